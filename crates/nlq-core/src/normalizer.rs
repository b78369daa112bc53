//! Stage 1: trim, length-check, and wrap the raw user question (§4.1).

use chrono::Utc;

use crate::error::{ErrorKind, PipelineError, Stage};
use crate::types::UserQuestion;

/// Produces a [`UserQuestion`] from raw input, or a typed error if the
/// question is empty or too long. Has no side effects.
pub struct Normalizer {
    max_length: usize,
}

impl Normalizer {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn normalize(&self, raw_text: &str) -> Result<UserQuestion, PipelineError> {
        let trimmed = raw_text.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::new(Stage::Normalizer, ErrorKind::EmptyQuestion));
        }
        if trimmed.chars().count() > self.max_length {
            return Err(PipelineError::new(
                Stage::Normalizer,
                ErrorKind::QuestionTooLong {
                    limit: self.max_length,
                },
            ));
        }

        Ok(UserQuestion::from_parts(
            raw_text.to_string(),
            trimmed.to_string(),
            Utc::now(),
            None,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let normalizer = Normalizer::new(2_000);
        let question = normalizer.normalize("  how many tables  \n").unwrap();
        assert_eq!(question.normalized_text(), "how many tables");
        assert_eq!(question.raw_text(), "  how many tables  \n");
    }

    #[test]
    fn rejects_whitespace_only_input() {
        let normalizer = Normalizer::new(2_000);
        let err = normalizer.normalize("   ").unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyQuestion);
    }

    #[test]
    fn rejects_questions_over_the_limit() {
        let normalizer = Normalizer::new(10);
        let err = normalizer.normalize(&"a".repeat(11)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::QuestionTooLong { limit: 10 });
    }

    #[test]
    fn accepts_exactly_at_the_limit() {
        let normalizer = Normalizer::new(10);
        let question = normalizer.normalize(&"a".repeat(10)).unwrap();
        assert_eq!(question.normalized_text().chars().count(), 10);
    }
}

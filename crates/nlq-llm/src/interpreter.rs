//! `ResultsInterpreterPort` (§4.6): narrates a query's result set in
//! natural language and proposes up to five follow-up questions, then
//! enforces the response guarantees (non-empty, length-bounded, numeric
//! literals grounded in the sample) before handing it back.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;

use nlq_core::config::LlmConfig;
use nlq_core::error::{ErrorKind, PipelineError, Stage};
use nlq_core::ports::{CompletionClient, GenerationOptions, PromptSection};
use nlq_core::stage_ports::ResultsInterpreterPort;
use nlq_core::types::{Interpretation, QueryResults, UserQuestion, ValidatedSql};

use crate::sample::{build_sample, grounded_numbers};

const INTERPRETATION_INSTRUCTIONS: &str = "\
Write a short narrative answering the question using only the figures shown above.
Do not invent numbers that do not appear in the data or summary statistics.
After the narrative, add a line reading exactly `Follow-ups:` followed by zero to five
short imperative follow-up questions, one per line, each starting with `-`.";

pub struct ResultsInterpreter {
    client: Arc<dyn CompletionClient>,
    config: LlmConfig,
    options: GenerationOptions,
}

impl ResultsInterpreter {
    pub fn new(client: Arc<dyn CompletionClient>, config: LlmConfig) -> Arc<Self> {
        Arc::new(Self {
            client,
            config,
            options: GenerationOptions::default(),
        })
    }

    fn build_sections(&self, question: &UserQuestion, validated: &ValidatedSql, results: &QueryResults) -> Vec<PromptSection> {
        let sample = build_sample(results);
        let mut body = String::new();
        for row in &sample.rows {
            body.push_str(&row.join(" | "));
            body.push('\n');
        }
        for summary in &sample.summaries {
            body.push_str(&format!(
                "{}: min={:?} max={:?} mean={:?} distinct={:?}\n",
                summary.name, summary.min, summary.max, summary.mean, summary.distinct_count
            ));
        }

        vec![
            PromptSection::new("Question", question.normalized_text().to_string()),
            PromptSection::new("Query", validated.statement_text.clone()),
            PromptSection::new("Data", body),
            PromptSection::new("Instructions", INTERPRETATION_INSTRUCTIONS.to_string()),
        ]
    }
}

#[async_trait]
impl ResultsInterpreterPort for ResultsInterpreter {
    async fn interpret(
        &self,
        question: &UserQuestion,
        validated: &ValidatedSql,
        results: &QueryResults,
    ) -> Result<(Interpretation, Vec<String>), PipelineError> {
        let sections = self.build_sections(question, validated, results);
        let text = self
            .client
            .complete(&sections, self.options)
            .await
            .map_err(|err| fail(ErrorKind::InterpretationUnavailable(err.to_string())))?;

        let (narrative_text, follow_up_suggestions) = split_response(&text);
        if narrative_text.trim().is_empty() {
            return Err(fail(ErrorKind::InterpretationUnavailable(
                "model returned an empty narrative".to_string(),
            )));
        }
        if narrative_text.chars().count() > self.config.max_narrative_length {
            return Err(fail(ErrorKind::InterpretationUnavailable(format!(
                "narrative exceeds the configured maximum of {} characters",
                self.config.max_narrative_length
            ))));
        }

        let sample = build_sample(results);
        let grounded = grounded_numbers(&sample);
        let mut warnings = Vec::new();
        if let Some(figure) = first_unfounded_figure(&narrative_text, &grounded) {
            warnings.push(format!(
                "[HallucinatedFigureSuspected] narrative cites {figure}, which does not appear in the sampled data or summary statistics"
            ));
        }

        let interpretation = Interpretation {
            narrative_text,
            follow_up_suggestions: follow_up_suggestions.into_iter().take(5).collect(),
        };
        Ok((interpretation, warnings))
    }
}

fn split_response(text: &str) -> (String, Vec<String>) {
    let marker = marker_pattern();
    match marker.find(text) {
        Some(found) => {
            let narrative = text[..found.start()].trim().to_string();
            let suggestions = text[found.end()..]
                .lines()
                .map(str::trim)
                .filter_map(|line| line.strip_prefix('-'))
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty())
                .collect();
            (narrative, suggestions)
        }
        None => (text.trim().to_string(), Vec::new()),
    }
}

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)follow-ups:\s*").expect("valid regex"))
}

/// Returns the first numeric literal in `narrative` that doesn't match (to
/// the nearest integer, per §4.6's "modulo integer rounding") any grounded
/// number from the sample or its summary statistics.
fn first_unfounded_figure(narrative: &str, grounded: &std::collections::BTreeSet<String>) -> Option<String> {
    let grounded_values: Vec<f64> = grounded.iter().filter_map(|value| value.parse::<f64>().ok()).collect();
    number_pattern()
        .find_iter(narrative)
        .map(|m| m.as_str())
        .find(|literal| {
            let Ok(value) = literal.parse::<f64>() else {
                return false;
            };
            !grounded_values.iter().any(|g| (g - value).abs() < 1.0 || g.round() == value.round())
        })
        .map(str::to_string)
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\d+(?:\.\d+)?\b").expect("valid regex"))
}

fn fail(kind: ErrorKind) -> PipelineError {
    PipelineError::new(Stage::Interpreter, kind)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use nlq_core::ports::CompletionError;
    use nlq_core::types::{CellValue, ColumnType};

    use super::*;

    struct StubClient {
        response: &'static str,
    }

    #[async_trait]
    impl CompletionClient for StubClient {
        async fn complete(&self, _sections: &[PromptSection], _options: GenerationOptions) -> Result<String, CompletionError> {
            Ok(self.response.to_string())
        }
    }

    fn question() -> UserQuestion {
        UserQuestion::from_parts("q".to_string(), "q".to_string(), Utc::now(), None)
    }

    fn validated() -> ValidatedSql {
        ValidatedSql::new("SELECT total FROM public.orders LIMIT 1000", 1000)
    }

    fn results_with_total(values: &[i64]) -> QueryResults {
        QueryResults {
            column_names: vec!["total".to_string()],
            column_types: vec![ColumnType::Integer],
            rows: values.iter().map(|v| vec![CellValue::Integer(*v)]).collect(),
            row_count: values.len(),
            truncated: false,
            elapsed: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn parses_narrative_and_follow_ups() {
        let client = Arc::new(StubClient {
            response: "Total shipped orders were 42.\n\nFollow-ups:\n- Break this down by region.\n- Compare to last month.",
        });
        let interpreter = ResultsInterpreter::new(client, LlmConfig::default());
        let (interpretation, warnings) = interpreter
            .interpret(&question(), &validated(), &results_with_total(&[42]))
            .await
            .unwrap();
        assert_eq!(interpretation.narrative_text, "Total shipped orders were 42.");
        assert_eq!(interpretation.follow_up_suggestions.len(), 2);
        assert!(warnings.is_empty());
    }

    #[tokio::test]
    async fn flags_a_number_absent_from_the_sample_as_a_warning() {
        let client = Arc::new(StubClient {
            response: "Total shipped orders were 9999.\n\nFollow-ups:",
        });
        let interpreter = ResultsInterpreter::new(client, LlmConfig::default());
        let (_interpretation, warnings) = interpreter
            .interpret(&question(), &validated(), &results_with_total(&[42]))
            .await
            .unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("HallucinatedFigureSuspected"));
    }

    #[tokio::test]
    async fn rejects_an_empty_narrative() {
        let client = Arc::new(StubClient { response: "Follow-ups:\n- x" });
        let interpreter = ResultsInterpreter::new(client, LlmConfig::default());
        let err = interpreter
            .interpret(&question(), &validated(), &results_with_total(&[42]))
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InterpretationUnavailable(_)));
    }
}

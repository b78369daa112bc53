//! Deterministic, collision-resistant file naming for export artifacts.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

#[derive(Debug, Clone)]
pub struct ExportNaming {
    question_slug: String,
    created_at: DateTime<Utc>,
}

impl ExportNaming {
    pub fn new(question_text: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            question_slug: sanitize_slug(question_text),
            created_at,
        }
    }

    pub fn filename(&self, format: ExportFormat) -> String {
        let timestamp = self.created_at.format("%Y%m%d-%H%M%S");
        let extension = match format {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        };
        format!("{}-{}.{}", self.question_slug, timestamp, extension)
    }
}

/// Lowercases, strips punctuation, collapses runs of separators into a
/// single dash, and truncates to a sane filename length.
fn sanitize_slug(text: &str) -> String {
    let mut cleaned = String::new();
    let mut last_dash = false;

    for ch in text.trim().chars() {
        let normalized = ch.to_ascii_lowercase();
        if normalized.is_ascii_alphanumeric() {
            cleaned.push(normalized);
            last_dash = false;
        } else if !last_dash {
            cleaned.push('-');
            last_dash = true;
        }
    }

    let cleaned = cleaned.trim_matches('-');
    let truncated: String = cleaned.chars().take(40).collect();
    let truncated = truncated.trim_matches('-');

    if truncated.is_empty() {
        "query".to_string()
    } else {
        truncated.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn filename_combines_slug_and_timestamp() {
        let timestamp = Utc.with_ymd_and_hms(2026, 1, 18, 12, 30, 5).unwrap();
        let naming = ExportNaming::new("How many orders shipped late?", timestamp);
        assert_eq!(
            naming.filename(ExportFormat::Csv),
            "how-many-orders-shipped-late-20260118-123005.csv"
        );
    }

    #[test]
    fn blank_question_falls_back_to_query() {
        let naming = ExportNaming::new("   ???  ", Utc::now());
        assert_eq!(naming.question_slug, "query");
    }
}

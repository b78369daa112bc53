use chrono::{DateTime, Utc};

/// A normalized question ready to be handed to the schema-aware SQL
/// generator. Produced once by the normalizer (stage 1) and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuestion {
    raw_text: String,
    normalized_text: String,
    received_at: DateTime<Utc>,
    max_rows_hint: Option<u32>,
}

impl UserQuestion {
    /// Constructs a question from already-normalized parts.
    ///
    /// Callers outside the normalizer should use
    /// `Normalizer::normalize` instead; this constructor exists for
    /// deserializing fixtures in tests and for crates that already hold a
    /// validated `normalized_text`.
    pub fn from_parts(
        raw_text: String,
        normalized_text: String,
        received_at: DateTime<Utc>,
        max_rows_hint: Option<u32>,
    ) -> Self {
        Self {
            raw_text,
            normalized_text,
            received_at,
            max_rows_hint,
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn normalized_text(&self) -> &str {
        &self.normalized_text
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn max_rows_hint(&self) -> Option<u32> {
        self.max_rows_hint
    }
}

use std::collections::BTreeSet;

/// Raw SQL extracted from the model's response, before validation. The
/// referenced-table/column sets are derived by tolerant identifier
/// scanning and used only for plausibility checks, never for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSql {
    pub statement_text: String,
    pub model_rationale: Option<String>,
    pub referenced_tables: BTreeSet<String>,
    pub referenced_columns: BTreeSet<String>,
}

/// A non-empty-violation-free result from the validator, carrying the
/// (possibly row-cap-rewritten) statement text and the row cap the
/// validator actually applied to it — either the rewritten `LIMIT`, the
/// caller's own `LIMIT` if it already fit within `row_cap_max`, or
/// `row_cap_default` if none was present. The executor materializes
/// against this cap, not the validator's default, so a statement that
/// legitimately kept a larger caller-supplied `LIMIT` isn't re-truncated.
/// Constructing one outside `nlq_validator` is only meaningful in tests,
/// so the constructor is not gated behind a feature flag but callers
/// should treat the validator as the sole producer in production code
/// paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSql {
    pub statement_text: String,
    pub row_cap: usize,
    pub warnings: Vec<String>,
}

impl ValidatedSql {
    pub fn new(statement_text: impl Into<String>, row_cap: usize) -> Self {
        Self {
            statement_text: statement_text.into(),
            row_cap,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(statement_text: impl Into<String>, row_cap: usize, warnings: Vec<String>) -> Self {
        Self {
            statement_text: statement_text.into(),
            row_cap,
            warnings,
        }
    }
}

use nlq_core::types::{GeneratedSql, SchemaSnapshot};

/// Read-only context handed to each [`crate::rule::ValidationRule`].
pub struct RuleContext<'a> {
    pub stripped_sql: &'a str,
    pub generated: &'a GeneratedSql,
    pub schema: &'a SchemaSnapshot,
}

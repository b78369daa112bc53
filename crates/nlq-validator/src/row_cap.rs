//! Rule 6 ("Row cap"): every statement that reaches the executor carries a
//! `LIMIT`. Postgres, MySQL, and SQLite — the three dialects `nlq-db`
//! targets — all accept the same `LIMIT n` tail, so there's no dialect
//! branch here unlike the teacher's multi-dialect lint rules.

use std::sync::OnceLock;

use regex::Regex;
use sqlparser::ast::{Expr, LimitClause, Query, Value};

use nlq_core::config::ValidatorConfig;

fn limit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\blimit\s+\d+").expect("valid regex"))
}

/// Returns the rewritten statement text, the row cap actually in effect
/// for it, and — if the existing cap had to be lowered — a warning
/// describing the change.
pub fn apply_row_cap(trimmed_sql: &str, query: &Query, config: &ValidatorConfig) -> (String, u32, Option<String>) {
    match existing_limit(query) {
        None => (
            format!("{trimmed_sql} LIMIT {}", config.row_cap_default),
            config.row_cap_default,
            None,
        ),
        Some(existing) if existing > config.row_cap_max => {
            let rewritten = replace_trailing_limit(trimmed_sql, config.row_cap_max);
            let warning = format!(
                "row cap {existing} exceeds the configured maximum of {}; lowered",
                config.row_cap_max
            );
            (rewritten, config.row_cap_max, Some(warning))
        }
        Some(existing) => (trimmed_sql.to_string(), existing, None),
    }
}

fn existing_limit(query: &Query) -> Option<u32> {
    match &query.limit_clause {
        Some(LimitClause::LimitOffset { limit: Some(expr), .. }) => numeric_literal(expr),
        Some(LimitClause::OffsetCommaLimit { limit, .. }) => numeric_literal(limit),
        _ => None,
    }
}

fn numeric_literal(expr: &Expr) -> Option<u32> {
    if let Expr::Value(value_with_span) = expr {
        if let Value::Number(digits, _) = &value_with_span.value {
            return digits.parse().ok();
        }
    }
    None
}

fn replace_trailing_limit(sql: &str, cap: u32) -> String {
    match limit_pattern().find_iter(sql).last() {
        Some(found) => format!("{}LIMIT {cap}{}", &sql[..found.start()], &sql[found.end()..]),
        None => format!("{sql} LIMIT {cap}"),
    }
}

#[cfg(test)]
mod tests {
    use sqlparser::ast::Statement;
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;

    use super::*;

    fn parse_query(sql: &str) -> Query {
        let statement = Parser::parse_sql(&GenericDialect {}, sql).unwrap().remove(0);
        match statement {
            Statement::Query(query) => *query,
            other => panic!("expected a query, got {other:?}"),
        }
    }

    #[test]
    fn appends_limit_when_absent() {
        let query = parse_query("SELECT * FROM orders");
        let config = ValidatorConfig::default();
        let (rewritten, effective_cap, warning) = apply_row_cap("SELECT * FROM orders", &query, &config);
        assert_eq!(rewritten, "SELECT * FROM orders LIMIT 1000");
        assert_eq!(effective_cap, config.row_cap_default);
        assert!(warning.is_none());
    }

    #[test]
    fn leaves_limit_within_bounds_untouched() {
        let query = parse_query("SELECT * FROM orders LIMIT 50");
        let config = ValidatorConfig::default();
        let (rewritten, effective_cap, warning) = apply_row_cap("SELECT * FROM orders LIMIT 50", &query, &config);
        assert_eq!(rewritten, "SELECT * FROM orders LIMIT 50");
        assert_eq!(effective_cap, 50);
        assert!(warning.is_none());
    }

    #[test]
    fn keeps_a_caller_supplied_limit_up_to_the_configured_maximum() {
        let sql = "SELECT * FROM orders LIMIT 10000";
        let query = parse_query(sql);
        let config = ValidatorConfig::default();
        let (rewritten, effective_cap, warning) = apply_row_cap(sql, &query, &config);
        assert_eq!(rewritten, "SELECT * FROM orders LIMIT 10000");
        assert_eq!(effective_cap, 10_000);
        assert!(warning.is_none());
    }

    #[test]
    fn lowers_limit_exceeding_the_configured_maximum() {
        let sql = "SELECT * FROM orders LIMIT 50000";
        let query = parse_query(sql);
        let config = ValidatorConfig::default();
        let (rewritten, effective_cap, warning) = apply_row_cap(sql, &query, &config);
        assert_eq!(rewritten, "SELECT * FROM orders LIMIT 10000");
        assert_eq!(effective_cap, config.row_cap_max);
        assert!(warning.is_some());
    }
}

//! Post-processing helpers shared by the generator and interpreter: pulling
//! a fenced code block out of free-form model text, and a tolerant
//! identifier scan over SQL that needs no real parser (§4.3's
//! "referenced_tables and referenced_columns by a tolerant identifier
//! scan").

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

/// Pulls the first fenced code block out of `text` (``` or ```sql), falling
/// back to the whole trimmed text when the model didn't fence its answer —
/// some providers omit the fence for short single-statement answers.
pub fn extract_sql_block(text: &str) -> Option<String> {
    let pattern = fence_pattern();
    if let Some(captures) = pattern.captures(text) {
        let body = captures.get(1)?.as_str().trim();
        return (!body.is_empty()).then(|| body.to_string());
    }
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)```(?:sql)?\s*\n?(.*?)```").expect("valid regex"))
}

/// Tables referenced after `FROM`/`JOIN`, schema-qualified or bare,
/// lowercased for case-insensitive comparison against the snapshot.
pub fn scan_referenced_tables(sql: &str) -> BTreeSet<String> {
    let pattern = table_reference_pattern();
    pattern
        .captures_iter(sql)
        .filter_map(|captures| captures.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect()
}

fn table_reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(?:FROM|JOIN)\s+([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)?)").expect("valid regex")
    })
}

/// Bare column-like identifiers appearing in the projection list between
/// `SELECT` and the first top-level `FROM` — best-effort only, per §4.4's
/// "columns are best-effort checked".
pub fn scan_referenced_columns(sql: &str) -> BTreeSet<String> {
    let projection = projection_clause(sql).unwrap_or_default();
    let without_aliases = alias_pattern().replace_all(&projection, "");
    let pattern = identifier_pattern();
    pattern
        .find_iter(&without_aliases)
        .map(|m| m.as_str().to_ascii_lowercase())
        .filter(|ident| !is_sql_keyword(ident))
        .map(|ident| ident.rsplit('.').next().unwrap_or(ident.as_str()).to_string())
        .collect()
}

fn alias_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\bAS\s+[A-Za-z_][A-Za-z0-9_]*").expect("valid regex"))
}

fn projection_clause(sql: &str) -> Option<String> {
    let select_pattern = select_from_pattern();
    let captures = select_pattern.captures(sql)?;
    Some(captures.get(1)?.as_str().to_string())
}

fn select_from_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)\bSELECT\b(.*?)\bFROM\b").expect("valid regex"))
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)?").expect("valid regex"))
}

fn is_sql_keyword(ident: &str) -> bool {
    matches!(
        ident,
        "select" | "distinct" | "as" | "case" | "when" | "then" | "else" | "end" | "count" | "sum" | "avg" | "min" | "max" | "cast" | "over" | "partition" | "by" | "order"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_a_fenced_sql_block() {
        let text = "Here you go:\n```sql\nSELECT id FROM public.orders\n```\nLet me know if you need more.";
        assert_eq!(extract_sql_block(text), Some("SELECT id FROM public.orders".to_string()));
    }

    #[test]
    fn falls_back_to_the_whole_trimmed_text_when_unfenced() {
        let text = "  SELECT id FROM public.orders  ";
        assert_eq!(extract_sql_block(text), Some("SELECT id FROM public.orders".to_string()));
    }

    #[test]
    fn scans_tables_after_from_and_join() {
        let tables = scan_referenced_tables("SELECT o.id FROM public.orders o JOIN public.customers c ON c.id = o.customer_id");
        assert!(tables.contains("public.orders"));
        assert!(tables.contains("public.customers"));
    }

    #[test]
    fn scans_columns_from_the_projection_list_only() {
        let columns = scan_referenced_columns("SELECT o.id, o.total AS amount FROM public.orders o WHERE o.total > 10");
        assert!(columns.contains("id"));
        assert!(columns.contains("total"));
        assert!(!columns.contains("amount"));
    }
}

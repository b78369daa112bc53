//! Rule 4 ("Grounded references"): every table the generator claims to
//! reference must exist in the schema snapshot; unknown columns are only a
//! warning since the identifier scanner in `nlq-llm` is best-effort and
//! can't attribute expressions or aliases reliably.

use std::collections::HashSet;

use sqlparser::ast::Statement;

use nlq_core::ErrorKind;

use crate::context::RuleContext;
use crate::rule::{RuleOutcome, ValidationRule};

pub struct GroundedReferencesRule;

impl ValidationRule for GroundedReferencesRule {
    fn code(&self) -> &'static str {
        "grounded_references"
    }

    fn name(&self) -> &'static str {
        "References must exist in the schema"
    }

    fn check(&self, _statement: &Statement, ctx: &RuleContext) -> RuleOutcome {
        let qualified: HashSet<String> = ctx
            .schema
            .table_names()
            .map(|name| name.to_ascii_lowercase())
            .collect();
        let bare: HashSet<String> = ctx
            .schema
            .tables()
            .values()
            .map(|table| table.table_name.to_ascii_lowercase())
            .collect();

        let unknown: Vec<String> = ctx
            .generated
            .referenced_tables
            .iter()
            .filter(|table| {
                let lower = table.to_ascii_lowercase();
                !qualified.contains(&lower) && !bare.contains(&lower)
            })
            .cloned()
            .collect();

        if !unknown.is_empty() {
            return RuleOutcome::Fail(ErrorKind::UnknownTable(unknown));
        }

        let known_columns: HashSet<String> = ctx
            .schema
            .tables()
            .values()
            .flat_map(|table| table.columns.iter().map(|c| c.name.to_ascii_lowercase()))
            .collect();

        let unknown_columns: Vec<&str> = ctx
            .generated
            .referenced_columns
            .iter()
            .map(String::as_str)
            .filter(|column| !known_columns.contains(&column.to_ascii_lowercase()))
            .collect();

        if unknown_columns.is_empty() {
            RuleOutcome::Pass
        } else {
            RuleOutcome::Warn(format!(
                "references unrecognized column(s): {}",
                unknown_columns.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;

    use super::*;
    use crate::rules::test_support::{generated_sql_with_refs, schema_with_orders_table};

    #[test]
    fn fails_on_unknown_table() {
        let sql = "SELECT * FROM nonexistent";
        let statement = Parser::parse_sql(&GenericDialect {}, sql).unwrap().remove(0);
        let generated = generated_sql_with_refs(sql, &["nonexistent"], &[]);
        let schema = schema_with_orders_table();
        let ctx = RuleContext {
            stripped_sql: sql,
            generated: &generated,
            schema: &schema,
        };
        assert!(matches!(
            GroundedReferencesRule.check(&statement, &ctx),
            RuleOutcome::Fail(ErrorKind::UnknownTable(_))
        ));
    }

    #[test]
    fn warns_but_does_not_fail_on_unknown_column() {
        let sql = "SELECT mystery_column FROM public.orders";
        let statement = Parser::parse_sql(&GenericDialect {}, sql).unwrap().remove(0);
        let generated = generated_sql_with_refs(sql, &["public.orders"], &["mystery_column"]);
        let schema = schema_with_orders_table();
        let ctx = RuleContext {
            stripped_sql: sql,
            generated: &generated,
            schema: &schema,
        };
        assert!(matches!(
            GroundedReferencesRule.check(&statement, &ctx),
            RuleOutcome::Warn(_)
        ));
    }

    #[test]
    fn accepts_known_table_and_columns() {
        let sql = "SELECT id FROM public.orders";
        let statement = Parser::parse_sql(&GenericDialect {}, sql).unwrap().remove(0);
        let generated = generated_sql_with_refs(sql, &["public.orders"], &["id"]);
        let schema = schema_with_orders_table();
        let ctx = RuleContext {
            stripped_sql: sql,
            generated: &generated,
            schema: &schema,
        };
        assert!(matches!(
            GroundedReferencesRule.check(&statement, &ctx),
            RuleOutcome::Pass
        ));
    }
}

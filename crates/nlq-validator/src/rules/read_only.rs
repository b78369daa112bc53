//! Rule 2 ("Read-only") and rule 3 ("No multi-batch separators" — the
//! AST half of it; the textual half lives in [`crate::rules::batch`]).

use sqlparser::ast::{Query, SetExpr, Statement};

use nlq_core::ErrorKind;

use crate::context::RuleContext;
use crate::rule::{RuleOutcome, ValidationRule};

pub struct ReadOnlyRule;

impl ValidationRule for ReadOnlyRule {
    fn code(&self) -> &'static str {
        "read_only"
    }

    fn name(&self) -> &'static str {
        "Statement must be a read-only SELECT"
    }

    fn check(&self, statement: &Statement, _ctx: &RuleContext) -> RuleOutcome {
        match statement {
            Statement::Query(query) => match query_is_read_only(query) {
                Ok(()) => RuleOutcome::Pass,
                Err(reason) => RuleOutcome::Fail(ErrorKind::NonReadOnly(reason)),
            },
            other => RuleOutcome::Fail(ErrorKind::NonReadOnly(format!(
                "top-level statement must be a SELECT, found {}",
                statement_kind_name(other)
            ))),
        }
    }
}

fn query_is_read_only(query: &Query) -> Result<(), String> {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            query_is_read_only(&cte.query)?;
        }
    }
    set_expr_is_read_only(&query.body)
}

fn set_expr_is_read_only(set_expr: &SetExpr) -> Result<(), String> {
    match set_expr {
        SetExpr::Select(select) => {
            if select.into.is_some() {
                Err("SELECT ... INTO is not permitted".to_string())
            } else {
                Ok(())
            }
        }
        SetExpr::Query(query) => query_is_read_only(query),
        SetExpr::SetOperation { left, right, .. } => {
            set_expr_is_read_only(left)?;
            set_expr_is_read_only(right)
        }
        SetExpr::Insert(_) | SetExpr::Update(_) | SetExpr::Delete(_) | SetExpr::Merge(_) => {
            Err("query body contains a nested write operation".to_string())
        }
        _ => Ok(()),
    }
}

fn statement_kind_name(statement: &Statement) -> &'static str {
    match statement {
        Statement::Insert(_) => "INSERT",
        Statement::Update { .. } => "UPDATE",
        Statement::Delete(_) => "DELETE",
        Statement::Merge { .. } => "MERGE",
        Statement::Truncate { .. } => "TRUNCATE",
        Statement::Drop { .. } => "DROP",
        Statement::CreateTable(_) => "CREATE TABLE",
        Statement::CreateView { .. } => "CREATE VIEW",
        Statement::AlterTable { .. } => "ALTER TABLE",
        _ => "a non-SELECT statement",
    }
}

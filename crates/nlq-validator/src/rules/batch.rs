//! Rule 3 ("No multi-batch separators"), textual half: vendor batch
//! terminators such as `GO` never appear as SQL tokens, so they must be
//! caught before or alongside parsing rather than in the AST.

use regex::Regex;
use std::sync::OnceLock;

use sqlparser::ast::Statement;

use nlq_core::ErrorKind;

use crate::context::RuleContext;
use crate::rule::{RuleOutcome, ValidationRule};

fn batch_separator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?im)^\s*GO\s*$").expect("valid regex"))
}

pub struct BatchSeparatorRule;

impl ValidationRule for BatchSeparatorRule {
    fn code(&self) -> &'static str {
        "no_batch_separators"
    }

    fn name(&self) -> &'static str {
        "No vendor batch separators"
    }

    fn check(&self, _statement: &Statement, ctx: &RuleContext) -> RuleOutcome {
        if batch_separator_pattern().is_match(ctx.stripped_sql) {
            RuleOutcome::Fail(ErrorKind::NonReadOnly(
                "generated SQL contains a batch separator (GO)".to_string(),
            ))
        } else {
            RuleOutcome::Pass
        }
    }
}

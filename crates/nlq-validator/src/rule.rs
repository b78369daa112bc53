//! The rule trait shared by the validator's AST-level checks.
//!
//! Grounded on the teacher's lint rule trait: a machine-readable code, a
//! human-readable name, and a `check` method that inspects one parsed
//! statement. Unlike the teacher's lints (which accumulate `Issue`s across
//! a whole document), a validator rule either passes, warns, or fails the
//! run outright — there is no "fix and continue" here, only "reject".

use nlq_core::ErrorKind;
use sqlparser::ast::Statement;

use crate::context::RuleContext;

pub enum RuleOutcome {
    Pass,
    Warn(String),
    Fail(ErrorKind),
}

pub trait ValidationRule: Send + Sync {
    /// Machine-readable rule code, e.g. `"read_only"`.
    fn code(&self) -> &'static str;

    /// Short human-readable name.
    fn name(&self) -> &'static str;

    fn check(&self, statement: &Statement, ctx: &RuleContext) -> RuleOutcome;
}

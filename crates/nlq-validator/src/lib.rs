//! Validates generated SQL for safety before it ever reaches a database
//! connection (§4.4): single statement, read-only, grounded in the schema,
//! bounded in size, and capped in row count. The validator never opens a
//! connection — every check here is static analysis over the parsed AST.

mod comments;
mod context;
mod rule;
mod row_cap;
mod rules;

use std::sync::Arc;

use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use tracing::instrument;

use nlq_core::config::ValidatorConfig;
use nlq_core::error::{ErrorKind, PipelineError, Stage};
use nlq_core::stage_ports::SqlValidatorPort;
use nlq_core::types::{GeneratedSql, SchemaSnapshot, ValidatedSql};

use context::RuleContext;
use rule::RuleOutcome;

pub struct SqlValidator {
    config: ValidatorConfig,
}

impl SqlValidator {
    pub fn new(config: ValidatorConfig) -> Arc<Self> {
        Arc::new(Self { config })
    }
}

impl SqlValidatorPort for SqlValidator {
    #[instrument(skip(self, generated, schema), fields(len = generated.statement_text.len()))]
    fn validate(&self, generated: &GeneratedSql, schema: &SchemaSnapshot) -> Result<ValidatedSql, PipelineError> {
        let stripped = comments::strip_comments(&generated.statement_text);
        let trimmed = stripped.trim().trim_end_matches(';').trim().to_string();

        if trimmed.is_empty() {
            return Err(fail(ErrorKind::GenerationMalformed));
        }
        if trimmed.len() > self.config.statement_max_bytes {
            return Err(fail(ErrorKind::StatementTooLarge {
                limit: self.config.statement_max_bytes,
            }));
        }

        let mut statements = Parser::parse_sql(&GenericDialect {}, &trimmed)
            .map_err(|err| fail(ErrorKind::NonReadOnly(format!("could not parse generated SQL: {err}"))))?;

        let statement = match statements.len() {
            0 => return Err(fail(ErrorKind::GenerationMalformed)),
            1 => statements.remove(0),
            _ => return Err(fail(ErrorKind::MultipleStatements)),
        };

        let ctx = RuleContext {
            stripped_sql: &trimmed,
            generated,
            schema,
        };

        let mut warnings = Vec::new();
        for rule in rules::default_rules() {
            match rule.check(&statement, &ctx) {
                RuleOutcome::Pass => {}
                RuleOutcome::Warn(message) => warnings.push(format!("[{}] {message}", rule.code())),
                RuleOutcome::Fail(kind) => return Err(fail(kind)),
            }
        }

        let query = match statement {
            Statement::Query(query) => query,
            // ReadOnlyRule runs before this point and rejects every other variant.
            _ => unreachable!("read-only rule already rejected non-query statements"),
        };

        let (rewritten, effective_cap, cap_warning) = row_cap::apply_row_cap(&trimmed, &query, &self.config);
        if let Some(warning) = cap_warning {
            warnings.push(format!("[row_cap] {warning}"));
        }

        Ok(ValidatedSql::with_warnings(rewritten, effective_cap as usize, warnings))
    }
}

fn fail(kind: ErrorKind) -> PipelineError {
    PipelineError::new(Stage::Validator, kind)
}

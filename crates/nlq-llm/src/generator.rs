//! `SqlGeneratorPort` (§4.3): turns a normalized question plus a schema
//! snapshot into a single candidate SELECT statement via the completion
//! client, retrying once on a malformed response (when configured to)
//! before surfacing failure.

use std::sync::Arc;

use async_trait::async_trait;

use nlq_core::config::LlmConfig;
use nlq_core::error::{ErrorKind, PipelineError, Stage};
use nlq_core::ports::{CompletionClient, GenerationOptions, PromptSection};
use nlq_core::stage_ports::SqlGeneratorPort;
use nlq_core::types::{GeneratedSql, SchemaSnapshot, UserQuestion};

use crate::extract;
use crate::prompt::render_schema;

const GENERATION_RULES: &str = "\
- Return exactly one statement: a SELECT, or a WITH whose final statement is a SELECT.
- Never use INSERT, UPDATE, DELETE, MERGE, TRUNCATE, DROP, ALTER, CREATE, GRANT, or REVOKE.
- Reference only tables listed in the schema above.
- Prefer explicit JOIN syntax over comma-separated joins.
- Avoid SELECT * when a narrower projection answers the question.
- Include an ORDER BY when the question asks for a top-N result.
- Reply with the SQL in a single ```sql fenced block and nothing else.";

pub struct SqlGenerator {
    client: Arc<dyn CompletionClient>,
    dialect_label: String,
    config: LlmConfig,
    options: GenerationOptions,
}

impl SqlGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, dialect_label: impl Into<String>, config: LlmConfig) -> Arc<Self> {
        Arc::new(Self {
            client,
            dialect_label: dialect_label.into(),
            config,
            options: GenerationOptions::default(),
        })
    }

    fn build_sections(&self, question: &UserQuestion, schema: &SchemaSnapshot, previous_failure: Option<&str>) -> Vec<PromptSection> {
        let mut sections = vec![
            PromptSection::new("Question", question.normalized_text().to_string()),
            PromptSection::new("Schema", render_schema(schema)),
            PromptSection::new("Dialect", self.dialect_label.clone()),
            PromptSection::new("Rules", GENERATION_RULES.to_string()),
        ];
        if let Some(failure) = previous_failure {
            sections.push(PromptSection::new(
                "PreviousAttempt",
                format!("The previous attempt failed with: {failure}"),
            ));
        }
        sections
    }

    async fn call_and_parse(&self, sections: &[PromptSection]) -> Result<GeneratedSql, PipelineError> {
        let text = self
            .client
            .complete(sections, self.options)
            .await
            .map_err(|err| fail(ErrorKind::GenerationUnavailable(err.to_string())))?;

        let sql = extract::extract_sql_block(&text).ok_or_else(|| fail(ErrorKind::GenerationMalformed))?;
        let trimmed = sql.trim().trim_end_matches(';').trim().to_string();
        if trimmed.is_empty() {
            return Err(fail(ErrorKind::GenerationMalformed));
        }

        Ok(GeneratedSql {
            referenced_tables: extract::scan_referenced_tables(&trimmed),
            referenced_columns: extract::scan_referenced_columns(&trimmed),
            statement_text: trimmed,
            model_rationale: None,
        })
    }
}

#[async_trait]
impl SqlGeneratorPort for SqlGenerator {
    async fn generate(
        &self,
        question: &UserQuestion,
        schema: &SchemaSnapshot,
        previous_failure: Option<&str>,
    ) -> Result<GeneratedSql, PipelineError> {
        let sections = self.build_sections(question, schema, previous_failure);
        match self.call_and_parse(&sections).await {
            Ok(generated) => Ok(generated),
            Err(err) if err.kind == ErrorKind::GenerationMalformed && self.config.retry_malformed => {
                self.call_and_parse(&sections).await
            }
            Err(err) => Err(err),
        }
    }
}

fn fail(kind: ErrorKind) -> PipelineError {
    PipelineError::new(Stage::SqlGenerator, kind)
}

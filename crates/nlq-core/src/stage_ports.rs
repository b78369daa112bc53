//! Trait boundaries between the orchestrator and the per-stage crates.
//!
//! `nlq-core` cannot depend on `nlq-schema`, `nlq-llm`, `nlq-validator`,
//! `nlq-export`, or `nlq-viz` (they depend on it), so the orchestrator is
//! generic over these traits instead; each sibling crate provides the
//! concrete implementation the binary wires together at construction time.

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::types::{
    ExportArtifacts, GeneratedSql, Interpretation, QueryResults, SchemaSnapshot, UserQuestion,
    ValidatedSql, VisualizationArtifact,
};

#[async_trait]
pub trait SchemaRetrieverPort: Send + Sync {
    async fn schema_for(&self, server: &str, database: &str) -> Result<SchemaSnapshot, PipelineError>;
}

#[async_trait]
pub trait SqlGeneratorPort: Send + Sync {
    async fn generate(
        &self,
        question: &UserQuestion,
        schema: &SchemaSnapshot,
        previous_failure: Option<&str>,
    ) -> Result<GeneratedSql, PipelineError>;
}

pub trait SqlValidatorPort: Send + Sync {
    fn validate(&self, generated: &GeneratedSql, schema: &SchemaSnapshot) -> Result<ValidatedSql, PipelineError>;
}

#[async_trait]
pub trait ResultsInterpreterPort: Send + Sync {
    async fn interpret(
        &self,
        question: &UserQuestion,
        validated: &ValidatedSql,
        results: &QueryResults,
    ) -> Result<(Interpretation, Vec<String>), PipelineError>;
}

pub trait DataExporterPort: Send + Sync {
    fn export(&self, results: &QueryResults, question: &UserQuestion) -> Result<ExportArtifacts, String>;
}

pub trait VisualizerPort: Send + Sync {
    fn visualize(&self, results: &QueryResults, question: &UserQuestion) -> VisualizationArtifact;
}

//! Trait boundaries to the two external collaborators named in §6.
//!
//! The orchestrator is generic over these traits, not over any concrete
//! HTTP or SQL driver crate — `nlq-llm` and `nlq-db` implement them, and
//! the binary that constructs a `Pipeline` is the only place both a
//! concrete implementation and `nlq-core` are linked together.

use std::time::Duration;

use async_trait::async_trait;

use crate::types::{ColumnDescriptor, TableKind};

/// A single section of a prompt, handed to the completion client as an
/// opaque ordered list so the core never constructs vendor-specific
/// message framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSection {
    pub title: &'static str,
    pub body: String,
}

impl PromptSection {
    pub fn new(title: &'static str, body: impl Into<String>) -> Self {
        Self {
            title,
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_output_tokens: 4096,
        }
    }
}

/// The LLM collaborator's entire surface area, per §6: one operation that
/// takes structured prompt sections and returns raw text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        prompt_sections: &[PromptSection],
        generation_options: GenerationOptions,
    ) -> Result<String, CompletionError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CompletionError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider returned an error response: {0}")]
    Provider(String),
}

/// One row of raw catalog metadata, as returned by
/// [`DatabaseGateway::describe_catalog`] before it is assembled into a
/// `SchemaSnapshot` by `nlq-schema`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCatalogColumn {
    pub schema_name: String,
    pub table_name: String,
    pub table_kind: TableKind,
    pub column: ColumnDescriptor,
    pub foreign_key_table: Option<String>,
    pub foreign_key_column: Option<String>,
}

/// A materialized row from [`DatabaseGateway::run_read_only`], carrying
/// values as already-typed `CellValue`s so the executor does not need to
/// know about any specific driver's wire representation.
pub type RawRow = Vec<crate::types::CellValue>;

/// Column metadata returned alongside a query's row stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumnMeta {
    pub name: String,
    pub data_type: crate::types::ColumnType,
}

/// A cooperative cancellation token; the executor checks it between row
/// batches and the driver's own cancel primitive is invoked through
/// [`DatabaseGateway::cancel`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(std::sync::Arc<std::sync::atomic::AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

pub struct CatalogResult {
    pub columns: Vec<RawCatalogColumn>,
}

pub struct QueryStream {
    pub columns: Vec<RawColumnMeta>,
    pub rows: Vec<RawRow>,
    pub more_rows_available: bool,
}

/// The database collaborator's entire surface area, per §6.
#[async_trait]
pub trait DatabaseGateway: Send + Sync {
    async fn describe_catalog(
        &self,
        server: &str,
        database: &str,
    ) -> Result<CatalogResult, DatabaseError>;

    async fn run_read_only(
        &self,
        sql: &str,
        statement_timeout: Duration,
        row_cap: usize,
        cancel: CancelToken,
    ) -> Result<QueryStream, DatabaseError>;

    async fn cancel(&self, token: CancelToken);
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DatabaseError {
    #[error("transient driver error: {0}")]
    Transient(String),
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    #[error("statement timed out")]
    Timeout,
}

//! The pipeline's error taxonomy (§7).
//!
//! Every variant here is fatal to the run that produced it. Non-fatal
//! conditions (`UnknownColumn`, `HallucinatedFigureSuspected`,
//! `ExportFailed`, visualization failures) are represented as `Warning`
//! values accumulated on the run result instead.

use thiserror::Error;

/// The stage that produced a fatal error, used to tag `PipelineError` for
/// operator-facing diagnostics without ever leaking LLM prompt text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Normalizer,
    SchemaRetriever,
    SqlGenerator,
    Validator,
    Executor,
    Interpreter,
    Exporter,
    Visualizer,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Normalizer => "Normalizer",
            Stage::SchemaRetriever => "SchemaRetriever",
            Stage::SqlGenerator => "SqlGenerator",
            Stage::Validator => "Validator",
            Stage::Executor => "Executor",
            Stage::Interpreter => "Interpreter",
            Stage::Exporter => "Exporter",
            Stage::Visualizer => "Visualizer",
        };
        f.write_str(name)
    }
}

/// The typed error kind, independent of which stage raised it. Kept
/// separate from `PipelineError` so individual crates (`nlq-validator`,
/// `nlq-db`, ...) can return `ErrorKind` directly and let the orchestrator
/// attach the stage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("question was empty after trimming")]
    EmptyQuestion,

    #[error("question exceeds the configured maximum length of {limit} characters")]
    QuestionTooLong { limit: usize },

    #[error("failed to fetch schema catalog: {0}")]
    CatalogFetchFailed(String),

    #[error("cache entry was unreadable and has been discarded: {0}")]
    CacheCorrupt(String),

    #[error("SQL generation transport failed: {0}")]
    GenerationUnavailable(String),

    #[error("SQL generation returned no extractable statement")]
    GenerationMalformed,

    #[error("generated SQL contains more than one top-level statement")]
    MultipleStatements,

    #[error("generated SQL is not read-only: {0}")]
    NonReadOnly(String),

    #[error("generated SQL references unknown table(s): {0:?}")]
    UnknownTable(Vec<String>),

    #[error("generated SQL exceeds the configured maximum size of {limit} bytes")]
    StatementTooLarge { limit: usize },

    #[error("query execution failed: {0}")]
    ExecutionFailed(String),

    #[error("query exceeded the statement timeout")]
    QueryTimeout,

    #[error("result set has {actual} columns, exceeding the configured maximum of {limit}")]
    ResultShapeRejected { actual: usize, limit: usize },

    #[error("interpretation transport failed: {0}")]
    InterpretationUnavailable(String),

    #[error("export failed: {0}")]
    ExportFailed(String),

    #[error("the run was cancelled")]
    Cancelled,
}

/// A fatal error bubbled up to the orchestrator's caller, tagged with the
/// stage that produced it and an operator-facing message that may include
/// SQL text and database error text but never LLM prompt text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("[{stage}] {kind}")]
pub struct PipelineError {
    pub stage: Stage,
    pub kind: ErrorKind,
}

impl PipelineError {
    pub fn new(stage: Stage, kind: ErrorKind) -> Self {
        Self { stage, kind }
    }
}

/// A non-fatal condition accumulated on the run result. Consumers decide
/// how (or whether) to surface these; the pipeline always keeps running
/// after recording one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub stage: Stage,
    pub message: String,
}

impl Warning {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

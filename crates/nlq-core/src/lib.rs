//! Core types, error taxonomy, configuration, and stage orchestration for
//! the natural-language-to-SQL pipeline.
//!
//! This crate owns nothing that talks to a network or a filesystem. Every
//! external collaborator — the LLM, the database, the schema cache, the
//! exporter, the visualizer — is a trait defined in [`ports`] or
//! [`stage_ports`] and implemented by a sibling crate; [`orchestrator`]
//! wires concrete implementations together without depending on any of
//! them at compile time.

pub mod config;
pub mod error;
pub mod executor;
pub mod normalizer;
pub mod orchestrator;
pub mod ports;
pub mod stage_ports;
pub mod types;

pub use config::PipelineConfig;
pub use error::{ErrorKind, PipelineError, Stage, Warning};
pub use executor::QueryExecutor;
pub use normalizer::Normalizer;
pub use orchestrator::{Pipeline, PipelineOutcome};

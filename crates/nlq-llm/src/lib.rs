//! LLM-backed stages (§4.3, §4.6): SQL generation from a natural-language
//! question and schema snapshot, and natural-language interpretation of a
//! result set. Both stages share one completion-client transport
//! (`client.rs`) and a set of post-processing helpers (`extract.rs`,
//! `sample.rs`, `prompt.rs`).

mod client;
mod extract;
mod generator;
mod interpreter;
mod prompt;
mod sample;

pub use client::{HttpCompletionClient, RetryConfig};
pub use generator::SqlGenerator;
pub use interpreter::ResultsInterpreter;

//! CLI argument parsing using clap.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// nlq - ask a natural-language question over a SQL warehouse
#[derive(Parser, Debug)]
#[command(name = "nlq")]
#[command(about = "Turn a natural-language question into SQL, run it, and explain the result", long_about = None)]
#[command(version)]
pub struct Args {
    /// The natural-language question to answer
    pub question: String,

    /// Database connection URL (postgres://, mysql://, or sqlite://)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Cache-key label identifying the server; defaults to the URL's host
    #[arg(long)]
    pub server: Option<String>,

    /// Cache-key label identifying the database; defaults to the URL's path
    #[arg(long)]
    pub database: Option<String>,

    /// Restrict catalog introspection to a single schema
    #[arg(long, value_name = "SCHEMA")]
    pub schema: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Suppress warnings on stderr
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to a TOML configuration file (defaults to $NLQ_CONFIG, then built-in defaults)
    #[arg(long, env = "NLQ_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    Table,
    /// JSON report
    Json,
}

//! nlq - command-line driver for the natural-language-to-SQL pipeline.
//!
//! This binary is the only place a concrete `CompletionClient` and
//! `DatabaseGateway` are linked alongside `nlq-core`; everything here is
//! wiring, argument parsing, and report formatting.

mod cli;
mod output;

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use nlq_core::config::PipelineConfig;
use nlq_core::orchestrator::{Pipeline, PipelineOutcome};
use nlq_core::ports::{CancelToken, CompletionClient, DatabaseGateway};
use nlq_core::stage_ports::{DataExporterPort, VisualizerPort};
use nlq_db::{DatabaseType, SqlxDatabaseGateway};
use nlq_export::FileExporter;
use nlq_llm::{HttpCompletionClient, ResultsInterpreter, SqlGenerator};
use nlq_schema::SchemaCache;
use nlq_validator::SqlValidator;
use nlq_viz::Visualizer;

use cli::{Args, OutputFormat};
use output::{format_json, format_table};

const DEFAULT_LLM_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_EXPORTS_DIR: &str = "./nlq-exports";
const DEFAULT_VIZ_DIR: &str = "./nlq-viz";

fn main() -> ExitCode {
    match run() {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            eprintln!("nlq: error: {err:#}");
            ExitCode::from(66)
        }
    }
}

fn run() -> Result<bool> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    runtime.block_on(run_pipeline(args, config))
}

async fn run_pipeline(args: Args, config: PipelineConfig) -> Result<bool> {
    let db_type = DatabaseType::from_url(&args.database_url)
        .with_context(|| format!("unsupported database URL: {}", args.database_url))?;

    let server = args.server.clone().unwrap_or_else(|| host_label(&args.database_url));
    let database = args.database.clone().unwrap_or_else(|| path_label(&args.database_url));

    let gateway: Arc<dyn DatabaseGateway> = Arc::new(
        SqlxDatabaseGateway::connect(&args.database_url, args.schema.clone())
            .await
            .context("failed to connect to the database")?,
    );

    let schema_cache = SchemaCache::new(gateway.clone(), config.schema_cache.clone());

    let api_key = env::var("LLM_API_KEY").context("LLM_API_KEY must be set to call the completion provider")?;
    let endpoint = env::var("LLM_ENDPOINT").unwrap_or_else(|_| DEFAULT_LLM_ENDPOINT.to_string());
    let model = env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string());
    let completion_client: Arc<dyn CompletionClient> = Arc::new(HttpCompletionClient::new(endpoint, api_key, model));

    let sql_generator = SqlGenerator::new(completion_client.clone(), dialect_label(db_type), config.llm.clone());
    let interpreter = ResultsInterpreter::new(completion_client, config.llm.clone());
    let validator = SqlValidator::new(config.validator.clone());

    let exporter: Option<Arc<dyn DataExporterPort>> = config.exporter.enabled.then(|| {
        FileExporter::new(resolved_dir(&config.exports_dir, DEFAULT_EXPORTS_DIR), config.exporter.max_column_width) as Arc<dyn DataExporterPort>
    });
    let visualizer: Option<Arc<dyn VisualizerPort>> = config.visualizer.enabled.then(|| {
        Visualizer::new(resolved_dir(&config.viz_dir, DEFAULT_VIZ_DIR), config.visualizer.clone()) as Arc<dyn VisualizerPort>
    });

    let pipeline = Pipeline::new(config, schema_cache, sql_generator, validator, gateway, interpreter, exporter, visualizer);

    let outcome = pipeline.run(&args.question, &server, &database, CancelToken::new()).await;
    let has_errors = matches!(outcome, PipelineOutcome::Failure { .. });

    let rendered = match args.format {
        OutputFormat::Table => format_table(&args.question, &outcome, args.quiet),
        OutputFormat::Json => format_json(&args.question, &outcome, false),
    };
    write_output(&args.output, &rendered)?;

    Ok(has_errors)
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
            PipelineConfig::from_toml_str(&text).with_context(|| format!("failed to parse {}", path.display()))
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn resolved_dir(configured: &Path, fallback: &str) -> PathBuf {
    if configured.as_os_str().is_empty() {
        PathBuf::from(fallback)
    } else {
        configured.to_path_buf()
    }
}

fn dialect_label(db_type: DatabaseType) -> &'static str {
    match db_type {
        DatabaseType::Postgres => "PostgreSQL",
        DatabaseType::Mysql => "MySQL",
        DatabaseType::Sqlite => "SQLite",
    }
}

/// Derives a cache-key label for the server from the URL's authority when
/// `--server` isn't given. Intentionally simple string splitting rather
/// than a URL-parsing dependency: only used to default a diagnostic label.
fn host_label(url: &str) -> String {
    url.split("://")
        .nth(1)
        .and_then(|rest| rest.split(['/', '?']).next())
        .filter(|s| !s.is_empty())
        .unwrap_or("default")
        .to_string()
}

fn path_label(url: &str) -> String {
    url.split("://")
        .nth(1)
        .and_then(|rest| rest.split_once('/'))
        .map(|(_, path)| path.split('?').next().unwrap_or(path))
        .filter(|s| !s.is_empty())
        .unwrap_or("default")
        .to_string()
}

fn write_output(path: &Option<PathBuf>, content: &str) -> Result<()> {
    if let Some(path) = path {
        fs::write(path, content).with_context(|| format!("failed to write to {}", path.display()))?;
    } else {
        io::stdout().write_all(content.as_bytes()).context("failed to write to stdout")?;
        if !content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

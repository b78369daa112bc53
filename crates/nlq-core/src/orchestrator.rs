//! The eight-stage pipeline (§2) and its discriminated result (§7).

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::PipelineConfig;
use crate::error::{ErrorKind, PipelineError, Stage, Warning};
use crate::executor::QueryExecutor;
use crate::normalizer::Normalizer;
use crate::ports::{CancelToken, DatabaseGateway};
use crate::stage_ports::{
    DataExporterPort, ResultsInterpreterPort, SchemaRetrieverPort, SqlGeneratorPort,
    SqlValidatorPort, VisualizerPort,
};
use crate::types::{
    ExportArtifacts, GeneratedSql, Interpretation, QueryResults, SchemaSnapshot, UserQuestion,
    ValidatedSql, VisualizationArtifact,
};

/// Everything a run produced, successfully or not (§7).
#[derive(Debug)]
pub enum PipelineOutcome {
    Success {
        results: QueryResults,
        interpretation: Interpretation,
        export: Option<ExportArtifacts>,
        visualization: VisualizationArtifact,
        warnings: Vec<Warning>,
    },
    Failure {
        error: PipelineError,
        warnings_so_far: Vec<Warning>,
    },
}

/// Wires the eight components together. Construction takes trait objects
/// for every collaborator, keeping `nlq-core` free of any dependency on
/// the HTTP, SQL-driver, or file-export crates that provide them.
pub struct Pipeline {
    config: PipelineConfig,
    schema_retriever: Arc<dyn SchemaRetrieverPort>,
    sql_generator: Arc<dyn SqlGeneratorPort>,
    validator: Arc<dyn SqlValidatorPort>,
    database: Arc<dyn DatabaseGateway>,
    interpreter: Arc<dyn ResultsInterpreterPort>,
    exporter: Option<Arc<dyn DataExporterPort>>,
    visualizer: Option<Arc<dyn VisualizerPort>>,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: PipelineConfig,
        schema_retriever: Arc<dyn SchemaRetrieverPort>,
        sql_generator: Arc<dyn SqlGeneratorPort>,
        validator: Arc<dyn SqlValidatorPort>,
        database: Arc<dyn DatabaseGateway>,
        interpreter: Arc<dyn ResultsInterpreterPort>,
        exporter: Option<Arc<dyn DataExporterPort>>,
        visualizer: Option<Arc<dyn VisualizerPort>>,
    ) -> Self {
        Self {
            config,
            schema_retriever,
            sql_generator,
            validator,
            database,
            interpreter,
            exporter,
            visualizer,
        }
    }

    /// Runs the full pipeline for one question against one (server,
    /// database) pair. `cancel` is checked between stages and handed to
    /// the executor for in-flight query cancellation.
    #[instrument(skip(self, raw_question, cancel), fields(server, database))]
    pub async fn run(
        &self,
        raw_question: &str,
        server: &str,
        database: &str,
        cancel: CancelToken,
    ) -> PipelineOutcome {
        let mut warnings = Vec::new();

        if cancel.is_cancelled() {
            return Self::fail(Stage::Normalizer, ErrorKind::Cancelled, warnings);
        }

        let normalizer = Normalizer::new(self.config.llm.max_question_length);
        let question = match normalizer.normalize(raw_question) {
            Ok(question) => question,
            Err(error) => return Self::fail_with(error, warnings),
        };

        let schema = match self.schema_retriever.schema_for(server, database).await {
            Ok(schema) => schema,
            Err(error) => return Self::fail_with(error, warnings),
        };

        let first_attempt = match self.generate_and_validate(&question, &schema, None).await {
            Ok(attempt) => attempt,
            Err(error) => return Self::fail_with(error, warnings),
        };

        if cancel.is_cancelled() {
            return Self::fail(Stage::Executor, ErrorKind::Cancelled, warnings);
        }

        let executor = QueryExecutor::new(self.database.as_ref(), self.config.executor.clone());

        let (results, validated) = match self
            .run_with_one_regeneration(&executor, &question, &schema, first_attempt, &cancel)
            .await
        {
            Ok((results, validated, validator_warnings)) => {
                warnings.extend(validator_warnings);
                (results, validated)
            }
            Err(error) => return Self::fail_with(error, warnings),
        };

        let (interpretation, interp_warnings) =
            match self.interpreter.interpret(&question, &validated, &results).await {
                Ok(outcome) => outcome,
                Err(error) => return Self::fail_with(error, warnings),
            };
        warnings.extend(
            interp_warnings
                .into_iter()
                .map(|message| Warning::new(Stage::Interpreter, message)),
        );

        let export = self.try_export(&results, &question, &mut warnings);
        let visualization = self.try_visualize(&results, &question);

        PipelineOutcome::Success {
            results,
            interpretation,
            export,
            visualization,
            warnings,
        }
    }

    /// Stages 3-5 with the bounded one-shot regeneration loop: if
    /// execution fails, the SQL generator gets one chance to produce a
    /// different statement before the original failure is surfaced (§4.5,
    /// §9).
    async fn run_with_one_regeneration(
        &self,
        executor: &QueryExecutor<'_>,
        question: &UserQuestion,
        schema: &SchemaSnapshot,
        first_attempt: (ValidatedSql, Vec<String>),
        cancel: &CancelToken,
    ) -> Result<(QueryResults, ValidatedSql, Vec<Warning>), PipelineError> {
        let (validated, validator_warnings) = first_attempt;
        let mut warnings: Vec<Warning> = validator_warnings
            .into_iter()
            .map(|message| Warning::new(Stage::Validator, message))
            .collect();

        match executor.execute(&validated, cancel.clone()).await {
            Ok(results) => return Ok((results, validated, warnings)),
            Err(first_failure) => {
                info!(error = %first_failure, "execution failed, attempting one regeneration");
                let (retried, retry_warnings) = self
                    .generate_and_validate(question, schema, Some(&first_failure.to_string()))
                    .await
                    .map_err(|_| first_failure.clone())?;

                match executor.execute(&retried, cancel.clone()).await {
                    Ok(results) => {
                        warnings.extend(
                            retry_warnings
                                .into_iter()
                                .map(|message| Warning::new(Stage::Validator, message)),
                        );
                        Ok((results, retried, warnings))
                    }
                    Err(_) => Err(first_failure),
                }
            }
        }
    }

    async fn generate_and_validate(
        &self,
        question: &UserQuestion,
        schema: &SchemaSnapshot,
        previous_failure: Option<&str>,
    ) -> Result<(ValidatedSql, Vec<String>), PipelineError> {
        let generated: GeneratedSql = self
            .sql_generator
            .generate(question, schema, previous_failure)
            .await?;
        let validated = self.validator.validate(&generated, schema)?;
        let warnings = validated.warnings.clone();
        Ok((validated, warnings))
    }

    fn try_export(
        &self,
        results: &QueryResults,
        question: &UserQuestion,
        warnings: &mut Vec<Warning>,
    ) -> Option<ExportArtifacts> {
        if !self.config.exporter.enabled {
            return None;
        }
        let exporter = self.exporter.as_ref()?;
        match exporter.export(results, question) {
            Ok(artifacts) => Some(artifacts),
            Err(message) => {
                warn!(%message, "export failed, continuing without artifacts");
                warnings.push(Warning::new(Stage::Exporter, message));
                None
            }
        }
    }

    fn try_visualize(&self, results: &QueryResults, question: &UserQuestion) -> VisualizationArtifact {
        if !self.config.visualizer.enabled {
            return VisualizationArtifact::none("visualization disabled by configuration");
        }
        match self.visualizer.as_ref() {
            Some(visualizer) => visualizer.visualize(results, question),
            None => VisualizationArtifact::none("visualizer not configured"),
        }
    }

    fn fail(stage: Stage, kind: ErrorKind, warnings_so_far: Vec<Warning>) -> PipelineOutcome {
        PipelineOutcome::Failure {
            error: PipelineError::new(stage, kind),
            warnings_so_far,
        }
    }

    fn fail_with(error: PipelineError, warnings_so_far: Vec<Warning>) -> PipelineOutcome {
        PipelineOutcome::Failure {
            error,
            warnings_so_far,
        }
    }
}

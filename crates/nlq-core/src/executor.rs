//! Stage 5: open a read-only connection, run the statement, materialize
//! rows (§4.5).

use std::time::{Duration, Instant};

use tracing::warn;

use crate::config::ExecutorConfig;
use crate::error::{ErrorKind, PipelineError, Stage};
use crate::ports::{CancelToken, DatabaseError, DatabaseGateway};
use crate::types::{QueryResults, ValidatedSql};

/// One backoff before a single retry of a transient driver error.
const TRANSIENT_RETRY_BACKOFF: Duration = Duration::from_millis(200);

pub struct QueryExecutor<'a> {
    gateway: &'a dyn DatabaseGateway,
    config: ExecutorConfig,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(gateway: &'a dyn DatabaseGateway, config: ExecutorConfig) -> Self {
        Self { gateway, config }
    }

    /// Runs `validated` against the gateway, materializing up to the row
    /// cap the validator applied to this statement (`validated.row_cap`,
    /// not the validator's default — a statement that legitimately kept a
    /// larger caller-supplied `LIMIT` is not re-truncated here). Over-
    /// fetches by one row so `truncated` can be reported accurately, and
    /// retries once on a transient driver error if configured to do so.
    pub async fn execute(&self, validated: &ValidatedSql, cancel: CancelToken) -> Result<QueryResults, PipelineError> {
        let row_cap = validated.row_cap;
        let started = Instant::now();
        let attempt = self.run_once(validated, cancel.clone()).await;

        let stream = match attempt {
            Ok(stream) => stream,
            Err(DatabaseError::Transient(reason)) if self.config.retry_transient => {
                warn!(reason = %reason, "transient driver error, retrying once");
                tokio::time::sleep(TRANSIENT_RETRY_BACKOFF).await;
                self.run_once(validated, cancel).await.map_err(|err| self.map_error(err))?
            }
            Err(err) => return Err(self.map_error(err)),
        };

        if stream.columns.len() > self.config.max_columns {
            return Err(PipelineError::new(
                Stage::Executor,
                ErrorKind::ResultShapeRejected {
                    actual: stream.columns.len(),
                    limit: self.config.max_columns,
                },
            ));
        }

        let truncated = stream.rows.len() > row_cap || stream.more_rows_available;
        let mut rows = stream.rows;
        rows.truncate(row_cap);

        Ok(QueryResults {
            column_names: stream.columns.iter().map(|c| c.name.clone()).collect(),
            column_types: stream.columns.iter().map(|c| c.data_type).collect(),
            row_count: rows.len(),
            rows,
            truncated,
            elapsed: started.elapsed(),
        })
    }

    async fn run_once(&self, validated: &ValidatedSql, cancel: CancelToken) -> Result<crate::ports::QueryStream, DatabaseError> {
        self.gateway
            .run_read_only(
                &validated.statement_text,
                self.config.statement_timeout,
                validated.row_cap + 1,
                cancel,
            )
            .await
    }

    fn map_error(&self, err: DatabaseError) -> PipelineError {
        let kind = match err {
            DatabaseError::Timeout => ErrorKind::QueryTimeout,
            DatabaseError::Transient(msg) | DatabaseError::ExecutionFailed(msg) => {
                ErrorKind::ExecutionFailed(msg)
            }
        };
        PipelineError::new(Stage::Executor, kind)
    }
}

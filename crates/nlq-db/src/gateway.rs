//! The SQLx-backed [`DatabaseGateway`] implementation: one connection pool
//! per target database, read-only execution with a statement timeout and
//! cooperative cancellation, and catalog introspection (§4.2, §4.5, §6).

use std::sync::Once;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Column, Row};

use nlq_core::ports::{
    CancelToken, CatalogResult, DatabaseError, DatabaseGateway, QueryStream, RawColumnMeta,
};
use nlq_core::types::{CellValue, ColumnType};

use crate::catalog::fetch_catalog;
use crate::db_type::DatabaseType;
use crate::redact::{redact_url, url_scheme};

const MAX_CONNECTIONS: u32 = 4;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

static INSTALL_DRIVERS: Once = Once::new();

/// A read-only gateway bound to a single database at construction time.
/// `server`/`database` arguments on [`DatabaseGateway`] methods are labels
/// used for cache-key and diagnostic purposes; they do not select among
/// multiple physical connections.
pub struct SqlxDatabaseGateway {
    pool: AnyPool,
    db_type: DatabaseType,
    schema_filter: Option<String>,
}

impl SqlxDatabaseGateway {
    pub async fn connect(url: &str, schema_filter: Option<String>) -> Result<Self, DatabaseError> {
        let db_type = DatabaseType::from_url(url).ok_or_else(|| {
            DatabaseError::ExecutionFailed(format!(
                "unsupported database URL scheme: {}",
                url_scheme(url)
            ))
        })?;

        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);

        let pool = AnyPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await
            .map_err(|err| {
                DatabaseError::ExecutionFailed(format!(
                    "failed to connect to {}: {err}",
                    redact_url(url)
                ))
            })?;

        Ok(Self {
            pool,
            db_type,
            schema_filter,
        })
    }
}

#[async_trait]
impl DatabaseGateway for SqlxDatabaseGateway {
    async fn describe_catalog(
        &self,
        _server: &str,
        _database: &str,
    ) -> Result<CatalogResult, DatabaseError> {
        let columns = fetch_catalog(&self.pool, self.db_type, self.schema_filter.as_deref()).await?;
        Ok(CatalogResult { columns })
    }

    async fn run_read_only(
        &self,
        sql: &str,
        statement_timeout: Duration,
        row_cap: usize,
        cancel: CancelToken,
    ) -> Result<QueryStream, DatabaseError> {
        let fetch = sqlx::query(sql).fetch_all(&self.pool);

        let rows = tokio::select! {
            result = tokio::time::timeout(statement_timeout, fetch) => {
                match result {
                    Ok(Ok(rows)) => rows,
                    Ok(Err(err)) => return Err(classify_sqlx_error(err)),
                    Err(_) => return Err(DatabaseError::Timeout),
                }
            }
            _ = poll_cancel(&cancel) => return Err(DatabaseError::ExecutionFailed(
                "cancelled while waiting on the database driver".to_string(),
            )),
        };

        let more_rows_available = rows.len() > row_cap;
        let taken: Vec<AnyRow> = rows.into_iter().take(row_cap).collect();

        let columns = describe_columns(&taken);
        let decoded_rows = taken.iter().map(|row| decode_row(row, &columns)).collect();

        Ok(QueryStream {
            columns,
            rows: decoded_rows,
            more_rows_available,
        })
    }

    async fn cancel(&self, token: CancelToken) {
        token.cancel();
    }
}

/// Polls the cancellation flag without busy-spinning; used as one arm of
/// the `select!` racing the driver call in [`run_read_only`].
async fn poll_cancel(token: &CancelToken) {
    loop {
        if token.is_cancelled() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Column types aren't known ahead of the fetch with the Any driver, so
/// they are inferred from the first row's decoded values; an empty result
/// set reports every column as `Text`.
fn describe_columns(rows: &[AnyRow]) -> Vec<RawColumnMeta> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };

    first
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| RawColumnMeta {
            name: column.name().to_string(),
            data_type: infer_column_type(first, index),
        })
        .collect()
}

fn infer_column_type(row: &AnyRow, index: usize) -> ColumnType {
    if row.try_get::<i64, usize>(index).is_ok() {
        ColumnType::Integer
    } else if row.try_get::<f64, usize>(index).is_ok() {
        ColumnType::Decimal
    } else if row.try_get::<bool, usize>(index).is_ok() {
        ColumnType::Boolean
    } else if row.try_get::<chrono::DateTime<chrono::Utc>, usize>(index).is_ok() {
        ColumnType::Datetime
    } else if row.try_get::<chrono::NaiveDate, usize>(index).is_ok() {
        ColumnType::Date
    } else if row.try_get::<Vec<u8>, usize>(index).is_ok() {
        ColumnType::Binary
    } else {
        ColumnType::Text
    }
}

fn decode_row(row: &AnyRow, columns: &[RawColumnMeta]) -> Vec<CellValue> {
    (0..columns.len()).map(|index| decode_cell(row, index)).collect()
}

/// Tries each SQLx decode in turn since the Any driver erases the
/// database's native type; the first successful decode wins.
fn decode_cell(row: &AnyRow, index: usize) -> CellValue {
    if let Ok(value) = row.try_get::<Option<i64>, usize>(index) {
        return value.map(CellValue::Integer).unwrap_or(CellValue::Null);
    }
    if let Ok(value) = row.try_get::<Option<f64>, usize>(index) {
        return value.map(CellValue::Decimal).unwrap_or(CellValue::Null);
    }
    if let Ok(value) = row.try_get::<Option<bool>, usize>(index) {
        return value.map(CellValue::Boolean).unwrap_or(CellValue::Null);
    }
    if let Ok(value) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, usize>(index) {
        return value.map(CellValue::Datetime).unwrap_or(CellValue::Null);
    }
    if let Ok(value) = row.try_get::<Option<chrono::NaiveDate>, usize>(index) {
        return value.map(CellValue::Date).unwrap_or(CellValue::Null);
    }
    if let Ok(value) = row.try_get::<Option<String>, usize>(index) {
        return value.map(CellValue::Text).unwrap_or(CellValue::Null);
    }
    if let Ok(value) = row.try_get::<Option<Vec<u8>>, usize>(index) {
        return value.map(CellValue::Binary).unwrap_or(CellValue::Null);
    }
    CellValue::Null
}

fn classify_sqlx_error(err: sqlx::Error) -> DatabaseError {
    match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => DatabaseError::Transient(err.to_string()),
        _ => DatabaseError::ExecutionFailed(err.to_string()),
    }
}

//! Catalog introspection: tables, views, columns, and foreign keys, per
//! dialect (§4.2 raw catalog fetch, behind `SchemaRetrieverPort`'s
//! `nlq-schema` caller).

use std::collections::HashMap;

use sqlx::{any::AnyRow, AnyPool, Row};

use nlq_core::ports::{DatabaseError, RawCatalogColumn};
use nlq_core::types::{ColumnDescriptor, ColumnType, TableKind};

use crate::db_type::DatabaseType;

/// Safe upper bound for identifier length when coercing MySQL's
/// `information_schema` `longtext` columns to a type the SQLx Any driver
/// can decode.
const MYSQL_IDENTIFIER_SAFE_LENGTH: usize = 255;

pub async fn fetch_catalog(
    pool: &AnyPool,
    db_type: DatabaseType,
    schema_filter: Option<&str>,
) -> Result<Vec<RawCatalogColumn>, DatabaseError> {
    match db_type {
        DatabaseType::Postgres => fetch_postgres(pool, schema_filter).await,
        DatabaseType::Mysql => fetch_mysql(pool, schema_filter).await,
        DatabaseType::Sqlite => fetch_sqlite(pool).await,
    }
}

fn map_data_type(data_type: &str) -> ColumnType {
    let lowered = data_type.to_ascii_lowercase();
    if lowered.contains("int") || lowered.contains("serial") {
        ColumnType::Integer
    } else if lowered.contains("numeric")
        || lowered.contains("decimal")
        || lowered.contains("double")
        || lowered.contains("float")
        || lowered.contains("real")
    {
        ColumnType::Decimal
    } else if lowered.contains("timestamp") || lowered.contains("datetime") {
        ColumnType::Datetime
    } else if lowered.contains("date") {
        ColumnType::Date
    } else if lowered.contains("bool") {
        ColumnType::Boolean
    } else if lowered.contains("blob") || lowered.contains("bytea") || lowered.contains("binary") {
        ColumnType::Binary
    } else if lowered.contains("char") || lowered.contains("text") || lowered.contains("json") {
        ColumnType::Text
    } else {
        ColumnType::Other
    }
}

async fn fetch_postgres(
    pool: &AnyPool,
    schema_filter: Option<&str>,
) -> Result<Vec<RawCatalogColumn>, DatabaseError> {
    let schema = schema_filter.unwrap_or("public");

    let query = r#"
        SELECT
            c.table_schema::text AS table_schema,
            c.table_name::text AS table_name,
            t.table_type::text AS table_type,
            c.column_name::text AS column_name,
            c.data_type::text AS data_type,
            c.is_nullable::text AS is_nullable,
            CASE WHEN pk.column_name IS NOT NULL THEN true ELSE false END AS is_primary_key,
            fk.foreign_table::text AS foreign_table,
            fk.foreign_column::text AS foreign_column
        FROM information_schema.columns c
        JOIN information_schema.tables t
            ON t.table_schema = c.table_schema AND t.table_name = c.table_name
        LEFT JOIN (
            SELECT kcu.table_schema, kcu.table_name, kcu.column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            WHERE tc.constraint_type = 'PRIMARY KEY'
        ) pk ON c.table_schema = pk.table_schema
            AND c.table_name = pk.table_name
            AND c.column_name = pk.column_name
        LEFT JOIN (
            SELECT
                kcu.table_schema, kcu.table_name, kcu.column_name,
                ccu.table_name AS foreign_table, ccu.column_name AS foreign_column
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            JOIN information_schema.constraint_column_usage ccu
                ON tc.constraint_name = ccu.constraint_name
            WHERE tc.constraint_type = 'FOREIGN KEY'
        ) fk ON c.table_schema = fk.table_schema
            AND c.table_name = fk.table_name
            AND c.column_name = fk.column_name
        WHERE c.table_schema = $1
        ORDER BY c.table_schema, c.table_name, c.ordinal_position
    "#;

    let rows = sqlx::query(query)
        .bind(schema)
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_error)?;

    Ok(rows.into_iter().map(row_to_column).collect())
}

async fn fetch_mysql(
    pool: &AnyPool,
    schema_filter: Option<&str>,
) -> Result<Vec<RawCatalogColumn>, DatabaseError> {
    let limit = MYSQL_IDENTIFIER_SAFE_LENGTH;
    let schema_predicate = if schema_filter.is_some() {
        "c.TABLE_SCHEMA = ?"
    } else {
        "c.TABLE_SCHEMA = DATABASE()"
    };

    let query = format!(
        r#"
        SELECT
            LEFT(c.TABLE_SCHEMA, {limit}) AS table_schema,
            LEFT(c.TABLE_NAME, {limit}) AS table_name,
            LEFT(t.TABLE_TYPE, {limit}) AS table_type,
            LEFT(c.COLUMN_NAME, {limit}) AS column_name,
            LEFT(c.DATA_TYPE, {limit}) AS data_type,
            LEFT(c.IS_NULLABLE, {limit}) AS is_nullable,
            CASE WHEN c.COLUMN_KEY = 'PRI' THEN 1 ELSE 0 END AS is_primary_key,
            LEFT(kcu.REFERENCED_TABLE_NAME, {limit}) AS foreign_table,
            LEFT(kcu.REFERENCED_COLUMN_NAME, {limit}) AS foreign_column
        FROM information_schema.COLUMNS c
        JOIN information_schema.TABLES t
            ON t.TABLE_SCHEMA = c.TABLE_SCHEMA AND t.TABLE_NAME = c.TABLE_NAME
        LEFT JOIN information_schema.KEY_COLUMN_USAGE kcu
            ON kcu.TABLE_SCHEMA = c.TABLE_SCHEMA
            AND kcu.TABLE_NAME = c.TABLE_NAME
            AND kcu.COLUMN_NAME = c.COLUMN_NAME
            AND kcu.REFERENCED_TABLE_NAME IS NOT NULL
        WHERE {schema_predicate}
        ORDER BY c.TABLE_SCHEMA, c.TABLE_NAME, c.ORDINAL_POSITION
        "#
    );

    let rows = if let Some(schema) = schema_filter {
        sqlx::query(&query)
            .bind(schema)
            .fetch_all(pool)
            .await
            .map_err(map_sqlx_error)?
    } else {
        sqlx::query(&query).fetch_all(pool).await.map_err(map_sqlx_error)?
    };

    Ok(rows.into_iter().map(row_to_column).collect())
}

fn row_to_column(row: AnyRow) -> RawCatalogColumn {
    let table_schema: String = row.try_get("table_schema").unwrap_or_default();
    let table_name: String = row.try_get("table_name").unwrap_or_default();
    let table_type: String = row.try_get("table_type").unwrap_or_default();
    let column_name: String = row.try_get("column_name").unwrap_or_default();
    let data_type: String = row.try_get("data_type").unwrap_or_default();
    let is_nullable = row
        .try_get::<String, _>("is_nullable")
        .map(|v| v.eq_ignore_ascii_case("yes"))
        .unwrap_or(true);
    let is_primary_key = get_bool_like(&row, "is_primary_key");
    let foreign_table: Option<String> = row.try_get("foreign_table").ok();
    let foreign_column: Option<String> = row.try_get("foreign_column").ok();

    RawCatalogColumn {
        schema_name: table_schema,
        table_name,
        table_kind: if table_type.to_ascii_uppercase().contains("VIEW") {
            TableKind::View
        } else {
            TableKind::Table
        },
        column: ColumnDescriptor {
            name: column_name,
            data_type: map_data_type(&data_type),
            nullable: is_nullable,
            is_primary_key,
        },
        foreign_key_table: foreign_table.filter(|s| !s.is_empty()),
        foreign_key_column: foreign_column.filter(|s| !s.is_empty()),
    }
}

fn get_bool_like(row: &AnyRow, column: &str) -> bool {
    if let Ok(value) = row.try_get::<bool, _>(column) {
        return value;
    }
    if let Ok(value) = row.try_get::<i32, _>(column) {
        return value != 0;
    }
    if let Ok(value) = row.try_get::<i64, _>(column) {
        return value != 0;
    }
    false
}

/// SQLite has no `information_schema`, so tables, views, column metadata,
/// and foreign keys each come from a separate pragma/system-table query.
/// Table and column names are validated before being spliced into the
/// pragma statements, which cannot be parameterized.
async fn fetch_sqlite(pool: &AnyPool) -> Result<Vec<RawCatalogColumn>, DatabaseError> {
    let objects_query = r#"
        SELECT name, type FROM sqlite_master
        WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%'
        ORDER BY name
    "#;
    let object_rows = sqlx::query(objects_query)
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_error)?;

    let mut columns = Vec::new();

    for object_row in object_rows {
        let name: String = object_row.try_get("name").unwrap_or_default();
        let kind: String = object_row.try_get("type").unwrap_or_default();

        if validate_sqlite_identifier(&name).is_err() {
            tracing::warn!(table = %name, "skipping SQLite object with unsupported identifier");
            continue;
        }

        let table_kind = if kind == "view" {
            TableKind::View
        } else {
            TableKind::Table
        };

        let fk_map = fetch_sqlite_foreign_keys(pool, &name).await?;

        let pragma = format!("PRAGMA table_info('{}')", name.replace('\'', "''"));
        let column_rows = sqlx::query(&pragma).fetch_all(pool).await.map_err(map_sqlx_error)?;

        for column_row in column_rows {
            let column_name: String = column_row.try_get("name").unwrap_or_default();
            let data_type: String = column_row.try_get("type").unwrap_or_default();
            let not_null: i32 = column_row.try_get("notnull").unwrap_or(0);
            let pk: i32 = column_row.try_get("pk").unwrap_or(0);
            let fk = fk_map.get(&column_name).cloned();

            columns.push(RawCatalogColumn {
                schema_name: "main".to_string(),
                table_name: name.clone(),
                table_kind,
                column: ColumnDescriptor {
                    name: column_name,
                    data_type: map_data_type(&data_type),
                    nullable: not_null == 0,
                    is_primary_key: pk > 0,
                },
                foreign_key_table: fk.as_ref().map(|(table, _)| table.clone()),
                foreign_key_column: fk.map(|(_, column)| column),
            });
        }
    }

    Ok(columns)
}

async fn fetch_sqlite_foreign_keys(
    pool: &AnyPool,
    table: &str,
) -> Result<HashMap<String, (String, String)>, DatabaseError> {
    let pragma = format!("PRAGMA foreign_key_list('{}')", table.replace('\'', "''"));
    let rows = sqlx::query(&pragma).fetch_all(pool).await.map_err(map_sqlx_error)?;

    let mut map = HashMap::new();
    for row in rows {
        let from: String = row.try_get("from").unwrap_or_default();
        let referenced_table: String = row.try_get("table").unwrap_or_default();
        let referenced_column: String = row.try_get("to").unwrap_or_default();
        map.insert(from, (referenced_table, referenced_column));
    }
    Ok(map)
}

/// Only alphanumerics, underscore, and dot (attached-database qualifiers)
/// are allowed, since table and column names are spliced directly into
/// `PRAGMA` statements that SQLx cannot parameterize.
fn validate_sqlite_identifier(name: &str) -> Result<(), DatabaseError> {
    if name.is_empty() || name.len() > MYSQL_IDENTIFIER_SAFE_LENGTH {
        return Err(DatabaseError::ExecutionFailed(format!(
            "invalid identifier length: {}",
            name.len()
        )));
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
        return Err(DatabaseError::ExecutionFailed(format!(
            "identifier contains unsupported characters: {name}"
        )));
    }
    Ok(())
}

fn map_sqlx_error(err: sqlx::Error) -> DatabaseError {
    DatabaseError::ExecutionFailed(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_common_type_names() {
        assert_eq!(map_data_type("integer"), ColumnType::Integer);
        assert_eq!(map_data_type("bigint"), ColumnType::Integer);
        assert_eq!(map_data_type("numeric"), ColumnType::Decimal);
        assert_eq!(map_data_type("timestamp without time zone"), ColumnType::Datetime);
        assert_eq!(map_data_type("date"), ColumnType::Date);
        assert_eq!(map_data_type("boolean"), ColumnType::Boolean);
        assert_eq!(map_data_type("bytea"), ColumnType::Binary);
        assert_eq!(map_data_type("character varying"), ColumnType::Text);
        assert_eq!(map_data_type("money"), ColumnType::Other);
    }

    #[test]
    fn rejects_unsafe_sqlite_identifiers() {
        assert!(validate_sqlite_identifier("users").is_ok());
        assert!(validate_sqlite_identifier("main.users").is_ok());
        assert!(validate_sqlite_identifier("users'--").is_err());
        assert!(validate_sqlite_identifier("users;DROP TABLE").is_err());
        assert!(validate_sqlite_identifier("").is_err());
    }
}

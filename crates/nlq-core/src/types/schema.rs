use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Logical category for a column's underlying database type. The validator
/// and visualizer reason about these categories, never about dialect-
/// specific type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnType {
    Integer,
    Decimal,
    Text,
    Date,
    Datetime,
    Boolean,
    Binary,
    Other,
}

impl ColumnType {
    /// True for types the visualizer treats as chartable numeric axes.
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Decimal)
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::Datetime)
    }
}

/// Whether a table-qualified name denotes a base table or a view. The
/// pipeline is read-only regardless, so this only affects display and
/// plausibility-check grouping, never write eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Table,
    View,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: ColumnType,
    pub nullable: bool,
    pub is_primary_key: bool,
}

/// A local-columns -> other-table.other-columns foreign key reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyRef {
    pub local_columns: Vec<String>,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    pub schema_name: String,
    pub table_name: String,
    pub kind: TableKind,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: BTreeSet<String>,
    pub foreign_keys: Vec<ForeignKeyRef>,
}

impl TableDescriptor {
    /// The `schema.table` identifier used as a map key and in validator
    /// grounded-reference checks.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema_name, self.table_name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// An immutable point-in-time description of a warehouse's tables, columns,
/// and keys, keyed by `(server_id, database_id)`. Two snapshots with equal
/// `fingerprint` are interchangeable for cache-freshness purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    server_id: String,
    database_id: String,
    captured_at: DateTime<Utc>,
    tables: BTreeMap<String, TableDescriptor>,
    fingerprint: String,
}

impl SchemaSnapshot {
    /// Builds a snapshot from a freshly fetched table list, computing the
    /// structural fingerprint over the table set + column set + types.
    pub fn new(
        server_id: impl Into<String>,
        database_id: impl Into<String>,
        captured_at: DateTime<Utc>,
        tables: Vec<TableDescriptor>,
    ) -> Self {
        let mut map = BTreeMap::new();
        for table in tables {
            map.insert(table.qualified_name(), table);
        }
        let fingerprint = compute_fingerprint(&map);
        Self {
            server_id: server_id.into(),
            database_id: database_id.into(),
            captured_at,
            tables: map,
            fingerprint,
        }
    }

    /// Reconstructs a snapshot from its serialized parts, re-deriving the
    /// fingerprint so a tampered or corrupted cache file is caught by a
    /// `fingerprint` mismatch rather than trusted blindly.
    pub fn from_cached_parts(
        server_id: String,
        database_id: String,
        captured_at: DateTime<Utc>,
        tables: BTreeMap<String, TableDescriptor>,
    ) -> Self {
        let fingerprint = compute_fingerprint(&tables);
        Self {
            server_id,
            database_id,
            captured_at,
            tables,
            fingerprint,
        }
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn tables(&self) -> &BTreeMap<String, TableDescriptor> {
        &self.tables
    }

    pub fn table(&self, qualified_name: &str) -> Option<&TableDescriptor> {
        self.tables.get(qualified_name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

fn compute_fingerprint(tables: &BTreeMap<String, TableDescriptor>) -> String {
    let mut hasher = Sha256::new();
    for (name, table) in tables {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        for column in &table.columns {
            hasher.update(column.name.as_bytes());
            hasher.update([0u8]);
            hasher.update([column.data_type as u8]);
            hasher.update([column.nullable as u8, column.is_primary_key as u8]);
        }
        hasher.update([0xffu8]);
    }
    hex::encode(hasher.finalize())
}

/// Which tier served a cache lookup; used only for metrics/logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Memory,
    File,
}

/// An entry in the schema cache, wrapping a snapshot with the bookkeeping
/// needed to decide freshness (`stored_at` + the cache's configured TTL).
#[derive(Debug, Clone)]
pub struct SchemaCacheEntry {
    pub snapshot: SchemaSnapshot,
    pub stored_at: DateTime<Utc>,
    pub source: CacheSource,
}

impl SchemaCacheEntry {
    pub fn new(snapshot: SchemaSnapshot, stored_at: DateTime<Utc>, source: CacheSource) -> Self {
        Self {
            snapshot,
            stored_at,
            source,
        }
    }

    /// An entry is fresh iff `now - stored_at < ttl`; a non-fresh entry is
    /// treated as absent by the cache and may be overwritten.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now.signed_duration_since(self.stored_at) < ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table(name: &str) -> TableDescriptor {
        TableDescriptor {
            schema_name: "dim".to_string(),
            table_name: name.to_string(),
            kind: TableKind::Table,
            columns: vec![ColumnDescriptor {
                name: "id".to_string(),
                data_type: ColumnType::Integer,
                nullable: false,
                is_primary_key: true,
            }],
            primary_key: BTreeSet::from(["id".to_string()]),
            foreign_keys: vec![],
        }
    }

    #[test]
    fn fingerprint_is_stable_for_equal_table_sets() {
        let now = Utc::now();
        let a = SchemaSnapshot::new("srv", "db", now, vec![sample_table("customer")]);
        let b = SchemaSnapshot::new("srv", "db", now, vec![sample_table("customer")]);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_changes_when_a_column_type_changes() {
        let now = Utc::now();
        let mut changed = sample_table("customer");
        changed.columns[0].data_type = ColumnType::Text;

        let a = SchemaSnapshot::new("srv", "db", now, vec![sample_table("customer")]);
        let b = SchemaSnapshot::new("srv", "db", now, vec![changed]);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn round_trip_through_cached_parts_preserves_fingerprint() {
        let now = Utc::now();
        let original = SchemaSnapshot::new("srv", "db", now, vec![sample_table("customer")]);
        let restored = SchemaSnapshot::from_cached_parts(
            original.server_id().to_string(),
            original.database_id().to_string(),
            original.captured_at(),
            original.tables().clone(),
        );
        assert_eq!(original.fingerprint(), restored.fingerprint());
    }

    #[test]
    fn entry_freshness_respects_ttl() {
        let stored_at = Utc::now() - chrono::Duration::minutes(90);
        let entry = SchemaCacheEntry::new(
            SchemaSnapshot::new("srv", "db", Utc::now(), vec![]),
            stored_at,
            CacheSource::Memory,
        );
        assert!(!entry.is_fresh(Utc::now(), chrono::Duration::hours(1)));
        assert!(entry.is_fresh(Utc::now(), chrono::Duration::hours(2)));
    }
}

//! Groups the flat `RawCatalogColumn` rows a `DatabaseGateway` returns into
//! the nested `TableDescriptor` shape `SchemaSnapshot` expects.
//!
//! `RawCatalogColumn` carries at most one referenced table/column per row
//! and never a referenced schema, so every foreign key is modeled as a
//! single-column reference into a table in the same schema as the
//! referencing table. Composite (multi-column) foreign keys are therefore
//! represented as several single-column `ForeignKeyRef`s rather than one
//! constraint — `nlq-db`'s catalog query has no constraint name to group by.

use std::collections::BTreeMap;

use nlq_core::ports::RawCatalogColumn;
use nlq_core::types::{ForeignKeyRef, TableDescriptor, TableKind};

pub fn assemble_tables(columns: Vec<RawCatalogColumn>) -> Vec<TableDescriptor> {
    let mut builders: BTreeMap<(String, String), TableBuilder> = BTreeMap::new();

    for row in columns {
        let key = (row.schema_name.clone(), row.table_name.clone());
        builders
            .entry(key)
            .or_insert_with(|| TableBuilder::new(row.schema_name.clone(), row.table_name.clone(), row.table_kind))
            .push(row);
    }

    builders.into_values().map(TableBuilder::finish).collect()
}

struct TableBuilder {
    schema_name: String,
    table_name: String,
    kind: TableKind,
    columns: Vec<nlq_core::types::ColumnDescriptor>,
    primary_key: std::collections::BTreeSet<String>,
    foreign_keys: Vec<ForeignKeyRef>,
}

impl TableBuilder {
    fn new(schema_name: String, table_name: String, kind: TableKind) -> Self {
        Self {
            schema_name,
            table_name,
            kind,
            columns: Vec::new(),
            primary_key: std::collections::BTreeSet::new(),
            foreign_keys: Vec::new(),
        }
    }

    fn push(&mut self, row: RawCatalogColumn) {
        if row.column.is_primary_key {
            self.primary_key.insert(row.column.name.clone());
        }
        if let (Some(referenced_table), Some(referenced_column)) = (row.foreign_key_table, row.foreign_key_column) {
            self.foreign_keys.push(ForeignKeyRef {
                local_columns: vec![row.column.name.clone()],
                referenced_schema: self.schema_name.clone(),
                referenced_table,
                referenced_columns: vec![referenced_column],
            });
        }
        self.columns.push(row.column);
    }

    fn finish(self) -> TableDescriptor {
        TableDescriptor {
            schema_name: self.schema_name,
            table_name: self.table_name,
            kind: self.kind,
            columns: self.columns,
            primary_key: self.primary_key,
            foreign_keys: self.foreign_keys,
        }
    }
}

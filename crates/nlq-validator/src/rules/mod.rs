mod batch;
mod grounded_references;
mod read_only;

pub use batch::BatchSeparatorRule;
pub use grounded_references::GroundedReferencesRule;
pub use read_only::ReadOnlyRule;

use crate::rule::ValidationRule;

/// The fixed rule set run, in order, against every generated statement that
/// has already survived the structural pre-checks (statement count, size).
pub fn default_rules() -> Vec<Box<dyn ValidationRule>> {
    vec![
        Box::new(ReadOnlyRule),
        Box::new(BatchSeparatorRule),
        Box::new(GroundedReferencesRule),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use std::collections::BTreeSet;

    use nlq_core::types::{
        ColumnDescriptor, ColumnType, GeneratedSql, SchemaSnapshot, TableDescriptor, TableKind,
    };

    pub fn generated_sql(statement_text: &str) -> GeneratedSql {
        GeneratedSql {
            statement_text: statement_text.to_string(),
            model_rationale: None,
            referenced_tables: BTreeSet::new(),
            referenced_columns: BTreeSet::new(),
        }
    }

    pub fn generated_sql_with_refs(
        statement_text: &str,
        tables: &[&str],
        columns: &[&str],
    ) -> GeneratedSql {
        GeneratedSql {
            statement_text: statement_text.to_string(),
            model_rationale: None,
            referenced_tables: tables.iter().map(|t| t.to_string()).collect(),
            referenced_columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn empty_schema() -> SchemaSnapshot {
        SchemaSnapshot::new("server-1", "db-1", Utc::now(), Vec::new())
    }

    pub fn schema_with_orders_table() -> SchemaSnapshot {
        let table = TableDescriptor {
            schema_name: "public".to_string(),
            table_name: "orders".to_string(),
            kind: TableKind::Table,
            columns: vec![
                ColumnDescriptor {
                    name: "id".to_string(),
                    data_type: ColumnType::Integer,
                    nullable: false,
                    is_primary_key: true,
                },
                ColumnDescriptor {
                    name: "total".to_string(),
                    data_type: ColumnType::Decimal,
                    nullable: false,
                    is_primary_key: false,
                },
            ],
            primary_key: BTreeSet::from(["id".to_string()]),
            foreign_keys: Vec::new(),
        };
        SchemaSnapshot::new("server-1", "db-1", Utc::now(), vec![table])
    }
}

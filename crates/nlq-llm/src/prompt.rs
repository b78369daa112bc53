//! Compact, deterministic renderings of pipeline types into prompt text.
//! Shared by the generator (schema rendering) and the interpreter (result
//! sample rendering) so both sides of the LLM boundary describe data the
//! same way.

use nlq_core::types::SchemaSnapshot;

/// A table-qualified column listing with types and PK/FK hints, per §4.3's
/// prompt contract ("a compact textual rendering of the snapshot").
pub fn render_schema(schema: &SchemaSnapshot) -> String {
    let mut out = String::new();
    for (qualified_name, table) in schema.tables() {
        out.push_str(qualified_name);
        out.push_str(" (");
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|column| {
                let mut rendered = format!("{}: {:?}", column.name, column.data_type);
                if table.primary_key.contains(&column.name) {
                    rendered.push_str(" PK");
                }
                if !column.nullable {
                    rendered.push_str(" NOT NULL");
                }
                rendered
            })
            .collect();
        out.push_str(&columns.join(", "));
        out.push(')');
        for fk in &table.foreign_keys {
            out.push_str(&format!(
                " FK {} -> {}.{}.{}",
                fk.local_columns.join(","),
                fk.referenced_schema,
                fk.referenced_table,
                fk.referenced_columns.join(",")
            ));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use nlq_core::types::{ColumnDescriptor, ColumnType, ForeignKeyRef, TableDescriptor, TableKind};

    use super::*;

    #[test]
    fn renders_columns_with_primary_key_and_foreign_key_hints() {
        let schema = SchemaSnapshot::new(
            "srv",
            "db",
            Utc::now(),
            vec![TableDescriptor {
                schema_name: "public".to_string(),
                table_name: "orders".to_string(),
                kind: TableKind::Table,
                columns: vec![
                    ColumnDescriptor { name: "id".to_string(), data_type: ColumnType::Integer, nullable: false, is_primary_key: true },
                    ColumnDescriptor { name: "customer_id".to_string(), data_type: ColumnType::Integer, nullable: false, is_primary_key: false },
                ],
                primary_key: std::collections::BTreeSet::from(["id".to_string()]),
                foreign_keys: vec![ForeignKeyRef {
                    local_columns: vec!["customer_id".to_string()],
                    referenced_schema: "public".to_string(),
                    referenced_table: "customers".to_string(),
                    referenced_columns: vec!["id".to_string()],
                }],
            }],
        );

        let rendered = render_schema(&schema);
        assert!(rendered.contains("public.orders ("));
        assert!(rendered.contains("id: Integer PK"));
        assert!(rendered.contains("FK customer_id -> public.customers.id"));
    }
}

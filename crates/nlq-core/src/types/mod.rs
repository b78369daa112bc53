//! Data contracts shared across every pipeline stage.
//!
//! Every value that crosses a stage boundary is an immutable record defined
//! here. Stages never share mutable state through any channel other than
//! these types (the schema cache is the one deliberate exception; see
//! `nlq_schema`).

mod artifacts;
mod question;
mod results;
mod schema;
mod sql;

pub use artifacts::{ExportArtifacts, VisualizationArtifact, ChartKind};
pub use question::UserQuestion;
pub use results::{CellValue, Interpretation, QueryResults};
pub use schema::{
    CacheSource, ColumnDescriptor, ColumnType, ForeignKeyRef, SchemaCacheEntry, SchemaSnapshot,
    TableDescriptor, TableKind,
};
pub use sql::{GeneratedSql, ValidatedSql};

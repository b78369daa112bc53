use std::time::Duration;

use super::schema::ColumnType;

/// A single cell value, typed loosely enough to hold anything the driver
/// can return while still letting the exporter and visualizer make
/// type-directed formatting decisions.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Decimal(f64),
    Text(String),
    Boolean(bool),
    Date(chrono::NaiveDate),
    Datetime(chrono::DateTime<chrono::Utc>),
    Binary(Vec<u8>),
}

impl CellValue {
    /// A best-effort fixed-point/ISO-8601 rendering used by the CSV writer
    /// and by the interpreter's numeric-literal grounding check.
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Integer(v) => v.to_string(),
            CellValue::Decimal(v) => format!("{v:.6}")
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string(),
            CellValue::Text(v) => v.clone(),
            CellValue::Boolean(v) => v.to_string(),
            CellValue::Date(v) => v.format("%Y-%m-%d").to_string(),
            CellValue::Datetime(v) => v.to_rfc3339(),
            CellValue::Binary(v) => format!("0x{}", hex::encode(v)),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(v) => Some(*v as f64),
            CellValue::Decimal(v) => Some(*v),
            _ => None,
        }
    }
}

/// A materialized, row-capped result set. `rows.len() <= row_cap` always
/// holds; `truncated` is set whenever the driver reported (or the executor
/// observed, via the `row_cap + 1` over-fetch) more rows than were kept.
#[derive(Debug, Clone)]
pub struct QueryResults {
    pub column_names: Vec<String>,
    pub column_types: Vec<ColumnType>,
    pub rows: Vec<Vec<CellValue>>,
    pub row_count: usize,
    pub truncated: bool,
    pub elapsed: Duration,
}

impl QueryResults {
    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|n| n == name)
    }

    /// Values of a single column across all materialized rows, for the
    /// visualizer's numeric-column scans and the interpreter's summary
    /// statistics.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &CellValue> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }
}

/// The LLM's natural-language narration of a result set, plus any
/// follow-up suggestions it proposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub narrative_text: String,
    pub follow_up_suggestions: Vec<String>,
}

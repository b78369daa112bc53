//! RFC 4180 CSV export of a query result set (§4.7).

use std::path::Path;

use csv::WriterBuilder;
use nlq_core::types::{QueryResults, UserQuestion};

use crate::ExportError;

/// Writes `results` to `path` as CSV, preceded by two `#`-prefixed comment
/// lines recording the question asked and when the export was produced.
/// Comment lines are not valid CSV but are the convention every downstream
/// spreadsheet tool in practice tolerates, and they keep the artifact
/// self-describing without a sidecar file.
pub fn write_csv(
    path: &Path,
    results: &QueryResults,
    question: &UserQuestion,
) -> Result<(), ExportError> {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(format!("# question: {}\n", question.raw_text()).as_bytes());
    buffer.extend_from_slice(
        format!("# generated_at: {}\n", question.received_at().to_rfc3339()).as_bytes(),
    );

    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_writer(buffer);

    writer
        .write_record(&results.column_names)
        .map_err(|err| ExportError::Csv(err.to_string()))?;

    for row in &results.rows {
        let record: Vec<String> = row.iter().map(|cell| cell.to_display_string()).collect();
        writer
            .write_record(record)
            .map_err(|err| ExportError::Csv(err.to_string()))?;
    }

    let buffer = writer
        .into_inner()
        .map_err(|err| ExportError::Csv(err.to_string()))?;
    std::fs::write(path, buffer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use nlq_core::types::{CellValue, ColumnType};

    use super::*;

    fn sample_results() -> QueryResults {
        QueryResults {
            column_names: vec!["region".to_string(), "revenue".to_string()],
            column_types: vec![ColumnType::Text, ColumnType::Decimal],
            rows: vec![
                vec![
                    CellValue::Text("east".to_string()),
                    CellValue::Decimal(1234.5),
                ],
                vec![CellValue::Text("west".to_string()), CellValue::Null],
            ],
            row_count: 2,
            truncated: false,
            elapsed: Duration::from_millis(5),
        }
    }

    #[test]
    fn writes_comment_header_then_csv_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let question = UserQuestion::from_parts(
            "revenue by region".to_string(),
            "revenue by region".to_string(),
            Utc::now(),
            None,
        );

        write_csv(&path, &sample_results(), &question).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();

        assert!(content.starts_with("# question: revenue by region\n"));
        assert!(content.contains("region,revenue\n"));
        assert!(content.contains("east,1234.5\n"));
        assert!(content.contains("west,\n"));
    }
}

//! CSV and spreadsheet export of natural-language-query result sets (§4.7).

mod csv;
mod error;
mod naming;
mod xlsx;

pub use error::ExportError;
pub use naming::{ExportFormat, ExportNaming};

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use nlq_core::stage_ports::DataExporterPort;
use nlq_core::types::{ExportArtifacts, QueryResults, UserQuestion};

/// Writes both a CSV and an XLSX artifact for every result set under a
/// single exports directory, implementing [`DataExporterPort`] for the
/// orchestrator.
pub struct FileExporter {
    exports_dir: PathBuf,
    max_column_width: usize,
}

impl FileExporter {
    pub fn new(exports_dir: impl Into<PathBuf>, max_column_width: usize) -> Arc<Self> {
        Arc::new(Self {
            exports_dir: exports_dir.into(),
            max_column_width,
        })
    }
}

impl DataExporterPort for FileExporter {
    fn export(&self, results: &QueryResults, question: &UserQuestion) -> Result<ExportArtifacts, String> {
        std::fs::create_dir_all(&self.exports_dir).map_err(|err| err.to_string())?;

        let created_at = Utc::now();
        let naming = ExportNaming::new(question.raw_text(), created_at);

        let csv_path = self.exports_dir.join(naming.filename(ExportFormat::Csv));
        csv::write_csv(&csv_path, results, question).map_err(|err| err.to_string())?;

        let spreadsheet_path = self.exports_dir.join(naming.filename(ExportFormat::Xlsx));
        xlsx::write_xlsx(&spreadsheet_path, results, question, self.max_column_width)
            .map_err(|err| err.to_string())?;

        Ok(ExportArtifacts {
            csv_path,
            spreadsheet_path,
            row_count: results.row_count,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nlq_core::types::{CellValue, ColumnType};

    use super::*;

    fn sample_results() -> QueryResults {
        QueryResults {
            column_names: vec!["n".to_string()],
            column_types: vec![ColumnType::Integer],
            rows: vec![vec![CellValue::Integer(1)]],
            row_count: 1,
            truncated: false,
            elapsed: Duration::from_millis(1),
        }
    }

    #[test]
    fn exports_both_csv_and_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FileExporter::new(dir.path(), 30);
        let question = UserQuestion::from_parts(
            "count rows".to_string(),
            "count rows".to_string(),
            Utc::now(),
            None,
        );

        let artifacts = exporter.export(&sample_results(), &question).unwrap();
        assert!(artifacts.csv_path.exists());
        assert!(artifacts.spreadsheet_path.exists());
        assert_eq!(artifacts.row_count, 1);
    }
}

//! Error type for the export crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV export error: {0}")]
    Csv(String),

    #[error("XLSX export error: {0}")]
    Xlsx(String),
}

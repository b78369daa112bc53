use std::path::PathBuf;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifacts {
    pub csv_path: PathBuf,
    pub spreadsheet_path: PathBuf,
    pub row_count: usize,
    pub created_at: DateTime<Utc>,
}

/// The chart family chosen by the visualizer's selection rules (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Heatmap,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualizationArtifact {
    pub png_path: Option<PathBuf>,
    pub chart_kind: ChartKind,
    pub reason_if_none: Option<String>,
}

impl VisualizationArtifact {
    pub fn none(reason: impl Into<String>) -> Self {
        Self {
            png_path: None,
            chart_kind: ChartKind::None,
            reason_if_none: Some(reason.into()),
        }
    }

    pub fn rendered(path: PathBuf, kind: ChartKind) -> Self {
        Self {
            png_path: Some(path),
            chart_kind: kind,
            reason_if_none: None,
        }
    }
}

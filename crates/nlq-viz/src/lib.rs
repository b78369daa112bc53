//! The visualizer stage (§4.8): decides whether a result set is worth
//! charting, picks a chart family, and renders it to a PNG file. Rendering
//! failures never fail the pipeline — they come back as a `None` artifact
//! with a reason, the same way an unsuitable result set does.

mod naming;
mod render;
mod selection;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use nlq_core::config::VisualizerConfig;
use nlq_core::stage_ports::VisualizerPort;
use nlq_core::types::{QueryResults, UserQuestion, VisualizationArtifact};

pub struct Visualizer {
    viz_dir: PathBuf,
    config: VisualizerConfig,
}

impl Visualizer {
    pub fn new(viz_dir: impl Into<PathBuf>, config: VisualizerConfig) -> Arc<Self> {
        Arc::new(Self {
            viz_dir: viz_dir.into(),
            config,
        })
    }
}

impl VisualizerPort for Visualizer {
    fn visualize(&self, results: &QueryResults, question: &UserQuestion) -> VisualizationArtifact {
        if !self.config.enabled {
            return VisualizationArtifact::none("visualization disabled");
        }

        let selection = selection::select_chart(results, question);
        if selection.kind == nlq_core::types::ChartKind::None {
            return VisualizationArtifact::none(selection.reason_if_none.unwrap_or_else(|| "not chartable".to_string()));
        }

        if let Err(err) = std::fs::create_dir_all(&self.viz_dir) {
            tracing::warn!(error = %err, "failed to create visualization directory");
            return VisualizationArtifact::none(format!("could not create visualization directory: {err}"));
        }

        let path = self.viz_dir.join(naming::chart_filename(Utc::now()));
        match render::render(&path, selection.kind, results, self.config.dpi, self.config.max_points) {
            Ok(()) => VisualizationArtifact::rendered(path, selection.kind),
            Err(err) => {
                tracing::warn!(error = %err, "chart rendering failed");
                VisualizationArtifact::none(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nlq_core::types::{CellValue, ColumnType};

    use super::*;

    fn question(text: &str) -> UserQuestion {
        UserQuestion::from_parts(text.to_string(), text.to_string(), Utc::now(), None)
    }

    fn results() -> QueryResults {
        QueryResults {
            column_names: vec!["region".to_string(), "revenue".to_string()],
            column_types: vec![ColumnType::Text, ColumnType::Integer],
            rows: vec![
                vec![CellValue::Text("west".into()), CellValue::Integer(10)],
                vec![CellValue::Text("east".into()), CellValue::Integer(20)],
            ],
            row_count: 2,
            truncated: false,
            elapsed: Duration::from_millis(1),
        }
    }

    #[test]
    fn renders_a_chart_and_returns_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let visualizer = Visualizer::new(dir.path().to_path_buf(), VisualizerConfig::default());
        let artifact = visualizer.visualize(&results(), &question("revenue by region"));
        assert!(artifact.png_path.is_some());
        assert!(artifact.png_path.unwrap().exists());
    }

    #[test]
    fn returns_none_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let config = VisualizerConfig {
            enabled: false,
            ..VisualizerConfig::default()
        };
        let visualizer = Visualizer::new(dir.path().to_path_buf(), config);
        let artifact = visualizer.visualize(&results(), &question("revenue by region"));
        assert!(artifact.png_path.is_none());
        assert_eq!(artifact.reason_if_none.as_deref(), Some("visualization disabled"));
    }

    #[test]
    fn returns_none_for_an_unsuitable_result_set() {
        let dir = tempfile::tempdir().unwrap();
        let visualizer = Visualizer::new(dir.path().to_path_buf(), VisualizerConfig::default());
        let mut single_row = results();
        single_row.rows.truncate(1);
        single_row.row_count = 1;
        let artifact = visualizer.visualize(&single_row, &question("revenue by region"));
        assert!(artifact.png_path.is_none());
    }
}

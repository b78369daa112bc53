//! JSON report formatting.
//!
//! `nlq-core`'s types stay free of `serde::Serialize` (they are not wire
//! types), so this module maps a [`PipelineOutcome`] onto a small
//! CLI-local, serializable report shape instead of deriving on the core.

use serde::Serialize;

use nlq_core::orchestrator::PipelineOutcome;
use nlq_core::types::ChartKind;

#[derive(Serialize)]
struct Report {
    question: String,
    ok: bool,
    narrative: Option<String>,
    follow_ups: Vec<String>,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    row_count: usize,
    truncated: bool,
    csv_path: Option<String>,
    spreadsheet_path: Option<String>,
    chart_path: Option<String>,
    chart_kind: Option<String>,
    chart_skipped_reason: Option<String>,
    error_stage: Option<String>,
    error: Option<String>,
    warnings: Vec<String>,
}

/// Formats a pipeline outcome as JSON. `compact` selects minified output.
pub fn format_json(question: &str, outcome: &PipelineOutcome, compact: bool) -> String {
    let report = match outcome {
        PipelineOutcome::Success {
            results,
            interpretation,
            export,
            visualization,
            warnings,
        } => Report {
            question: question.to_string(),
            ok: true,
            narrative: Some(interpretation.narrative_text.clone()),
            follow_ups: interpretation.follow_up_suggestions.clone(),
            columns: results.column_names.clone(),
            rows: results
                .rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_display_string()).collect())
                .collect(),
            row_count: results.row_count,
            truncated: results.truncated,
            csv_path: export.as_ref().map(|e| e.csv_path.display().to_string()),
            spreadsheet_path: export.as_ref().map(|e| e.spreadsheet_path.display().to_string()),
            chart_path: visualization.png_path.as_ref().map(|p| p.display().to_string()),
            chart_kind: (visualization.chart_kind != ChartKind::None).then(|| format!("{:?}", visualization.chart_kind)),
            chart_skipped_reason: visualization.reason_if_none.clone(),
            error_stage: None,
            error: None,
            warnings: warnings.iter().map(|w| format!("[{}] {}", w.stage, w.message)).collect(),
        },
        PipelineOutcome::Failure { error, warnings_so_far } => Report {
            question: question.to_string(),
            ok: false,
            narrative: None,
            follow_ups: Vec::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: 0,
            truncated: false,
            csv_path: None,
            spreadsheet_path: None,
            chart_path: None,
            chart_kind: None,
            chart_skipped_reason: None,
            error_stage: Some(error.stage.to_string()),
            error: Some(error.kind.to_string()),
            warnings: warnings_so_far.iter().map(|w| format!("[{}] {}", w.stage, w.message)).collect(),
        },
    };

    if compact {
        serde_json::to_string(&report).expect("report serialization cannot fail")
    } else {
        serde_json::to_string_pretty(&report).expect("report serialization cannot fail")
    }
}

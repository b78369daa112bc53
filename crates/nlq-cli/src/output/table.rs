//! Human-readable report formatting.

use std::fmt::Write;

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use tabled::builder::Builder;

use nlq_core::error::Warning;
use nlq_core::orchestrator::PipelineOutcome;
use nlq_core::types::{ChartKind, ExportArtifacts, Interpretation, QueryResults, VisualizationArtifact};

const MAX_DISPLAY_ROWS: usize = 50;

/// Formats a pipeline outcome as human-readable text with optional colors.
pub fn format_table(question: &str, outcome: &PipelineOutcome, quiet: bool) -> String {
    let colored = std::io::stdout().is_terminal();
    let mut out = String::new();

    write_header(&mut out, colored);
    writeln!(out, "Question: {question}").unwrap();
    writeln!(out).unwrap();

    match outcome {
        PipelineOutcome::Success {
            results,
            interpretation,
            export,
            visualization,
            warnings,
        } => {
            write_narrative(&mut out, interpretation, colored);
            write_results(&mut out, results);
            write_artifacts(&mut out, export, visualization, colored);
            if !quiet {
                write_warnings(&mut out, warnings, colored);
            }
        }
        PipelineOutcome::Failure { error, warnings_so_far } => {
            let label = "FAILED".to_string();
            let label = if colored { label.red().to_string() } else { label };
            writeln!(out, "{label}: [{}] {}", error.stage, error.kind).unwrap();
            if !quiet {
                write_warnings(&mut out, warnings_so_far, colored);
            }
        }
    }

    out
}

fn write_header(out: &mut String, colored: bool) {
    let title = "Natural-Language Query Report";
    let line = "═".repeat(50);
    if colored {
        writeln!(out, "{}", title.bold()).unwrap();
        writeln!(out, "{}", line.dimmed()).unwrap();
    } else {
        writeln!(out, "{title}").unwrap();
        writeln!(out, "{line}").unwrap();
    }
}

fn write_narrative(out: &mut String, interpretation: &Interpretation, colored: bool) {
    if colored {
        writeln!(out, "{}", interpretation.narrative_text.cyan()).unwrap();
    } else {
        writeln!(out, "{}", interpretation.narrative_text).unwrap();
    }
    if !interpretation.follow_up_suggestions.is_empty() {
        writeln!(out).unwrap();
        writeln!(out, "Follow-ups:").unwrap();
        for suggestion in &interpretation.follow_up_suggestions {
            writeln!(out, "  - {suggestion}").unwrap();
        }
    }
    writeln!(out).unwrap();
}

fn write_results(out: &mut String, results: &QueryResults) {
    if results.is_empty() {
        writeln!(out, "(no rows)").unwrap();
        writeln!(out).unwrap();
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(results.column_names.clone());
    for row in results.rows.iter().take(MAX_DISPLAY_ROWS) {
        builder.push_record(row.iter().map(|cell| cell.to_display_string()));
    }
    writeln!(out, "{}", builder.build()).unwrap();

    if results.row_count > MAX_DISPLAY_ROWS {
        writeln!(out, "... {} more row(s) not shown", results.row_count - MAX_DISPLAY_ROWS).unwrap();
    }
    if results.truncated {
        writeln!(out, "(result set truncated at the configured row cap)").unwrap();
    }
    writeln!(out).unwrap();
}

fn write_artifacts(out: &mut String, export: &Option<ExportArtifacts>, visualization: &VisualizationArtifact, colored: bool) {
    if let Some(export) = export {
        writeln!(out, "CSV: {}", export.csv_path.display()).unwrap();
        writeln!(out, "Spreadsheet: {}", export.spreadsheet_path.display()).unwrap();
    }

    match (visualization.chart_kind, &visualization.png_path) {
        (ChartKind::None, _) => {
            if let Some(reason) = &visualization.reason_if_none {
                let label = if colored { "No chart".dimmed().to_string() } else { "No chart".to_string() };
                writeln!(out, "{label}: {reason}").unwrap();
            }
        }
        (kind, Some(path)) => {
            writeln!(out, "Chart ({kind:?}): {}", path.display()).unwrap();
        }
        (_, None) => {}
    }
    writeln!(out).unwrap();
}

fn write_warnings(out: &mut String, warnings: &[Warning], colored: bool) {
    if warnings.is_empty() {
        return;
    }
    let header = format!("Warnings ({}):", warnings.len());
    if colored {
        writeln!(out, "{}", header.yellow()).unwrap();
    } else {
        writeln!(out, "{header}").unwrap();
    }
    for warning in warnings {
        writeln!(out, "  [{}] {}", warning.stage, warning.message).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nlq_core::error::{ErrorKind, PipelineError, Stage};
    use nlq_core::types::{CellValue, ColumnType};

    use super::*;

    fn results() -> QueryResults {
        QueryResults {
            column_names: vec!["region".to_string(), "revenue".to_string()],
            column_types: vec![ColumnType::Text, ColumnType::Integer],
            rows: vec![vec![CellValue::Text("west".into()), CellValue::Integer(100)]],
            row_count: 1,
            truncated: false,
            elapsed: Duration::from_millis(1),
        }
    }

    #[test]
    fn renders_a_successful_outcome() {
        let outcome = PipelineOutcome::Success {
            results: results(),
            interpretation: Interpretation {
                narrative_text: "West region led with 100 in revenue.".to_string(),
                follow_up_suggestions: vec!["Compare to last quarter.".to_string()],
            },
            export: None,
            visualization: VisualizationArtifact::none("insufficient rows"),
            warnings: Vec::new(),
        };
        let text = format_table("revenue by region", &outcome, false);
        assert!(text.contains("West region led"));
        assert!(text.contains("Follow-ups:"));
        assert!(text.contains("west"));
    }

    #[test]
    fn renders_a_failure() {
        let outcome = PipelineOutcome::Failure {
            error: PipelineError::new(Stage::Validator, ErrorKind::MultipleStatements),
            warnings_so_far: Vec::new(),
        };
        let text = format_table("drop everything", &outcome, false);
        assert!(text.contains("FAILED"));
        assert!(text.contains("Validator"));
    }
}

//! Chart-type selection (§4.8): a suitability check followed by a
//! priority-ordered set of rules (Heatmap, Line, Pie, Bar) driven by the
//! result set's shape and a handful of keyword markers in the question
//! text. Pure and synchronous — no I/O, which is what makes it cheap to
//! re-run ahead of an actual render.

use nlq_core::types::{ChartKind, ColumnType, QueryResults, UserQuestion};

const HEATMAP_MARKERS: &[&str] = &["heatmap", "heat map", "matrix", "correlation"];
const TREND_MARKERS: &[&str] = &["trend", "over time", "by month", "by quarter", "by year", "history"];
const BREAKDOWN_MARKERS: &[&str] = &["breakdown", "share", "distribution", "percentage", "proportion"];

const PIE_MAX_ROWS: usize = 12;
const LARGE_RESULT_ROWS: usize = 50;

pub struct Selection {
    pub kind: ChartKind,
    pub reason_if_none: Option<String>,
}

impl Selection {
    fn none(reason: impl Into<String>) -> Self {
        Self {
            kind: ChartKind::None,
            reason_if_none: Some(reason.into()),
        }
    }

    fn chart(kind: ChartKind) -> Self {
        Self {
            kind,
            reason_if_none: None,
        }
    }
}

pub fn select_chart(results: &QueryResults, question: &UserQuestion) -> Selection {
    if results.row_count < 2 {
        return Selection::none("fewer than two rows");
    }
    if results.is_empty() {
        return Selection::none("empty result set");
    }

    let numeric_columns = (0..results.column_count()).filter(|&i| results.column_types[i].is_numeric()).count();
    if numeric_columns == 0 {
        return Selection::none("no numeric column");
    }

    if results.column_count() < 2 {
        // No label column to pair the lone numeric column against.
        return Selection::none("single column");
    }

    let kind = choose_kind(results, question);
    if results.row_count > LARGE_RESULT_ROWS && !suitable_for_large_results(kind) {
        return Selection::none("too many rows for this chart type");
    }
    Selection::chart(kind)
}

fn choose_kind(results: &QueryResults, question: &UserQuestion) -> ChartKind {
    let text = question.normalized_text().to_ascii_lowercase();
    let categorical_columns = (0..results.column_count()).filter(|&i| is_categorical(results.column_types[i])).count();
    let numeric_columns = (0..results.column_count()).filter(|&i| results.column_types[i].is_numeric()).count();

    if contains_any(&text, HEATMAP_MARKERS) || (results.column_count() >= 3 && categorical_columns >= 2 && numeric_columns >= 1) {
        return ChartKind::Heatmap;
    }

    let has_temporal_column = results.column_types.iter().copied().any(ColumnType::is_temporal);
    if has_temporal_column || contains_any(&text, TREND_MARKERS) {
        return ChartKind::Line;
    }

    if contains_any(&text, BREAKDOWN_MARKERS) && results.row_count <= PIE_MAX_ROWS {
        return ChartKind::Pie;
    }

    ChartKind::Bar
}

fn is_categorical(column_type: ColumnType) -> bool {
    !column_type.is_numeric() && !column_type.is_temporal()
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| text.contains(marker))
}

/// Bar truncates to the configured `max_points` and heatmaps/lines plot the
/// whole set, so only pie (which needs a small number of legible wedges) is
/// unsuitable for a large result.
fn suitable_for_large_results(kind: ChartKind) -> bool {
    !matches!(kind, ChartKind::Pie)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use nlq_core::types::CellValue;

    use super::*;

    fn question(text: &str) -> UserQuestion {
        UserQuestion::from_parts(text.to_string(), text.to_string(), Utc::now(), None)
    }

    fn results(column_types: Vec<ColumnType>, row_count: usize) -> QueryResults {
        QueryResults {
            column_names: column_types.iter().enumerate().map(|(i, _)| format!("c{i}")).collect(),
            column_types,
            rows: vec![vec![CellValue::Integer(1)]; row_count],
            row_count,
            truncated: false,
            elapsed: Duration::from_millis(1),
        }
    }

    #[test]
    fn rejects_fewer_than_two_rows() {
        let selection = select_chart(&results(vec![ColumnType::Integer], 1), &question("how many orders"));
        assert_eq!(selection.kind, ChartKind::None);
    }

    #[test]
    fn rejects_no_numeric_column() {
        let selection = select_chart(&results(vec![ColumnType::Text, ColumnType::Text], 5), &question("list customers"));
        assert_eq!(selection.kind, ChartKind::None);
    }

    #[test]
    fn picks_line_for_a_temporal_column() {
        let selection = select_chart(
            &results(vec![ColumnType::Date, ColumnType::Integer], 10),
            &question("revenue by day"),
        );
        assert_eq!(selection.kind, ChartKind::Line);
    }

    #[test]
    fn picks_pie_for_a_small_breakdown() {
        let selection = select_chart(
            &results(vec![ColumnType::Text, ColumnType::Integer], 6),
            &question("what is the breakdown of orders by region"),
        );
        assert_eq!(selection.kind, ChartKind::Pie);
    }

    #[test]
    fn falls_back_to_bar_by_default() {
        let selection = select_chart(
            &results(vec![ColumnType::Text, ColumnType::Integer], 10),
            &question("top products by revenue"),
        );
        assert_eq!(selection.kind, ChartKind::Bar);
    }

    #[test]
    fn a_breakdown_question_over_too_many_rows_falls_back_to_bar() {
        // The pie rule itself is gated to small row counts, so a "breakdown"
        // question over a large result never reaches the pie branch at all.
        let selection = select_chart(
            &results(vec![ColumnType::Text, ColumnType::Integer], 60),
            &question("breakdown of orders by customer"),
        );
        assert_eq!(selection.kind, ChartKind::Bar);
    }

    #[test]
    fn a_single_numeric_column_is_not_chartable() {
        let selection = select_chart(&results(vec![ColumnType::Integer], 5), &question("order totals"));
        assert_eq!(selection.kind, ChartKind::None);
        assert_eq!(selection.reason_if_none.as_deref(), Some("single column"));
    }

    #[test]
    fn picks_pie_for_a_market_share_question() {
        let selection = select_chart(
            &results(vec![ColumnType::Text, ColumnType::Integer], 6),
            &question("what is the market share by region"),
        );
        assert_eq!(selection.kind, ChartKind::Pie);
    }
}

//! Builds the result-set sample handed to the interpreter prompt, per
//! §4.6: the full result when `row_count <= 50`, otherwise the first 25
//! rows plus summary statistics (min/max/mean for numeric columns,
//! distinct count for categorical ones).

use nlq_core::types::{CellValue, ColumnType, QueryResults};

pub struct ColumnSummary {
    pub name: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub distinct_count: Option<usize>,
}

pub struct ResultSample {
    pub rows: Vec<Vec<String>>,
    pub summaries: Vec<ColumnSummary>,
}

const FULL_SAMPLE_THRESHOLD: usize = 50;
const PARTIAL_SAMPLE_ROWS: usize = 25;

pub fn build_sample(results: &QueryResults) -> ResultSample {
    if results.row_count <= FULL_SAMPLE_THRESHOLD {
        return ResultSample {
            rows: render_rows(&results.rows),
            summaries: Vec::new(),
        };
    }

    let cap = results.rows.len().min(PARTIAL_SAMPLE_ROWS);
    let rows = render_rows(&results.rows[..cap]);
    let summaries = results
        .column_names
        .iter()
        .enumerate()
        .map(|(index, name)| summarize_column(results, index, name, results.column_types[index]))
        .collect();
    ResultSample { rows, summaries }
}

fn summarize_column(results: &QueryResults, index: usize, name: &str, column_type: ColumnType) -> ColumnSummary {
    if column_type.is_numeric() {
        let values: Vec<f64> = results.column_values(index).filter_map(CellValue::as_f64).collect();
        let min = values.iter().copied().fold(None, min_fold);
        let max = values.iter().copied().fold(None, max_fold);
        let mean = (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64);
        ColumnSummary {
            name: name.to_string(),
            min,
            max,
            mean,
            distinct_count: None,
        }
    } else {
        let distinct: std::collections::BTreeSet<String> = results.column_values(index).map(CellValue::to_display_string).collect();
        ColumnSummary {
            name: name.to_string(),
            min: None,
            max: None,
            mean: None,
            distinct_count: Some(distinct.len()),
        }
    }
}

fn min_fold(acc: Option<f64>, value: f64) -> Option<f64> {
    Some(acc.map_or(value, |current| current.min(value)))
}

fn max_fold(acc: Option<f64>, value: f64) -> Option<f64> {
    Some(acc.map_or(value, |current| current.max(value)))
}

fn render_rows(rows: &[Vec<CellValue>]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(CellValue::to_display_string).collect())
        .collect()
}

/// Every rendered numeric value appearing in the sample or its summary
/// statistics, used by the interpreter's hallucinated-figure check.
pub fn grounded_numbers(sample: &ResultSample) -> std::collections::BTreeSet<String> {
    let mut numbers = std::collections::BTreeSet::new();
    for row in &sample.rows {
        for cell in row {
            if cell.parse::<f64>().is_ok() {
                numbers.insert(cell.clone());
            }
        }
    }
    for summary in &sample.summaries {
        for value in [summary.min, summary.max, summary.mean] {
            if let Some(value) = value {
                numbers.insert(format!("{value:.6}").trim_end_matches('0').trim_end_matches('.').to_string());
            }
        }
        if let Some(count) = summary.distinct_count {
            numbers.insert(count.to_string());
        }
    }
    numbers
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn results(rows: Vec<Vec<CellValue>>) -> QueryResults {
        QueryResults {
            column_names: vec!["amount".to_string()],
            column_types: vec![ColumnType::Decimal],
            row_count: rows.len(),
            rows,
            truncated: false,
            elapsed: Duration::from_millis(5),
        }
    }

    #[test]
    fn uses_the_full_result_set_at_or_below_the_threshold() {
        let rows: Vec<Vec<CellValue>> = (0..10).map(|i| vec![CellValue::Integer(i)]).collect();
        let sample = build_sample(&results(rows));
        assert_eq!(sample.rows.len(), 10);
        assert!(sample.summaries.is_empty());
    }

    #[test]
    fn summarizes_numeric_columns_beyond_the_threshold() {
        let rows: Vec<Vec<CellValue>> = (0..100).map(|i| vec![CellValue::Integer(i)]).collect();
        let sample = build_sample(&results(rows));
        assert_eq!(sample.rows.len(), 25);
        assert_eq!(sample.summaries.len(), 1);
        assert_eq!(sample.summaries[0].min, Some(0.0));
        assert_eq!(sample.summaries[0].max, Some(99.0));
    }
}

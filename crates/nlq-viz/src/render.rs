//! PNG rendering for each chart kind, via `plotters`'s bitmap backend. No
//! corpus example in this repository's lineage renders charts, so this
//! module follows `plotters`'s own documented `ChartBuilder`/`DrawingArea`
//! API directly rather than adapting an existing call site (see DESIGN.md).

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use nlq_core::types::{CellValue, ChartKind, QueryResults};

const MAX_LABEL_CHARS: usize = 30;

pub fn render(path: &Path, kind: ChartKind, results: &QueryResults, dpi: u32, max_points: usize) -> Result<(), String> {
    let (width, height) = resolution_for_dpi(dpi);
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(|err| err.to_string())?;

    let outcome = match kind {
        ChartKind::Bar => render_bar(&root, results, max_points),
        ChartKind::Line => render_line(&root, results),
        ChartKind::Pie => render_pie(&root, results),
        ChartKind::Heatmap => render_heatmap(&root, results),
        ChartKind::None => Ok(()),
    };
    outcome.map_err(|err| err.to_string())?;

    root.present().map_err(|err| err.to_string())?;
    Ok(())
}

/// An 8x5 inch canvas at the configured DPI, floored to a sane minimum so a
/// misconfigured low DPI still produces a readable image.
fn resolution_for_dpi(dpi: u32) -> (u32, u32) {
    ((dpi * 8).max(640), (dpi * 5).max(400))
}

fn label_column(results: &QueryResults) -> Option<usize> {
    (0..results.column_count()).find(|&i| !results.column_types[i].is_numeric())
}

fn numeric_column(results: &QueryResults) -> Option<usize> {
    (0..results.column_count()).find(|&i| results.column_types[i].is_numeric())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max.saturating_sub(1)).collect::<String>() + "…"
    }
}

fn row_label(label_index: Option<usize>, row_index: usize, row: &[CellValue]) -> String {
    let label = label_index
        .and_then(|idx| row.get(idx))
        .map(CellValue::to_display_string)
        .unwrap_or_else(|| format!("#{}", row_index + 1));
    truncate(&label, MAX_LABEL_CHARS)
}

fn render_bar<'a>(
    root: &DrawingArea<BitMapBackend<'a>, Shift>,
    results: &QueryResults,
    max_points: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let value_index = numeric_column(results).ok_or("no numeric column to plot")?;
    let label_index = label_column(results);

    let mut bars: Vec<(String, f64)> = results
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let value = row.get(value_index).and_then(CellValue::as_f64).unwrap_or(0.0);
            (row_label(label_index, i, row), value)
        })
        .collect();
    bars.truncate(max_points.max(1));

    let max_value = bars.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max).max(1.0);

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(140)
        .build_cartesian_2d(0f64..max_value * 1.1, 0..bars.len())?;

    let labels = bars.iter().map(|(label, _)| label.clone()).collect::<Vec<_>>();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_labels(bars.len().max(1))
        .y_label_formatter(&move |idx| labels.get(*idx).cloned().unwrap_or_default())
        .draw()?;

    chart.draw_series(
        bars.iter()
            .enumerate()
            .map(|(i, (_, value))| Rectangle::new([(0.0, i), (*value, i + 1)], BLUE.filled())),
    )?;
    Ok(())
}

fn render_line<'a>(root: &DrawingArea<BitMapBackend<'a>, Shift>, results: &QueryResults) -> Result<(), Box<dyn std::error::Error>> {
    let value_index = numeric_column(results).ok_or("no numeric column to plot")?;
    let points: Vec<(f64, f64)> = results
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| (i as f64, row.get(value_index).and_then(CellValue::as_f64).unwrap_or(0.0)))
        .collect();

    let max_value = points.iter().map(|(_, v)| *v).fold(f64::MIN, f64::max).max(1.0);
    let min_value = points.iter().map(|(_, v)| *v).fold(f64::MAX, f64::min).min(0.0);

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..(points.len().max(1) as f64 - 1.0).max(1.0), min_value..max_value * 1.05)?;

    chart.configure_mesh().draw()?;
    chart.draw_series(LineSeries::new(points, &BLUE))?;
    Ok(())
}

fn render_pie<'a>(root: &DrawingArea<BitMapBackend<'a>, Shift>, results: &QueryResults) -> Result<(), Box<dyn std::error::Error>> {
    let value_index = numeric_column(results).ok_or("no numeric column to plot")?;
    let label_index = label_column(results);

    let slices: Vec<(String, f64)> = results
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let value = row.get(value_index).and_then(CellValue::as_f64).unwrap_or(0.0).max(0.0);
            (row_label(label_index, i, row), value)
        })
        .collect();

    let total: f64 = slices.iter().map(|(_, value)| value).sum();
    if total <= 0.0 {
        return Ok(());
    }

    let (width, height) = root.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = (width.min(height) as f64 / 2.5) as i32;
    let palette: &[&RGBColor] = &[&RED, &BLUE, &GREEN, &CYAN, &MAGENTA, &YELLOW, &BLACK];

    let mut start_angle = 0f64;
    for (i, (_, value)) in slices.iter().enumerate() {
        let sweep = (value / total) * std::f64::consts::TAU;
        let end_angle = start_angle + sweep;
        let steps = 40;
        let mut points = vec![center];
        for step in 0..=steps {
            let angle = start_angle + sweep * (step as f64 / steps as f64);
            let x = center.0 + (radius as f64 * angle.cos()) as i32;
            let y = center.1 + (radius as f64 * angle.sin()) as i32;
            points.push((x, y));
        }
        root.draw(&Polygon::new(points, palette[i % palette.len()].filled()))?;
        start_angle = end_angle;
    }
    Ok(())
}

fn render_heatmap<'a>(root: &DrawingArea<BitMapBackend<'a>, Shift>, results: &QueryResults) -> Result<(), Box<dyn std::error::Error>> {
    let categorical: Vec<usize> = (0..results.column_count())
        .filter(|&i| !results.column_types[i].is_numeric() && !results.column_types[i].is_temporal())
        .collect();
    let numeric_index = numeric_column(results).ok_or("no numeric column to plot")?;
    let (row_col, col_col) = match (categorical.first(), categorical.get(1)) {
        (Some(&a), Some(&b)) => (a, b),
        _ => return Err("heatmap requires two categorical columns".into()),
    };

    let mut row_labels: Vec<String> = Vec::new();
    let mut col_labels: Vec<String> = Vec::new();
    let mut cells: std::collections::BTreeMap<(usize, usize), f64> = std::collections::BTreeMap::new();

    for row in &results.rows {
        let r = row.get(row_col).map(CellValue::to_display_string).unwrap_or_default();
        let c = row.get(col_col).map(CellValue::to_display_string).unwrap_or_default();
        let value = row.get(numeric_index).and_then(CellValue::as_f64).unwrap_or(0.0);
        let ri = row_labels.iter().position(|label| label == &r).unwrap_or_else(|| {
            row_labels.push(truncate(&r, MAX_LABEL_CHARS));
            row_labels.len() - 1
        });
        let ci = col_labels.iter().position(|label| label == &c).unwrap_or_else(|| {
            col_labels.push(truncate(&c, MAX_LABEL_CHARS));
            col_labels.len() - 1
        });
        cells.insert((ri, ci), value);
    }

    let max_value = cells.values().copied().fold(0.0_f64, f64::max).max(1.0);

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(120)
        .build_cartesian_2d(0..col_labels.len().max(1), 0..row_labels.len().max(1))?;

    let y_labels = row_labels.clone();
    let x_labels = col_labels.clone();
    chart
        .configure_mesh()
        .x_labels(col_labels.len().max(1))
        .y_labels(row_labels.len().max(1))
        .x_label_formatter(&move |idx| x_labels.get(*idx).cloned().unwrap_or_default())
        .y_label_formatter(&move |idx| y_labels.get(*idx).cloned().unwrap_or_default())
        .draw()?;

    chart.draw_series(cells.iter().map(|(&(ri, ci), &value)| {
        let intensity = (value / max_value).clamp(0.0, 1.0);
        let shade = (255.0 * (1.0 - intensity)) as u8;
        Rectangle::new([(ci, ri), (ci + 1, ri + 1)], RGBColor(255, shade, shade).filled())
    }))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nlq_core::types::ColumnType;

    use super::*;

    fn results(column_types: Vec<ColumnType>, rows: Vec<Vec<CellValue>>) -> QueryResults {
        let row_count = rows.len();
        QueryResults {
            column_names: column_types.iter().enumerate().map(|(i, _)| format!("c{i}")).collect(),
            column_types,
            rows,
            row_count,
            truncated: false,
            elapsed: Duration::from_millis(1),
        }
    }

    #[test]
    fn renders_a_bar_chart_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        let data = results(
            vec![ColumnType::Text, ColumnType::Integer],
            vec![
                vec![CellValue::Text("a".into()), CellValue::Integer(3)],
                vec![CellValue::Text("b".into()), CellValue::Integer(7)],
            ],
        );
        render(&path, ChartKind::Bar, &data, 100, 15).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn renders_a_pie_chart_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        let data = results(
            vec![ColumnType::Text, ColumnType::Integer],
            vec![
                vec![CellValue::Text("a".into()), CellValue::Integer(3)],
                vec![CellValue::Text("b".into()), CellValue::Integer(7)],
            ],
        );
        render(&path, ChartKind::Pie, &data, 100, 15).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn rejects_a_heatmap_without_two_categorical_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        let data = results(vec![ColumnType::Text, ColumnType::Integer], vec![vec![CellValue::Text("a".into()), CellValue::Integer(1)]]);
        assert!(render(&path, ChartKind::Heatmap, &data, 100, 15).is_err());
    }
}

//! Spreadsheet export of a query result set (§4.7).

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};

use nlq_core::types::{CellValue, QueryResults, UserQuestion};

use crate::ExportError;

const HEADER_ROW: u32 = 2;
const HEADER_COLOR: &str = "#1F4E78";

/// Writes a single "Results" sheet: row 0 holds the (merged) question text,
/// row 2 the bold, frozen, colored header, and the data follows with
/// per-type cell formats so numbers sort and filter correctly in the
/// spreadsheet instead of landing as text.
pub fn write_xlsx(
    path: &std::path::Path,
    results: &QueryResults,
    question: &UserQuestion,
    max_column_width: usize,
) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name("Results")
        .map_err(|err| ExportError::Xlsx(err.to_string()))?;

    write_question_row(sheet, question, results.column_count())?;
    write_header_row(sheet, results)?;
    write_data_rows(sheet, results, max_column_width)?;

    sheet
        .set_freeze_panes(HEADER_ROW + 1, 0)
        .map_err(|err| ExportError::Xlsx(err.to_string()))?;
    sheet.autofit();

    workbook
        .save(path)
        .map_err(|err| ExportError::Xlsx(err.to_string()))?;
    Ok(())
}

fn write_question_row(
    sheet: &mut Worksheet,
    question: &UserQuestion,
    column_count: usize,
) -> Result<(), ExportError> {
    let format = Format::new().set_italic().set_align(FormatAlign::Left);
    let last_col = column_count.saturating_sub(1).max(0) as u16;
    if last_col == 0 {
        sheet
            .write_string_with_format(0, 0, question.raw_text(), &format)
            .map_err(|err| ExportError::Xlsx(err.to_string()))?;
    } else {
        sheet
            .merge_range(0, 0, 0, last_col, question.raw_text(), &format)
            .map_err(|err| ExportError::Xlsx(err.to_string()))?;
    }
    Ok(())
}

fn write_header_row(sheet: &mut Worksheet, results: &QueryResults) -> Result<(), ExportError> {
    let format = Format::new()
        .set_bold()
        .set_background_color(HEADER_COLOR)
        .set_font_color("#FFFFFF");

    for (col, name) in results.column_names.iter().enumerate() {
        sheet
            .write_string_with_format(HEADER_ROW, col as u16, name, &format)
            .map_err(|err| ExportError::Xlsx(err.to_string()))?;
    }
    Ok(())
}

fn write_data_rows(
    sheet: &mut Worksheet,
    results: &QueryResults,
    max_column_width: usize,
) -> Result<(), ExportError> {
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for (row_index, row) in results.rows.iter().enumerate() {
        let row_number = HEADER_ROW + 1 + row_index as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            write_cell(sheet, row_number, col, cell, &date_format, &datetime_format)?;
        }
    }

    for col in 0..results.column_count() as u16 {
        sheet
            .set_column_width(col, max_column_width as f64)
            .map_err(|err| ExportError::Xlsx(err.to_string()))?;
    }
    Ok(())
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    date_format: &Format,
    datetime_format: &Format,
) -> Result<(), ExportError> {
    let result = match cell {
        CellValue::Null => sheet.write_blank(row, col, &Format::new()),
        CellValue::Integer(v) => sheet.write_number(row, col, *v as f64),
        CellValue::Decimal(v) => sheet.write_number(row, col, *v),
        CellValue::Text(v) => sheet.write_string(row, col, sanitize_formula_prefix(v)),
        CellValue::Boolean(v) => sheet.write_boolean(row, col, *v),
        CellValue::Date(v) => {
            let excel_date = rust_xlsxwriter::ExcelDateTime::from_ymd(
                v.format("%Y").to_string().parse().unwrap_or(1970),
                v.format("%m").to_string().parse().unwrap_or(1),
                v.format("%d").to_string().parse().unwrap_or(1),
            )
            .map_err(|err| ExportError::Xlsx(err.to_string()))?;
            sheet.write_datetime_with_format(row, col, &excel_date, date_format)
        }
        CellValue::Datetime(v) => {
            let excel_dt = rust_xlsxwriter::ExcelDateTime::parse_from_str(&v.format("%Y-%m-%dT%H:%M:%S").to_string())
                .map_err(|err| ExportError::Xlsx(err.to_string()))?;
            sheet.write_datetime_with_format(row, col, &excel_dt, datetime_format)
        }
        CellValue::Binary(_) => sheet.write_string(row, col, cell.to_display_string()),
    };
    result.map_err(|err| ExportError::Xlsx(err.to_string()))?;
    Ok(())
}

/// Guards against formula injection when a text cell's first character
/// would make a spreadsheet application interpret it as a formula.
fn sanitize_formula_prefix(value: &str) -> String {
    match value.chars().next() {
        Some('=') | Some('+') | Some('-') | Some('@') => format!("'{value}"),
        _ => value.to_string(),
    }
}

use std::collections::HashSet;
use std::path::Path;

use chrono::{Datelike, NaiveDateTime, Timelike};
use rust_xlsxwriter::{Color, ExcelDateTime, Format, Workbook, Worksheet, XlsxError};
use tracing::info;

use crate::cell_diff::DiffClass;
use crate::compare::{ComparisonBlock, COLUMNS_PER_FIELD, DIFF_OFFSET, LEFT_OFFSET, RIGHT_OFFSET};
use crate::diff::ComparisonReport;
use crate::error::{Result, XlDiffError};
use crate::grid::{Grid, Sheet};
use crate::summary::{SummaryEntry, SUMMARY_HEADERS};
use crate::utils::avoid_collision;
use crate::value::CellValue;

const SAME_COLOR: u32 = 0x93F277;
const DIFFERENT_COLOR: u32 = 0xEDB26F;
const HEADER_COLOR: u32 = 0xA5FF00;
const SUMMARY_COLUMN_WIDTH: f64 = 30.0;
pub const SUMMARY_SHEET_NAME: &str = "summary";

struct Formats {
    same: Format,
    different: Format,
    header: Format,
    date: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            same: Format::new().set_background_color(Color::RGB(SAME_COLOR)),
            different: Format::new().set_background_color(Color::RGB(DIFFERENT_COLOR)),
            header: Format::new().set_background_color(Color::RGB(HEADER_COLOR)),
            date: Format::new().set_num_format("yyyy-mm-dd hh:mm:ss"),
        }
    }
}

/// Worksheet names handed out so far in one workbook.
struct SheetNames(HashSet<String>);

impl SheetNames {
    fn new() -> Self {
        Self(HashSet::new())
    }

    fn add<'a>(&mut self, workbook: &'a mut Workbook, name: &str) -> Result<&'a mut Worksheet> {
        let name = avoid_collision(name, &mut self.0);
        let sheet = workbook.add_worksheet();
        sheet.set_name(&name)?;
        Ok(sheet)
    }
}

/// Persist a comparison: left copy, right copy and comparison sheet per pair,
/// then the summary sheet when one was built.
pub fn write_report(path: &Path, report: &ComparisonReport) -> Result<()> {
    if report.sections.is_empty() && report.summary.is_none() {
        return Err(XlDiffError::EmptyWorkbook {
            path: path.to_path_buf(),
        });
    }

    let formats = Formats::new();
    let mut workbook = Workbook::new();
    let mut names = SheetNames::new();

    for section in &report.sections {
        write_grid(names.add(&mut workbook, &section.left.name)?, &section.left.grid, &formats)?;
        write_grid(names.add(&mut workbook, &section.right.name)?, &section.right.grid, &formats)?;
        write_block(names.add(&mut workbook, &section.block.name)?, &section.block, &formats)?;
    }

    if let Some(entries) = &report.summary {
        write_summary(names.add(&mut workbook, SUMMARY_SHEET_NAME)?, entries, &formats)?;
    }

    info!(path = %path.display(), sheets = report.sections.len() * 3, "saving to file");
    workbook.save(path)?;
    info!("save complete");
    Ok(())
}

/// A workbook holding only the summary sheet.
pub fn write_summary_workbook(path: &Path, entries: &[SummaryEntry]) -> Result<()> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();
    let mut names = SheetNames::new();
    write_summary(names.add(&mut workbook, SUMMARY_SHEET_NAME)?, entries, &formats)?;
    workbook.save(path)?;
    info!(path = %path.display(), entries = entries.len(), "summary saved");
    Ok(())
}

/// A single-sheet workbook, used to keep fetched query results on disk.
pub fn write_sheet(path: &Path, sheet: &Sheet) -> Result<()> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();
    let mut names = SheetNames::new();
    write_grid(names.add(&mut workbook, &sheet.name)?, &sheet.grid, &formats)?;
    workbook.save(path)?;
    info!(path = %path.display(), sheet = %sheet.name, "sheet saved");
    Ok(())
}

fn write_grid(ws: &mut Worksheet, grid: &Grid, formats: &Formats) -> Result<()> {
    for (r, row) in grid.rows().iter().enumerate() {
        let r = row_num(r)?;
        for (c, value) in row.cells().iter().enumerate() {
            write_value(ws, r, col_num(c)?, value, None, formats)?;
        }
    }
    Ok(())
}

fn write_block(ws: &mut Worksheet, block: &ComparisonBlock, formats: &Formats) -> Result<()> {
    for (r, row) in block.rows.iter().enumerate() {
        let r = row_num(r)?;
        for (f, cell) in row.iter().enumerate() {
            let base = f * COLUMNS_PER_FIELD;
            let fill = match cell.class {
                DiffClass::Same => &formats.same,
                DiffClass::Different => &formats.different,
            };
            write_value(ws, r, col_num(base + LEFT_OFFSET)?, &cell.left, None, formats)?;
            write_value(ws, r, col_num(base + RIGHT_OFFSET)?, &cell.right, None, formats)?;
            write_value(ws, r, col_num(base + DIFF_OFFSET)?, &cell.diff.to_cell(), Some(fill), formats)?;
        }
    }
    Ok(())
}

fn write_summary(ws: &mut Worksheet, entries: &[SummaryEntry], formats: &Formats) -> Result<()> {
    for (c, title) in SUMMARY_HEADERS.iter().enumerate() {
        ws.write_string_with_format(0, col_num(c)?, *title, &formats.header)?;
    }

    for (i, e) in entries.iter().enumerate() {
        let r = row_num(i + 1)?;
        ws.write_string(r, 0, &e.block_name)?;
        ws.write_string(r, 1, &e.column_label)?;
        ws.write_number(r, 2, e.difference_count as f64)?;
        ws.write_number(r, 3, e.total_rows as f64)?;
        ws.write_string(r, 4, e.percent_display())?;
        ws.write_number(r, 5, e.column_index as f64)?;
    }

    for c in 0..SUMMARY_HEADERS.len() {
        ws.set_column_width(col_num(c)?, SUMMARY_COLUMN_WIDTH)?;
    }
    Ok(())
}

fn write_value(
    ws: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    fill: Option<&Format>,
    formats: &Formats,
) -> Result<()> {
    match (value, fill) {
        (CellValue::Empty, None) => {}
        (CellValue::Empty, Some(fmt)) => {
            ws.write_blank(row, col, fmt)?;
        }
        (CellValue::Number(n), Some(fmt)) if n.is_finite() => {
            ws.write_number_with_format(row, col, *n, fmt)?;
        }
        (CellValue::Number(n), None) if n.is_finite() => {
            ws.write_number(row, col, *n)?;
        }
        (CellValue::Bool(b), None) => {
            ws.write_boolean(row, col, *b)?;
        }
        (CellValue::DateTime(dt), None) => match excel_datetime(dt) {
            Ok(excel_dt) => {
                ws.write_datetime_with_format(row, col, &excel_dt, &formats.date)?;
            }
            // Excel has no dates before 1900
            Err(_) => {
                ws.write_string(row, col, value.to_string())?;
            }
        },
        (other, Some(fmt)) => {
            ws.write_string_with_format(row, col, other.to_string(), fmt)?;
        }
        (other, None) => {
            ws.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}

fn excel_datetime(dt: &NaiveDateTime) -> std::result::Result<ExcelDateTime, XlsxError> {
    let year = u16::try_from(dt.year()).map_err(|_| XlsxError::DateTimeRangeError(dt.to_string()))?;
    let seconds = dt.second() as f64 + f64::from(dt.nanosecond()) / 1e9;
    ExcelDateTime::from_ymd(year, dt.month() as u8, dt.day() as u8)?.and_hms(
        dt.hour() as u16,
        dt.minute() as u8,
        seconds,
    )
}

fn row_num(r: usize) -> Result<u32> {
    u32::try_from(r).map_err(|_| XlDiffError::Xlsx(XlsxError::RowColumnLimitError))
}

fn col_num(c: usize) -> Result<u16> {
    u16::try_from(c).map_err(|_| XlDiffError::Xlsx(XlsxError::RowColumnLimitError))
}

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::{debug, info};

use crate::error::{Result, XlDiffError};
use crate::grid::{Document, Grid, Sheet};
use crate::utils::read_text_best_effort;
use crate::value::{parse_date, CellValue};

const SPREADSHEET_EXTS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Spreadsheet,
    Csv,
}

pub fn source_format(path: &Path) -> Result<SourceFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    if ext == "csv" {
        Ok(SourceFormat::Csv)
    } else if SPREADSHEET_EXTS.contains(&ext.as_str()) {
        Ok(SourceFormat::Spreadsheet)
    } else {
        Err(XlDiffError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }
}

/// Load every sheet of a spreadsheet, or the single table of a CSV file.
pub fn read_document(path: &Path) -> Result<Document> {
    let doc = match source_format(path)? {
        SourceFormat::Csv => Document::new(vec![read_csv(path)?]),
        SourceFormat::Spreadsheet => read_spreadsheet(path)?,
    };
    info!(
        path = %path.display(),
        sheets = ?doc.sheet_names(),
        "document loaded"
    );
    Ok(doc)
}

/// A CSV file as one sheet named after the file stem. Every non-empty field is
/// text; classification decides later whether it reads as a number or date.
pub fn read_csv(path: &Path) -> Result<Sheet> {
    let text = read_text_best_effort(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut grid = Grid::new();
    for record in reader.records() {
        let record = record.map_err(|source| XlDiffError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        grid.push_row(record.iter().map(CellValue::from).collect());
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_string();
    debug!(sheet = %name, rows = grid.max_row(), "csv parsed");
    Ok(Sheet::new(name, grid))
}

pub fn read_spreadsheet(path: &Path) -> Result<Document> {
    let workbook_err = |source: calamine::Error| XlDiffError::Workbook {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(workbook_err)?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name).map_err(workbook_err)?;
        let grid = range_to_grid(&range);
        debug!(sheet = %name, rows = grid.max_row(), columns = grid.max_column(), "sheet read");
        sheets.push(Sheet::new(name, grid));
    }
    Ok(Document::new(sheets))
}

/// Calamine ranges start at the first used cell; pad so row/column 1 stay at A1.
fn range_to_grid(range: &Range<Data>) -> Grid {
    let (row_offset, col_offset) = range
        .start()
        .map_or((0, 0), |(r, c)| (r as usize, c as usize));

    let mut grid = Grid::new();
    for _ in 0..row_offset {
        grid.push_row(Vec::new());
    }
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; col_offset];
        cells.extend(row.iter().map(data_to_value));
        while matches!(cells.last(), Some(CellValue::Empty)) {
            cells.pop();
        }
        grid.push_row(cells);
    }
    grid
}

pub fn data_to_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => CellValue::DateTime(naive),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match parse_date(s) {
            Some(naive) => CellValue::DateTime(naive),
            None => CellValue::Text(s.clone()),
        },
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("#{e:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn extensions_pick_the_reader() {
        assert_eq!(source_format(Path::new("a.CSV")).unwrap(), SourceFormat::Csv);
        assert_eq!(
            source_format(Path::new("a.xlsx")).unwrap(),
            SourceFormat::Spreadsheet
        );
        assert!(matches!(
            source_format(Path::new("a.txt")),
            Err(XlDiffError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn csv_becomes_one_text_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("left.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "Header,Col A").unwrap();
        writeln!(f, "Row 1,\"1,5\"").unwrap();
        writeln!(f, "Row 2,").unwrap();
        writeln!(f, "Row 3").unwrap();
        drop(f);

        let doc = read_document(&path).unwrap();
        assert_eq!(doc.sheet_names(), vec!["left"]);
        let grid = &doc.sheets[0].grid;
        assert_eq!(grid.max_row(), 4);
        assert_eq!(grid.cell(2, 2), &CellValue::Text("1,5".into()));
        assert_eq!(grid.cell(3, 2), &CellValue::Empty);
        assert_eq!(grid.cell(4, 1), &CellValue::Text("Row 3".into()));
    }

    #[test]
    fn latin1_csv_is_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("l.csv");
        std::fs::write(&path, b"caf\xe9,1\n").unwrap();
        let sheet = read_csv(&path).unwrap();
        assert_eq!(sheet.grid.cell(1, 1), &CellValue::Text("café".into()));
    }

    #[test]
    fn calamine_values_map_onto_cell_values() {
        assert_eq!(data_to_value(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(data_to_value(&Data::String(String::new())), CellValue::Empty);
        assert_eq!(data_to_value(&Data::Bool(true)), CellValue::Bool(true));
        assert!(matches!(
            data_to_value(&Data::DateTimeIso("2019-01-01T00:00:00".into())),
            CellValue::DateTime(_)
        ));
    }
}

use crate::value::CellValue;

static EMPTY: CellValue = CellValue::Empty;

/// One row of a grid. `Missing` marks a row that has no counterpart on this side
/// after alignment, which is not the same thing as a present row of empty cells.
#[derive(Debug, Clone, PartialEq)]
pub enum GridRow {
    Present(Vec<CellValue>),
    Missing,
}

impl GridRow {
    pub fn cells(&self) -> &[CellValue] {
        match self {
            GridRow::Present(cells) => cells,
            GridRow::Missing => &[],
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, GridRow::Missing)
    }
}

/// In-memory 2-D table. Addressing through `cell` is 1-based like a spreadsheet;
/// anything outside the stored rows reads as `Empty`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<GridRow>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            rows: rows.into_iter().map(GridRow::Present).collect(),
        }
    }

    pub fn push_row(&mut self, cells: Vec<CellValue>) {
        self.rows.push(GridRow::Present(cells));
    }

    pub fn push_missing(&mut self) {
        self.rows.push(GridRow::Missing);
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    /// 1-based row lookup.
    pub fn row(&self, row: usize) -> Option<&GridRow> {
        row.checked_sub(1).and_then(|idx| self.rows.get(idx))
    }

    /// 1-based cell lookup.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        match (self.row(row), col.checked_sub(1)) {
            (Some(r), Some(c)) => r.cells().get(c).unwrap_or(&EMPTY),
            _ => &EMPTY,
        }
    }

    pub fn max_row(&self) -> usize {
        self.rows.len()
    }

    pub fn max_column(&self) -> usize {
        self.rows.iter().map(|r| r.cells().len()).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A named grid: one worksheet, one CSV file or one query result.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub grid: Grid,
}

impl Sheet {
    pub fn new(name: impl Into<String>, grid: Grid) -> Self {
        Self {
            name: name.into(),
            grid,
        }
    }
}

/// Ordered collection of sheets loaded from one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub sheets: Vec<Sheet>,
}

impl Document {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

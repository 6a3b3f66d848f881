use std::fmt;

use tracing::debug;

use crate::align::MatchRecord;
use crate::grid::Grid;
use crate::value::CellValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn row_of(self, record: &MatchRecord) -> Option<usize> {
        match self {
            Side::Left => record.left_row,
            Side::Right => record.right_row,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rebuild one side of an aligned pair: the header row (if any) verbatim, then one
/// row per record, either a copy of the original row or a `Missing` placeholder.
/// Row `i` of the left and right results line up by construction.
pub fn materialize(original: &Grid, records: &[MatchRecord], side: Side, has_header: bool) -> Grid {
    let width = original.max_column();
    let mut out = Grid::new();

    if has_header {
        out.push_row(copy_row(original, 1, width));
    }

    for record in records {
        match side.row_of(record) {
            Some(row) => out.push_row(copy_row(original, row, width)),
            None => out.push_missing(),
        }
    }

    debug!(%side, rows = out.max_row(), columns = width, "sheet materialized");
    out
}

fn copy_row(grid: &Grid, row: usize, width: usize) -> Vec<CellValue> {
    (1..=width).map(|col| grid.cell(row, col).clone()).collect()
}

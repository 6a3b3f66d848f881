use tracing::info;

use crate::cell_diff::DIFFERENT;
use crate::compare::{ComparisonBlock, COLUMNS_PER_FIELD, DIFF_OFFSET};
use crate::grid::{Document, Grid};
use crate::utils::column_letter;
use crate::value::CellValue;

/// Sheets written per compared pair: left copy, right copy, comparison.
pub const SHEETS_PER_COMPARISON: usize = 3;

pub const SUMMARY_HEADERS: [&str; 6] = [
    "Sheet Name",
    "Column Name",
    "Number of Differences",
    "Total Rows",
    "Percent Different",
    "Column Index",
];

/// Per-column difference count for one comparison block.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryEntry {
    pub block_name: String,
    pub column_label: String,
    pub difference_count: usize,
    pub total_rows: usize,
    /// Fraction of rows that differ, rounded to 4 places.
    pub percent_different: f64,
    /// 1-based column in the source sheets.
    pub column_index: usize,
}

impl SummaryEntry {
    pub fn percent_display(&self) -> String {
        format!("{:.2}%", self.percent_different * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOptions {
    /// 1-based output column of the first left value.
    pub start_column: usize,
    /// Output columns per field.
    pub stride: usize,
    /// Distance from a left value column to its diff column.
    pub diff_offset: usize,
    pub threshold: f64,
    /// Label columns from row 1 of the left value column instead of a letter.
    pub has_header: bool,
    /// 1-based first row scanned. Rows above it are not counted at all.
    pub starting_row: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            start_column: 1,
            stride: COLUMNS_PER_FIELD,
            diff_offset: DIFF_OFFSET,
            threshold: 0.001,
            has_header: true,
            starting_row: 1,
        }
    }
}

fn counts_as_difference(value: &CellValue, threshold: f64) -> bool {
    match value {
        CellValue::Text(s) if s == DIFFERENT => true,
        // Signed: a right value below the left one is never counted.
        _ => value.as_number().is_some_and(|n| n > threshold),
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Count differences per field of a comparison grid. Only fields with at least
/// one difference produce an entry.
pub fn summarize(grid: &Grid, block_name: &str, opts: &SummaryOptions) -> Vec<SummaryEntry> {
    let stride = opts.stride.max(1);
    let start_row = opts.starting_row.max(1);
    let max_row = grid.max_row();
    let mut entries = Vec::new();

    for col in (opts.start_column.max(1)..=grid.max_column()).step_by(stride) {
        let total_rows = (start_row..=max_row).count();
        let difference_count = (start_row..=max_row)
            .filter(|&row| counts_as_difference(grid.cell(row, col + opts.diff_offset), opts.threshold))
            .count();

        if difference_count == 0 {
            continue;
        }

        let column_index = (col - 1) / stride + 1;
        let column_label = if opts.has_header {
            grid.cell(1, col).to_string()
        } else {
            column_letter(column_index)
        };
        let percent_different = if total_rows > 0 {
            round4(difference_count as f64 / total_rows as f64)
        } else {
            0.0
        };

        entries.push(SummaryEntry {
            block_name: block_name.to_string(),
            column_label,
            difference_count,
            total_rows,
            percent_different,
            column_index,
        });
    }
    entries
}

/// Flat concatenation of each block's entries, in block order.
pub fn summarize_blocks<'a>(
    blocks: impl IntoIterator<Item = &'a ComparisonBlock>,
    opts: &SummaryOptions,
) -> Vec<SummaryEntry> {
    let mut entries = Vec::new();
    for block in blocks {
        entries.extend(summarize(&block.to_grid(), &block.name, opts));
    }
    info!(entries = entries.len(), "summary built");
    entries
}

/// Summarize a workbook previously written by this tool: every
/// `SHEETS_PER_COMPARISON`-th sheet, starting at the third, holds a comparison.
pub fn summarize_workbook(doc: &Document, opts: &SummaryOptions) -> Vec<SummaryEntry> {
    let mut entries = Vec::new();
    for sheet in doc
        .sheets
        .iter()
        .skip(SHEETS_PER_COMPARISON - 1)
        .step_by(SHEETS_PER_COMPARISON)
    {
        entries.extend(summarize(&sheet.grid, &sheet.name, opts));
    }
    info!(
        sheets = doc.sheets.len(),
        entries = entries.len(),
        "workbook summarized"
    );
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> CellValue {
        CellValue::from(s)
    }

    fn n(x: f64) -> CellValue {
        CellValue::Number(x)
    }

    /// Header plus four data rows, two fields.
    fn block_grid() -> Grid {
        Grid::from_rows(vec![
            vec![t("Col A"), t("Col A"), t("Same"), t("Col B"), t("Col B"), t("Same")],
            vec![t("1"), n(1.0), n(0.0), t("2"), n(3.0), n(1.0)],
            vec![t("z"), t("z"), t("Same"), t("Q"), t("W"), t("Different")],
            vec![t("x"), t("x"), t("Same"), t("row"), CellValue::Empty, t("Different")],
            vec![t("y"), t("y"), t("Same"), t("a"), t("b"), t("Different")],
        ])
    }

    #[test]
    fn counts_per_column_and_stays_sparse() {
        let entries = summarize(&block_grid(), "Sheet1", &SummaryOptions::default());
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.column_label, "Col B");
        assert_eq!(e.difference_count, 4);
        assert_eq!(e.total_rows, 5);
        assert_eq!(e.percent_display(), "80.00%");
        assert_eq!(e.column_index, 2);
    }

    #[test]
    fn letters_label_columns_without_header() {
        let opts = SummaryOptions {
            has_header: false,
            ..SummaryOptions::default()
        };
        let entries = summarize(&block_grid(), "Sheet1", &opts);
        assert_eq!(entries[0].column_label, "B");
    }

    #[test]
    fn deltas_count_only_above_threshold() {
        let grid = Grid::from_rows(vec![
            vec![t("a"), t("a"), n(0.001)],
            vec![t("a"), t("a"), n(-0.5)],
            vec![t("a"), t("a"), n(0.0011)],
        ]);
        let entries = summarize(&grid, "s", &SummaryOptions::default());
        assert_eq!(entries[0].difference_count, 1);
        assert_eq!(entries[0].percent_different, 0.3333);
        assert_eq!(entries[0].percent_display(), "33.33%");
    }

    #[test]
    fn a_drop_in_value_is_not_summarized() {
        let left = Grid::from_rows(vec![vec![t("v")], vec![n(10.0)]]);
        let right = Grid::from_rows(vec![vec![t("v")], vec![n(5.0)]]);
        let block = crate::compare::compare_grids("s", &left, &right, 0.001);
        assert_eq!(block.rows[1][0].diff.to_cell(), n(-5.0));

        let entries = summarize_blocks([&block], &SummaryOptions::default());
        assert!(entries.is_empty());
    }

    #[test]
    fn starting_row_excludes_rows_from_totals() {
        let opts = SummaryOptions {
            starting_row: 2,
            ..SummaryOptions::default()
        };
        let entries = summarize(&block_grid(), "Sheet1", &opts);
        assert_eq!(entries[0].total_rows, 4);
        assert_eq!(entries[0].percent_display(), "100.00%");
    }
}

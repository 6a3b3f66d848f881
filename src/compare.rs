use tracing::info;

use crate::cell_diff::{value_difference, DiffClass, Difference};
use crate::grid::Grid;
use crate::value::CellValue;

/// Output columns per compared field: left value, right value, diff.
pub const COLUMNS_PER_FIELD: usize = 3;
pub const LEFT_OFFSET: usize = 0;
pub const RIGHT_OFFSET: usize = 1;
pub const DIFF_OFFSET: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonCell {
    pub left: CellValue,
    pub right: CellValue,
    pub diff: Difference,
    pub class: DiffClass,
}

/// Result of comparing one pair of grids. `rows[r][c]` is field `c` of row `r`
/// (both 0-based here).
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonBlock {
    pub name: String,
    pub threshold: f64,
    pub rows: Vec<Vec<ComparisonCell>>,
}

impl ComparisonBlock {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn field_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn cells(&self) -> impl Iterator<Item = &ComparisonCell> {
        self.rows.iter().flatten()
    }

    pub fn different_cells(&self) -> usize {
        self.cells()
            .filter(|c| c.class == DiffClass::Different)
            .count()
    }

    /// Lay the block out as a grid with fields at `3(c-1)+1 ..= 3(c-1)+3`.
    pub fn to_grid(&self) -> Grid {
        Grid::from_rows(
            self.rows
                .iter()
                .map(|row| {
                    row.iter()
                        .flat_map(|cell| [cell.left.clone(), cell.right.clone(), cell.diff.to_cell()])
                        .collect()
                })
                .collect(),
        )
    }
}

/// 1-based output column of the left value for 1-based field `field`.
pub fn output_column(field: usize) -> usize {
    (field - 1) * COLUMNS_PER_FIELD + 1
}

/// Cell-by-cell comparison over the union extent of both grids. Cells outside a
/// grid, and every cell of a `Missing` row, read as `Empty`.
pub fn compare_grids(name: &str, left: &Grid, right: &Grid, threshold: f64) -> ComparisonBlock {
    let max_row = left.max_row().max(right.max_row());
    let max_col = left.max_column().max(right.max_column());

    let rows: Vec<Vec<ComparisonCell>> = (1..=max_row)
        .map(|row| {
            (1..=max_col)
                .map(|col| {
                    let l = left.cell(row, col);
                    let r = right.cell(row, col);
                    let diff = value_difference(l, r);
                    ComparisonCell {
                        left: l.clone(),
                        right: r.clone(),
                        diff,
                        class: diff.classify(threshold),
                    }
                })
                .collect()
        })
        .collect();

    let block = ComparisonBlock {
        name: name.to_string(),
        threshold,
        rows,
    };
    info!(
        sheet = name,
        rows = max_row,
        fields = max_col,
        different = block.different_cells(),
        "sheets compared"
    );
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_three_columns_per_field() {
        let left = Grid::from_rows(vec![vec!["1".into(), "Q".into()]]);
        let right = Grid::from_rows(vec![vec![CellValue::Number(1.0), "W".into()]]);
        let block = compare_grids("Sheet1", &left, &right, 0.001);

        assert_eq!(block.field_count(), 2);
        assert_eq!(block.rows[0][0].diff, Difference::Delta(0.0));
        assert_eq!(block.rows[0][0].class, DiffClass::Same);
        assert_eq!(block.rows[0][1].diff, Difference::Different);
        assert_eq!(block.rows[0][1].class, DiffClass::Different);

        let grid = block.to_grid();
        assert_eq!(grid.max_column(), 6);
        assert_eq!(grid.cell(1, output_column(2)), &CellValue::Text("Q".into()));
        assert_eq!(grid.cell(1, output_column(2) + RIGHT_OFFSET), &CellValue::Text("W".into()));
        assert_eq!(
            grid.cell(1, output_column(2) + DIFF_OFFSET),
            &CellValue::Text("Different".into())
        );
    }

    #[test]
    fn extent_is_the_union_of_both_grids() {
        let left = Grid::from_rows(vec![vec!["a".into()], vec!["b".into()]]);
        let right = Grid::from_rows(vec![vec!["a".into(), "x".into()]]);
        let block = compare_grids("s", &left, &right, 0.0);
        assert_eq!(block.row_count(), 2);
        assert_eq!(block.field_count(), 2);
        assert_eq!(block.rows[0][1].left, CellValue::Empty);
        assert_eq!(block.rows[1][0].right, CellValue::Empty);
        assert_eq!(block.different_cells(), 2);
    }
}

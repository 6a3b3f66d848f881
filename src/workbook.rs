use std::fmt;

use clap::ValueEnum;
use tracing::info;

use crate::error::{Result, XlDiffError};
use crate::grid::Document;

/// How sheets of two documents are paired for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SheetMatching {
    /// Only sheets present on both sides under the same name, in left order.
    Name,
    /// i-th sheet against i-th sheet, up to the shorter document.
    Order,
}

impl fmt::Display for SheetMatching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetMatching::Name => f.write_str("name"),
            SheetMatching::Order => f.write_str("order"),
        }
    }
}

/// A pair of sheet positions to compare and the name of the comparison sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPair {
    pub left: usize,
    pub right: usize,
    pub output_name: String,
}

pub fn comparison_sheet_name(left: &str, right: &str, matching: SheetMatching) -> String {
    if matching == SheetMatching::Name || left == right {
        left.to_string()
    } else {
        format!("{left} v {right}")
    }
}

/// Resolve which sheets to compare. Finding none is a configuration error.
pub fn match_sections(
    left: &Document,
    right: &Document,
    matching: SheetMatching,
) -> Result<Vec<SectionPair>> {
    let pairs: Vec<SectionPair> = match matching {
        SheetMatching::Name => left
            .sheets
            .iter()
            .enumerate()
            .filter_map(|(i, sheet)| {
                right
                    .sheets
                    .iter()
                    .position(|r| r.name == sheet.name)
                    .map(|j| (i, j))
            })
            .collect::<Vec<_>>(),
        SheetMatching::Order => (0..left.sheets.len().min(right.sheets.len()))
            .map(|i| (i, i))
            .collect(),
    }
    .into_iter()
    .map(|(i, j)| SectionPair {
        left: i,
        right: j,
        output_name: comparison_sheet_name(&left.sheets[i].name, &right.sheets[j].name, matching),
    })
    .collect();

    let names: Vec<&str> = pairs.iter().map(|p| p.output_name.as_str()).collect();
    info!(%matching, ?names, "sheets to process");

    if pairs.is_empty() {
        return Err(XlDiffError::NoSections);
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Grid, Sheet};

    fn doc(names: &[&str]) -> Document {
        Document::new(names.iter().map(|n| Sheet::new(*n, Grid::new())).collect())
    }

    #[test]
    fn by_name_follows_left_order() {
        let pairs = match_sections(&doc(&["b", "a", "x"]), &doc(&["a", "b"]), SheetMatching::Name)
            .unwrap();
        let got: Vec<(usize, usize, &str)> = pairs
            .iter()
            .map(|p| (p.left, p.right, p.output_name.as_str()))
            .collect();
        assert_eq!(got, vec![(0, 1, "b"), (1, 0, "a")]);
    }

    #[test]
    fn by_order_stops_at_the_shorter_side() {
        let pairs = match_sections(&doc(&["Sheet", "Two"]), &doc(&["Sheet1"]), SheetMatching::Order)
            .unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].output_name, "Sheet v Sheet1");
    }

    #[test]
    fn same_names_by_order_keep_the_name() {
        let pairs = match_sections(&doc(&["Data"]), &doc(&["Data"]), SheetMatching::Order).unwrap();
        assert_eq!(pairs[0].output_name, "Data");
    }

    #[test]
    fn nothing_to_compare_is_an_error() {
        let err = match_sections(&doc(&["a"]), &doc(&["b"]), SheetMatching::Name).unwrap_err();
        assert!(matches!(err, XlDiffError::NoSections));
    }
}

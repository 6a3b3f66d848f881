use std::cmp::Ordering;
use std::fmt;

use tracing::debug;

use crate::grid::Grid;
use crate::value::{format_number, CellValue, ValueKind};

/// Key column configuration, 1-based. The shape given by the caller is kept for
/// display; extraction always produces a fixed-width `Key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyColumns {
    Single(usize),
    Composite(Vec<usize>),
}

impl KeyColumns {
    pub fn columns(&self) -> &[usize] {
        match self {
            KeyColumns::Single(col) => std::slice::from_ref(col),
            KeyColumns::Composite(cols) => cols,
        }
    }

    pub fn width(&self) -> usize {
        self.columns().len()
    }
}

impl fmt::Display for KeyColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyColumns::Single(col) => write!(f, "{col}"),
            KeyColumns::Composite(cols) => {
                let parts: Vec<String> = cols.iter().map(|c| c.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// One normalized key position. Within one alignment run a position is either
/// numeric on every row of both sides or text on every row of both sides.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyPart {
    Number(f64),
    Text(String),
}

impl KeyPart {
    /// Total order used for sorting: numbers by `f64::total_cmp`, numbers before text.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Number(a), KeyPart::Number(b)) => a.total_cmp(b),
            (KeyPart::Text(a), KeyPart::Text(b)) => a.cmp(b),
            (KeyPart::Number(_), KeyPart::Text(_)) => Ordering::Less,
            (KeyPart::Text(_), KeyPart::Number(_)) => Ordering::Greater,
        }
    }
}

/// `None` for NaN and for number-versus-text: those pairs have no defined order.
impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (KeyPart::Number(a), KeyPart::Number(b)) => a.partial_cmp(b),
            (KeyPart::Text(a), KeyPart::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Number(n) => f.write_str(&format_number(*n)),
            KeyPart::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Key(Vec<KeyPart>);

impl Key {
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self(parts)
    }

    pub fn scalar(part: KeyPart) -> Self {
        Self(vec![part])
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// The single part of a width-1 key.
    pub fn as_scalar(&self) -> Option<&KeyPart> {
        match self.0.as_slice() {
            [part] => Some(part),
            _ => None,
        }
    }

    pub fn total_cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(&other.0) {
            match a.total_cmp(b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        for (a, b) in self.0.iter().zip(&other.0) {
            match a.partial_cmp(b)? {
                Ordering::Equal => continue,
                ord => return Some(ord),
            }
        }
        Some(self.0.len().cmp(&other.0.len()))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(part) = self.as_scalar() {
            return write!(f, "{part}");
        }
        let parts: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// A row index (1-based, within its own grid) with the key taken from it.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedRow {
    pub row: usize,
    pub key: Key,
}

/// First data row: 2 when the grid carries a header row, 1 otherwise.
pub fn first_data_row(has_header: bool) -> usize {
    if has_header {
        2
    } else {
        1
    }
}

/// Extract keys from both grids. Each key position becomes numeric only when every
/// value at that position on both sides is a number; otherwise every value at that
/// position is compared as text.
pub fn extract_keys(
    left: &Grid,
    right: &Grid,
    columns: &KeyColumns,
    has_header: bool,
) -> (Vec<KeyedRow>, Vec<KeyedRow>) {
    let start = first_data_row(has_header);
    let raw_left = raw_keys(left, columns, start);
    let raw_right = raw_keys(right, columns, start);

    let numeric: Vec<bool> = (0..columns.width())
        .map(|pos| {
            raw_left
                .iter()
                .chain(&raw_right)
                .all(|(_, values)| values[pos].kind() == ValueKind::Number)
        })
        .collect();

    debug!(
        key_columns = %columns,
        start_row = start,
        ?numeric,
        "key positions promoted"
    );

    (
        normalize(raw_left, &numeric),
        normalize(raw_right, &numeric),
    )
}

fn raw_keys(grid: &Grid, columns: &KeyColumns, start: usize) -> Vec<(usize, Vec<CellValue>)> {
    (start..=grid.max_row())
        .map(|row| {
            let values = columns
                .columns()
                .iter()
                .map(|&col| grid.cell(row, col).clone())
                .collect();
            (row, values)
        })
        .collect()
}

fn normalize(raw: Vec<(usize, Vec<CellValue>)>, numeric: &[bool]) -> Vec<KeyedRow> {
    raw.into_iter()
        .map(|(row, values)| {
            let parts = values
                .iter()
                .zip(numeric)
                .map(|(value, &is_numeric)| match value.as_number() {
                    Some(n) if is_numeric => KeyPart::Number(n),
                    _ => KeyPart::Text(value.to_string()),
                })
                .collect();
            KeyedRow {
                row,
                key: Key::new(parts),
            }
        })
        .collect()
}

/// Stable ascending sort; rows with equal keys keep their original relative order.
pub fn sort_keyed_rows(rows: &mut [KeyedRow]) {
    rows.sort_by(|a, b| a.key.total_cmp(&b.key));
}

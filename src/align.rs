use std::cmp::Ordering;

use tracing::{info, warn};

use crate::grid::Grid;
use crate::key::{extract_keys, sort_keyed_rows, Key, KeyColumns, KeyedRow};

/// One outer-join result: a left row, a right row, or both, sharing `key`.
/// Row indices are 1-based within their own grid; never both `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub left_row: Option<usize>,
    pub right_row: Option<usize>,
    pub key: Key,
}

impl MatchRecord {
    pub fn matched(left_row: usize, right_row: usize, key: Key) -> Self {
        Self {
            left_row: Some(left_row),
            right_row: Some(right_row),
            key,
        }
    }

    pub fn left_only(left_row: usize, key: Key) -> Self {
        Self {
            left_row: Some(left_row),
            right_row: None,
            key,
        }
    }

    pub fn right_only(right_row: usize, key: Key) -> Self {
        Self {
            left_row: None,
            right_row: Some(right_row),
            key,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.left_row.is_some() && self.right_row.is_some()
    }
}

/// Full outer join of two key-sorted row lists by two-pointer merge.
///
/// Both inputs must already be sorted ascending under the same ordering. Rows
/// sharing a key pair up one-to-one in sequence order; the surplus on either side
/// comes out unmatched. A pair of keys with no defined order (NaN, or a number
/// against text) is logged and settled by `Key::total_cmp`, the order the rows
/// were sorted under: the side that sorts first is emitted unmatched. Every input
/// row still appears in exactly one record.
pub fn align(left: Vec<KeyedRow>, right: Vec<KeyedRow>) -> Vec<MatchRecord> {
    let mut out = Vec::with_capacity(left.len().max(right.len()));
    let mut incomparable = 0usize;

    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        match l.key.partial_cmp(&r.key) {
            Some(Ordering::Equal) => {
                let (l, r) = match (left.next(), right.next()) {
                    (Some(l), Some(r)) => (l, r),
                    _ => break,
                };
                out.push(MatchRecord::matched(l.row, r.row, l.key));
            }
            Some(Ordering::Less) => {
                if let Some(l) = left.next() {
                    out.push(MatchRecord::left_only(l.row, l.key));
                }
            }
            Some(Ordering::Greater) => {
                if let Some(r) = right.next() {
                    out.push(MatchRecord::right_only(r.row, r.key));
                }
            }
            None => {
                if incomparable == 0 {
                    warn!(
                        left_key = %l.key,
                        right_key = %r.key,
                        "encountered keys that cannot be compared; falling back to the sort order"
                    );
                }
                incomparable += 1;
                if l.key.total_cmp(&r.key) == Ordering::Greater {
                    if let Some(r) = right.next() {
                        out.push(MatchRecord::right_only(r.row, r.key));
                    }
                } else if let Some(l) = left.next() {
                    out.push(MatchRecord::left_only(l.row, l.key));
                }
            }
        }
    }

    out.extend(left.map(|l| MatchRecord::left_only(l.row, l.key)));
    out.extend(right.map(|r| MatchRecord::right_only(r.row, r.key)));

    if incomparable > 1 {
        warn!(count = incomparable, "incomparable key pairs during alignment");
    }
    out
}

/// Extract, sort and merge the keyed rows of two grids.
pub fn align_grids(
    left: &Grid,
    right: &Grid,
    columns: &KeyColumns,
    has_header: bool,
) -> Vec<MatchRecord> {
    let (mut left_rows, mut right_rows) = extract_keys(left, right, columns, has_header);
    sort_keyed_rows(&mut left_rows);
    sort_keyed_rows(&mut right_rows);

    let (left_count, right_count) = (left_rows.len(), right_rows.len());
    let records = align(left_rows, right_rows);

    info!(
        key_columns = %columns,
        left_rows = left_count,
        right_rows = right_count,
        matched = records.iter().filter(|r| r.is_matched()).count(),
        records = records.len(),
        "rows aligned"
    );
    records
}

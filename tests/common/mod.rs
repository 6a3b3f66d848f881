//! Grid builders and on-disk fixtures shared across integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use xldiff::{CellValue, Grid, Sheet};

pub fn text_rows(rows: &[&[&str]]) -> Vec<Vec<CellValue>> {
    rows.iter()
        .map(|r| r.iter().map(|s| CellValue::from(*s)).collect())
        .collect()
}

pub fn grid(rows: &[&[&str]]) -> Grid {
    Grid::from_rows(text_rows(rows))
}

pub fn sheet(name: &str, rows: &[&[&str]]) -> Sheet {
    Sheet::new(name, grid(rows))
}

/// Left side of the keyed fixture: rows 4 and 5 are out of key order.
pub fn keyed_left() -> Grid {
    grid(&[
        &["Header", "Col A"],
        &["Row 1", "1"],
        &["Row 2", "z"],
        &["Row 4", "1/1/2019"],
        &["Row 3", "extra"],
    ])
}

/// Right side of the keyed fixture: no "Row 3", and "Row 4" holds a real date-time.
pub fn keyed_right() -> Grid {
    let mut rows = text_rows(&[&["Header", "Col A"], &["Row 1", "1"], &["Row 2", "z"]]);
    let midnight = NaiveDate::from_ymd_opt(2019, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    rows.push(vec!["Row 4".into(), CellValue::DateTime(midnight)]);
    Grid::from_rows(rows)
}

pub fn write_csv(dir: &Path, name: &str, rows: &[&[&str]]) -> PathBuf {
    let path = dir.join(name);
    let body: String = rows.iter().map(|r| format!("{}\n", r.join(","))).collect();
    std::fs::write(&path, body).unwrap();
    path
}

use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use tracing::{error, info};

use crate::error::Result;
use crate::grid::{Grid, Sheet};
use crate::value::CellValue;
use crate::writer::write_sheet;

/// Runs queries against one SQLite database and turns the result set into a sheet.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    connection: String,
}

impl QueryExecutor {
    pub fn new(connection: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
        }
    }

    pub fn connection(&self) -> &str {
        &self.connection
    }

    /// Row 1 holds the result column names, data starts on row 2.
    pub fn fetch(&self, sql: &str, sheet_name: &str) -> Result<Sheet> {
        info!(connection = %self.connection, sql, "run sql");
        // Read-only: a mistyped path fails instead of creating an empty database.
        let conn = Connection::open_with_flags(
            &self.connection,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
        )?;
        let mut stmt = conn.prepare(sql)?;

        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();

        let mut grid = Grid::new();
        grid.push_row(columns.into_iter().map(CellValue::from).collect());

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                cells.push(sql_value(row.get_ref(idx)?));
            }
            grid.push_row(cells);
        }

        info!(rows = grid.max_row().saturating_sub(1), columns = width, "query returned");
        Ok(Sheet::new(sheet_name, grid))
    }

    /// Fetch and, when `save_to` is given, keep a copy of the result as xlsx.
    pub fn fetch_to(&self, sql: &str, sheet_name: &str, save_to: Option<&Path>) -> Result<Sheet> {
        let sheet = self.fetch(sql, sheet_name)?;
        if let Some(path) = save_to {
            write_sheet(path, &sheet)?;
        }
        Ok(sheet)
    }
}

fn sql_value(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Empty,
        ValueRef::Integer(i) => CellValue::Number(i as f64),
        ValueRef::Real(f) => CellValue::Number(f),
        ValueRef::Text(bytes) => CellValue::from(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => CellValue::Text(hex::encode(bytes)),
    }
}

/// One side of a query comparison.
#[derive(Debug, Clone)]
pub struct QuerySide {
    pub executor: QueryExecutor,
    pub sql: String,
    pub sheet_name: String,
    pub save_to: Option<PathBuf>,
}

impl QuerySide {
    pub fn fetch(&self) -> Result<Sheet> {
        self.executor
            .fetch_to(&self.sql, &self.sheet_name, self.save_to.as_deref())
    }
}

/// Run two independent fetches, in parallel or one after the other. Comparison
/// only starts once both have succeeded; if either fails, the first error (left
/// before right) is returned and nothing is compared.
pub fn fetch_pair<L, R>(left: L, right: R, parallel: bool) -> Result<(Sheet, Sheet)>
where
    L: FnOnce() -> Result<Sheet> + Send,
    R: FnOnce() -> Result<Sheet> + Send,
{
    let (left, right) = if parallel {
        rayon::join(left, right)
    } else {
        let l = left()?;
        (Ok(l), right())
    };

    for (side, result) in [("left", &left), ("right", &right)] {
        if let Err(e) = result {
            error!(side, error = %e, "fetch failed");
        }
    }
    Ok((left?, right?))
}

pub fn fetch_queries(left: &QuerySide, right: &QuerySide, parallel: bool) -> Result<(Sheet, Sheet)> {
    info!(parallel, "fetching both sides");
    let pair = fetch_pair(|| left.fetch(), || right.fetch(), parallel)?;
    info!("finished running sql on both connections");
    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XlDiffError;

    fn seeded_db(dir: &Path) -> PathBuf {
        let path = dir.join("test.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER, name TEXT, score REAL, raw BLOB);
             INSERT INTO t VALUES (1, 'a', 1.5, x'0aff');
             INSERT INTO t VALUES (2, NULL, NULL, NULL);",
        )
        .unwrap();
        path
    }

    #[test]
    fn result_set_becomes_header_plus_rows() {
        let dir = tempfile::tempdir().unwrap();
        let db = seeded_db(dir.path());
        let exec = QueryExecutor::new(db.to_string_lossy());
        let sheet = exec.fetch("SELECT * FROM t ORDER BY id", "Sheet1").unwrap();

        assert_eq!(sheet.name, "Sheet1");
        let g = &sheet.grid;
        assert_eq!(g.max_row(), 3);
        assert_eq!(g.cell(1, 2), &CellValue::Text("name".into()));
        assert_eq!(g.cell(2, 1), &CellValue::Number(1.0));
        assert_eq!(g.cell(2, 3), &CellValue::Number(1.5));
        assert_eq!(g.cell(2, 4), &CellValue::Text("0aff".into()));
        assert_eq!(g.cell(3, 2), &CellValue::Empty);
    }

    #[test]
    fn a_failed_fetch_aborts_the_pair() {
        let dir = tempfile::tempdir().unwrap();
        let db = seeded_db(dir.path());
        let exec = QueryExecutor::new(db.to_string_lossy());

        for parallel in [true, false] {
            let err = fetch_pair(
                || exec.fetch("SELECT * FROM t", "l"),
                || exec.fetch("SELECT * FROM missing_table", "r"),
                parallel,
            )
            .unwrap_err();
            assert!(matches!(err, XlDiffError::Query(_)));
        }
    }

    #[test]
    fn missing_database_is_an_error_and_stays_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.db");
        let exec = QueryExecutor::new(path.to_string_lossy());

        let err = exec.fetch("SELECT 1", "Sheet1").unwrap_err();
        assert!(matches!(err, XlDiffError::Query(_)));
        assert!(!path.exists());
    }

    #[test]
    fn both_sides_succeed_in_parallel() {
        let dir = tempfile::tempdir().unwrap();
        let db = seeded_db(dir.path());
        let side = |name: &str| QuerySide {
            executor: QueryExecutor::new(db.to_string_lossy()),
            sql: "SELECT id FROM t".to_string(),
            sheet_name: name.to_string(),
            save_to: None,
        };
        let (l, r) = fetch_queries(&side("l"), &side("r"), true).unwrap();
        assert_eq!(l.grid, r.grid);
        assert_eq!(l.name, "l");
    }
}

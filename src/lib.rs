//
// lib.rs
// xldiff
//
// Library entry that re-exports the comparison engine (classification, key alignment, cell diffing, summaries) together with the workbook, CSV and SQL sources and the xlsx sink used by the binary.
//
// Public crate interface: re-export modules used by the binary and tests.
pub mod align;
pub mod batch;
pub mod cell_diff;
pub mod cli;
pub mod compare;
pub mod diff;
pub mod error;
pub mod grid;
pub mod key;
pub mod logging;
pub mod materialize;
pub mod query;
pub mod reader;
pub mod summary;
pub mod utils;
pub mod value;
pub mod workbook;
pub mod writer;

pub use align::{align, align_grids, MatchRecord};
pub use batch::{run_batch, BatchSettings};
pub use cell_diff::{value_difference, DiffClass, Difference};
pub use cli::{build_options, Args, CompareMode, Options};
pub use compare::{compare_grids, ComparisonBlock, ComparisonCell};
pub use diff::{compare_documents, run_sql, run_summary, run_xldiff, Counters, SqlRequest};
pub use error::{Result, XlDiffError};
pub use grid::{Document, Grid, GridRow, Sheet};
pub use key::{extract_keys, Key, KeyColumns, KeyPart, KeyedRow};
pub use materialize::{materialize, Side};
pub use summary::{summarize, summarize_blocks, summarize_workbook, SummaryEntry, SummaryOptions};
pub use value::{classify, is_date, is_number, CellValue, ValueKind};
pub use workbook::{match_sections, SheetMatching};

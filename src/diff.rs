use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::align::align_grids;
use crate::cli::{CompareMode, Options};
use crate::compare::{compare_grids, ComparisonBlock};
use crate::error::{Result, XlDiffError};
use crate::grid::{Document, Sheet};
use crate::materialize::{materialize, Side};
use crate::query::{fetch_queries, QueryExecutor, QuerySide};
use crate::reader::read_document;
use crate::summary::{summarize_blocks, summarize_workbook, SummaryEntry, SummaryOptions};
use crate::workbook::{match_sections, SectionPair};
use crate::writer::{write_report, write_summary_workbook};

/// Sheet name given to each fetched result set.
pub const QUERY_SHEET_NAME: &str = "Sheet1";

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Counters {
    pub sheets_compared: usize,
    pub rows_compared: usize,
    pub cells_compared: usize,
    pub cells_different: usize,
    pub summary_entries: usize,
}

impl AddAssign for Counters {
    fn add_assign(&mut self, other: Self) {
        self.sheets_compared += other.sheets_compared;
        self.rows_compared += other.rows_compared;
        self.cells_compared += other.cells_compared;
        self.cells_different += other.cells_different;
        self.summary_entries += other.summary_entries;
    }
}

/// The two sheets as they were compared (re-ordered in sorted mode) and the result.
#[derive(Debug, Clone)]
pub struct ComparedSection {
    pub left: Sheet,
    pub right: Sheet,
    pub block: ComparisonBlock,
}

#[derive(Debug, Clone, Default)]
pub struct ComparisonReport {
    pub sections: Vec<ComparedSection>,
    pub summary: Option<Vec<SummaryEntry>>,
}

impl ComparisonReport {
    pub fn counters(&self) -> Counters {
        let mut counters = Counters {
            sheets_compared: self.sections.len(),
            summary_entries: self.summary.as_ref().map_or(0, Vec::len),
            ..Counters::default()
        };
        for section in &self.sections {
            counters.rows_compared += section.block.row_count();
            counters.cells_compared += section.block.cells().count();
            counters.cells_different += section.block.different_cells();
        }
        counters
    }
}

pub fn summary_options(opts: &Options) -> SummaryOptions {
    SummaryOptions {
        threshold: opts.threshold,
        has_header: opts.has_header,
        ..SummaryOptions::default()
    }
}

/// Compare one pair of sheets. In sorted mode both sides are first re-laid out
/// on the shared key order and renamed `left_<name>` / `right_<name>`.
pub fn compare_sheets(
    left: &Sheet,
    right: &Sheet,
    output_name: &str,
    opts: &Options,
) -> Result<ComparedSection> {
    let (left, right) = match opts.compare_mode {
        CompareMode::Default => (left.clone(), right.clone()),
        CompareMode::Sorted => {
            let keys = opts.key_columns.as_ref().ok_or_else(|| {
                XlDiffError::config("sorted comparison needs key columns")
            })?;
            let records = align_grids(&left.grid, &right.grid, keys, opts.has_header);
            (
                Sheet::new(
                    format!("left_{}", left.name),
                    materialize(&left.grid, &records, Side::Left, opts.has_header),
                ),
                Sheet::new(
                    format!("right_{}", right.name),
                    materialize(&right.grid, &records, Side::Right, opts.has_header),
                ),
            )
        }
    };

    let block = compare_grids(output_name, &left.grid, &right.grid, opts.threshold);
    Ok(ComparedSection { left, right, block })
}

/// Pair up the sheets of both documents and compare every pair, in pair order.
pub fn compare_documents(left: &Document, right: &Document, opts: &Options) -> Result<ComparisonReport> {
    let pairs = match_sections(left, right, opts.sheet_matching)?;
    info!(
        compare_mode = %opts.compare_mode,
        threshold = opts.threshold,
        has_header = opts.has_header,
        pairs = pairs.len(),
        "comparing documents"
    );

    let sections = pairs
        .iter()
        .map(|pair| {
            compare_sheets(
                &left.sheets[pair.left],
                &right.sheets[pair.right],
                &pair.output_name,
                opts,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let summary = opts
        .add_summary
        .then(|| summarize_blocks(sections.iter().map(|s| &s.block), &summary_options(opts)));

    Ok(ComparisonReport { sections, summary })
}

/// Read, compare and write. Returns what was done.
pub fn run_xldiff(left_path: &Path, right_path: &Path, output: &Path, opts: &Options) -> Result<Counters> {
    let left = read_document(left_path)?;
    let right = read_document(right_path)?;
    let report = compare_documents(&left, &right, opts)?;
    write_report(output, &report)?;

    let counters = report.counters();
    info!(?counters, output = %output.display(), "comparison complete");
    Ok(counters)
}

/// A resolved sheet pair with the extent (rows, columns) of each side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSection {
    pub output_name: String,
    pub left_name: String,
    pub right_name: String,
    pub left_extent: (usize, usize),
    pub right_extent: (usize, usize),
}

/// Read both inputs and resolve the sheet pairs without comparing anything.
pub fn plan_xldiff(left_path: &Path, right_path: &Path, opts: &Options) -> Result<Vec<PlannedSection>> {
    let left = read_document(left_path)?;
    let right = read_document(right_path)?;
    let pairs = match_sections(&left, &right, opts.sheet_matching)?;
    Ok(pairs
        .into_iter()
        .map(|SectionPair { left: l, right: r, output_name }| {
            let (ls, rs) = (&left.sheets[l], &right.sheets[r]);
            PlannedSection {
                output_name,
                left_name: ls.name.clone(),
                right_name: rs.name.clone(),
                left_extent: (ls.grid.max_row(), ls.grid.max_column()),
                right_extent: (rs.grid.max_row(), rs.grid.max_column()),
            }
        })
        .collect())
}

/// Summarize a comparison workbook written earlier into a workbook holding only
/// the summary sheet.
pub fn run_summary(input: &Path, output: &Path, opts: &SummaryOptions) -> Result<Counters> {
    let doc = read_document(input)?;
    let entries = summarize_workbook(&doc, opts);
    write_summary_workbook(output, &entries)?;
    Ok(Counters {
        summary_entries: entries.len(),
        ..Counters::default()
    })
}

/// Two query sources compared as single-sheet documents.
#[derive(Debug, Clone)]
pub struct SqlRequest {
    pub left: QuerySide,
    pub right: QuerySide,
    pub parallel: bool,
}

impl SqlRequest {
    /// The right side runs `query_right` when given, else the left query.
    pub fn new(
        left_conn: &str,
        right_conn: &str,
        query: &str,
        query_right: Option<&str>,
        left_file: Option<PathBuf>,
        right_file: Option<PathBuf>,
        parallel: bool,
    ) -> Self {
        let side = |conn: &str, sql: &str, save_to: Option<PathBuf>| QuerySide {
            executor: QueryExecutor::new(conn),
            sql: sql.to_string(),
            sheet_name: QUERY_SHEET_NAME.to_string(),
            save_to,
        };
        Self {
            left: side(left_conn, query, left_file),
            right: side(right_conn, query_right.unwrap_or(query), right_file),
            parallel,
        }
    }
}

pub fn run_sql(request: &SqlRequest, output: &Path, opts: &Options) -> Result<Counters> {
    let (left, right) = fetch_queries(&request.left, &request.right, request.parallel)?;
    let report = compare_documents(&Document::new(vec![left]), &Document::new(vec![right]), opts)?;
    write_report(output, &report)?;

    let counters = report.counters();
    info!(?counters, output = %output.display(), "sql comparison complete");
    Ok(counters)
}

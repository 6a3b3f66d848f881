use std::fmt;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::error::{Result, XlDiffError};
use crate::key::KeyColumns;
use crate::workbook::SheetMatching;

pub const DEFAULT_THRESHOLD: f64 = 0.001;

#[derive(Parser, Debug)]
#[command(author, version, about = "Cell-by-cell comparison of spreadsheets, CSV files and SQL results", long_about = None)]
pub struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare two workbooks or CSV files into a new workbook
    Compare(CompareCommand),
    /// Summarize a comparison workbook written earlier
    Summary(SummaryArgs),
    /// Run a query on two SQLite databases and compare the results
    Sql(SqlArgs),
    /// Run one SQL (or file) comparison per line of a tab separated file
    Batch(BatchArgs),
}

#[derive(clap::Args, Debug)]
pub struct CompareCommand {
    /// Left input (xlsx, xlsm, xlsb, xls, ods or csv)
    pub left: PathBuf,

    /// Right input
    pub right: PathBuf,

    /// Output workbook (.xlsx)
    pub output: PathBuf,

    #[command(flatten)]
    pub compare: CompareArgs,

    /// Do not write anything; only print the sheet pairs that would be compared
    #[arg(long)]
    pub dry_run: bool,
}

/// Flags shared by every command that runs a comparison.
#[derive(clap::Args, Debug, Clone)]
pub struct CompareArgs {
    /// Numeric differences up to this magnitude count as the same
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Compare rows by position (default) or align them on key columns first (sorted)
    #[arg(short, long = "compare-type", value_enum, default_value_t = CompareMode::Default)]
    pub compare_type: CompareMode,

    /// 1-based key column for sorted comparison
    #[arg(short, long)]
    pub sort_column: Option<usize>,

    /// 1-based key columns for sorted comparison (comma separated or repeated)
    #[arg(short = 'l', long, value_delimiter = ',', num_args = 1.., conflicts_with = "sort_column")]
    pub sort_column_list: Vec<usize>,

    /// Inputs have no header row
    #[arg(short = 'd', long)]
    pub no_header: bool,

    /// Pair sheets by name or by position
    #[arg(short = 'm', long, value_enum, default_value_t = SheetMatching::Order)]
    pub sheet_matching: SheetMatching,

    /// Skip the summary sheet
    #[arg(long)]
    pub no_summary: bool,
}

#[derive(clap::Args, Debug)]
pub struct SummaryArgs {
    /// Comparison workbook to summarize
    pub input: PathBuf,

    /// Output workbook (defaults to <input>_summary.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Label columns by letter instead of the first row
    #[arg(short = 'd', long)]
    pub no_header: bool,
}

#[derive(clap::Args, Debug)]
pub struct SqlArgs {
    /// Left SQLite database
    pub left: String,

    /// Right SQLite database
    pub right: String,

    /// Output workbook (.xlsx)
    pub output: PathBuf,

    /// Query run on the left database (and the right one unless --query-right is given)
    #[arg(short, long)]
    pub query: String,

    /// Query run on the right database
    #[arg(short = 'Q', long)]
    pub query_right: Option<String>,

    /// Also keep the left result as a workbook
    #[arg(short = 'L', long)]
    pub left_file: Option<PathBuf>,

    /// Also keep the right result as a workbook
    #[arg(short = 'R', long)]
    pub right_file: Option<PathBuf>,

    /// Run the two queries one after the other
    #[arg(long)]
    pub sequential: bool,

    #[command(flatten)]
    pub compare: CompareArgs,
}

#[derive(clap::Args, Debug)]
pub struct BatchArgs {
    /// Tab separated job file
    pub file: PathBuf,

    /// The first line is a job, not a header
    #[arg(short = 'd', long)]
    pub no_header: bool,

    /// Run the two queries of each job one after the other
    #[arg(long)]
    pub sequential: bool,

    /// Compare the left_file/right_file columns instead of running queries
    #[arg(long)]
    pub compare_only: bool,
}

/// Row pairing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CompareMode {
    /// Row i against row i.
    #[default]
    Default,
    /// Rows aligned on key columns.
    Sorted,
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareMode::Default => f.write_str("default"),
            CompareMode::Sorted => f.write_str("sorted"),
        }
    }
}

impl CompareMode {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "default" => Ok(CompareMode::Default),
            "sorted" => Ok(CompareMode::Sorted),
            other => Err(XlDiffError::config(format!(
                "unknown compare type '{other}' (expected default or sorted)"
            ))),
        }
    }
}

/// Validated comparison settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub threshold: f64,
    pub key_columns: Option<KeyColumns>,
    pub compare_mode: CompareMode,
    pub has_header: bool,
    pub sheet_matching: SheetMatching,
    pub add_summary: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            key_columns: None,
            compare_mode: CompareMode::Default,
            has_header: true,
            sheet_matching: SheetMatching::Order,
            add_summary: true,
        }
    }
}

impl Options {
    /// Reject settings that cannot produce a comparison. Runs before any input is read.
    pub fn validate(self) -> Result<Self> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(XlDiffError::config(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        if let Some(keys) = &self.key_columns {
            if keys.width() == 0 {
                return Err(XlDiffError::config("at least one key column is required"));
            }
            if keys.columns().contains(&0) {
                return Err(XlDiffError::config(format!(
                    "key columns are 1-based, got {keys}"
                )));
            }
        }
        if self.compare_mode == CompareMode::Sorted && self.key_columns.is_none() {
            return Err(XlDiffError::config(
                "sorted comparison needs a key column (--sort-column or --sort-column-list)",
            ));
        }
        Ok(self)
    }
}

/// One column stays `Single`, several become `Composite`, none means no key.
pub fn key_columns_from(columns: &[usize]) -> Option<KeyColumns> {
    match columns {
        [] => None,
        [col] => Some(KeyColumns::Single(*col)),
        cols => Some(KeyColumns::Composite(cols.to_vec())),
    }
}

pub fn build_options(args: &CompareArgs) -> Result<Options> {
    let key_columns = match args.sort_column {
        Some(col) => Some(KeyColumns::Single(col)),
        None => key_columns_from(&args.sort_column_list),
    };

    Options {
        threshold: args.threshold,
        key_columns,
        compare_mode: args.compare_type,
        has_header: !args.no_header,
        sheet_matching: args.sheet_matching,
        add_summary: !args.no_summary,
    }
    .validate()
}

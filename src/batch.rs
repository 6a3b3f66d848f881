use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::cli::{key_columns_from, CompareMode, Options, DEFAULT_THRESHOLD};
use crate::diff::{run_sql, run_xldiff, Counters, SqlRequest};
use crate::error::{Result, XlDiffError};
use crate::utils::{parse_flag, read_text_best_effort};
use crate::workbook::SheetMatching;

/// One tab separated line of a job file, by position. Trailing columns may be
/// omitted; columns past `JOB_COLUMNS` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct JobLine {
    left: String,
    right: String,
    output: String,
    query: Option<String>,
    query_right: Option<String>,
    left_file: Option<String>,
    right_file: Option<String>,
    threshold: Option<String>,
    /// Accepted for compatibility with existing job files; never acted on.
    open_on_finish: Option<String>,
    sort_columns: Option<String>,
    compare_type: Option<String>,
    has_header: Option<String>,
    sheet_matching: Option<String>,
    summary: Option<String>,
}

const JOB_COLUMNS: usize = 14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    Sql {
        left: String,
        right: String,
        query: String,
        query_right: Option<String>,
        left_file: Option<PathBuf>,
        right_file: Option<PathBuf>,
    },
    Files {
        left: PathBuf,
        right: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchJob {
    /// 1-based line in the job file.
    pub line: usize,
    pub source: JobSource,
    pub output: PathBuf,
    pub options: Options,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    pub has_header: bool,
    pub parallel: bool,
    pub compare_only: bool,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            has_header: true,
            parallel: true,
            compare_only: false,
        }
    }
}

fn line_error(line: usize, message: impl std::fmt::Display) -> XlDiffError {
    XlDiffError::config(format!("batch line {line}: {message}"))
}

fn flag(line: usize, field: &str, value: Option<&str>, default: bool) -> Result<bool> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => parse_flag(v).ok_or_else(|| line_error(line, format!("{field} '{v}' is not a boolean"))),
    }
}

/// `name`/`order`, or a boolean where true means match by name.
fn sheet_matching(line: usize, value: Option<&str>) -> Result<SheetMatching> {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        None | Some("") | Some("order") => Ok(SheetMatching::Order),
        Some("name") => Ok(SheetMatching::Name),
        Some(other) => match parse_flag(other) {
            Some(true) => Ok(SheetMatching::Name),
            Some(false) => Ok(SheetMatching::Order),
            None => Err(line_error(line, format!("unknown sheet matching '{other}'"))),
        },
    }
}

fn sort_columns(line: usize, value: Option<&str>) -> Result<Vec<usize>> {
    value
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| line_error(line, format!("sort column '{s}' is not a column number")))
        })
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl JobLine {
    fn into_job(self, line: usize, compare_only: bool) -> Result<BatchJob> {
        let threshold = match self.threshold.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_THRESHOLD,
            Some(t) => t
                .parse::<f64>()
                .map_err(|_| line_error(line, format!("threshold '{t}' is not a number")))?,
        };
        flag(line, "open_on_finish", self.open_on_finish.as_deref(), false)?;
        let compare_mode = CompareMode::parse(self.compare_type.as_deref().unwrap_or(""))
            .map_err(|e| line_error(line, e))?;

        let options = Options {
            threshold,
            key_columns: key_columns_from(&sort_columns(line, self.sort_columns.as_deref())?),
            compare_mode,
            has_header: flag(line, "has_header", self.has_header.as_deref(), true)?,
            sheet_matching: sheet_matching(line, self.sheet_matching.as_deref())?,
            add_summary: flag(line, "summary", self.summary.as_deref(), true)?,
        }
        .validate()
        .map_err(|e| line_error(line, e))?;

        let left_file = non_empty(self.left_file).map(PathBuf::from);
        let right_file = non_empty(self.right_file).map(PathBuf::from);

        let source = if compare_only {
            match (left_file, right_file) {
                (Some(left), Some(right)) => JobSource::Files { left, right },
                _ => return Err(line_error(line, "compare-only jobs need left_file and right_file")),
            }
        } else {
            JobSource::Sql {
                left: self.left.trim().to_string(),
                right: self.right.trim().to_string(),
                query: non_empty(self.query).ok_or_else(|| line_error(line, "query is required"))?,
                query_right: non_empty(self.query_right),
                left_file,
                right_file,
            }
        };

        Ok(BatchJob {
            line,
            source,
            output: PathBuf::from(self.output.trim()),
            options,
        })
    }
}

/// Parse every job of a tab separated job file. Any malformed line fails the
/// whole file before a job runs.
pub fn parse_jobs(text: &str, has_header: bool, compare_only: bool) -> Result<Vec<BatchJob>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut jobs = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let line = idx + 1;
        if has_header && idx == 0 {
            continue;
        }
        let record = record.map_err(|e| line_error(line, e))?;
        let record: csv::StringRecord = record.iter().take(JOB_COLUMNS).collect();
        let job_line: JobLine = record.deserialize(None).map_err(|e| line_error(line, e))?;
        jobs.push(job_line.into_job(line, compare_only)?);
    }
    Ok(jobs)
}

pub fn run_job(job: &BatchJob, parallel: bool) -> Result<Counters> {
    info!(line = job.line, output = %job.output.display(), "running batch job");
    match &job.source {
        JobSource::Files { left, right } => run_xldiff(left, right, &job.output, &job.options),
        JobSource::Sql {
            left,
            right,
            query,
            query_right,
            left_file,
            right_file,
        } => {
            let request = SqlRequest::new(
                left,
                right,
                query,
                query_right.as_deref(),
                left_file.clone(),
                right_file.clone(),
                parallel,
            );
            run_sql(&request, &job.output, &job.options)
        }
    }
}

/// Run the jobs of `path` in file order. The first failing job stops the batch.
pub fn run_batch(path: &Path, settings: &BatchSettings) -> Result<Counters> {
    let text = read_text_best_effort(path)?;
    let jobs = parse_jobs(&text, settings.has_header, settings.compare_only)?;
    info!(
        path = %path.display(),
        jobs = jobs.len(),
        parallel = settings.parallel,
        compare_only = settings.compare_only,
        "batch loaded"
    );

    let mut total = Counters::default();
    for job in &jobs {
        total += run_job(job, settings.parallel)?;
    }
    Ok(total)
}

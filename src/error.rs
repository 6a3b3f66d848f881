use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the comparison library.
#[derive(Debug, Error)]
pub enum XlDiffError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("no sheets were found for processing; check that sheet matching is set correctly (name or order)")]
    NoSections,

    #[error("file extension for {path:?} is not xlsx, xlsm, xlsb, xls, ods or csv; file cannot be processed")]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse csv file {path:?}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to open workbook {path:?}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("nothing to write to {path:?}")]
    EmptyWorkbook { path: PathBuf },

    #[error("failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

impl XlDiffError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, XlDiffError>;

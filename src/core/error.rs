use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the extraction, enrichment and scoring stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    // Input discovery
    #[error("no spreadsheet in {0} could be extracted")]
    NoInputFiles(PathBuf),

    #[error(
        "{file} lacks the required columns: 评论内容, 一级评论ID (or 评论类型), 评论时间 and IP地址"
    )]
    MissingColumns { file: PathBuf },

    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("workbook {0} has no worksheet")]
    EmptyWorkbook(PathBuf),

    // Enrichment
    #[error("row count mismatch: expected {expected} rows, found {actual}")]
    RowCountMismatch { expected: usize, actual: usize },

    #[error("invalid value in column '{column}': {value}")]
    InvalidValue { column: String, value: String },

    // Configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    // Models
    #[error("unknown sentiment model '{0}'")]
    UnknownModel(String),

    #[error("sentiment model '{name}' failed to load: {source}")]
    ModelLoad {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    // Pass-through from dependencies
    #[error(transparent)]
    SpreadsheetRead(#[from] calamine::Error),

    #[error(transparent)]
    SpreadsheetWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

use std::path::PathBuf;

use thiserror::Error;

/// Why a table could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Error: The file {} does not exist.", .0.display())]
    NotFound(PathBuf),

    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("parsing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reading parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("decoding arrow batch: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("date column '{0}' is not present in the header")]
    MissingDateColumn(String),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// The records handed to an operation do not form a uniform table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("row {row} has {found} fields but the header has {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("input data must be a list of records sharing one schema (record {index} differs)")]
    NonUniform { index: usize },

    #[error("row {0} is not a JSON object")]
    NotAnObject(usize),
}

/// Failure of a lookup or aggregation over a loaded table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("record {row} has no field '{field}'")]
    MissingField { field: String, row: usize },

    #[error("data does not contain required column '{0}'")]
    MissingColumn(String),

    #[error("record {row}: '{value}' in '{field}' is not a number")]
    NotNumeric {
        field: String,
        row: usize,
        value: String,
    },

    #[error("Error: Incorrect date format in '{column}' column. Please ensure dates are in '{format}' format.")]
    DateFormat { column: String, format: String },

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

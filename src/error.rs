//! Error types for loading, analysis and export.

use crate::types::Role;
use std::path::PathBuf;
use thiserror::Error;

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors from column mapping, aggregation and analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Headers did not match every mandatory role; a manual mapping is needed.
    #[error("could not detect column(s) for: {}", join_roles(.missing))]
    UnresolvedMapping { missing: Vec<Role> },

    /// A manual mapping left a mandatory role unselected.
    #[error("please complete all required mappings (missing: {})", join_roles(.missing))]
    IncompleteManualMapping { missing: Vec<Role> },

    /// A manual mapping named a column the header row does not have.
    #[error("column {index} for {role} is out of range (header has {columns} columns)")]
    ColumnOutOfRange {
        role: Role,
        index: usize,
        columns: usize,
    },

    /// Profitability was requested but no cost column was mapped.
    #[error("profitability analysis requires cost data")]
    MissingCostData,

    /// Unknown analysis mode name.
    #[error("unsupported analysis type: {0}")]
    UnsupportedAnalysisMode(String),

    /// Analysis requested before any data was loaded and mapped.
    #[error("please upload and map data first")]
    NoData,
}

/// Errors while decoding input files into sheets.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no input files given")]
    NoFiles,

    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to open workbook {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    /// File decoded but had no header row.
    #[error("file is empty: {path}")]
    EmptyFile { path: PathBuf },

    #[error("unsupported file type: {path}")]
    UnsupportedFormat { path: PathBuf },
}

/// Errors while writing exports.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("no data to export")]
    NothingToExport,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

//! Typed failures raised by the filtering core.
//!
//! Only hard failures live here. An empty filtered dataset or a zero total is a
//! valid result and is reported through [`crate::metrics::MetricsResult`].

use thiserror::Error;

/// One or more required columns are absent from an uploaded dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing required column(s): {}", .missing.join(", "))]
pub struct SchemaError {
    /// Every missing column, in the order the columns were required.
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsightError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The fuzzy matcher was asked to rank candidates against an empty query.
    /// Callers must bypass the matcher instead.
    #[error("Fuzzy search requires a non-empty query")]
    EmptyQuery,

    #[error("Column '{column}' is not part of the dataset")]
    UnknownColumn { column: String },

    #[error("Row {row} has {found} value(s) but the dataset declares {expected} column(s)")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Failed to parse filter expression '{expression}'")]
    InvalidFilter { expression: String },
}

pub type Result<T, E = InsightError> = std::result::Result<T, E>;

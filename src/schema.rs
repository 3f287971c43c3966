//! Required column checks for uploaded ticket tables.
//!
//! Column names are matched exactly (case and accents included), the same way
//! the uploaded header row spells them.

use log::debug;

use crate::{dataset::Dataset, error::SchemaError};

/// Returns the dataset unchanged when every required column is declared.
///
/// On failure the error lists every missing column in `required` order, not
/// just the first one.
pub fn validate<S: AsRef<str>>(dataset: Dataset, required: &[S]) -> Result<Dataset, SchemaError> {
    let missing = missing_columns(&dataset, required);
    if !missing.is_empty() {
        return Err(SchemaError { missing });
    }
    debug!(
        "Schema check passed for {} required column(s) across {} row(s)",
        required.len(),
        dataset.len()
    );
    Ok(dataset)
}

pub fn missing_columns<S: AsRef<str>>(dataset: &Dataset, required: &[S]) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for name in required.iter().map(AsRef::as_ref) {
        if !dataset.has_column(name) && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }
    missing
}

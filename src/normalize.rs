//! Text clean-up applied before categorical matching.
//!
//! Uploaded sheets mix `" ideal "`, `"Ideal"` and `"IDEAL"` for the same
//! verdict. Each designated column is rewritten to its trimmed, upper-cased
//! form. A null cell is coerced to the empty string first, so a normalized
//! column never holds nulls.

use std::borrow::Cow;

use log::debug;

use crate::{
    dataset::Dataset,
    error::{InsightError, Result},
};

/// Returns an uppercase representation, avoiding allocation when unnecessary.
pub fn uppercase(input: &str) -> Cow<'_, str> {
    if input.chars().all(|ch| !ch.is_lowercase()) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(input.to_uppercase())
    }
}

/// Normalized form of one cell. Null becomes `""`.
pub fn normalize_value(value: Option<&str>) -> Cow<'_, str> {
    match value {
        None => Cow::Borrowed(""),
        Some(raw) => uppercase(raw.trim()),
    }
}

/// New dataset with every named column normalized. The input is untouched.
pub fn normalize<S: AsRef<str>>(dataset: &Dataset, text_columns: &[S]) -> Result<Dataset> {
    let indexes = text_columns
        .iter()
        .map(|name| dataset.require_column(name.as_ref()))
        .collect::<Result<Vec<_>, InsightError>>()?;
    debug!(
        "Normalizing {} column(s) over {} row(s)",
        indexes.len(),
        dataset.len()
    );
    Ok(dataset.map_columns(&indexes, |cell| Some(normalize_value(cell).into_owned())))
}

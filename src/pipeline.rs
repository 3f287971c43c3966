//! One dashboard session: a prepared dataset plus the current filter.
//!
//! The presentation layer opens a [`Session`] per uploaded file and calls
//! [`Session::update`] whenever a control changes. Nothing is shared between
//! sessions and the dataset is never mutated after [`prepare`].

use log::info;
use serde::Serialize;

use crate::{
    config::InsightConfig,
    dataset::Dataset,
    error::Result,
    filter::{self, FilterOptions, FilterSpec},
    metrics::{self, MetricsResult},
    normalize, schema,
};

/// Schema check followed by normalization of the configured text columns.
pub fn prepare(raw: Dataset, config: &InsightConfig) -> Result<Dataset> {
    let validated = schema::validate(raw, &config.required_columns())?;
    let normalized = normalize::normalize(&validated, &config.normalized_columns())?;
    info!(
        "Prepared {} row(s) across {} column(s)",
        normalized.len(),
        normalized.columns().len()
    );
    Ok(normalized)
}

/// Everything one render of the dashboard needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub filtered: Dataset,
    pub metrics: MetricsResult,
    pub options: FilterOptions,
}

pub fn evaluate(dataset: &Dataset, spec: &FilterSpec, config: &InsightConfig) -> Result<DashboardView> {
    let options = FilterOptions::derive(dataset, spec, &config.columns)?;
    let filtered = filter::apply(dataset, spec, &config.columns)?;
    let metrics = metrics::compute(&filtered, &config.columns)?;
    Ok(DashboardView {
        filtered,
        metrics,
        options,
    })
}

/// Applies the normalization of `column` to user-entered selection values so
/// they compare equal to the prepared cells.
pub fn normalize_selection<S: AsRef<str>>(values: &[S], column: &str, config: &InsightConfig) -> Vec<String> {
    let normalized = config.is_normalized(column);
    values
        .iter()
        .map(|value| {
            if normalized {
                normalize::normalize_value(Some(value.as_ref())).into_owned()
            } else {
                value.as_ref().to_string()
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Session {
    config: InsightConfig,
    dataset: Dataset,
    spec: FilterSpec,
}

impl Session {
    pub fn open(raw: Dataset, config: InsightConfig) -> Result<Self> {
        let dataset = prepare(raw, &config)?;
        Ok(Self {
            config,
            dataset,
            spec: FilterSpec::default(),
        })
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    /// Replaces the active filter and recomputes the view.
    pub fn update(&mut self, spec: FilterSpec) -> Result<DashboardView> {
        self.spec = spec;
        self.view()
    }

    pub fn view(&self) -> Result<DashboardView> {
        evaluate(&self.dataset, &self.spec, &self.config)
    }

    /// Type options narrowed by a free-text search, within the types offered
    /// for the current analysis selection.
    pub fn search_types(&self, query: &str) -> Result<Vec<String>> {
        let options = filter::type_options_for(&self.dataset, &self.config.columns, self.spec.analyses())?;
        filter::narrow_categories(&options, query, &self.config.fuzzy)
    }
}

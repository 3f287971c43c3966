//! Counts, shares and the dominant-type insight for a filtered dataset.
//!
//! Every figure is recomputed from the dataset handed in; nothing is cached.
//! An empty dataset is a valid input: totals are zero, every percentage is
//! zero and the insight is [`Insight::NoData`]. A non-empty dataset whose
//! types are all blank reports [`Insight::Unclassified`] instead.

use std::{collections::HashMap, fmt};

use chrono::NaiveDate;
use itertools::Itertools;
use log::{debug, warn};
use serde::Serialize;

use crate::{
    config::ColumnNames,
    dataset::{Dataset, display_value, parse_naive_date},
    error::Result,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub label: String,
    pub count: usize,
    /// Unrounded `count / total * 100`.
    pub percent: f64,
}

impl CategoryShare {
    pub fn rounded_percent(&self) -> f64 {
        round_one_decimal(self.percent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    Dominant {
        label: String,
        count: usize,
        total: usize,
        share: f64,
    },
    /// Tickets matched, but none of them carries a type.
    Unclassified { total: usize },
    NoData,
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insight::Dominant {
                label,
                count,
                total,
                share,
            } => write!(
                f,
                "{label} concentra {:.1}% dos tickets filtrados ({count} de {total}).",
                round_one_decimal(*share)
            ),
            Insight::Unclassified { total } => write!(
                f,
                "Nenhum dos {total} tickets filtrados tem tipo informado."
            ),
            Insight::NoData => write!(f, "Nenhum ticket encontrado para os filtros atuais."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsResult {
    pub total: usize,
    /// One entry per distinct analysis value present, first-seen order.
    pub analysis: Vec<CategoryShare>,
    /// One entry per distinct type value present, first-seen order.
    pub types: Vec<CategoryShare>,
    /// Tickets per day, ascending. Empty when the date column is absent.
    pub timeline: Vec<DateCount>,
    /// Rows whose date is missing or unparseable.
    pub undated: usize,
    pub insight: Insight,
}

impl MetricsResult {
    /// Count for one analysis label, 0 when absent.
    pub fn label_count(&self, label: &str) -> usize {
        self.analysis
            .iter()
            .find(|share| share.label == label)
            .map_or(0, |share| share.count)
    }

    /// Unrounded share for one analysis label, 0 when absent.
    pub fn label_percent(&self, label: &str) -> f64 {
        self.analysis
            .iter()
            .find(|share| share.label == label)
            .map_or(0.0, |share| share.percent)
    }
}

/// `part / total * 100`, or 0 when `total` is 0.
pub fn percent_of(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn compute(dataset: &Dataset, columns: &ColumnNames) -> Result<MetricsResult> {
    let kind = dataset.require_column(&columns.kind)?;
    let analysis = dataset.require_column(&columns.analysis)?;
    let total = dataset.len();

    let mut analysis_tally = Tally::default();
    let mut type_tally = Tally::default();
    for row in dataset.rows() {
        analysis_tally.add(display_value(row.get(analysis)));
        type_tally.add(display_value(row.get(kind)));
    }

    let (timeline, undated) = match dataset.column_index(&columns.date) {
        Some(date_column) => date_series(dataset, date_column),
        None => (Vec::new(), 0),
    };
    if undated > 0 {
        warn!("{undated} row(s) skipped from the timeline: missing or unparseable date");
    }

    let insight = dominant_insight(&type_tally, total);
    debug!(
        "Computed metrics over {total} row(s): {} analysis value(s), {} type(s)",
        analysis_tally.len(),
        type_tally.len()
    );
    Ok(MetricsResult {
        total,
        analysis: analysis_tally.shares(total),
        types: type_tally.shares(total),
        timeline,
        undated,
        insight,
    })
}

/// Highest-count non-empty type, earliest first seen on ties.
/// `NoData` only for an empty dataset.
fn dominant_insight(types: &Tally, total: usize) -> Insight {
    let mut best: Option<(&str, usize)> = None;
    for (label, count) in types.entries() {
        if label.trim().is_empty() {
            continue;
        }
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((label, count));
        }
    }
    match best {
        _ if total == 0 => Insight::NoData,
        Some((label, count)) => Insight::Dominant {
            label: label.to_string(),
            count,
            total,
            share: percent_of(count, total),
        },
        None => Insight::Unclassified { total },
    }
}

fn date_series(dataset: &Dataset, date_column: usize) -> (Vec<DateCount>, usize) {
    let mut undated = 0usize;
    let dates = dataset
        .column_values(date_column)
        .filter_map(|cell| {
            let parsed = cell.and_then(parse_naive_date);
            if parsed.is_none() {
                undated += 1;
            }
            parsed
        })
        .collect::<Vec<_>>();
    let series = dates
        .into_iter()
        .counts()
        .into_iter()
        .map(|(date, count)| DateCount { date, count })
        .sorted_by_key(|entry| entry.date)
        .collect();
    (series, undated)
}

/// Counter that remembers first-seen order.
#[derive(Debug, Default)]
struct Tally {
    order: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl Tally {
    fn add(&mut self, label: &str) {
        match self.index.get(label) {
            Some(&slot) => self.order[slot].1 += 1,
            None => {
                self.index.insert(label.to_string(), self.order.len());
                self.order.push((label.to_string(), 1));
            }
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn entries(&self) -> impl Iterator<Item = (&str, usize)> {
        self.order.iter().map(|(label, count)| (label.as_str(), *count))
    }

    fn shares(&self, total: usize) -> Vec<CategoryShare> {
        self.entries()
            .map(|(label, count)| CategoryShare {
                label: label.to_string(),
                count,
                percent: percent_of(count, total),
            })
            .collect()
    }
}

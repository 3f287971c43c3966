//! Filter state, row predicates and the option lists offered to the
//! user for each filter control.
//!
//! A [`FilterSpec`] composes independent predicates with AND. Categorical
//! filters distinguish "not configured" (`None`, allow all) from an explicit
//! empty selection (`Some(empty)`, exclude everything).
//!
//! Option lists are derived in two stages: analysis options come straight from
//! the dataset, type options from the rows matching the chosen analyses (see
//! [`type_options_for`] and [`FilterOptions::derive`]).

use std::collections::BTreeSet;

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use crate::{
    config::{ColumnNames, FuzzySettings},
    dataset::{Dataset, Row, display_value, parse_naive_date},
    error::{InsightError, Result},
    fuzzy,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnEquals {
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

/// Active filter state. Built once per control change and not mutated after.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    ticket_query: Option<String>,
    types: Option<BTreeSet<String>>,
    analyses: Option<BTreeSet<String>>,
    column_equals: Option<ColumnEquals>,
    date_range: Option<DateRange>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring search on the ticket id. A blank query
    /// means no constraint.
    pub fn with_ticket_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.ticket_query = (!query.trim().is_empty()).then(|| query.trim().to_string());
        self
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_analyses<I, S>(mut self, analyses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.analyses = Some(analyses.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_column_equals(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.column_equals = Some(ColumnEquals {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_range = (from.is_some() || to.is_some()).then_some(DateRange { from, to });
        self
    }

    pub fn ticket_query(&self) -> Option<&str> {
        self.ticket_query.as_deref()
    }

    pub fn types(&self) -> Option<&BTreeSet<String>> {
        self.types.as_ref()
    }

    pub fn analyses(&self) -> Option<&BTreeSet<String>> {
        self.analyses.as_ref()
    }

    pub fn column_equals(&self) -> Option<&ColumnEquals> {
        self.column_equals.as_ref()
    }

    pub fn date_range(&self) -> Option<DateRange> {
        self.date_range
    }

    /// Resolves the configured constraints against the dataset's columns.
    pub fn predicates(&self, dataset: &Dataset, columns: &ColumnNames) -> Result<Vec<Predicate>> {
        let mut predicates = Vec::new();
        if let Some(query) = &self.ticket_query {
            predicates.push(Predicate::Contains {
                column: dataset.require_column(&columns.ticket)?,
                needle: query.to_lowercase(),
            });
        }
        if let Some(allowed) = &self.types {
            predicates.push(Predicate::OneOf {
                column: dataset.require_column(&columns.kind)?,
                allowed: allowed.clone(),
            });
        }
        if let Some(allowed) = &self.analyses {
            predicates.push(Predicate::OneOf {
                column: dataset.require_column(&columns.analysis)?,
                allowed: allowed.clone(),
            });
        }
        if let Some(equals) = &self.column_equals {
            predicates.push(Predicate::Equals {
                column: dataset.require_column(&equals.column)?,
                value: equals.value.clone(),
            });
        }
        if let Some(range) = self.date_range {
            predicates.push(Predicate::DateWithin {
                column: dataset.require_column(&columns.date)?,
                range,
            });
        }
        debug!("Built {} predicate(s) from filter spec", predicates.len());
        Ok(predicates)
    }

    /// One boolean per row, `true` when every predicate holds.
    pub fn mask(&self, dataset: &Dataset, columns: &ColumnNames) -> Result<Vec<bool>> {
        let predicates = self.predicates(dataset, columns)?;
        Ok(dataset
            .rows()
            .iter()
            .map(|row| predicates.iter().all(|p| p.matches(row)))
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Lower-cased needle contained in the trimmed, lower-cased cell.
    Contains { column: usize, needle: String },
    OneOf {
        column: usize,
        allowed: BTreeSet<String>,
    },
    Equals { column: usize, value: String },
    DateWithin { column: usize, range: DateRange },
}

impl Predicate {
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::Contains { column, needle } => match row.get(*column) {
                Some(value) if !value.trim().is_empty() => {
                    value.trim().to_lowercase().contains(needle.as_str())
                }
                _ => false,
            },
            Predicate::OneOf { column, allowed } => {
                allowed.contains(display_value(row.get(*column)))
            }
            Predicate::Equals { column, value } => display_value(row.get(*column)) == value,
            Predicate::DateWithin { column, range } => row
                .get(*column)
                .and_then(parse_naive_date)
                .is_some_and(|date| range.contains(date)),
        }
    }
}

/// Rows of `dataset` matching `spec`, in their original order. An
/// all-excluding spec yields an empty dataset.
pub fn apply(dataset: &Dataset, spec: &FilterSpec, columns: &ColumnNames) -> Result<Dataset> {
    let mask = spec.mask(dataset, columns)?;
    let filtered = dataset.select(&mask);
    debug!("Filter kept {} of {} row(s)", filtered.len(), dataset.len());
    Ok(filtered)
}

/// Distinct non-empty analysis values, sorted.
pub fn analysis_options(dataset: &Dataset, columns: &ColumnNames) -> Result<Vec<String>> {
    let column = dataset.require_column(&columns.analysis)?;
    Ok(distinct_sorted(dataset.rows().iter(), column))
}

/// Distinct non-empty type values co-occurring with the selected analyses.
/// `None` means no analysis has been chosen and every type is offered.
pub fn type_options_for(
    dataset: &Dataset,
    columns: &ColumnNames,
    analysis_selection: Option<&BTreeSet<String>>,
) -> Result<Vec<String>> {
    let kind = dataset.require_column(&columns.kind)?;
    let analysis = dataset.require_column(&columns.analysis)?;
    let rows = dataset.rows().iter().filter(|row| {
        analysis_selection.is_none_or(|selected| selected.contains(display_value(row.get(analysis))))
    });
    Ok(distinct_sorted(rows, kind))
}

fn distinct_sorted<'a>(rows: impl Iterator<Item = &'a Row>, column: usize) -> Vec<String> {
    rows.filter_map(|row| row.get(column))
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Options offered for each categorical control given the current spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub analyses: Vec<String>,
    /// Depends on the analysis selection of the filter.
    pub types: Vec<String>,
}

impl FilterOptions {
    pub fn derive(dataset: &Dataset, spec: &FilterSpec, columns: &ColumnNames) -> Result<Self> {
        let analyses = analysis_options(dataset, columns)?;
        let types = type_options_for(dataset, columns, spec.analyses())?;
        debug!(
            "Derived {} analysis option(s) and {} type option(s)",
            analyses.len(),
            types.len()
        );
        Ok(Self { analyses, types })
    }
}

/// Narrows a list of category options with a free-text search.
///
/// A blank query bypasses the fuzzy matcher and keeps every option. Otherwise
/// the best `settings.limit` options with a non-zero score are returned, best
/// first.
pub fn narrow_categories<S: AsRef<str>>(
    options: &[S],
    query: &str,
    settings: &FuzzySettings,
) -> Result<Vec<String>> {
    if query.trim().is_empty() {
        return Ok(options.iter().map(|o| o.as_ref().to_string()).collect());
    }
    let matches = fuzzy::search_with(query, options, settings)?;
    Ok(matches
        .into_iter()
        .filter(|m| m.score > 0.0)
        .map(|m| m.label)
        .collect())
}

/// Parses `column=value` (or `column == value`) into an equality constraint.
/// Surrounding quotes on the value are removed.
pub fn parse_column_equals(expression: &str) -> Result<ColumnEquals> {
    let trimmed = expression.trim();
    let invalid = || InsightError::InvalidFilter {
        expression: trimmed.to_string(),
    };
    let (left, right) = trimmed.split_once('=').ok_or_else(invalid)?;
    let right = right.strip_prefix('=').unwrap_or(right);
    let column = left.trim();
    if column.is_empty() {
        return Err(invalid());
    }
    Ok(ColumnEquals {
        column: column.to_string(),
        value: unquote(right.trim()).to_string(),
    })
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tickets() -> Dataset {
        Dataset::from_records(
            &["Ticket", "Tipo", "Análise", "Data", "Canal"],
            vec![
                vec!["ABC-101", "Liveness", "IDEAL", "2024-01-05", "app"],
                vec!["abc-102", "Liveness", "NÃO IDEAL", "2024-01-20", "web"],
                vec!["XYZ-201", "Documento", "IDEAL", "ontem", "app"],
                vec!["", "Selfie", "NÃO IDEAL", "", "app"],
            ],
        )
        .unwrap()
    }

    fn ids(spec: &FilterSpec) -> Vec<usize> {
        apply(&tickets(), spec, &ColumnNames::default())
            .unwrap()
            .row_ids()
    }

    #[test]
    fn empty_spec_keeps_everything() {
        assert_eq!(ids(&FilterSpec::new()), vec![0, 1, 2, 3]);
    }

    #[test]
    fn ticket_query_is_case_insensitive_substring() {
        assert_eq!(ids(&FilterSpec::new().with_ticket_query("abc")), vec![0, 1]);
        assert_eq!(ids(&FilterSpec::new().with_ticket_query(" 20")), vec![2]);
        assert_eq!(ids(&FilterSpec::new().with_ticket_query("   ")), vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_ticket_never_matches_a_query() {
        assert!(!ids(&FilterSpec::new().with_ticket_query("-")).contains(&3));
    }

    #[test]
    fn explicit_empty_selection_excludes_everything() {
        let spec = FilterSpec::new().with_types(Vec::<String>::new());
        assert!(ids(&spec).is_empty());
    }

    #[test]
    fn categorical_filters_combine_with_and() {
        let spec = FilterSpec::new()
            .with_types(["Liveness", "Documento"])
            .with_analyses(["IDEAL"]);
        assert_eq!(ids(&spec), vec![0, 2]);
    }

    #[test]
    fn column_equality_uses_extra_column() {
        let spec = FilterSpec::new().with_column_equals("Canal", "app");
        assert_eq!(ids(&spec), vec![0, 2, 3]);
    }

    #[test]
    fn unknown_extra_column_is_an_error() {
        let spec = FilterSpec::new().with_column_equals("Origem", "app");
        let err = apply(&tickets(), &spec, &ColumnNames::default()).unwrap_err();
        assert_eq!(
            err,
            InsightError::UnknownColumn {
                column: "Origem".to_string()
            }
        );
    }

    #[test]
    fn date_range_skips_unparseable_dates() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1);
        let to = NaiveDate::from_ymd_opt(2024, 1, 10);
        assert_eq!(ids(&FilterSpec::new().with_date_range(from, to)), vec![0]);
        assert_eq!(ids(&FilterSpec::new().with_date_range(from, None)), vec![0, 1]);
        assert!(FilterSpec::new().with_date_range(None, None).date_range().is_none());
    }

    #[test]
    fn type_options_cascade_from_analysis_selection() {
        let dataset = tickets();
        let columns = ColumnNames::default();
        let all = type_options_for(&dataset, &columns, None).unwrap();
        assert_eq!(all, vec!["Documento", "Liveness", "Selfie"]);

        let selected = BTreeSet::from(["NÃO IDEAL".to_string()]);
        let narrowed = type_options_for(&dataset, &columns, Some(&selected)).unwrap();
        assert_eq!(narrowed, vec!["Liveness", "Selfie"]);

        let spec = FilterSpec::new().with_analyses(["IDEAL"]);
        let options = FilterOptions::derive(&dataset, &spec, &columns).unwrap();
        assert_eq!(options.analyses, vec!["IDEAL", "NÃO IDEAL"]);
        assert_eq!(options.types, vec!["Documento", "Liveness"]);
    }

    #[test]
    fn narrow_categories_bypasses_blank_queries() {
        let options = ["Documento", "Liveness", "Selfie"];
        let settings = FuzzySettings::default();
        assert_eq!(
            narrow_categories(&options, "  ", &settings).unwrap(),
            vec!["Documento", "Liveness", "Selfie"]
        );
        assert!(narrow_categories(&options, "livenes", &settings).unwrap().is_empty());

        let tolerant = FuzzySettings {
            min_token_similarity: Some(0.8),
            ..FuzzySettings::default()
        };
        assert_eq!(
            narrow_categories(&options, "livenes", &tolerant).unwrap(),
            vec!["Liveness"]
        );
    }

    #[test]
    fn parse_column_equals_handles_quotes_and_double_equals() {
        let parsed = parse_column_equals("Canal = 'app'").unwrap();
        assert_eq!(parsed.column, "Canal");
        assert_eq!(parsed.value, "app");

        let parsed = parse_column_equals("Canal==\"web mobile\"").unwrap();
        assert_eq!(parsed.value, "web mobile");

        let parsed = parse_column_equals("Obs=a==b").unwrap();
        assert_eq!(parsed.column, "Obs");
        assert_eq!(parsed.value, "a==b");

        let parsed = parse_column_equals("Obs == =x").unwrap();
        assert_eq!(parsed.column, "Obs");
        assert_eq!(parsed.value, "=x");

        assert!(parse_column_equals("Canal").is_err());
        assert!(parse_column_equals("=app").is_err());
    }
}

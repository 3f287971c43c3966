//! In-memory ticket table.
//!
//! A [`Dataset`] is an ordered list of [`Row`]s sharing one declared column set.
//! It is built once per uploaded file and never mutated afterwards: every stage
//! (normalization, filtering) returns a new dataset. Rows remember their
//! position in the uploaded file so a filtered subset can always be traced back
//! to the rows it came from.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::{InsightError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    /// 0-based position of the row in the uploaded file.
    pub id: usize,
    pub cells: Vec<Option<String>>,
}

impl Row {
    pub fn new(id: usize, cells: Vec<Option<String>>) -> Self {
        Self { id, cells }
    }

    pub fn get(&self, column: usize) -> Option<&str> {
        self.cells.get(column).and_then(|cell| cell.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Builds a dataset, rejecting rows whose width differs from `columns`.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        for row in &rows {
            if row.cells.len() != columns.len() {
                return Err(InsightError::RaggedRow {
                    row: row.id,
                    expected: columns.len(),
                    found: row.cells.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Builds a dataset from raw cells, numbering rows in order.
    /// Empty strings are kept as text; use [`Dataset::from_records`] for loader
    /// semantics where an empty cell is null.
    pub fn from_cells(columns: Vec<String>, cells: Vec<Vec<Option<String>>>) -> Result<Self> {
        let rows = cells
            .into_iter()
            .enumerate()
            .map(|(id, cells)| Row::new(id, cells))
            .collect();
        Self::new(columns, rows)
    }

    /// Builds a dataset from string records the way a loader sees them: an
    /// empty field becomes a null cell.
    pub fn from_records<S, R>(columns: &[S], records: impl IntoIterator<Item = R>) -> Result<Self>
    where
        S: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        let columns = columns
            .iter()
            .map(|c| c.as_ref().to_string())
            .collect::<Vec<_>>();
        let cells = records
            .into_iter()
            .map(|record| {
                record
                    .into_iter()
                    .map(|field| {
                        let field = field.as_ref();
                        (!field.is_empty()).then(|| field.to_string())
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        Self::from_cells(columns, cells)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| InsightError::UnknownColumn {
                column: name.to_string(),
            })
    }

    /// Row ids in order, handy for comparing subsets.
    pub fn row_ids(&self) -> Vec<usize> {
        self.rows.iter().map(|row| row.id).collect()
    }

    /// Values of one column in row order.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        self.rows.iter().map(move |row| row.get(column))
    }

    /// Same columns, only the rows whose mask entry is `true`.
    pub fn select(&self, mask: &[bool]) -> Dataset {
        let rows = self
            .rows
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(row, _)| row.clone())
            .collect();
        Dataset {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Same rows with each cell of the listed columns rewritten by `f`.
    pub(crate) fn map_columns<F>(&self, columns: &[usize], mut f: F) -> Dataset
    where
        F: FnMut(Option<&str>) -> Option<String>,
    {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = row.cells.clone();
                for &column in columns {
                    if let Some(cell) = cells.get_mut(column) {
                        *cell = f(cell.as_deref());
                    }
                }
                Row::new(row.id, cells)
            })
            .collect();
        Dataset {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Tabular shape used for export and rendering: headers plus display
    /// strings, null cells rendered empty.
    pub fn to_table(&self) -> (Vec<String>, Vec<Vec<String>>) {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .map(|cell| cell.clone().unwrap_or_default())
                    .collect()
            })
            .collect();
        (self.columns.clone(), rows)
    }
}

/// Text a cell contributes to categorical grouping. Null groups with empty.
pub fn display_value(cell: Option<&str>) -> &str {
    cell.unwrap_or("")
}

pub fn parse_naive_date(value: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"];
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.date())
        })
}

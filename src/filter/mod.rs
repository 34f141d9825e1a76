//! Filter dimensions, per-session selections and the filter engine.
//!
//! A [`FilterDimension`] is static configuration: one filterable column
//! with its display label and the group it is shown under. A
//! [`FilterSelection`] is the per-session state: for each dimension, the
//! set of values the user picked. An empty set means "no restriction".
//!
//! Filtering is conjunctive across dimensions and disjunctive within one:
//!
//! ```text
//! company  in {A, B}   AND
//! band     in {2}      AND
//! zone     (empty)     -> no constraint
//! ```

mod engine;

pub use engine::{DimensionChoices, DimensionGroup, FilterEngine};

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::Value;

/// Errors raised while editing a selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Unknown filter dimension: {0}")]
    UnknownDimension(String),

    #[error("Invalid filter '{0}': expected column=value")]
    InvalidArgument(String),
}

/// A filterable column plus its display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDimension {
    pub column: String,
    pub label: String,
    pub group: String,
}

impl FilterDimension {
    pub fn new(
        column: impl Into<String>,
        label: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            label: label.into(),
            group: group.into(),
        }
    }
}

/// The stock HR dimensions: organization slices first, then workforce.
pub fn default_dimensions() -> Vec<FilterDimension> {
    vec![
        FilterDimension::new("company", "Company", "org"),
        FilterDimension::new("business_unit", "Business Unit", "org"),
        FilterDimension::new("area", "Area", "org"),
        FilterDimension::new("department", "Department", "org"),
        FilterDimension::new("employment_type", "Employment Type", "workforce"),
        FilterDimension::new("zone", "Zone", "workforce"),
        FilterDimension::new("function", "Function", "workforce"),
        FilterDimension::new("band", "Band", "workforce"),
    ]
}

/// Display title for a dimension group key.
pub fn group_title(group: &str) -> &str {
    match group {
        "org" => "Organization",
        "workforce" => "Workforce",
        other => other,
    }
}

/// Selected values per dimension column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    selected: BTreeMap<String, BTreeSet<Value>>,
}

impl FilterSelection {
    /// All-empty selection over the given dimensions.
    pub fn empty_for(dimensions: &[FilterDimension]) -> Self {
        Self {
            selected: dimensions
                .iter()
                .map(|d| (d.column.clone(), BTreeSet::new()))
                .collect(),
        }
    }

    /// Add `value` to the selection for `column`.
    pub fn select(&mut self, column: impl Into<String>, value: Value) {
        self.selected.entry(column.into()).or_default().insert(value);
    }

    /// Remove `value` from the selection for `column`.
    ///
    /// Returns whether the value was selected.
    pub fn deselect(&mut self, column: &str, value: &Value) -> bool {
        self.selected
            .get_mut(column)
            .is_some_and(|values| values.remove(value))
    }

    /// Replace the selection for `column`.
    pub fn set<I>(&mut self, column: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = Value>,
    {
        self.selected
            .insert(column.into(), values.into_iter().collect());
    }

    /// Empty every dimension's selection, keeping the dimensions known.
    pub fn clear(&mut self) {
        for values in self.selected.values_mut() {
            values.clear();
        }
    }

    /// Selected values for `column`, if the column has an entry.
    pub fn values(&self, column: &str) -> Option<&BTreeSet<Value>> {
        self.selected.get(column)
    }

    /// Whether no dimension constrains anything.
    pub fn is_empty(&self) -> bool {
        self.selected.values().all(BTreeSet::is_empty)
    }

    /// Dimensions with a non-empty selection.
    pub fn active(&self) -> impl Iterator<Item = (&str, &BTreeSet<Value>)> {
        self.selected
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(column, values)| (column.as_str(), values))
    }
}

/// Parse a `column=value` argument. The value is typed like a data cell,
/// so `band=2` selects the number 2.
pub fn parse_filter_arg(arg: &str) -> Result<(String, Value), FilterError> {
    let (column, raw) = arg
        .split_once('=')
        .ok_or_else(|| FilterError::InvalidArgument(arg.to_string()))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(FilterError::InvalidArgument(arg.to_string()));
    }
    Ok((column.to_string(), Value::parse(raw)))
}

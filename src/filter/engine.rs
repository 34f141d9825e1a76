// src/filter/engine.rs
use std::collections::BTreeSet;

use serde::Serialize;

use super::{default_dimensions, group_title, FilterDimension, FilterError, FilterSelection};
use crate::data::{Dataset, DatasetCollection, Value};

/// One dimension with the values a user can pick from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionChoices {
    pub column: String,
    pub label: String,
    pub values: Vec<Value>,
}

/// Dimensions shown together under one heading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionGroup {
    pub key: String,
    pub title: String,
    pub dimensions: Vec<DimensionChoices>,
}

/// Applies a [`FilterSelection`] over a fixed set of dimensions.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    dimensions: Vec<FilterDimension>,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new(default_dimensions())
    }
}

impl FilterEngine {
    pub fn new(dimensions: Vec<FilterDimension>) -> Self {
        Self { dimensions }
    }

    pub fn dimensions(&self) -> &[FilterDimension] {
        &self.dimensions
    }

    pub fn dimension(&self, column: &str) -> Option<&FilterDimension> {
        self.dimensions.iter().find(|d| d.column == column)
    }

    /// Sorted distinct non-null values of `column`.
    pub fn distinct_values(&self, dataset: &Dataset, column: &str) -> Vec<Value> {
        dataset
            .column_values(column)
            .filter(|v| !v.is_null())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Records matching every configured dimension that has a non-empty
    /// selection. The input is left untouched and record order is kept.
    pub fn apply_filters(&self, dataset: &Dataset, selection: &FilterSelection) -> Dataset {
        let constraints: Vec<(&str, &BTreeSet<Value>)> = self
            .dimensions
            .iter()
            .filter_map(|d| {
                selection
                    .values(&d.column)
                    .filter(|values| !values.is_empty())
                    .map(|values| (d.column.as_str(), values))
            })
            .collect();

        if constraints.is_empty() {
            return dataset.clone();
        }

        dataset.filter(|record| {
            constraints
                .iter()
                .all(|(column, values)| values.contains(record.get(column)))
        })
    }

    /// Copy of `collection` with `dataset_name` filtered. Other datasets
    /// pass through unchanged; a missing dataset is not an error.
    pub fn apply_to_collection(
        &self,
        collection: &DatasetCollection,
        dataset_name: &str,
        selection: &FilterSelection,
    ) -> DatasetCollection {
        collection
            .iter()
            .map(|(name, dataset)| {
                let dataset = if name == dataset_name {
                    self.apply_filters(dataset, selection)
                } else {
                    dataset.clone()
                };
                (name.to_string(), dataset)
            })
            .collect()
    }

    /// The all-empty selection over this engine's dimensions.
    pub fn reset_selection(&self) -> FilterSelection {
        FilterSelection::empty_for(&self.dimensions)
    }

    /// Add a value to `selection`, rejecting columns that are not dimensions.
    pub fn select(
        &self,
        selection: &mut FilterSelection,
        column: &str,
        value: Value,
    ) -> Result<(), FilterError> {
        if self.dimension(column).is_none() {
            return Err(FilterError::UnknownDimension(column.to_string()));
        }
        selection.select(column, value);
        Ok(())
    }

    /// Dimension choices drawn from `dataset`, grouped in the order the
    /// groups first appear in the configuration.
    pub fn choices(&self, dataset: &Dataset) -> Vec<DimensionGroup> {
        let mut groups: Vec<DimensionGroup> = Vec::new();
        for dim in &self.dimensions {
            let choices = DimensionChoices {
                column: dim.column.clone(),
                label: dim.label.clone(),
                values: self.distinct_values(dataset, &dim.column),
            };
            match groups.iter_mut().find(|g| g.key == dim.group) {
                Some(group) => group.dimensions.push(choices),
                None => groups.push(DimensionGroup {
                    key: dim.group.clone(),
                    title: group_title(&dim.group).to_string(),
                    dimensions: vec![choices],
                }),
            }
        }
        groups
    }
}

//! Tabular data model and the cached data store.
//!
//! A data source is a directory of tabular files. Each recognized file
//! becomes one [`Dataset`] in a [`DatasetCollection`], keyed by its file
//! stem (`employee.csv` -> `employee`).
//!
//! ```text
//! data/
//!   employee.csv   -> "employee"
//!   payroll.tsv    -> "payroll"
//!   README.md      (skipped)
//! ```

mod source;
mod store;
mod value;

pub use source::{load_collection, read_dataset};
pub use store::DataStore;
pub use value::Value;

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a data source.
///
/// Every variant names the path that failed.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("Data source is not a readable directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Malformed data file {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },
}

/// Result type for data loading.
pub type DataResult<T> = Result<T, DataLoadError>;

/// Errors raised when a row does not fit its dataset's columns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row has {actual} values but dataset has {expected} columns")]
pub struct SchemaError {
    pub expected: usize,
    pub actual: usize,
}

static NULL: Value = Value::Null;

/// One row: column name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    /// Value of `column`; absent columns read as null.
    pub fn get(&self, column: &str) -> &Value {
        self.values.get(column).unwrap_or(&NULL)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// An ordered collection of records sharing one column set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    /// Create an empty dataset with the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            records: Vec::new(),
        }
    }

    /// Append a row given positionally in column order.
    pub fn push_row(&mut self, values: Vec<Value>) -> Result<(), SchemaError> {
        if values.len() != self.columns.len() {
            return Err(SchemaError {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        let record = self.columns.iter().cloned().zip(values).collect();
        self.records.push(record);
        Ok(())
    }

    /// Builder form of [`Dataset::push_row`].
    pub fn with_row(mut self, values: Vec<Value>) -> Result<Self, SchemaError> {
        self.push_row(values)?;
        Ok(self)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of one column in record order.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.records.iter().map(move |r| r.get(column))
    }

    /// New dataset with the same columns holding the records that match.
    pub fn filter<F>(&self, mut keep: F) -> Dataset
    where
        F: FnMut(&Record) -> bool,
    {
        Dataset {
            columns: self.columns.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

/// Named datasets loaded from one data source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetCollection {
    datasets: BTreeMap<String, Dataset>,
}

impl DatasetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.datasets.get(name)
    }

    /// Insert or replace a dataset, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, dataset: Dataset) -> Option<Dataset> {
        self.datasets.insert(name.into(), dataset)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.datasets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl FromIterator<(String, Dataset)> for DatasetCollection {
    fn from_iter<I: IntoIterator<Item = (String, Dataset)>>(iter: I) -> Self {
        Self {
            datasets: iter.into_iter().collect(),
        }
    }
}

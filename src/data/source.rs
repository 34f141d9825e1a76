// src/data/source.rs
//! Directory-of-files data source.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{DataLoadError, DataResult, Dataset, DatasetCollection, Value};

/// Field delimiter for a recognized tabular file, `None` for anything else.
fn delimiter_for(path: &Path) -> Option<u8> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "csv" => Some(b','),
        "tsv" => Some(b'\t'),
        _ => None,
    }
}

/// Read one delimited file into a dataset.
///
/// The first row is the header. Every later row must have exactly as many
/// fields as the header; cells are typed with [`Value::parse`].
pub fn read_dataset(path: &Path, delimiter: u8) -> DataResult<Dataset> {
    let csv_err = |source: csv::Error| DataLoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(csv_err)?;

    let headers = reader.headers().map_err(csv_err)?.clone();
    let mut seen = HashSet::new();
    for header in headers.iter() {
        if header.is_empty() {
            return Err(DataLoadError::Malformed {
                path: path.to_path_buf(),
                message: "empty column name in header".to_string(),
            });
        }
        if !seen.insert(header) {
            return Err(DataLoadError::Malformed {
                path: path.to_path_buf(),
                message: format!("duplicate column '{}'", header),
            });
        }
    }

    let mut dataset = Dataset::new(headers.iter());
    for row in reader.records() {
        let row = row.map_err(csv_err)?;
        let values = row.iter().map(Value::parse).collect();
        dataset
            .push_row(values)
            .map_err(|e| DataLoadError::Malformed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
    }

    debug!(
        path = %path.display(),
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "read dataset"
    );
    Ok(dataset)
}

/// Load every recognized file in `dir` into a collection.
///
/// Files are visited in name order. A failure on any file fails the whole
/// load; no partial collection is returned.
pub fn load_collection(dir: &Path) -> DataResult<DatasetCollection> {
    if !dir.is_dir() {
        return Err(DataLoadError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| DataLoadError::Io { path, source }
    };

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err(dir))? {
        let path = entry.map_err(io_err(dir))?.path();
        if path.is_file() && delimiter_for(&path).is_some() {
            files.push(path);
        }
    }
    files.sort();

    let mut collection = DatasetCollection::new();
    for path in files {
        let (Some(delimiter), Some(name)) = (
            delimiter_for(&path),
            path.file_stem().and_then(|s| s.to_str()),
        ) else {
            continue;
        };

        if collection.contains(name) {
            return Err(DataLoadError::Malformed {
                path: path.clone(),
                message: format!("dataset '{}' is defined by more than one file", name),
            });
        }

        let dataset = read_dataset(&path, delimiter)?;
        collection.insert(name, dataset);
    }

    info!(
        source = %dir.display(),
        datasets = collection.len(),
        "loaded data source"
    );
    Ok(collection)
}

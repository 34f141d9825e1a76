// src/report/registry.rs
//! Report discovery and the identifier -> handler table.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use super::{Report, ReportIdentifier, ScriptReport};

/// Extension of script report units.
pub const DEFAULT_EXTENSION: &str = "lua";

/// Errors raised while scanning the report directory.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Report directory not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read report directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn normalize_extension(extension: &str) -> &str {
    extension.trim_start_matches('.')
}

/// Identifiers of the report units in `dir`, sorted.
///
/// A unit is a regular file whose extension equals `extension` (compared
/// case-sensitively, leading dot optional). Everything else is skipped.
pub fn discover(dir: &Path, extension: &str) -> Result<Vec<ReportIdentifier>, DiscoveryError> {
    Ok(scan(dir, extension)?.into_keys().collect())
}

fn scan(dir: &Path, extension: &str) -> Result<BTreeMap<ReportIdentifier, PathBuf>, DiscoveryError> {
    if !dir.is_dir() {
        return Err(DiscoveryError::NotFound {
            path: dir.to_path_buf(),
        });
    }
    let io_err = |source| DiscoveryError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let extension = normalize_extension(extension);
    let mut units = BTreeMap::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        units.insert(ReportIdentifier::new(stem), path.clone());
    }

    debug!(dir = %dir.display(), count = units.len(), "discovered report units");
    Ok(units)
}

/// Identifier -> report handler table, built at startup.
///
/// Identifiers are unique: registering an identifier that is already bound
/// replaces the earlier handler and logs a warning.
#[derive(Clone, Default)]
pub struct ReportRegistry {
    handlers: BTreeMap<ReportIdentifier, Arc<dyn Report>>,
}

impl ReportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding one [`ScriptReport`] per unit found in `dir`.
    pub fn from_dir(dir: &Path, extension: &str) -> Result<Self, DiscoveryError> {
        let mut registry = Self::new();
        registry.extend_from_dir(dir, extension)?;
        Ok(registry)
    }

    /// Bind every unit found in `dir`, after whatever is already registered.
    pub fn extend_from_dir(&mut self, dir: &Path, extension: &str) -> Result<(), DiscoveryError> {
        for (id, path) in scan(dir, extension)? {
            self.register(id, Arc::new(ScriptReport::new(path)));
        }
        Ok(())
    }

    /// Bind `id` to `handler`; the later registration wins.
    pub fn register(&mut self, id: impl Into<ReportIdentifier>, handler: Arc<dyn Report>) {
        let id = id.into();
        if self.handlers.contains_key(&id) {
            warn!(report = %id, "report identifier registered twice; keeping the later one");
        }
        self.handlers.insert(id, handler);
    }

    pub fn resolve(&self, id: &ReportIdentifier) -> Option<Arc<dyn Report>> {
        self.handlers.get(id).cloned()
    }

    pub fn contains(&self, id: &ReportIdentifier) -> bool {
        self.handlers.contains_key(id)
    }

    /// Every bound identifier, sorted.
    pub fn identifiers(&self) -> Vec<ReportIdentifier> {
        self.handlers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for ReportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(self.handlers.keys().map(ReportIdentifier::as_str))
            .finish()
    }
}

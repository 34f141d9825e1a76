//! Pluggable reports.
//!
//! A report is anything implementing [`Report`]: it consumes a (filtered)
//! [`DatasetCollection`] and writes [`Element`]s to a [`RenderSurface`].
//! Two kinds exist:
//!
//! - **Script units** - `*.lua` files in the report directory exposing a
//!   global `render(data, params)` function, run by [`ScriptReport`].
//! - **Built-ins** - native trait objects registered at startup.
//!
//! ```text
//! ReportRegistry::from_dir ──► { id -> Arc<dyn Report> }
//!                                       │
//! ReportDispatcher::render(id, data) ───┘──► Result<(), ReportRenderError>
//! ```

pub mod builtin;
mod dispatch;
mod lua;
mod registry;
mod surface;

pub use dispatch::{ReportDispatcher, ReportRenderError};
pub use lua::ScriptReport;
pub use registry::{discover, DiscoveryError, ReportRegistry, DEFAULT_EXTENSION};
pub use surface::{Element, RecordingSurface, RenderSurface, TextSurface};

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::data::DatasetCollection;

/// Free-form parameters passed to a report (`employee_id=1042`).
pub type Params = BTreeMap<String, String>;

/// Name of a report unit: its file name without the extension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ReportIdentifier(String);

impl ReportIdentifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReportIdentifier {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ReportIdentifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What a report receives for one render.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub data: &'a DatasetCollection,
    pub params: &'a Params,
}

/// Errors raised by a report unit.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report not found")]
    NotFound,

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lua error in {file}: {message}")]
    Lua { file: String, message: String },

    #[error("{file} does not define a render(data) function")]
    MissingEntryPoint { file: String },

    #[error("{0}")]
    Failed(String),

    #[error("report panicked: {0}")]
    Panicked(String),
}

impl ReportError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// A unit of presentation logic.
pub trait Report: Send + Sync {
    /// Render `ctx.data` onto `surface`.
    ///
    /// Reports may copy and reshape the data they receive; nothing they do
    /// is visible to the host or to other reports.
    fn render(
        &self,
        ctx: &ReportContext<'_>,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), ReportError>;
}

impl<F> Report for F
where
    F: Fn(&ReportContext<'_>, &mut dyn RenderSurface) -> Result<(), ReportError> + Send + Sync,
{
    fn render(
        &self,
        ctx: &ReportContext<'_>,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), ReportError> {
        self(ctx, surface)
    }
}

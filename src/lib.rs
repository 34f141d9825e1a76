//! # Worklens
//!
//! An HR analytics dashboard pipeline: load tabular workforce data once,
//! slice it with per-session filters, and hand the slice to pluggable
//! reports.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Data directory (CSV / TSV files)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [DataStore - memoized, shared]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  DatasetCollection                       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [FilterEngine + Session selection]
//! ┌─────────────────────────────────────────────────────────┐
//! │              Filtered DatasetCollection                  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [ReportDispatcher - failure isolated]
//! ┌─────────────────────────────────────────────────────────┐
//! │     Report (Lua unit or built-in) ──► RenderSurface      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`dashboard`] module drives one user interaction through this
//! pipeline; the CLI and the optional web server are thin shells over it.

pub mod config;
pub mod dashboard;
pub mod data;
pub mod filter;
pub mod report;

#[cfg(feature = "ui")]
pub mod web;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::dashboard::{
        Authenticator, ConfiguredUsers, CycleOutcome, CycleState, Dashboard, DashboardError,
        Request, Session,
    };
    pub use crate::data::{DataLoadError, DataStore, Dataset, DatasetCollection, Record, Value};
    pub use crate::filter::{FilterDimension, FilterEngine, FilterSelection};
    pub use crate::report::{
        discover, Element, RecordingSurface, RenderSurface, Report, ReportContext,
        ReportDispatcher, ReportError, ReportIdentifier, ReportRegistry, ReportRenderError,
        TextSurface,
    };
}

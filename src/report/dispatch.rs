// src/report/dispatch.rs
//! Failure-isolating report dispatch.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::{debug, error};

use super::{
    Params, RecordingSurface, RenderSurface, ReportContext, ReportError, ReportIdentifier,
    ReportRegistry,
};
use crate::data::DatasetCollection;

/// A report failed to render. Carries the report's identifier and cause.
#[derive(Debug, Error)]
#[error("Failed to load report '{identifier}': {cause}")]
pub struct ReportRenderError {
    pub identifier: ReportIdentifier,
    #[source]
    pub cause: ReportError,
}

/// Runs one report per call against a registry.
///
/// Every failure of the report unit (including panics in native reports)
/// is returned as a [`ReportRenderError`]. Report output is staged and
/// only reaches the caller's surface when the report completes, so a
/// failed render leaves nothing half-drawn.
#[derive(Debug, Clone, Default)]
pub struct ReportDispatcher {
    registry: ReportRegistry,
}

impl ReportDispatcher {
    pub fn new(registry: ReportRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ReportRegistry {
        &self.registry
    }

    /// Render `id` with no parameters.
    pub fn render(
        &self,
        id: &ReportIdentifier,
        data: &DatasetCollection,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), ReportRenderError> {
        self.render_with_params(id, data, &Params::new(), surface)
    }

    pub fn render_with_params(
        &self,
        id: &ReportIdentifier,
        data: &DatasetCollection,
        params: &Params,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), ReportRenderError> {
        let fail = |cause: ReportError| {
            error!(report = %id, error = %cause, "report render failed");
            ReportRenderError {
                identifier: id.clone(),
                cause,
            }
        };

        let handler = self.registry.resolve(id).ok_or_else(|| fail(ReportError::NotFound))?;
        let ctx = ReportContext { data, params };

        debug!(report = %id, "dispatching report");
        let mut staged = RecordingSurface::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.render(&ctx, &mut staged)));

        match outcome {
            Ok(Ok(())) => {
                staged.replay_into(surface);
                Ok(())
            }
            Ok(Err(cause)) => Err(fail(cause)),
            Err(payload) => Err(fail(ReportError::Panicked(panic_message(payload.as_ref())))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

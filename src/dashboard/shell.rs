// src/dashboard/shell.rs
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::{Authenticator, ConfiguredUsers, CycleState, Request, Session};
use crate::config::{BrandingSettings, Settings, SettingsError};
use crate::data::{DataLoadError, DataResult, Dataset, DataStore, DatasetCollection};
use crate::filter::FilterEngine;
use crate::report::{
    builtin, Element, RenderSurface, ReportDispatcher, ReportIdentifier, ReportRegistry,
    ReportRenderError,
};

/// Errors that end a cycle early.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Config(#[from] SettingsError),

    #[error(transparent)]
    Data(#[from] DataLoadError),
}

/// What one cycle did.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The session is not authenticated; nothing else ran.
    LoginRequired,

    /// The cycle ran to its footer.
    Completed {
        /// Report dispatched, if any was available.
        report: Option<ReportIdentifier>,
        /// Records of the primary dataset left after filtering.
        filtered_records: usize,
        /// Why the report failed, when it did.
        failure: Option<ReportRenderError>,
    },
}

impl CycleOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(
            self,
            CycleOutcome::Completed {
                report: Some(_),
                failure: None,
                ..
            }
        )
    }
}

/// Drives sessions through the load, filter and dispatch pipeline.
pub struct Dashboard {
    data_dir: PathBuf,
    primary_dataset: String,
    store: Arc<DataStore>,
    engine: FilterEngine,
    dispatcher: ReportDispatcher,
    branding: BrandingSettings,
    authenticator: Arc<dyn Authenticator>,
    discovery_error: Option<String>,
}

impl Dashboard {
    /// Dashboard over `data_dir` with default filters, branding and an
    /// open authenticator, backed by the global data store.
    pub fn new(data_dir: impl Into<PathBuf>, dispatcher: ReportDispatcher) -> Self {
        Self {
            data_dir: data_dir.into(),
            primary_dataset: "employee".to_string(),
            store: DataStore::global(),
            engine: FilterEngine::default(),
            dispatcher,
            branding: BrandingSettings::default(),
            authenticator: Arc::new(ConfiguredUsers::default()),
            discovery_error: None,
        }
    }

    /// Build the dashboard described by `settings`.
    ///
    /// An unreadable report directory is not fatal: the dashboard keeps the
    /// built-in reports and shows the discovery error on every cycle.
    pub fn from_settings(settings: &Settings) -> Result<Self, DashboardError> {
        let primary = settings.data.primary_dataset.clone();

        let mut registry = ReportRegistry::new();
        if settings.reports.builtins {
            builtin::register_all(&mut registry, &primary);
        }

        let report_dir = settings.report_dir()?;
        let discovery_error = match registry.extend_from_dir(&report_dir, &settings.reports.extension)
        {
            Ok(()) => None,
            Err(e) => {
                warn!(dir = %report_dir.display(), error = %e, "report discovery failed");
                Some(e.to_string())
            }
        };
        info!(reports = registry.len(), "report registry ready");

        let mut dashboard = Self::new(settings.data_dir()?, ReportDispatcher::new(registry))
            .with_primary_dataset(primary)
            .with_filter_engine(FilterEngine::new(settings.filter_dimensions()))
            .with_branding(settings.branding.clone())
            .with_authenticator(Arc::new(ConfiguredUsers::new(settings.auth.users.clone())));
        dashboard.discovery_error = discovery_error;
        Ok(dashboard)
    }

    pub fn with_store(mut self, store: Arc<DataStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_primary_dataset(mut self, name: impl Into<String>) -> Self {
        self.primary_dataset = name.into();
        self
    }

    pub fn with_filter_engine(mut self, engine: FilterEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_branding(mut self, branding: BrandingSettings) -> Self {
        self.branding = branding;
        self
    }

    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn primary_dataset(&self) -> &str {
        &self.primary_dataset
    }

    pub fn filter_engine(&self) -> &FilterEngine {
        &self.engine
    }

    pub fn dispatcher(&self) -> &ReportDispatcher {
        &self.dispatcher
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    /// Report discovery failure recorded at startup.
    pub fn discovery_error(&self) -> Option<&str> {
        self.discovery_error.as_deref()
    }

    /// A fresh session with nothing selected.
    pub fn new_session(&self) -> Session {
        Session::new(self.engine.reset_selection())
    }

    /// Load the (memoized) data collection.
    pub fn load_data(&self) -> DataResult<Arc<DatasetCollection>> {
        self.store.load(&self.data_dir)
    }

    /// Run one interaction for `session`, drawing onto `surface`.
    ///
    /// A report failure is shown on the surface and recorded in the outcome;
    /// the session stays usable. A data load failure is shown and returned.
    pub fn run_cycle(
        &self,
        session: &mut Session,
        request: &Request,
        surface: &mut dyn RenderSurface,
    ) -> Result<CycleOutcome, DashboardError> {
        session.enter(CycleState::Idle);

        if request.logout_requested() {
            info!(session = %session.id(), "logout requested");
            self.authenticator.logout(session);
        }
        if !self.authenticator.is_logged_in(session) {
            surface.emit(Element::LoginRequired);
            return Ok(CycleOutcome::LoginRequired);
        }

        surface.emit(Element::Header {
            brand: self.branding.name.clone(),
            tagline: self.branding.tagline.clone(),
            help_url: self.branding.help_url.clone(),
        });

        let data = match self.load_data() {
            Ok(data) => data,
            Err(e) => {
                surface.error(&e.to_string());
                return Err(e.into());
            }
        };
        session.enter(CycleState::DataReady);

        if let Some(message) = &self.discovery_error {
            surface.error(message);
        }

        let report = self.resolve_selected(session, request);
        surface.emit(Element::Navigation {
            reports: self
                .dispatcher
                .registry()
                .identifiers()
                .into_iter()
                .map(|id| id.to_string())
                .collect(),
            selected: report.as_ref().map(ToString::to_string),
        });

        if request.reset_requested() {
            *session.selection_mut() = self.engine.reset_selection();
        }
        let empty = Dataset::default();
        let people = data.get(&self.primary_dataset).unwrap_or(&empty);
        surface.filters(self.engine.choices(people), session.selection());

        let filtered =
            self.engine
                .apply_to_collection(&data, &self.primary_dataset, session.selection());
        let filtered_records = filtered.get(&self.primary_dataset).map_or(0, Dataset::len);
        session.enter(CycleState::FilterApplied);

        let failure = match &report {
            Some(id) => {
                session.enter(CycleState::Dispatching);
                match self.dispatcher.render_with_params(
                    id,
                    &filtered,
                    &request.report_params(),
                    surface,
                ) {
                    Ok(()) => {
                        session.enter(CycleState::RenderedOk);
                        None
                    }
                    Err(e) => {
                        surface.error(&e.to_string());
                        session.enter(CycleState::RenderFailed);
                        Some(e)
                    }
                }
            }
            None => {
                surface.warning("No reports available.");
                None
            }
        };

        surface.emit(Element::Footer);
        Ok(CycleOutcome::Completed {
            report,
            filtered_records,
            failure,
        })
    }

    /// The request's pick, else the session's if still registered, else the
    /// first report. A registered pick is stored back into the session; an
    /// unregistered request is returned as-is so dispatch reports it missing.
    fn resolve_selected(&self, session: &mut Session, request: &Request) -> Option<ReportIdentifier> {
        let registry = self.dispatcher.registry();
        if let Some(requested) = request.report() {
            if registry.contains(&requested) {
                session.select_report(requested.clone());
            }
            return Some(requested);
        }
        let picked = session
            .selected_report()
            .cloned()
            .filter(|id| registry.contains(id))
            .or_else(|| registry.identifiers().into_iter().next());
        if let Some(id) = &picked {
            session.select_report(id.clone());
        }
        picked
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("data_dir", &self.data_dir)
            .field("primary_dataset", &self.primary_dataset)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

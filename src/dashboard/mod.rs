//! The interactive dashboard: sessions, authentication and the request cycle.
//!
//! Each user interaction runs one cycle against the user's own [`Session`]:
//!
//! ```text
//! logout? ─► auth gate ─► header ─► load ─► navigation ─► filter panel
//!                                                             │
//!                 footer ◄── dispatch ◄── apply filters ◄─────┘
//! ```
//!
//! Nothing inside a session is shared with other sessions; the only
//! cross-session state is the read-only [`DataStore`](crate::data::DataStore)
//! cache.

mod shell;

pub use shell::{CycleOutcome, Dashboard, DashboardError};

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::filter::FilterSelection;
use crate::report::{Params, ReportIdentifier};

/// Where a session is within its current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleState {
    #[default]
    Idle,
    DataReady,
    FilterApplied,
    Dispatching,
    RenderedOk,
    RenderFailed,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleState::Idle => "idle",
            CycleState::DataReady => "data_ready",
            CycleState::FilterApplied => "filter_applied",
            CycleState::Dispatching => "dispatching",
            CycleState::RenderedOk => "rendered_ok",
            CycleState::RenderFailed => "render_failed",
        };
        f.write_str(name)
    }
}

/// One user's isolated interaction context.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    user: Option<String>,
    selection: FilterSelection,
    selected_report: Option<ReportIdentifier>,
    state: CycleState,
}

impl Session {
    pub fn new(selection: FilterSelection) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: None,
            selection,
            selected_report: None,
            state: CycleState::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Record `user` as signed in. Called by an [`Authenticator`].
    pub fn sign_in(&mut self, user: impl Into<String>) {
        self.user = Some(user.into());
    }

    /// Forget the user and everything they picked.
    pub fn sign_out(&mut self) {
        self.user = None;
        self.selection.clear();
        self.selected_report = None;
        self.state = CycleState::Idle;
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut FilterSelection {
        &mut self.selection
    }

    pub fn selected_report(&self) -> Option<&ReportIdentifier> {
        self.selected_report.as_ref()
    }

    pub fn select_report(&mut self, id: impl Into<ReportIdentifier>) {
        self.selected_report = Some(id.into());
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub(crate) fn enter(&mut self, state: CycleState) {
        debug!(session = %self.id, from = %self.state, to = %state, "cycle transition");
        self.state = state;
    }
}

/// Errors raised while signing a user in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("User name must not be empty")]
    EmptyUser,

    #[error("Unknown user: {0}")]
    UnknownUser(String),
}

/// Decides who may use the dashboard.
pub trait Authenticator: Send + Sync {
    fn login(&self, session: &mut Session, user: &str) -> Result<(), AuthError>;

    fn is_logged_in(&self, session: &Session) -> bool;

    fn logout(&self, session: &mut Session) {
        session.sign_out();
    }
}

/// Admits the users named in the configuration. An empty list admits any
/// non-empty user name.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredUsers {
    users: BTreeSet<String>,
}

impl ConfiguredUsers {
    pub fn new<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            users: users.into_iter().map(Into::into).collect(),
        }
    }

    fn admits(&self, user: &str) -> bool {
        self.users.is_empty() || self.users.contains(user)
    }
}

impl Authenticator for ConfiguredUsers {
    fn login(&self, session: &mut Session, user: &str) -> Result<(), AuthError> {
        let user = user.trim();
        if user.is_empty() {
            return Err(AuthError::EmptyUser);
        }
        if !self.admits(user) {
            return Err(AuthError::UnknownUser(user.to_string()));
        }
        session.sign_in(user);
        Ok(())
    }

    fn is_logged_in(&self, session: &Session) -> bool {
        session.user().is_some_and(|user| self.admits(user))
    }
}

/// Query parameters of one interaction.
///
/// `report`, `logout` and `reset_filters` steer the shell; every other
/// parameter is handed to the report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    params: Params,
}

const RESERVED: &[&str] = &["report", "logout", "reset_filters"];

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_params(params: Params) -> Self {
        Self { params }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn logout_requested(&self) -> bool {
        self.flag("logout")
    }

    pub fn reset_requested(&self) -> bool {
        self.flag("reset_filters")
    }

    /// Report picked by this request, if any.
    pub fn report(&self) -> Option<ReportIdentifier> {
        self.get("report")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ReportIdentifier::from)
    }

    /// Parameters meant for the report itself.
    pub fn report_params(&self) -> Params {
        self.params
            .iter()
            .filter(|(key, _)| !RESERVED.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1")
    }
}

//! Reports compiled into the binary.
//!
//! | id | report |
//! |----|--------|
//! | `workforce_overview` | headcount KPIs and per-company breakdown |
//! | `talent_profile` | one active employee's profile card |

mod overview;
mod profile;

pub use overview::WorkforceOverview;
pub use profile::{format_date, format_inr, TalentProfile};

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use super::ReportRegistry;
use crate::data::Record;

pub const WORKFORCE_OVERVIEW: &str = "workforce_overview";
pub const TALENT_PROFILE: &str = "talent_profile";

/// Register every built-in report, reading from `dataset`.
pub fn register_all(registry: &mut ReportRegistry, dataset: &str) {
    registry.register(WORKFORCE_OVERVIEW, Arc::new(WorkforceOverview::new(dataset)));
    registry.register(TALENT_PROFILE, Arc::new(TalentProfile::new(dataset)));
}

/// An employee is active until their exit date has passed.
pub(crate) fn is_active(record: &Record, today: NaiveDate) -> bool {
    match record.get("date_of_exit").as_date() {
        Some(exit) => exit > today,
        None => true,
    }
}

pub(crate) fn today(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Local::now().date_naive())
}

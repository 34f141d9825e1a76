// src/report/builtin/overview.rs
use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::{is_active, today};
use crate::data::Value;
use crate::report::{RenderSurface, Report, ReportContext, ReportError};

/// Headcount KPIs for the filtered workforce.
#[derive(Debug, Clone)]
pub struct WorkforceOverview {
    dataset: String,
    as_of: Option<NaiveDate>,
}

impl WorkforceOverview {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            as_of: None,
        }
    }

    /// Evaluate "active" against a fixed date instead of today.
    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }
}

impl Report for WorkforceOverview {
    fn render(
        &self,
        ctx: &ReportContext<'_>,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), ReportError> {
        surface.title("Workforce Overview", Some("Headcount across the selected slices"));

        let Some(people) = ctx.data.get(&self.dataset).filter(|ds| !ds.is_empty()) else {
            surface.warning("Employee data not available.");
            return Ok(());
        };

        let today = today(self.as_of);
        let mut by_company: BTreeMap<Value, (usize, usize)> = BTreeMap::new();
        let mut active = 0;
        for record in people.records() {
            let is_active = is_active(record, today);
            let entry = by_company.entry(record.get("company").clone()).or_default();
            entry.0 += 1;
            if is_active {
                entry.1 += 1;
                active += 1;
            }
        }

        surface.kpi("Headcount", &people.len().to_string());
        surface.kpi("Active", &active.to_string());
        surface.kpi("Exited", &(people.len() - active).to_string());

        let rows = by_company
            .into_iter()
            .map(|(company, (total, active))| {
                let company = if company.is_null() {
                    "Unassigned".to_string()
                } else {
                    company.to_string()
                };
                vec![company, total.to_string(), active.to_string()]
            })
            .collect();
        surface.table(
            vec![
                "Company".to_string(),
                "Headcount".to_string(),
                "Active".to_string(),
            ],
            rows,
        );
        Ok(())
    }
}

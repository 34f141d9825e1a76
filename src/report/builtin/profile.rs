// src/report/builtin/profile.rs
//! Employee profile card.
//!
//! Shows one active employee, picked with the `employee_id` parameter, as a
//! header plus labelled sections. Field values are formatted by key:
//!
//! | key contains | shown as |
//! |---|---|
//! | `ctc` | `₹ 12.5 Lakhs` |
//! | `date`, `promotion`, `transfer` | `05-Mar-2021` |
//! | `training` | `40 hrs` |
//! | `exp` (numeric) | `6 yrs` |

use chrono::NaiveDate;

use super::{is_active, today};
use crate::data::{Record, Value};
use crate::report::{RenderSurface, Report, ReportContext, ReportError};

const MISSING: &str = "-";

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Organizational Context",
        &[
            ("Company", "company"),
            ("Business Unit", "business_unit"),
            ("Department", "department"),
            ("Function", "function"),
            ("Zone", "zone"),
            ("Cluster", "cluster"),
            ("Area", "area"),
            ("Location", "location"),
        ],
    ),
    (
        "Tenure & Movement",
        &[
            ("Date of Joining", "date_of_joining"),
            ("Last Promotion", "last_promotion"),
            ("Last Transfer", "last_transfer"),
            ("Total Experience", "total_exp_yrs"),
            ("Previous Experience", "prev_exp_in_yrs"),
            ("Employment Type", "employment_type"),
        ],
    ),
    (
        "Compensation",
        &[
            ("Fixed CTC", "fixed_ctc_pa"),
            ("Variable CTC", "variable_ctc_pa"),
            ("Total CTC", "total_ctc_pa"),
        ],
    ),
    (
        "Performance & Potential",
        &[
            ("Satisfaction Score", "satisfaction_score"),
            ("Engagement Score", "engagement_score"),
            ("Rating 2025", "rating_25"),
            ("Rating 2024", "rating_24"),
            ("Top Talent", "Top Talent"),
            ("Succession Ready", "succession_ready"),
        ],
    ),
    (
        "Development & Learning",
        &[
            ("Learning Program", "learning_program"),
            ("Training Hours", "training_hours"),
        ],
    ),
    (
        "Competency & Skills",
        &[
            ("Competency", "competency"),
            ("Competency Details", "merged_competency"),
            ("Skills", "merged_skills"),
        ],
    ),
    (
        "Education & Background",
        &[
            ("Qualification", "qualification"),
            ("Highest Qualification", "highest_qualification"),
            ("Qualification Type", "qualification_type"),
            ("Previous Employers", "previous_employers"),
            ("Last Employer", "last_employer"),
            ("Employment Sector", "employment_sector"),
        ],
    ),
];

/// Amount in lakhs (1 lakh = 100,000), rounded to two decimals.
pub fn format_inr(amount: f64) -> String {
    let lakhs = (amount / 100_000.0 * 100.0).round() / 100.0;
    format!("₹ {} Lakhs", Value::Number(lakhs))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

fn format_age(born: NaiveDate, today: NaiveDate) -> String {
    let days = (today - born).num_days();
    format!("{} yrs", (days as f64 / 365.25).floor() as i64)
}

fn format_tenure(joined: NaiveDate, today: NaiveDate) -> String {
    let days = (today - joined).num_days().max(0);
    let years = days / 365;
    let months = (days % 365) / 30;
    if years > 0 {
        format!("{} yrs {} months", years, months)
    } else {
        format!("{} months", months)
    }
}

fn text_or_missing(value: &Value) -> String {
    if value.is_null() {
        MISSING.to_string()
    } else {
        value.to_string()
    }
}

fn join_present(record: &Record, columns: &[&str], separator: &str) -> Option<String> {
    let parts: Vec<String> = columns
        .iter()
        .map(|c| record.get(c).to_string().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(separator))
}

/// Display text for `key` of one employee record.
fn format_field(record: &Record, key: &str) -> String {
    match key {
        "merged_skills" => {
            return join_present(record, &["skills_1", "skills_2", "skills_3"], ", ")
                .unwrap_or_else(|| MISSING.to_string());
        }
        "merged_competency" => {
            return join_present(record, &["competency_type", "competency_level"], " - ")
                .unwrap_or_else(|| MISSING.to_string());
        }
        _ => {}
    }

    let value = record.get(key);
    if value.is_null() {
        return MISSING.to_string();
    }

    if key.contains("ctc") {
        return value
            .as_f64()
            .map(format_inr)
            .unwrap_or_else(|| MISSING.to_string());
    }
    if ["date", "promotion", "transfer"].iter().any(|k| key.contains(k)) {
        return value
            .as_date()
            .map(format_date)
            .unwrap_or_else(|| value.to_string());
    }
    if key.contains("training") {
        return format!("{} hrs", value);
    }
    if key.contains("exp") && value.as_f64().is_some() {
        return format!("{} yrs", value);
    }
    value.to_string()
}

/// Profile card for one active employee.
#[derive(Debug, Clone)]
pub struct TalentProfile {
    dataset: String,
    as_of: Option<NaiveDate>,
}

impl TalentProfile {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            as_of: None,
        }
    }

    /// Evaluate age, tenure and "active" against a fixed date.
    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }
}

impl Report for TalentProfile {
    fn render(
        &self,
        ctx: &ReportContext<'_>,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), ReportError> {
        let Some(people) = ctx.data.get(&self.dataset).filter(|ds| !ds.is_empty()) else {
            surface.warning("Employee data not available.");
            return Ok(());
        };

        let Some(raw_id) = ctx.params.get("employee_id").map(|s| s.trim()) else {
            surface.title(
                "Talent Profile",
                Some("Unified employee intelligence card"),
            );
            surface.text("Pass employee_id to show a profile.");
            return Ok(());
        };
        let Ok(employee_id) = raw_id.parse::<f64>() else {
            surface.error("Employee ID must be numeric.");
            return Ok(());
        };

        let today = today(self.as_of);
        let wanted = Value::Number(employee_id);
        let Some(emp) = people
            .records()
            .iter()
            .find(|r| is_active(r, today) && r.get("employee_id") == &wanted)
        else {
            surface.warning("No active employee found.");
            return Ok(());
        };

        let age = emp
            .get("date_of_birth")
            .as_date()
            .map(|born| format_age(born, today))
            .unwrap_or_else(|| MISSING.to_string());
        let tenure = emp
            .get("date_of_joining")
            .as_date()
            .map(|joined| format_tenure(joined, today))
            .unwrap_or_else(|| MISSING.to_string());

        surface.title(
            &text_or_missing(emp.get("employee_name")),
            Some(&format!("Employee ID: {}", emp.get("employee_id"))),
        );
        surface.text(&format!(
            "{} | {} | Band: {} | Grade: {}",
            text_or_missing(emp.get("function")),
            text_or_missing(emp.get("department")),
            text_or_missing(emp.get("band")),
            text_or_missing(emp.get("grade")),
        ));
        surface.text(&format!("Age: {} | Tenure: {}", age, tenure));

        for (title, fields) in SECTIONS {
            let rows = fields
                .iter()
                .map(|(label, key)| (label.to_string(), format_field(emp, key)))
                .collect();
            surface.fields(title, rows);
        }
        Ok(())
    }
}

use chrono::NaiveDate;
use worklens::data::{Dataset, DatasetCollection, Value};
use worklens::report::builtin::{TalentProfile, WorkforceOverview};
use worklens::report::{
    Element, Params, RecordingSurface, Report, ReportContext, TextSurface,
};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn as_of() -> NaiveDate {
    ymd(2025, 6, 1)
}

fn workforce() -> DatasetCollection {
    let people = Dataset::new(["employee_id", "company", "date_of_exit"])
        .with_row(vec![Value::from(1.0), Value::from("A"), Value::Null])
        .unwrap()
        .with_row(vec![Value::from(2.0), Value::from("A"), Value::from(ymd(2024, 1, 31))])
        .unwrap()
        .with_row(vec![Value::from(3.0), Value::from("B"), Value::from(ymd(2026, 1, 1))])
        .unwrap()
        .with_row(vec![Value::from(4.0), Value::Null, Value::Null])
        .unwrap();
    [("employee".to_string(), people)].into_iter().collect()
}

fn render(report: &dyn Report, data: &DatasetCollection, params: &Params) -> Vec<Element> {
    let mut surface = RecordingSurface::new();
    report
        .render(&ReportContext { data, params }, &mut surface)
        .unwrap();
    surface.into_elements()
}

#[test]
fn test_overview_text() {
    let report = WorkforceOverview::new("employee").as_of(as_of());
    let data = workforce();
    let params = Params::new();
    let mut surface = TextSurface::new();

    report
        .render(
            &ReportContext {
                data: &data,
                params: &params,
            },
            &mut surface,
        )
        .unwrap();

    insta::assert_snapshot!(surface.as_str(), @r"
    == Workforce Overview ==
    Headcount across the selected slices
    Headcount: 4
    Active: 3
    Exited: 1
    Company     Headcount  Active
    ----------  ---------  ------
    Unassigned  1          1
    A           2          1
    B           1          1
    ");
}

#[test]
fn test_overview_without_data_warns() {
    let report = WorkforceOverview::new("employee");
    let elements = render(&report, &DatasetCollection::new(), &Params::new());

    assert_eq!(
        elements.last(),
        Some(&Element::Warning {
            message: "Employee data not available.".to_string()
        })
    );
}

fn people() -> DatasetCollection {
    let columns = [
        "employee_id",
        "employee_name",
        "function",
        "department",
        "band",
        "grade",
        "date_of_birth",
        "date_of_joining",
        "date_of_exit",
        "fixed_ctc_pa",
        "training_hours",
        "skills_1",
        "skills_2",
    ];
    let people = Dataset::new(columns)
        .with_row(vec![
            Value::from(1042.0),
            Value::from("Asha Rao"),
            Value::from("Finance"),
            Value::from("Treasury"),
            Value::from(3.0),
            Value::from("M2"),
            Value::from(ymd(1990, 6, 2)),
            Value::from(ymd(2022, 5, 1)),
            Value::Null,
            Value::from(1_250_000.0),
            Value::from(40.0),
            Value::from("Excel"),
            Value::from("SQL"),
        ])
        .unwrap()
        .with_row(vec![
            Value::from(7.0),
            Value::from("Left Already"),
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::from(ymd(2023, 1, 1)),
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
        ])
        .unwrap();
    [("employee".to_string(), people)].into_iter().collect()
}

fn profile_for(employee_id: &str) -> Vec<Element> {
    let mut params = Params::new();
    params.insert("employee_id".to_string(), employee_id.to_string());
    render(
        &TalentProfile::new("employee").as_of(as_of()),
        &people(),
        &params,
    )
}

#[test]
fn test_profile_card() {
    let elements = profile_for("1042");

    assert_eq!(
        elements[0],
        Element::Title {
            title: "Asha Rao".to_string(),
            subtitle: Some("Employee ID: 1042".to_string()),
        }
    );
    assert_eq!(
        elements[1],
        Element::Text {
            text: "Finance | Treasury | Band: 3 | Grade: M2".to_string()
        }
    );
    assert_eq!(
        elements[2],
        Element::Text {
            text: "Age: 34 yrs | Tenure: 3 yrs 1 months".to_string()
        }
    );

    let sections: Vec<_> = elements
        .iter()
        .filter_map(|e| match e {
            Element::Fields { title, fields } => Some((title.as_str(), fields)),
            _ => None,
        })
        .collect();
    assert_eq!(sections.len(), 7);

    let field = |section: &str, label: &str| -> String {
        sections
            .iter()
            .find(|(title, _)| *title == section)
            .and_then(|(_, fields)| fields.iter().find(|(l, _)| l == label))
            .map(|(_, v)| v.clone())
            .unwrap()
    };
    assert_eq!(field("Tenure & Movement", "Date of Joining"), "01-May-2022");
    assert_eq!(field("Compensation", "Fixed CTC"), "₹ 12.5 Lakhs");
    assert_eq!(field("Compensation", "Total CTC"), "-");
    assert_eq!(field("Development & Learning", "Training Hours"), "40 hrs");
    assert_eq!(field("Competency & Skills", "Skills"), "Excel, SQL");
}

#[test]
fn test_profile_rejects_non_numeric_id() {
    assert_eq!(
        profile_for("abc"),
        vec![Element::Error {
            message: "Employee ID must be numeric.".to_string()
        }]
    );
}

#[test]
fn test_profile_skips_exited_employees() {
    assert_eq!(
        profile_for("7"),
        vec![Element::Warning {
            message: "No active employee found.".to_string()
        }]
    );
}

#[test]
fn test_profile_without_id_prompts() {
    let elements = render(
        &TalentProfile::new("employee"),
        &people(),
        &Params::new(),
    );
    assert!(matches!(&elements[0], Element::Title { title, .. } if title == "Talent Profile"));
    assert_eq!(elements.len(), 2);
}

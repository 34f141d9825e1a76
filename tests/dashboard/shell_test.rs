use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use worklens::config::Settings;
use worklens::dashboard::{
    ConfiguredUsers, CycleOutcome, CycleState, Dashboard, DashboardError, Request,
};
use worklens::data::{DataStore, Value};
use worklens::report::{Element, RecordingSurface, ReportError, ReportIdentifier};

const EMPLOYEES: &str = "\
employee_id,employee_name,company,band,date_of_exit
1,Asha,A,1,
2,Ravi,B,2,
3,Meera,A,3,
4,Kiran,B,1,
5,Dev,A,2,
6,Leela,B,3,
7,Arun,A,1,
8,Sita,B,2,2020-01-31
9,Vijay,A,3,
10,Nila,B,1,
";

const COUNT: &str = r#"
function render(data, params)
    ui.kpi("Rows", #data.employee)
end
"#;

const BROKEN: &str = r#"
function render(data)
    error("division by zero")
end
"#;

struct Fixture {
    _root: TempDir,
    settings: Settings,
}

fn fixture() -> Fixture {
    let root = TempDir::new().unwrap();
    let data = root.path().join("data");
    let reports = root.path().join("reports");
    fs::create_dir(&data).unwrap();
    fs::create_dir(&reports).unwrap();
    fs::write(data.join("employee.csv"), EMPLOYEES).unwrap();
    fs::write(reports.join("count.lua"), COUNT).unwrap();
    fs::write(reports.join("broken.lua"), BROKEN).unwrap();

    let mut settings = Settings::default();
    settings.data.dir = data.display().to_string();
    settings.reports.dir = reports.display().to_string();
    Fixture {
        _root: root,
        settings,
    }
}

fn dashboard(settings: &Settings) -> Dashboard {
    Dashboard::from_settings(settings)
        .unwrap()
        .with_store(Arc::new(DataStore::new()))
}

fn rows_kpi(elements: &[Element]) -> Option<&str> {
    elements.iter().find_map(|e| match e {
        Element::Kpi { label, value } if label == "Rows" => Some(value.as_str()),
        _ => None,
    })
}

#[test]
fn test_login_gate() {
    let fx = fixture();
    let dashboard = dashboard(&fx.settings);
    let mut session = dashboard.new_session();
    let mut surface = RecordingSurface::new();

    let outcome = dashboard
        .run_cycle(&mut session, &Request::new(), &mut surface)
        .unwrap();

    assert!(matches!(outcome, CycleOutcome::LoginRequired));
    assert_eq!(surface.into_elements(), vec![Element::LoginRequired]);
    assert_eq!(session.state(), CycleState::Idle);
}

#[test]
fn test_full_cycle_layout() {
    let fx = fixture();
    let dashboard = dashboard(&fx.settings);
    let mut session = dashboard.new_session();
    dashboard.authenticator().login(&mut session, "asha").unwrap();
    let mut surface = RecordingSurface::new();

    let request = Request::new().with("report", "count");
    let outcome = dashboard
        .run_cycle(&mut session, &request, &mut surface)
        .unwrap();

    assert!(outcome.is_rendered());
    assert_eq!(session.state(), CycleState::RenderedOk);
    let elements = surface.into_elements();
    assert!(matches!(elements.first(), Some(Element::Header { .. })));
    assert_eq!(elements.last(), Some(&Element::Footer));

    let navigation = elements
        .iter()
        .find_map(|e| match e {
            Element::Navigation { reports, selected } => Some((reports.clone(), selected.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        navigation.0,
        vec!["broken", "count", "talent_profile", "workforce_overview"]
    );
    assert_eq!(navigation.1.as_deref(), Some("count"));
    assert_eq!(rows_kpi(&elements), Some("10"));
}

#[test]
fn test_filters_follow_the_session() {
    let fx = fixture();
    let dashboard = dashboard(&fx.settings);
    let mut session = dashboard.new_session();
    dashboard.authenticator().login(&mut session, "asha").unwrap();

    dashboard
        .filter_engine()
        .select(session.selection_mut(), "company", Value::from("A"))
        .unwrap();
    let mut surface = RecordingSurface::new();
    let request = Request::new().with("report", "count");
    let outcome = dashboard
        .run_cycle(&mut session, &request, &mut surface)
        .unwrap();

    match outcome {
        CycleOutcome::Completed {
            filtered_records, ..
        } => assert_eq!(filtered_records, 5),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(rows_kpi(surface.elements()), Some("5"));

    // The selected report sticks; resetting filters restores every row.
    let mut surface = RecordingSurface::new();
    let request = Request::new().with("reset_filters", "true");
    dashboard
        .run_cycle(&mut session, &request, &mut surface)
        .unwrap();
    assert_eq!(rows_kpi(surface.elements()), Some("10"));
    assert!(session.selection().is_empty());
}

#[test]
fn test_report_failure_is_not_fatal() {
    let fx = fixture();
    let dashboard = dashboard(&fx.settings);
    let mut session = dashboard.new_session();
    dashboard.authenticator().login(&mut session, "asha").unwrap();

    let mut surface = RecordingSurface::new();
    let outcome = dashboard
        .run_cycle(&mut session, &Request::new().with("report", "broken"), &mut surface)
        .unwrap();

    match &outcome {
        CycleOutcome::Completed {
            failure: Some(e), ..
        } => assert_eq!(e.identifier, ReportIdentifier::from("broken")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(session.state(), CycleState::RenderFailed);
    let elements = surface.into_elements();
    assert!(elements.iter().any(|e| matches!(
        e,
        Element::Error { message } if message.contains("broken") && message.contains("division by zero")
    )));
    assert_eq!(elements.last(), Some(&Element::Footer));

    let mut surface = RecordingSurface::new();
    let outcome = dashboard
        .run_cycle(&mut session, &Request::new().with("report", "count"), &mut surface)
        .unwrap();
    assert!(outcome.is_rendered());
    assert_eq!(session.state(), CycleState::RenderedOk);
}

#[test]
fn test_unknown_requested_report_fails() {
    let fx = fixture();
    let dashboard = dashboard(&fx.settings);
    let mut session = dashboard.new_session();
    dashboard.authenticator().login(&mut session, "asha").unwrap();
    session.select_report("count");

    let mut surface = RecordingSurface::new();
    let outcome = dashboard
        .run_cycle(&mut session, &Request::new().with("report", "typo"), &mut surface)
        .unwrap();

    match &outcome {
        CycleOutcome::Completed {
            report,
            failure: Some(e),
            ..
        } => {
            assert_eq!(report.as_ref(), Some(&ReportIdentifier::from("typo")));
            assert_eq!(e.identifier, ReportIdentifier::from("typo"));
            assert!(matches!(e.cause, ReportError::NotFound));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(session.state(), CycleState::RenderFailed);
    assert_eq!(rows_kpi(surface.elements()), None);
    assert_eq!(
        session.selected_report(),
        Some(&ReportIdentifier::from("count"))
    );
}

#[test]
fn test_first_report_is_default() {
    let fx = fixture();
    let dashboard = dashboard(&fx.settings);
    let mut session = dashboard.new_session();
    dashboard.authenticator().login(&mut session, "asha").unwrap();
    let mut surface = RecordingSurface::new();

    let outcome = dashboard
        .run_cycle(&mut session, &Request::new(), &mut surface)
        .unwrap();

    match outcome {
        CycleOutcome::Completed { report, .. } => {
            assert_eq!(report, Some(ReportIdentifier::from("broken")))
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        session.selected_report(),
        Some(&ReportIdentifier::from("broken"))
    );
}

#[test]
fn test_logout_request() {
    let fx = fixture();
    let dashboard = dashboard(&fx.settings);
    let mut session = dashboard.new_session();
    dashboard.authenticator().login(&mut session, "asha").unwrap();
    session.selection_mut().select("band", Value::from(1.0));

    let mut surface = RecordingSurface::new();
    let outcome = dashboard
        .run_cycle(&mut session, &Request::new().with("logout", "true"), &mut surface)
        .unwrap();

    assert!(matches!(outcome, CycleOutcome::LoginRequired));
    assert!(session.user().is_none());
    assert!(session.selection().is_empty());
}

#[test]
fn test_configured_users_only() {
    let mut fx = fixture();
    fx.settings.auth.users = vec!["asha".to_string()];
    let dashboard = dashboard(&fx.settings);
    let mut session = dashboard.new_session();

    assert!(dashboard.authenticator().login(&mut session, "ravi").is_err());
    dashboard.authenticator().login(&mut session, "asha").unwrap();

    let strict = Dashboard::from_settings(&fx.settings)
        .unwrap()
        .with_authenticator(Arc::new(ConfiguredUsers::new(["someone_else"])));
    let mut surface = RecordingSurface::new();
    let outcome = strict
        .run_cycle(&mut session, &Request::new(), &mut surface)
        .unwrap();
    assert!(matches!(outcome, CycleOutcome::LoginRequired));
}

#[test]
fn test_missing_report_dir_keeps_builtins() {
    let mut fx = fixture();
    fx.settings.reports.dir = fx.settings.reports.dir.clone() + "/missing";
    let dashboard = dashboard(&fx.settings);

    assert!(dashboard.discovery_error().is_some());
    assert_eq!(
        dashboard.dispatcher().registry().identifiers(),
        vec![
            ReportIdentifier::from("talent_profile"),
            ReportIdentifier::from("workforce_overview"),
        ]
    );

    let mut session = dashboard.new_session();
    dashboard.authenticator().login(&mut session, "asha").unwrap();
    let mut surface = RecordingSurface::new();
    dashboard
        .run_cycle(&mut session, &Request::new(), &mut surface)
        .unwrap();
    assert!(surface.elements().iter().any(|e| matches!(
        e,
        Element::Error { message } if message.contains("Report directory not found")
    )));
}

#[test]
fn test_data_failure_is_returned() {
    let mut fx = fixture();
    fs::write(
        std::path::Path::new(&fx.settings.data.dir).join("broken.csv"),
        "a,b\n1\n",
    )
    .unwrap();
    fx.settings.reports.builtins = false;
    let dashboard = dashboard(&fx.settings);
    let mut session = dashboard.new_session();
    dashboard.authenticator().login(&mut session, "asha").unwrap();
    let mut surface = RecordingSurface::new();

    let err = dashboard
        .run_cycle(&mut session, &Request::new(), &mut surface)
        .unwrap_err();

    assert!(matches!(err, DashboardError::Data(_)));
    assert!(err.to_string().contains("broken.csv"));
    assert!(!surface
        .elements()
        .iter()
        .any(|e| matches!(e, Element::Navigation { .. })));
}

#[test]
fn test_sessions_do_not_share_selection() {
    let fx = fixture();
    let dashboard = dashboard(&fx.settings);
    let mut first = dashboard.new_session();
    let mut second = dashboard.new_session();
    dashboard.authenticator().login(&mut first, "asha").unwrap();
    dashboard.authenticator().login(&mut second, "ravi").unwrap();
    first.selection_mut().select("company", Value::from("B"));

    let request = Request::new().with("report", "count");
    let mut surface = RecordingSurface::new();
    dashboard.run_cycle(&mut first, &request, &mut surface).unwrap();
    assert_eq!(rows_kpi(surface.elements()), Some("5"));

    let mut surface = RecordingSurface::new();
    dashboard.run_cycle(&mut second, &request, &mut surface).unwrap();
    assert_eq!(rows_kpi(surface.elements()), Some("10"));
}

#[test]
fn test_demo_configuration() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut settings = Settings::from_file(root.join("demos/worklens.toml")).unwrap();
    settings.data.dir = root.join(&settings.data.dir).display().to_string();
    settings.reports.dir = root.join(&settings.reports.dir).display().to_string();
    let dashboard = dashboard(&settings);
    let mut session = dashboard.new_session();
    dashboard.authenticator().login(&mut session, "demo").unwrap();

    let mut surface = RecordingSurface::new();
    let outcome = dashboard
        .run_cycle(&mut session, &Request::new().with("report", "band_mix"), &mut surface)
        .unwrap();

    assert!(outcome.is_rendered());
    assert!(surface.elements().contains(&Element::Table {
        headers: vec!["Band".to_string(), "Headcount".to_string()],
        rows: vec![
            vec!["1".to_string(), "1".to_string()],
            vec!["2".to_string(), "2".to_string()],
            vec!["3".to_string(), "1".to_string()],
        ],
    }));
}

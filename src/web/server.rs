//! Axum web server for worklens
//!
//! Every request gets its own [`Session`](crate::dashboard::Session); nothing
//! but the data cache is shared between requests.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::Settings;
use crate::dashboard::{CycleOutcome, Dashboard, Request};
use crate::data::Value;
use crate::filter::DimensionGroup;
use crate::report::{Element, Params, RecordingSurface, ReportIdentifier};

/// Application state shared across handlers
pub struct AppState {
    pub dashboard: Dashboard,
}

/// Build the axum router with all routes
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/reports", get(list_reports))
        .route("/api/dimensions", get(list_dimensions))
        .route("/api/render", post(render_report))
        .layer(cors)
        .with_state(state)
}

/// Start the web server
pub async fn serve(settings: Settings, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let dashboard = Dashboard::from_settings(&settings)?;
    let data_dir = dashboard.data_dir().to_path_buf();
    let state = Arc::new(AppState { dashboard });
    let app = router(state);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, "worklens listening");
    println!("Worklens API");
    println!("   URL: http://localhost:{}", port);
    println!("   Data: {}", data_dir.display());
    println!();
    println!("   Press Ctrl+C to stop");

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// API Handlers
// ============================================================================

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

#[derive(Serialize)]
struct ReportsResponse {
    reports: Vec<ReportIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    discovery_error: Option<String>,
}

/// GET /api/reports - List report identifiers
async fn list_reports(State(state): State<Arc<AppState>>) -> Json<ReportsResponse> {
    let dashboard = &state.dashboard;
    Json(ReportsResponse {
        reports: dashboard.dispatcher().registry().identifiers(),
        discovery_error: dashboard.discovery_error().map(str::to_string),
    })
}

/// GET /api/dimensions - Filter choices from the unfiltered primary dataset
async fn list_dimensions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DimensionGroup>>, ApiError> {
    let groups = tokio::task::spawn_blocking(move || {
        let dashboard = &state.dashboard;
        let data = dashboard.load_data()?;
        let groups = match data.get(dashboard.primary_dataset()) {
            Some(people) => dashboard.filter_engine().choices(people),
            None => dashboard.filter_engine().choices(&Default::default()),
        };
        Ok::<_, crate::data::DataLoadError>(groups)
    })
    .await
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?
    .map_err(|e| {
        error!(error = %e, "data load failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e)
    })?;

    Ok(Json(groups))
}

#[derive(Deserialize)]
struct RenderRequest {
    report: Option<String>,
    user: String,
    #[serde(default)]
    filters: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    params: Params,
}

#[derive(Serialize)]
struct RenderResponse {
    report: Option<ReportIdentifier>,
    filtered_records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    elements: Vec<Element>,
}

/// POST /api/render - Run one dashboard cycle and return its elements
async fn render_report(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, ApiError> {
    let dashboard = &state.dashboard;
    let mut session = dashboard.new_session();
    dashboard
        .authenticator()
        .login(&mut session, &req.user)
        .map_err(|e| api_error(StatusCode::UNAUTHORIZED, e))?;

    for (column, values) in req.filters {
        for raw in values {
            dashboard
                .filter_engine()
                .select(session.selection_mut(), &column, Value::parse(&raw))
                .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
        }
    }

    let mut request = Request::from_params(req.params);
    if let Some(report) = req.report {
        request = request.with("report", report);
    }

    let state = Arc::clone(&state);
    let response = tokio::task::spawn_blocking(move || {
        let mut surface = RecordingSurface::new();
        let result = state
            .dashboard
            .run_cycle(&mut session, &request, &mut surface);
        let elements = surface.into_elements();
        match result {
            Ok(CycleOutcome::Completed {
                report,
                filtered_records,
                failure,
            }) => Ok(RenderResponse {
                report,
                filtered_records: Some(filtered_records),
                error: failure.map(|e| e.to_string()),
                elements,
            }),
            Ok(CycleOutcome::LoginRequired) => Ok(RenderResponse {
                report: None,
                filtered_records: None,
                error: Some("login required".to_string()),
                elements,
            }),
            Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e)),
        }
    })
    .await
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))??;

    Ok(Json(response))
}

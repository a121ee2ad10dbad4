use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use log::warn;

use crate::{
    errors::ScrapeError,
    marks::MarksResult,
    protocol::{ErrorResponse, UserData},
    portal::SchoolPortal,
    timetable::TimetableResult,
};

const GENERIC_FAILURE: &str = "couldn't retrieve data";

// Application state holding the portal implementation.
#[derive(Clone)]
pub struct AppState {
    pub portal: Arc<dyn SchoolPortal>,
}

impl AppState {
    pub fn new(portal: impl SchoolPortal + 'static) -> Self {
        Self {
            portal: Arc::new(portal),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(ping))
        .route("/get_marks", post(get_marks))
        .route("/get_timetable", post(get_timetable))
        .route(
            "/verify_data_get_personal_data",
            post(verify_data_get_personal_data),
        )
        .with_state(state)
}

type ApiError = (StatusCode, Json<ErrorResponse>);

async fn ping() -> Json<&'static str> {
    Json("PONG")
}

// Handler for fetching marks with a stored session.
async fn get_marks(
    State(state): State<AppState>,
    Json(payload): Json<UserData>,
) -> Result<Json<MarksResult>, ApiError> {
    let session = payload
        .session_state()
        .map_err(|err| failure("get_marks", err))?;
    let marks = state
        .portal
        .fetch_marks(&session)
        .await
        .map_err(|err| failure("get_marks", err))?;
    Ok(Json(marks))
}

// Handler for fetching the timetable with a stored session.
async fn get_timetable(
    State(state): State<AppState>,
    Json(payload): Json<UserData>,
) -> Result<Json<TimetableResult>, ApiError> {
    let session = payload
        .session_state()
        .map_err(|err| failure("get_timetable", err))?;
    let timetable = state
        .portal
        .fetch_timetable(&session)
        .await
        .map_err(|err| failure("get_timetable", err))?;
    Ok(Json(timetable))
}

// Handler for logging in and returning the harvested session.
async fn verify_data_get_personal_data(
    State(state): State<AppState>,
    Json(payload): Json<UserData>,
) -> Result<Json<UserData>, ApiError> {
    let session = state
        .portal
        .authenticate(&payload.credentials())
        .await
        .map_err(|err| failure("verify_data_get_personal_data", err))?;
    Ok(Json(payload.with_session(session)))
}

// Callers see one generic message, the log keeps the cause.
fn failure(endpoint: &str, err: ScrapeError) -> ApiError {
    warn!("{endpoint} failed ({}): {err}", err.kind());
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            message: GENERIC_FAILURE.to_string(),
            kind: err.kind().to_string(),
        }),
    )
}

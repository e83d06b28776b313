// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::AppState;
use crate::error::Result;
use crate::report::{renderer_for, ReportContext, ReportFormat};

pub fn create_router(state: AppState) -> Router {
    let sessions = Router::new()
        .route("/session", post(create_session))
        .route("/session/:id/events", post(append_events))
        .route("/session/:id/report.csv", get(report_csv))
        .route("/session/:id/report.pdf", get(report_pdf));

    Router::new()
        .route("/health", get(health))
        .merge(sessions.clone())
        .nest("/api", sessions)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Lenient JSON body: anything unparseable is `null`
fn json_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn create_session(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let candidate_name = json_body(&body)
        .get("candidateName")
        .and_then(Value::as_str)
        .map(str::to_string);
    let id = state.store.create_session(candidate_name);
    Json(json!({ "sessionId": id }))
}

async fn append_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>> {
    let mut body = json_body(&body);
    let events = match body.get_mut("events").map(Value::take) {
        Some(Value::Array(events)) => events,
        _ => Vec::new(),
    };
    let count = state.store.append_events(&id, &events)?;
    Ok(Json(json!({ "ok": true, "count": count })))
}

async fn report_csv(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    render_report(&state, &id, ReportFormat::Csv)
}

async fn report_pdf(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    render_report(&state, &id, ReportFormat::Pdf)
}

fn render_report(state: &AppState, id: &str, format: ReportFormat) -> Response {
    let session = match state.store.get_session(id) {
        Ok(session) => session,
        Err(e) => return e.into_text_response(),
    };

    let ctx = ReportContext::new(&session, Utc::now());
    match renderer_for(format, &state.config).render(&ctx) {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, format.content_type().to_string()),
                (header::CONTENT_DISPOSITION, format.content_disposition(id)),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => e.into_text_response(),
    }
}

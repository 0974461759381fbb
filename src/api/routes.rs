//! API route definitions.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use super::state::AppState;
use crate::engine::default_fix_id;
use crate::incident::Incident;
use crate::report::{render_artifact, ExportError, ExportFormat};
use crate::store;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/incidents", get(list_incidents))
        .route("/incidents/{id}", get(get_incident))
        .route("/incidents/{id}/insights", get(incident_insights))
        .route("/incidents/{id}/related", get(related_incidents))
        .route("/incidents/{id}/prediction", get(fix_prediction))
        .route("/incidents/{id}/report", get(rca_report))
}

#[derive(Debug, Error)]
enum ApiError {
    #[error("incident not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    BadRequest(ExportError),
    #[error(transparent)]
    Export(ExportError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn lookup<'a>(state: &'a AppState, id: &str) -> Result<&'a Incident, ApiError> {
    store::find(&state.incidents, id)
        .map(|(_, incident)| incident)
        .map_err(|_| ApiError::NotFound(id.to_string()))
}

fn meta() -> Value {
    json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "incidents": state.incidents.len()
        },
        "meta": meta()
    }))
}

async fn list_incidents(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "data": state.incidents.as_slice(),
        "meta": { "total": state.incidents.len() }
    }))
}

async fn get_incident(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let incident = lookup(&state, &id)?;
    Ok(Json(json!({ "data": incident, "meta": meta() })))
}

async fn incident_insights(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let incident = lookup(&state, &id)?;
    let insights = state.engine.insights(incident, &state.incidents);
    Ok(Json(json!({
        "data": insights,
        "meta": { "total": insights.len() }
    })))
}

#[derive(Debug, Deserialize)]
struct RelatedQuery {
    limit: Option<usize>,
}

async fn related_incidents(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RelatedQuery>,
) -> Result<Json<Value>, ApiError> {
    let incident = lookup(&state, &id)?;
    let related = state.engine.related(incident, &state.incidents, query.limit);
    Ok(Json(json!({
        "data": related,
        "meta": { "total": related.len() }
    })))
}

#[derive(Debug, Deserialize)]
struct PredictionQuery {
    fix: Option<String>,
}

async fn fix_prediction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PredictionQuery>,
) -> Result<Json<Value>, ApiError> {
    let incident = lookup(&state, &id)?;
    let fix = query.fix.unwrap_or_else(|| default_fix_id(incident));
    let prediction = state.engine.predict(incident, &fix, &state.incidents);
    Ok(Json(json!({ "data": prediction, "meta": meta() })))
}

#[derive(Debug, Deserialize)]
struct ReportQuery {
    format: Option<String>,
}

/// Without `format` the report is returned in the JSON envelope; with it the
/// rendered artifact is served as a download.
async fn rca_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let incident = lookup(&state, &id)?;
    let report = state.engine.report(incident);

    let Some(format) = query.format else {
        return Ok(Json(json!({ "data": report, "meta": meta() })).into_response());
    };

    let format: ExportFormat = format.parse().map_err(ApiError::BadRequest)?;
    let artifact = render_artifact(&report, format).map_err(ApiError::Export)?;

    Ok((
        [
            (header::CONTENT_TYPE, artifact.mime_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.filename),
            ),
        ],
        artifact.body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use crate::api::{router, state::AppState};
    use crate::engine::Engine;
    use crate::incident::{Incident, Severity};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn state() -> AppState {
        let mut a = Incident::new("inc-a", Severity::High, "OOM_KILL");
        a.resource.namespace = "prod".to_string();
        a.resource.kind = "Pod".to_string();
        let mut b = a.clone();
        b.id = "inc-b".to_string();
        AppState::new(vec![a, b], Engine::default())
    }

    async fn get(uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        get_from(state(), uri).await
    }

    async fn get_from(state: AppState, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    fn json(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, _, body) = get("/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["data"]["incidents"], 2);
    }

    #[tokio::test]
    async fn test_unknown_incident_is_404() {
        let (status, _, body) = get("/api/v1/incidents/nope/insights").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json(&body)["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn test_related_returns_index() {
        let (status, _, body) = get("/api/v1/incidents/inc-a/related?limit=3").await;
        assert_eq!(status, StatusCode::OK);
        let v = json(&body);
        assert_eq!(v["meta"]["total"], 1);
        assert_eq!(v["data"][0]["index"], 1);
        assert_eq!(v["data"][0]["incident"]["id"], "inc-b");
        assert_eq!(v["data"][0]["similarityScore"], 85);
    }

    #[tokio::test]
    async fn test_prediction_envelope() {
        let (status, _, body) = get("/api/v1/incidents/inc-a/prediction?fix=raise-limit").await;
        assert_eq!(status, StatusCode::OK);
        let v = json(&body);
        assert_eq!(v["data"]["fixId"], "raise-limit");
        assert_eq!(v["data"]["factors"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_report_download_headers() {
        let (status, headers, body) = get("/api/v1/incidents/inc-a/report?format=md").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/markdown");
        let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains("RCA-RCA-"));
        assert!(disposition.ends_with(".md\""));
        assert!(String::from_utf8(body).unwrap().starts_with("# Root Cause Analysis Report"));
    }

    #[tokio::test]
    async fn test_report_download_with_quoted_id() {
        let odd = Incident::new("q\"x\u{7}", Severity::Low, "OOM_KILL");
        let state = AppState::new(vec![odd], Engine::default());
        let (status, headers, _) = get_from(state, "/api/v1/incidents/q%22x%07/report?format=md").await;

        assert_eq!(status, StatusCode::OK);
        let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert_eq!(disposition.matches('"').count(), 2);
        assert!(disposition.ends_with("-q_x_.md\""));
    }

    #[tokio::test]
    async fn test_report_rejects_unknown_format() {
        let (status, _, _) = get("/api/v1/incidents/inc-a/report?format=pdf").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

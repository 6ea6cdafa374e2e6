//! HTTP route handlers for the API

use super::AppState;
use crate::db::sessions::{self, Bpm};
use crate::error::CoreError;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

const NOT_FOUND: &str = "Not found";

// ============================================================================
// Health Check
// ============================================================================

pub async fn health(State(state): State<AppState>) -> Response {
    match state.db.with_conn(|conn| sessions::count_sessions(conn)).await {
        Ok(count) => Json(serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "sessions": count
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// GET|POST /new_session
/// Opens the next session id and returns it
pub async fn new_session(State(state): State<AppState>) -> Response {
    match state.db.with_conn(sessions::allocate_session).await {
        Ok(id) => Json(id).into_response(),
        Err(e) => error_response(e),
    }
}

/// Body of `POST /send_bpm/:id`
#[derive(Debug, Deserialize)]
pub struct SendBpmRequest {
    pub bpm: BpmValue,
}

/// Accepted BPM payloads
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BpmValue {
    Number(serde_json::Number),
    Text(String),
}

impl From<BpmValue> for Bpm {
    fn from(value: BpmValue) -> Self {
        match value {
            BpmValue::Number(n) => Bpm::new(n.to_string()),
            BpmValue::Text(s) => Bpm::new(s),
        }
    }
}

/// POST /send_bpm/:id
///
/// The body is decoded as JSON whatever its Content-Type says.
pub async fn send_bpm(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Response {
    let Some(id) = parse_session_id(&raw_id) else {
        return not_found().await;
    };

    let req: SendBpmRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            tracing::debug!("Rejected send_bpm body for session {}: {}", id, e);
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "error": format!("Invalid request body: {}", e) })),
            )
                .into_response();
        }
    };

    let bpm = Bpm::from(req.bpm);
    match state
        .db
        .with_conn(move |conn| sessions::set_bpm(conn, id, &bpm))
        .await
    {
        Ok(_) => Json("All good").into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /get_bpm/:id
/// Returns a list of `[bpm]` rows, empty when the session is not open
pub async fn get_bpm(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let Some(id) = parse_session_id(&raw_id) else {
        return not_found().await;
    };

    match state
        .db
        .with_conn(move |conn| sessions::get_bpm(conn, id))
        .await
    {
        Ok(rows) => {
            let rows: Vec<serde_json::Value> = rows
                .iter()
                .map(|bpm| serde_json::json!([bpm.to_json()]))
                .collect();
            Json(rows).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET /close_session/:id
pub async fn close_session(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Response {
    let Some(id) = parse_session_id(&raw_id) else {
        return not_found().await;
    };

    match state
        .db
        .with_conn(move |conn| sessions::close_session(conn, id))
        .await
    {
        Ok(_) => Json(format!("Close session: {}", id)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Fallback for unknown routes and malformed session ids
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(NOT_FOUND)).into_response()
}

// ============================================================================
// Helpers
// ============================================================================

/// Session ids in paths are plain non-negative decimal integers
fn parse_session_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn error_response(e: CoreError) -> Response {
    let status = match &e {
        CoreError::SessionExists(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::error!("Request failed: {}", e);
    (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_id() {
        assert_eq!(parse_session_id("0"), Some(0));
        assert_eq!(parse_session_id("42"), Some(42));
        assert_eq!(parse_session_id("-1"), None);
        assert_eq!(parse_session_id("+1"), None);
        assert_eq!(parse_session_id("abc"), None);
        assert_eq!(parse_session_id(""), None);
        assert_eq!(parse_session_id("99999999999999999999"), None);
    }

    async fn error_body(e: CoreError) -> (StatusCode, serde_json::Value) {
        let response = error_response(e);
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_error_response_status_mapping() {
        assert_eq!(
            error_body(CoreError::SessionExists(1)).await,
            (
                StatusCode::CONFLICT,
                serde_json::json!({ "error": "Session 1 already exists" })
            )
        );
        assert_eq!(
            error_body(CoreError::Task("join failed".to_string())).await,
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": "Task error: join failed" })
            )
        );
        assert_eq!(
            error_body(CoreError::SessionIdsExhausted(i64::MAX)).await.0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_send_bpm_request_accepts_number_and_text() {
        let req: SendBpmRequest = serde_json::from_str(r#"{"bpm": 72}"#).unwrap();
        assert_eq!(Bpm::from(req.bpm), Bpm::new("72"));

        let req: SendBpmRequest = serde_json::from_str(r#"{"bpm": "68"}"#).unwrap();
        assert_eq!(Bpm::from(req.bpm), Bpm::new("68"));
    }

    #[test]
    fn test_send_bpm_request_rejects_bad_shapes() {
        assert!(serde_json::from_str::<SendBpmRequest>("{}").is_err());
        assert!(serde_json::from_str::<SendBpmRequest>(r#"{"bpm": null}"#).is_err());
        assert!(serde_json::from_str::<SendBpmRequest>(r#"{"bpm": [1]}"#).is_err());
        assert!(serde_json::from_str::<SendBpmRequest>("not json").is_err());
    }
}

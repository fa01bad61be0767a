//! HTTP chat gateway for the hexvote engine.
//!
//! Stands in for a chat platform: a bot adapter (or curl) posts user messages
//! and gets structured replies back, including the rendered chat text. All
//! requests go through one lock around the gateway, so feedback events from
//! different users never interleave.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use hexvote_core::{EngineError, Gateway, Outcome, Predictor, Reply, UserId};

/// Shared server state.
struct AppState {
    gateway: Mutex<Gateway>,
}

#[derive(Deserialize)]
struct MessageRequest {
    user_id: UserId,
    text: String,
}

#[derive(Deserialize)]
struct SubmitRequest {
    user_id: UserId,
    token: String,
}

#[derive(Deserialize)]
struct FeedbackRequest {
    user_id: UserId,
    /// 0 (low) or 1 (high).
    value: Outcome,
}

#[derive(Deserialize)]
struct AdminParams {
    admin_id: UserId,
}

#[derive(Deserialize)]
struct AddUserRequest {
    admin_id: UserId,
    user_id: UserId,
}

#[derive(Serialize)]
struct ReplyResponse {
    success: bool,
    /// Structured reply (absent on error).
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<Reply>,
    /// Chat text for the reply or the error.
    text: String,
    /// Error message if the request failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    history_len: usize,
    rules: usize,
    predictors_active: usize,
    predictors_total: usize,
}

trait JsonWithStatus<T> {
    fn with_status(self, status: StatusCode) -> (StatusCode, Json<T>);
}

impl<T> JsonWithStatus<T> for Json<T> {
    fn with_status(self, status: StatusCode) -> (StatusCode, Json<T>) {
        (status, self)
    }
}

fn status_for(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidTokenFormat(_) | EngineError::Usage(_) => StatusCode::BAD_REQUEST,
        EngineError::Unauthorized(_) | EngineError::NotAdmin(_) => StatusCode::FORBIDDEN,
        EngineError::NoPendingToken(_) => StatusCode::CONFLICT,
    }
}

/// Wrap a gateway result into the response envelope.
fn respond(result: Result<Reply, EngineError>) -> (StatusCode, Json<ReplyResponse>) {
    match result {
        Ok(reply) => Json(ReplyResponse {
            success: true,
            text: reply.render(),
            reply: Some(reply),
            error: None,
        })
        .with_status(StatusCode::OK),
        Err(err) => {
            warn!("request rejected: {err}");
            let msg = err.to_string();
            Json(ReplyResponse {
                success: false,
                reply: None,
                text: format!("❌ {msg}"),
                error: Some(msg),
            })
            .with_status(status_for(&err))
        }
    }
}

async fn handle_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MessageRequest>,
) -> (StatusCode, Json<ReplyResponse>) {
    let mut gateway = state.gateway.lock().await;
    respond(gateway.handle_message(req.user_id, &req.text))
}

async fn handle_submit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitRequest>,
) -> (StatusCode, Json<ReplyResponse>) {
    let mut gateway = state.gateway.lock().await;
    respond(gateway.submit(req.user_id, &req.token))
}

async fn handle_feedback(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FeedbackRequest>,
) -> (StatusCode, Json<ReplyResponse>) {
    let mut gateway = state.gateway.lock().await;
    respond(gateway.feedback(req.user_id, req.value))
}

async fn handle_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AdminParams>,
) -> (StatusCode, Json<ReplyResponse>) {
    let gateway = state.gateway.lock().await;
    respond(gateway.stats(params.admin_id))
}

async fn handle_list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AdminParams>,
) -> (StatusCode, Json<ReplyResponse>) {
    let gateway = state.gateway.lock().await;
    respond(gateway.list_users(params.admin_id))
}

async fn handle_add_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddUserRequest>,
) -> (StatusCode, Json<ReplyResponse>) {
    let mut gateway = state.gateway.lock().await;
    respond(gateway.add_user(req.admin_id, req.user_id))
}

async fn handle_remove_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
    Query(params): Query<AdminParams>,
) -> (StatusCode, Json<ReplyResponse>) {
    let mut gateway = state.gateway.lock().await;
    respond(gateway.remove_user(params.admin_id, user_id))
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let gateway = state.gateway.lock().await;
    let engine = gateway.engine();
    Json(HealthResponse {
        status: "ok".to_string(),
        history_len: engine.history().len(),
        rules: engine.rules().len(),
        predictors_active: engine.scoreboard().active().count(),
        predictors_total: Predictor::COUNT,
    })
}

async fn handle_index() -> Json<serde_json::Value> {
    let predictors: Vec<serde_json::Value> = Predictor::ALL
        .iter()
        .map(|p| {
            serde_json::json!({
                "name": p.name(),
                "description": p.description(),
                "uses_history": p.uses_history(),
            })
        })
        .collect();

    Json(serde_json::json!({
        "name": "Hexvote Server",
        "version": hexvote_core::VERSION,
        "predictors": predictors,
        "endpoints": {
            "/": "This API index",
            "/api/v1/message": {
                "method": "POST",
                "description": "Route a raw chat message (token, 0/1 feedback, or /command)",
                "body": { "user_id": "integer", "text": "string" }
            },
            "/api/v1/submit": {
                "method": "POST",
                "description": "Classify a 32-character hex token",
                "body": { "user_id": "integer", "token": "string" }
            },
            "/api/v1/feedback": {
                "method": "POST",
                "description": "Report the actual result for the last submitted token",
                "body": { "user_id": "integer", "value": "0 or 1" }
            },
            "/api/v1/stats?admin_id=N": "Per-predictor accuracy (admin)",
            "/admin/users?admin_id=N": "GET: list allowed users; POST {admin_id, user_id}: allow a user",
            "/admin/users/{user_id}?admin_id=N": "DELETE: revoke a user",
            "/health": "Health check",
        }
    }))
}

/// Build the axum router around a gateway.
pub fn build_router(gateway: Gateway) -> Router {
    let state = Arc::new(AppState {
        gateway: Mutex::new(gateway),
    });

    Router::new()
        .route("/", get(handle_index))
        .route("/api/v1/message", post(handle_message))
        .route("/api/v1/submit", post(handle_submit))
        .route("/api/v1/feedback", post(handle_feedback))
        .route("/api/v1/stats", get(handle_stats))
        .route("/admin/users", get(handle_list_users).post(handle_add_user))
        .route("/admin/users/{user_id}", delete(handle_remove_user))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Run the HTTP chat gateway until the listener fails.
pub async fn run_server(gateway: Gateway, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(gateway);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("hexvote server listening on http://{addr}");
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use hexvote_core::{EngineConfig, GatewayConfig};
    use tower::ServiceExt;

    const ADMIN: UserId = 1;
    const TOKEN: &str = "d41d8cd98f00b204e9800998ecf8427e";

    fn router() -> Router {
        build_router(Gateway::new(
            EngineConfig::default(),
            &GatewayConfig::new(ADMIN),
        ))
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    // -----------------------------------------------------------------------
    // Happy path
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_submit_then_feedback() {
        let app = router();
        let (status, json) = call(
            &app,
            Method::POST,
            "/api/v1/submit",
            Some(serde_json::json!({ "user_id": ADMIN, "token": TOKEN })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["reply"]["kind"], "prediction");
        let confidence = json["reply"]["data"]["confidence"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&confidence));
        assert_eq!(json["reply"]["data"]["top3"].as_array().unwrap().len(), 3);

        let (status, json) = call(
            &app,
            Method::POST,
            "/api/v1/feedback",
            Some(serde_json::json!({ "user_id": ADMIN, "value": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["text"], "✅ Recorded result: High");

        let (_, json) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(json["history_len"], 1);
        assert_eq!(json["predictors_total"], 10);
    }

    #[tokio::test]
    async fn test_message_routes_commands() {
        let app = router();
        let (status, json) = call(
            &app,
            Method::POST,
            "/api/v1/message",
            Some(serde_json::json!({ "user_id": 55, "text": "/start" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["reply"]["kind"], "greeting");
    }

    #[tokio::test]
    async fn test_stats_for_admin() {
        let app = router();
        let (status, json) = call(&app, Method::GET, "/api/v1/stats?admin_id=1", None).await;
        assert_eq!(status, StatusCode::OK);
        let rows = json["reply"]["data"].as_array().unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0]["name"], "basic");
        assert_eq!(rows[0]["total"], 2);
    }

    #[tokio::test]
    async fn test_user_management() {
        let app = router();
        let (status, _) = call(
            &app,
            Method::POST,
            "/admin/users",
            Some(serde_json::json!({ "admin_id": ADMIN, "user_id": 9 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, json) = call(&app, Method::GET, "/admin/users?admin_id=1", None).await;
        assert_eq!(json["reply"]["data"], serde_json::json!([1, 9]));

        let (status, json) = call(&app, Method::DELETE, "/admin/users/9?admin_id=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["reply"]["data"]["removed"], true);
    }

    // -----------------------------------------------------------------------
    // Errors
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_error_statuses() {
        let app = router();

        let (status, json) = call(
            &app,
            Method::POST,
            "/api/v1/submit",
            Some(serde_json::json!({ "user_id": ADMIN, "token": "xyz" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert!(json.get("reply").is_none());

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/feedback",
            Some(serde_json::json!({ "user_id": ADMIN, "value": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/submit",
            Some(serde_json::json!({ "user_id": 77, "token": TOKEN })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(&app, Method::GET, "/api/v1/stats?admin_id=77", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_feedback_value_must_be_bit() {
        let app = router();
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/feedback",
            Some(serde_json::json!({ "user_id": ADMIN, "value": 2 })),
        )
        .await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_index_lists_predictors() {
        let app = router();
        let (_, json) = call(&app, Method::GET, "/", None).await;
        let predictors = json["predictors"].as_array().unwrap();
        assert_eq!(predictors.len(), 10);
        assert_eq!(predictors[0]["name"], "basic");
        assert_eq!(predictors[0]["uses_history"], false);
        assert_eq!(predictors[3]["name"], "trend");
        assert_eq!(predictors[3]["uses_history"], true);
        assert_eq!(json["version"], hexvote_core::VERSION);
    }
}

// ABOUTME: HTTP server exposing the intent API, the scheduler tick and the Telegram webhook
// ABOUTME: Shared-secret auth via X-Authorization; every handler answers, even when a gear panics

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use butler_core::intents::surfaces::TELEGRAM_LURCH;
use butler_core::Params;
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::butler::{Butler, TaskRun};
use crate::metrics;
use crate::surfaces::TelegramUpdate;

pub const API_BASE: &str = "/butler/api/v1.0";
pub const TELEGRAM_WEBHOOK_PATH: &str = "/butler/telegramwebhook/v1.0";
pub const AUTH_HEADER: &str = "X-Authorization";

#[derive(Clone)]
struct WebhookState {
    butler: Arc<Butler>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TickResponse {
    pub success: bool,
    pub at: String,
    pub runs: Vec<TaskRun>,
}

#[derive(Debug, Deserialize)]
pub struct TickQuery {
    pub at: Option<String>,
}

fn reply(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiResponse>) {
    (
        status,
        Json(ApiResponse {
            success: status.is_success(),
            message: message.into(),
        }),
    )
}

/// Build the application router. The metrics route is only mounted when a
/// Prometheus recorder has been installed.
pub fn router(butler: Arc<Butler>, metrics_handle: Option<PrometheusHandle>) -> Router {
    let state = Arc::new(WebhookState { butler });

    let mut app = Router::new()
        .route("/", get(root_handler))
        .route(&format!("{}/intent", API_BASE), post(intent_handler))
        .route(&format!("{}/scheduler/tick", API_BASE), post(tick_handler))
        .route(TELEGRAM_WEBHOOK_PATH, post(telegram_webhook_handler))
        .with_state(state);

    if let Some(handle) = metrics_handle {
        let metrics_routes = Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(Arc::new(handle));
        app = app.merge(metrics_routes);
    }

    app.layer(TraceLayer::new_for_http())
}

/// Start the HTTP server and serve until the process ends
pub async fn start_server(butler: Arc<Butler>, metrics_handle: Option<PrometheusHandle>) -> Result<()> {
    let addr = format!(
        "{}:{}",
        butler.config().server.host,
        butler.config().server.port
    );
    let app = router(butler, metrics_handle);

    tracing::info!(addr = %addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

async fn root_handler() -> &'static str {
    "The butler is at your service"
}

fn auth_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTH_HEADER).and_then(|v| v.to_str().ok())
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
}

/// Handle POST /butler/api/v1.0/intent
async fn intent_handler(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<ApiResponse>) {
    if !state.butler.is_client_authorized(auth_key(&headers)) {
        tracing::warn!("Intent request with a wrong or missing authorization key");
        metrics::record_api_request("unauthorized");
        return reply(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    if !is_json(&headers) {
        metrics::record_api_request("bad_request");
        return reply(StatusCode::BAD_REQUEST, "No json data in the request");
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable intent body");
            metrics::record_api_request("bad_request");
            return reply(StatusCode::BAD_REQUEST, "Invalid json body, cannot parse it");
        }
    };

    let Some(intent) = payload
        .get("intent")
        .and_then(Value::as_str)
        .filter(|i| !i.trim().is_empty())
        .map(str::to_string)
    else {
        metrics::record_api_request("bad_request");
        return reply(StatusCode::BAD_REQUEST, "Missing intent field in the request");
    };

    let params: Params = match payload.get("params") {
        None | Some(Value::Null) => Params::new(),
        Some(Value::Object(map)) => map.clone().into_iter().collect(),
        Some(_) => {
            metrics::record_api_request("bad_request");
            return reply(StatusCode::BAD_REQUEST, "The params field must be an object");
        }
    };

    tracing::info!(intent = %intent, params = params.len(), "Intent request received");

    // Gears run on their own task so a panic becomes a 500 instead of a dropped connection
    let butler = Arc::clone(&state.butler);
    let dispatch_intent = intent.clone();
    let outcome =
        tokio::spawn(async move { butler.process_intent(&dispatch_intent, &params).await }).await;

    match outcome {
        Ok(result) => {
            let message = result.messages().join("\n");
            if result.went_well() {
                metrics::record_api_request("ok");
                reply(StatusCode::OK, message)
            } else {
                metrics::record_api_request("error");
                reply(StatusCode::BAD_REQUEST, message)
            }
        }
        Err(e) => {
            tracing::error!(intent = %intent, error = %e, "Gear crashed while processing intent");
            metrics::record_api_request("internal_error");
            metrics::record_error("gear_panic");
            reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong while processing your request",
            )
        }
    }
}

/// Handle POST /butler/api/v1.0/scheduler/tick
///
/// Meant for an external hourly trigger. `at` overrides the current time.
async fn tick_handler(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    Query(query): Query<TickQuery>,
) -> axum::response::Response {
    if !state.butler.is_client_authorized(auth_key(&headers)) {
        tracing::warn!("Scheduler tick with a wrong or missing authorization key");
        metrics::record_api_request("unauthorized");
        return reply(StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let at = match query.at.as_deref() {
        None => Utc::now(),
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(at) => at.with_timezone(&Utc),
            Err(e) => {
                metrics::record_api_request("bad_request");
                return reply(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid 'at' instant '{}': {}", raw, e),
                )
                .into_response();
            }
        },
    };

    let runs = state.butler.run_scheduled_tasks(at).await;
    metrics::record_api_request("ok");
    (
        StatusCode::OK,
        Json(TickResponse {
            success: true,
            at: at.to_rfc3339(),
            runs,
        }),
    )
        .into_response()
}

/// Handle POST /butler/telegramwebhook/v1.0
///
/// Always answers 200: Telegram retries anything else. Work happens on a
/// spawned task so the update is acknowledged right away.
async fn telegram_webhook_handler(State(state): State<Arc<WebhookState>>, body: Bytes) -> &'static str {
    let update = match serde_json::from_slice::<Value>(&body) {
        Ok(value) => TelegramUpdate::from_json(value),
        Err(e) => {
            tracing::debug!(error = %e, "Telegram webhook body is not json");
            metrics::record_telegram_update("invalid");
            return "OK";
        }
    };

    let surface_id = state
        .butler
        .config()
        .telegram
        .as_ref()
        .map(|t| t.surface_id.clone())
        .unwrap_or_else(|| TELEGRAM_LURCH.to_string());

    let Some(message) = update.to_surface_message(&surface_id) else {
        metrics::record_telegram_update("ignored");
        return "OK";
    };

    let auth_key = update.auth_key();
    if !state.butler.is_client_authorized(auth_key.as_deref()) {
        tracing::warn!(
            user_id = auth_key.as_deref().unwrap_or_default(),
            "Telegram message from a user not allowed to talk to the butler"
        );
        metrics::record_telegram_update("unauthorized");
        return "OK";
    }

    metrics::record_telegram_update("message");
    let butler = Arc::clone(&state.butler);
    tokio::spawn(async move {
        butler.receive_message(&message).await;
    });
    "OK"
}

/// Handle GET /metrics - returns Prometheus text format
async fn metrics_handler(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}

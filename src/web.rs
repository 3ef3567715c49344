//! HTTP 接口
//!
//! - `POST /chat`：`{"message": "..."}` → `{"reply", "routed_to", "anonymized"}`
//! - `GET /api/health`
//!
//! 所有响应带宽松的 CORS 头（前端页面可能直接从磁盘打开）。内部错误只返回通用提示，细节进日志。

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::Instrument;

use crate::core::{AdvisorError, AdvisorRouter};
use crate::llm::Backend;

/// 对外的通用失败提示
pub const UNAVAILABLE_MESSAGE: &str = "Advisor unavailable";

pub struct AppState {
    pub advisor: AdvisorRouter,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub routed_to: Backend,
    pub anonymized: bool,
}

/// 创建 HTTP 路由
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", post(chat).options(preflight))
        .route("/api/health", get(health))
        .layer(middleware::map_response(add_cors_headers))
        .with_state(state)
}

impl IntoResponse for AdvisorError {
    fn into_response(self) -> Response {
        match &self {
            AdvisorError::InvalidInput => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            AdvisorError::BackendUnavailable { stage, source } => {
                tracing::error!("Advisor failed at {} stage: {}", stage, source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": UNAVAILABLE_MESSAGE })),
                )
                    .into_response()
            }
        }
    }
}

/// 缺字段、非字符串、JSON 不合法都按输入错误处理
fn extract_message(payload: Result<Json<Value>, JsonRejection>) -> Result<String, AdvisorError> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::debug!("Rejected chat body: {}", rejection);
        AdvisorError::InvalidInput
    })?;

    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
        .ok_or(AdvisorError::InvalidInput)
}

async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, AdvisorError> {
    let message = extract_message(payload)?;

    let span = tracing::info_span!("chat", request_id = %uuid::Uuid::new_v4());
    let result = state.advisor.handle(&message).instrument(span).await?;

    Ok(Json(ChatResponse {
        routed_to: result.routed_to(),
        anonymized: result.anonymized(),
        reply: result.reply,
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let (_, _, remote_tokens) = state.advisor.remote_token_usage();
    Json(json!({
        "status": "ok",
        "local_model": state.advisor.local_model(),
        "remote_enabled": state.advisor.remote_enabled(),
        "remote_tokens": remote_tokens,
    }))
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn add_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    response
}

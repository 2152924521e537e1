//! 语音平台 Webhook 集成
//!
//! 通过 POST /webhook（或 /）逐条接收话语，调用对话状态机后以
//! { "reply": "..." } 回复。兼容两种载荷：直连对话（session_id + message）
//! 与通话后转写（post_call_transcription，取最后一条转写文本）。
//! 可选的共享密钥签名头在进入状态机之前校验。

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::dialog::{DialogError, DialogMachine};

/// 来源校验签名头
pub const SIGNATURE_HEADER: &str = "x-elevenlabs-signature";

/// Webhook 服务状态
pub struct VoiceState {
    pub machine: DialogMachine,
    /// 未配置时拒绝所有带签名头的请求；不带签名头的请求直接放行
    pub webhook_secret: Option<String>,
}

/// 入站载荷
#[derive(Debug, Default, Deserialize)]
pub struct VoicePayload {
    pub session_id: Option<String>,
    pub conversation_id: Option<String>,
    pub message: Option<String>,
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub data: Option<TranscriptionData>,
}

/// post_call_transcription 的数据体
#[derive(Debug, Default, Deserialize)]
pub struct TranscriptionData {
    pub conversation_id: Option<String>,
    pub transcript: Option<Vec<TranscriptEntry>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TranscriptEntry {
    pub text: Option<String>,
}

/// 统一回复体
#[derive(Debug, Serialize)]
pub struct Reply {
    pub reply: String,
}

/// 创建 Webhook 路由
pub fn create_router(state: Arc<VoiceState>) -> Router {
    Router::new()
        .route("/webhook", post(webhook_receive))
        .route("/", post(webhook_receive))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}

/// POST /webhook - 接收一条话语
async fn webhook_receive(
    State(state): State<Arc<VoiceState>>,
    headers: HeaderMap,
    Json(payload): Json<VoicePayload>,
) -> (StatusCode, Json<Reply>) {
    if let Some(signature) = headers.get(SIGNATURE_HEADER) {
        let valid = state
            .webhook_secret
            .as_deref()
            .is_some_and(|secret| signature.to_str().ok() == Some(secret));
        if !valid {
            tracing::warn!("Invalid webhook signature");
            return reply(StatusCode::UNAUTHORIZED, "Unauthorized");
        }
    }

    let (session_id, message) = extract_turn(payload);
    let Some(message) = message else {
        return reply(StatusCode::BAD_REQUEST, "Invalid request format.");
    };

    match state.machine.handle_turn(&session_id, &message).await {
        Ok(text) => (StatusCode::OK, Json(Reply { reply: text })),
        Err(DialogError::InvalidRequest) => reply(StatusCode::BAD_REQUEST, "Invalid request format."),
        Err(DialogError::IntentNotUnderstood) => reply(
            StatusCode::NOT_FOUND,
            "Sorry, I couldn't understand the request.",
        ),
        Err(DialogError::NoCatalogMatch) => reply(StatusCode::NOT_FOUND, "No catalog matched."),
        Err(DialogError::Catalog(e)) => {
            tracing::error!("Catalog service error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(Reply {
                    reply: format!("Server error: {}", e),
                }),
            )
        }
    }
}

fn reply(status: StatusCode, text: &str) -> (StatusCode, Json<Reply>) {
    (
        status,
        Json(Reply {
            reply: text.to_string(),
        }),
    )
}

/// 提取 (会话 ID, 消息文本)
///
/// 会话 ID 取 session_id / conversation_id，都缺则生成 UUID；
/// 消息取 message / text；通话后转写载荷覆盖两者。空消息返回 None。
fn extract_turn(payload: VoicePayload) -> (String, Option<String>) {
    let mut session_id = non_empty(payload.session_id)
        .or_else(|| non_empty(payload.conversation_id))
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let mut message = non_empty(payload.message).or_else(|| non_empty(payload.text));

    if payload.type_.as_deref() == Some("post_call_transcription") {
        if let Some(data) = payload.data {
            let last_text = data
                .transcript
                .as_ref()
                .and_then(|t| t.last())
                .and_then(|entry| entry.text.clone());
            if let Some(text) = non_empty(last_text) {
                message = Some(text);
            }
            if let Some(conversation_id) = non_empty(data.conversation_id) {
                session_id = conversation_id;
            }
        }
    }

    (
        session_id,
        message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty()),
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

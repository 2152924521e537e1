//! 目录服务 HTTP 客户端
//!
//! 语音助手 REST 端点：parse_intent / get_variables / submit_catalog /
//! poll_ritm_state / get_loggedin_user。响应统一剥掉 { "result": ... } 包装层。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::types::{IntentResolution, ResolvedUser, SubmitReceipt, TicketStatus, VariableDef};
use super::{CatalogError, CatalogService};

const API_ROOT: &str = "api/x_eyi_wsd_app_form/voiceassistantapi";

/// 视为终态的工单状态子串
const TERMINAL_STATES: &[&str] = &["complete", "closed", "fulfilled"];

/// 出网客户端：实例根地址 + 可选 Basic 认证，所有请求带显式超时
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base_url: String,
    auth: Option<(String, String)>,
}

/// 提交回执的三种历史命名别名
#[derive(Debug, Default, Deserialize)]
struct WireReceipt {
    #[serde(default)]
    ritm_number: Option<String>,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(rename = "requestId", default)]
    request_id_camel: Option<String>,
}

impl WireReceipt {
    fn ticket(self) -> Option<String> {
        self.ritm_number.or(self.request_id).or(self.request_id_camel)
    }
}

impl HttpCatalogClient {
    /// 认证仅在用户名和密码都提供时启用
    pub fn new(
        base_url: &str,
        username: Option<String>,
        password: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let auth = match (username, password) {
            (Some(user), Some(pass)) => Some((user, pass)),
            _ => None,
        };
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_ROOT, name)
    }

    async fn post_json(&self, name: &str, body: Value) -> Result<Value, CatalogError> {
        let mut req = self.http.post(self.endpoint(name)).json(&body);
        if let Some((user, pass)) = &self.auth {
            req = req.basic_auth(user, Some(pass));
        }
        Self::read_json(name, req.send().await?).await
    }

    async fn get_json(&self, name: &str, query: &[(&str, &str)]) -> Result<Value, CatalogError> {
        let mut req = self.http.get(self.endpoint(name)).query(query);
        if let Some((user, pass)) = &self.auth {
            req = req.basic_auth(user, Some(pass));
        }
        Self::read_json(name, req.send().await?).await
    }

    async fn read_json(name: &str, resp: reqwest::Response) -> Result<Value, CatalogError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                endpoint: name.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        let value: Value = resp.json().await?;
        Ok(unwrap_result(value))
    }
}

/// 剥掉 { "result": ... } 包装层
fn unwrap_result(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("result") => {
            map.remove("result").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[async_trait]
impl CatalogService for HttpCatalogClient {
    async fn parse_intent(&self, utterance: &str) -> Result<Option<IntentResolution>, CatalogError> {
        let value = self
            .post_json("parse_intent", json!({ "utterance": utterance }))
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        let intent: IntentResolution =
            serde_json::from_value(value).map_err(|e| CatalogError::Decode(e.to_string()))?;
        Ok(Some(intent))
    }

    async fn variables(&self, catalog_id: &str) -> Result<Vec<VariableDef>, CatalogError> {
        let value = self
            .post_json("get_variables", json!({ "catalog_item_sys_id": catalog_id }))
            .await?;
        // 兼容裸数组与 { "variables": [...] } 两种形状
        let list = if value.is_array() {
            value
        } else if let Some(vars) = value.get("variables") {
            vars.clone()
        } else {
            Value::Array(Vec::new())
        };
        serde_json::from_value(list).map_err(|e| CatalogError::Decode(e.to_string()))
    }

    async fn submit(
        &self,
        catalog_id: &str,
        answers: &[(String, String)],
    ) -> Result<SubmitReceipt, CatalogError> {
        let mut variables = serde_json::Map::new();
        for (name, value) in answers {
            variables.insert(name.clone(), Value::String(value.clone()));
        }
        let value = self
            .post_json(
                "submit_catalog",
                json!({ "catalog_item_sys_id": catalog_id, "variables": variables }),
            )
            .await?;
        let receipt: WireReceipt = serde_json::from_value(value).unwrap_or_default();
        Ok(SubmitReceipt {
            ticket: receipt.ticket(),
        })
    }

    async fn poll_status(
        &self,
        ticket: &str,
        interval: Duration,
        max_attempts: u32,
    ) -> Result<Option<TicketStatus>, CatalogError> {
        for attempt in 0..max_attempts {
            if attempt > 0 {
                tokio::time::sleep(interval).await;
            }
            match self
                .get_json("poll_ritm_state", &[("ritm_number", ticket)])
                .await
            {
                Ok(value) => {
                    let state = match value.get("state") {
                        Some(Value::String(s)) => s.to_lowercase(),
                        Some(other) => other.to_string().to_lowercase(),
                        None => String::new(),
                    };
                    if TERMINAL_STATES.iter().any(|t| state.contains(t)) {
                        let description = value
                            .get("description")
                            .and_then(|d| d.as_str())
                            .unwrap_or("")
                            .to_string();
                        return Ok(Some(TicketStatus { state, description }));
                    }
                }
                Err(e) => tracing::warn!("poll_ritm_state attempt failed: {}", e),
            }
        }
        Ok(None)
    }

    async fn logged_in_user(&self) -> Result<Option<ResolvedUser>, CatalogError> {
        let value = self.get_json("get_loggedin_user", &[]).await?;
        if value.is_null() {
            return Ok(None);
        }
        let user: ResolvedUser =
            serde_json::from_value(value).map_err(|e| CatalogError::Decode(e.to_string()))?;
        Ok((!user.id.is_empty()).then_some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_result_strips_envelope() {
        let wrapped = json!({ "result": { "state": "closed" } });
        assert_eq!(unwrap_result(wrapped), json!({ "state": "closed" }));

        let bare = json!({ "state": "closed" });
        assert_eq!(unwrap_result(bare.clone()), bare);
    }

    #[test]
    fn test_wire_receipt_aliases() {
        let receipt: WireReceipt =
            serde_json::from_value(json!({ "ritm_number": "RITM001" })).unwrap();
        assert_eq!(receipt.ticket().as_deref(), Some("RITM001"));

        let receipt: WireReceipt =
            serde_json::from_value(json!({ "requestId": "REQ9" })).unwrap();
        assert_eq!(receipt.ticket().as_deref(), Some("REQ9"));

        let receipt: WireReceipt = serde_json::from_value(json!({})).unwrap();
        assert!(receipt.ticket().is_none());
    }
}

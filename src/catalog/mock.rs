//! 脚本化目录服务（用于测试，不出网）
//!
//! 预置意图解析结果、变量列表与提交回执；记录每次提交的载荷供断言。

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::types::{IntentResolution, ResolvedUser, SubmitReceipt, TicketStatus, VariableDef};
use super::{CatalogError, CatalogService};

/// Mock 客户端：按预置脚本应答
#[derive(Default)]
pub struct MockCatalogService {
    intent: Option<IntentResolution>,
    variables: Vec<VariableDef>,
    user: Option<ResolvedUser>,
    ticket: Option<String>,
    status: Option<TicketStatus>,
    fail_submit: bool,
    submissions: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl MockCatalogService {
    pub fn new() -> Self {
        Self::default()
    }

    /// 意图解析命中指定目录项
    pub fn with_intent(mut self, catalog_id: &str) -> Self {
        self.intent = Some(IntentResolution {
            catalog_id: Some(catalog_id.to_string()),
            user: None,
        });
        self
    }

    /// 意图可解析但没有匹配的目录项
    pub fn with_unmatched_intent(mut self) -> Self {
        self.intent = Some(IntentResolution::default());
        self
    }

    /// 登录用户查询返回的身份
    pub fn with_user(mut self, id: &str, name: &str) -> Self {
        self.user = Some(ResolvedUser {
            id: id.to_string(),
            name: Some(name.to_string()),
        });
        self
    }

    pub fn with_variables(mut self, variables: Vec<VariableDef>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_ticket(mut self, ticket: &str) -> Self {
        self.ticket = Some(ticket.to_string());
        self
    }

    /// 轮询立即观察到的终态
    pub fn with_status(mut self, state: &str, description: &str) -> Self {
        self.status = Some(TicketStatus {
            state: state.to_string(),
            description: description.to_string(),
        });
        self
    }

    pub fn failing_submit(mut self) -> Self {
        self.fail_submit = true;
        self
    }

    /// 已记录的提交载荷（目录 ID + name -> value 列表）
    pub fn submissions(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogService for MockCatalogService {
    async fn parse_intent(&self, _utterance: &str) -> Result<Option<IntentResolution>, CatalogError> {
        Ok(self.intent.clone())
    }

    async fn variables(&self, _catalog_id: &str) -> Result<Vec<VariableDef>, CatalogError> {
        Ok(self.variables.clone())
    }

    async fn submit(
        &self,
        catalog_id: &str,
        answers: &[(String, String)],
    ) -> Result<SubmitReceipt, CatalogError> {
        self.submissions
            .lock()
            .unwrap()
            .push((catalog_id.to_string(), answers.to_vec()));
        if self.fail_submit {
            return Err(CatalogError::Status {
                endpoint: "submit_catalog".to_string(),
                status: 500,
                body: "scripted failure".to_string(),
            });
        }
        Ok(SubmitReceipt {
            ticket: self.ticket.clone(),
        })
    }

    async fn poll_status(
        &self,
        _ticket: &str,
        _interval: Duration,
        _max_attempts: u32,
    ) -> Result<Option<TicketStatus>, CatalogError> {
        Ok(self.status.clone())
    }

    async fn logged_in_user(&self) -> Result<Option<ResolvedUser>, CatalogError> {
        Ok(self.user.clone())
    }
}

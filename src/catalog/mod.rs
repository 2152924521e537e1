//! 目录服务集成
//!
//! 意图解析、变量 schema、提交与状态轮询都由外部目录服务承担；
//! 本模块只定义调用契约（CatalogService）及其 HTTP / Mock 实现。

pub mod client;
pub mod mock;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use client::HttpCatalogClient;
pub use mock::MockCatalogService;
pub use types::{ChoiceDef, IntentResolution, ResolvedUser, SubmitReceipt, TicketStatus, VariableDef};

/// 目录服务调用失败
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog endpoint {endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected response shape: {0}")]
    Decode(String),
}

/// 目录服务契约
///
/// 对话核心只依赖这个 trait；HTTP 实现出网，Mock 实现用于测试。
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// 从原始话语解析意图；无法解析时返回 None
    async fn parse_intent(&self, utterance: &str) -> Result<Option<IntentResolution>, CatalogError>;

    /// 拉取目录项的有序变量列表；空列表合法（零问题流程）
    async fn variables(&self, catalog_id: &str) -> Result<Vec<VariableDef>, CatalogError>;

    /// 提交收齐的 name -> value 映射
    async fn submit(
        &self,
        catalog_id: &str,
        answers: &[(String, String)],
    ) -> Result<SubmitReceipt, CatalogError>;

    /// 有界轮询工单状态：观察到终态（complete/closed/fulfilled 子串）即返回，
    /// 次数耗尽返回 Ok(None)；单次查询失败只记日志不中断
    async fn poll_status(
        &self,
        ticket: &str,
        interval: Duration,
        max_attempts: u32,
    ) -> Result<Option<TicketStatus>, CatalogError>;

    /// 当前登录用户；服务未返回有效标识时为 None
    async fn logged_in_user(&self) -> Result<Option<ResolvedUser>, CatalogError>;
}

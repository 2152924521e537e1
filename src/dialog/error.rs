//! 对话错误类型
//!
//! 只收录让当前轮次无法正常走完的失败；答案规整失败不在此列
//! （静默回退原文）。提交失败也不在此列：会话销毁后用道歉文案回复。

use thiserror::Error;

use crate::catalog::CatalogError;

#[derive(Error, Debug)]
pub enum DialogError {
    /// 缺少会话 ID 或消息文本，进入状态机之前即被拒绝
    #[error("Invalid request")]
    InvalidRequest,

    /// 意图解析没有结果
    #[error("Could not understand the request")]
    IntentNotUnderstood,

    /// 意图结果里没有匹配的目录项
    #[error("No catalog item matched")]
    NoCatalogMatch,

    /// 目录服务调用失败
    #[error("Catalog service error: {0}")]
    Catalog(#[from] CatalogError),
}

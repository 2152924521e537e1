//! Beeline - 目录请求槽位填充对话引擎
//!
//! 通过 Webhook 逐条接收用户话语：先识别目标目录项，再逐字段追问并规整答案，
//! 收齐后出确认摘要（支持就地修正），确认即提交到外部目录服务并轮询结果。
//!
//! 模块划分：
//! - **catalog**: 外部目录服务契约（意图解析 / 变量 schema / 提交 / 状态轮询）与 HTTP、Mock 实现
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **dialog**: 会话模型与存储、对话状态机、确认阶段修正解析
//! - **integrations**: 语音平台 Webhook 入口
//! - **normalize**: 答案规整流水线（填充词剥离、选项模糊匹配、日期时间解析与合并）

pub mod catalog;
pub mod config;
pub mod dialog;
pub mod integrations;
pub mod normalize;

pub use dialog::{DialogError, DialogMachine};

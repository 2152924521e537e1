//! 目录服务数据类型
//!
//! REST 载荷在这里只保留状态机关心的字段；其余键一律忽略。

use serde::Deserialize;

/// 意图解析结果：目标目录项与（可选的）已解析申请人
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntentResolution {
    #[serde(rename = "catalog_item_sys_id", default)]
    pub catalog_id: Option<String>,
    #[serde(default)]
    pub user: Option<ResolvedUser>,
}

/// 解析出的用户身份（标识 + 显示名）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolvedUser {
    #[serde(rename = "sys_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// 目录变量定义（一个待收集字段的 schema）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariableDef {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(rename = "type", default)]
    pub type_hint: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChoiceDef>,
    /// 预填答案（如有）
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
}

/// 选项定义；label 与 value 缺一时互为回退
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoiceDef {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// 提交回执：外部服务返回的工单号（命名别名已在客户端归一）
#[derive(Debug, Clone, Default)]
pub struct SubmitReceipt {
    pub ticket: Option<String>,
}

/// 轮询观察到的工单终态
#[derive(Debug, Clone)]
pub struct TicketStatus {
    pub state: String,
    pub description: String,
}

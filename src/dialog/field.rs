//! 字段模型
//!
//! 一个目录变量即一个待收集字段。规整类别（kind）在接入时一次性判定，
//! 之后流水线按 kind 分派。

use crate::catalog::types::{ResolvedUser, VariableDef};

/// 合成的申请人字段名；创建会话时固定插在最前并预填答案
pub const REQUESTED_FOR: &str = "requested_for";

/// 枚举字段的一个选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub value: String,
}

/// 字段的规整类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 枚举选项，走模糊匹配
    Choice,
    /// 名称含 date，走日期解析
    Date,
    /// 名称含 time，走时间解析
    Time,
    /// 其余：原文存储
    Plain,
}

/// 会话中的一个待填字段
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub label: Option<String>,
    pub question: Option<String>,
    pub kind: FieldKind,
    pub choices: Vec<Choice>,
    pub answer: Option<String>,
    /// 渲染确认摘要时的人类可读覆盖值（requested_for 解析出的姓名）
    pub display_name: Option<String>,
}

impl Field {
    /// 由目录服务的变量定义构造字段；选项 label/value 互为回退，
    /// 空串答案视为未填
    pub fn from_variable(def: VariableDef) -> Self {
        let choices: Vec<Choice> = def
            .choices
            .into_iter()
            .filter_map(|c| match (c.label, c.value) {
                (Some(label), Some(value)) => Some(Choice { label, value }),
                (Some(label), None) => Some(Choice {
                    value: label.clone(),
                    label,
                }),
                (None, Some(value)) => Some(Choice {
                    label: value.clone(),
                    value,
                }),
                (None, None) => None,
            })
            .collect();

        let kind = resolve_kind(&def.name, def.type_hint.as_deref(), !choices.is_empty());

        Self {
            name: def.name,
            label: def.label,
            question: def.question.filter(|q| !q.trim().is_empty()),
            kind,
            choices,
            answer: def.answer.filter(|a| !a.trim().is_empty()),
            display_name: def.display_name,
        }
    }

    /// 合成的申请人字段：答案预填为用户标识，显示名留给确认摘要
    pub fn requested_for(user: ResolvedUser) -> Self {
        Self {
            name: REQUESTED_FOR.to_string(),
            label: None,
            question: Some("Requested for".to_string()),
            kind: FieldKind::Plain,
            choices: Vec::new(),
            answer: Some(user.id),
            display_name: user.name,
        }
    }

    /// 提问文案：无 question 时由 label 或原始名称生成
    pub fn prompt(&self) -> String {
        match &self.question {
            Some(question) => question.clone(),
            None => format!(
                "Please provide {}",
                self.label.as_deref().unwrap_or(&self.name)
            ),
        }
    }

    /// 确认摘要中显示的值：requested_for 有显示名时用显示名，其余用答案
    pub fn display_value(&self) -> Option<&str> {
        if self.name == REQUESTED_FOR {
            if let Some(name) = self.display_name.as_deref() {
                return Some(name);
            }
        }
        self.answer.as_deref()
    }
}

fn resolve_kind(name: &str, type_hint: Option<&str>, has_choices: bool) -> FieldKind {
    if has_choices {
        return FieldKind::Choice;
    }
    let name = name.to_lowercase();
    if name.contains("date") {
        return FieldKind::Date;
    }
    if name.contains("time") {
        return FieldKind::Time;
    }
    match type_hint.map(str::to_lowercase).as_deref() {
        Some("date") => FieldKind::Date,
        Some("time") => FieldKind::Time,
        _ => FieldKind::Plain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::ChoiceDef;

    #[test]
    fn test_kind_resolution() {
        let def = VariableDef {
            name: "booking_date".to_string(),
            ..VariableDef::default()
        };
        assert_eq!(Field::from_variable(def).kind, FieldKind::Date);

        let def = VariableDef {
            name: "booking_start_time".to_string(),
            ..VariableDef::default()
        };
        assert_eq!(Field::from_variable(def).kind, FieldKind::Time);

        let def = VariableDef {
            name: "location".to_string(),
            choices: vec![ChoiceDef {
                label: Some("Quiet Zone".to_string()),
                value: Some("qz".to_string()),
            }],
            ..VariableDef::default()
        };
        assert_eq!(Field::from_variable(def).kind, FieldKind::Choice);

        let def = VariableDef {
            name: "purpose".to_string(),
            ..VariableDef::default()
        };
        assert_eq!(Field::from_variable(def).kind, FieldKind::Plain);
    }

    #[test]
    fn test_choice_backfill() {
        let def = VariableDef {
            name: "location".to_string(),
            choices: vec![
                ChoiceDef {
                    label: Some("Quiet Zone".to_string()),
                    value: None,
                },
                ChoiceDef {
                    label: None,
                    value: Some("od".to_string()),
                },
                ChoiceDef {
                    label: None,
                    value: None,
                },
            ],
            ..VariableDef::default()
        };
        let field = Field::from_variable(def);
        assert_eq!(field.choices.len(), 2);
        assert_eq!(field.choices[0].value, "Quiet Zone");
        assert_eq!(field.choices[1].label, "od");
    }

    #[test]
    fn test_prompt_fallbacks() {
        let def = VariableDef {
            name: "cost_center".to_string(),
            ..VariableDef::default()
        };
        assert_eq!(Field::from_variable(def).prompt(), "Please provide cost_center");

        let def = VariableDef {
            name: "cost_center".to_string(),
            label: Some("Cost center".to_string()),
            ..VariableDef::default()
        };
        assert_eq!(Field::from_variable(def).prompt(), "Please provide Cost center");

        let def = VariableDef {
            name: "cost_center".to_string(),
            question: Some("Which cost center?".to_string()),
            ..VariableDef::default()
        };
        assert_eq!(Field::from_variable(def).prompt(), "Which cost center?");
    }

    #[test]
    fn test_requested_for_display_value() {
        let field = Field::requested_for(ResolvedUser {
            id: "u123".to_string(),
            name: Some("Alex Chen".to_string()),
        });
        assert_eq!(field.answer.as_deref(), Some("u123"));
        assert_eq!(field.display_value(), Some("Alex Chen"));

        let field = Field::requested_for(ResolvedUser {
            id: "u123".to_string(),
            name: None,
        });
        assert_eq!(field.display_value(), Some("u123"));
    }
}

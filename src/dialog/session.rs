//! 会话状态
//!
//! 一次槽位填充对话的全部状态：目标目录项、有序字段、游标与阶段。
//! 字段顺序与目录 ID 创建后不再变化；游标在收集阶段只增不减。

use super::field::Field;

/// 对话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 正在逐个收集字段答案
    AwaitingVariable,
    /// 已收齐，等待用户确认或修正
    Confirming,
}

/// 单个会话
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub catalog_id: String,
    pub fields: Vec<Field>,
    /// 下一个待问字段的下标
    pub cursor: usize,
    pub phase: Phase,
}

impl Session {
    pub fn new(session_id: String, catalog_id: String, fields: Vec<Field>) -> Self {
        Self {
            session_id,
            catalog_id,
            fields,
            cursor: 0,
            phase: Phase::AwaitingVariable,
        }
    }

    /// 当前待答字段
    pub fn current_field(&self) -> Option<&Field> {
        self.fields.get(self.cursor)
    }

    /// 把当前字段的答案写入并前移游标
    pub fn store_answer(&mut self, answer: String) {
        if let Some(field) = self.fields.get_mut(self.cursor) {
            field.answer = Some(answer);
            self.cursor += 1;
        }
    }

    /// 就地覆盖指定字段的答案（确认阶段修正；不动游标）
    pub fn set_answer(&mut self, index: usize, answer: String) {
        if let Some(field) = self.fields.get_mut(index) {
            field.answer = Some(answer);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.fields.iter().all(|f| f.answer.is_some())
    }

    /// 下一个未答字段的问题；顺带把游标推过已预填的字段
    pub fn next_question(&mut self) -> Option<String> {
        while self.cursor < self.fields.len() {
            let field = &self.fields[self.cursor];
            if field.answer.is_none() {
                return Some(field.prompt());
            }
            self.cursor += 1;
        }
        None
    }

    /// 确认摘要正文：下划线转空格的 name: value 列表
    pub fn summary(&self) -> String {
        self.fields
            .iter()
            .filter_map(|f| {
                f.display_value()
                    .map(|v| format!("{}: {}", f.name.replace('_', " "), v))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 提交用的有序 name -> 原始答案 映射（display_name 不参与）
    pub fn collected_answers(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter_map(|f| f.answer.clone().map(|a| (f.name.clone(), a)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::ResolvedUser;
    use crate::dialog::field::FieldKind;

    fn plain_field(name: &str, answer: Option<&str>) -> Field {
        Field {
            name: name.to_string(),
            label: None,
            question: Some(format!("{}?", name)),
            kind: FieldKind::Plain,
            choices: Vec::new(),
            answer: answer.map(str::to_string),
            display_name: None,
        }
    }

    #[test]
    fn test_next_question_skips_prefilled() {
        let mut session = Session::new(
            "s1".to_string(),
            "cat1".to_string(),
            vec![
                plain_field("requested_for", Some("u1")),
                plain_field("booking_date", None),
            ],
        );
        assert_eq!(session.next_question().as_deref(), Some("booking_date?"));
        assert_eq!(session.cursor, 1);
    }

    #[test]
    fn test_store_answer_advances_cursor() {
        let mut session = Session::new(
            "s1".to_string(),
            "cat1".to_string(),
            vec![plain_field("a", None), plain_field("b", None)],
        );
        session.store_answer("one".to_string());
        assert_eq!(session.cursor, 1);
        assert_eq!(session.fields[0].answer.as_deref(), Some("one"));
        assert!(!session.is_complete());

        session.store_answer("two".to_string());
        assert_eq!(session.cursor, 2);
        assert!(session.is_complete());
        assert!(session.next_question().is_none());
        assert!(session.cursor <= session.fields.len());
    }

    #[test]
    fn test_summary_renders_underscores_and_display_name() {
        let mut session = Session::new(
            "s1".to_string(),
            "cat1".to_string(),
            vec![
                Field::requested_for(ResolvedUser {
                    id: "u1".to_string(),
                    name: Some("Alex Chen".to_string()),
                }),
                plain_field("booking_date", Some("2025-03-10")),
            ],
        );
        session.set_answer(1, "2025-03-10".to_string());
        assert_eq!(
            session.summary(),
            "requested for: Alex Chen, booking date: 2025-03-10"
        );
    }

    #[test]
    fn test_collected_answers_use_raw_values() {
        let session = Session::new(
            "s1".to_string(),
            "cat1".to_string(),
            vec![
                Field::requested_for(ResolvedUser {
                    id: "u1".to_string(),
                    name: Some("Alex Chen".to_string()),
                }),
                plain_field("purpose", Some("offsite")),
            ],
        );
        assert_eq!(
            session.collected_answers(),
            vec![
                ("requested_for".to_string(), "u1".to_string()),
                ("purpose".to_string(), "offsite".to_string()),
            ]
        );
    }
}

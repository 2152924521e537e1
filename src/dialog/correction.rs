//! 确认阶段的修正解析
//!
//! 宽松句式：可选动词（change/update/set）+ 字段词 + 可选连接词（to/is），
//! 余下文本即新值。字段词大小写不敏感地匹配字段 name 或 label；无匹配返回
//! None，由状态机按取消处理。这是尽力而为的启发式：值里带 to 之类的措辞
//! 可能把错误的词当成字段，所以新值原样存储、不再过规整流水线。

use std::sync::OnceLock;

use regex::Regex;

use super::field::Field;

static CORRECTION_RE: OnceLock<Regex> = OnceLock::new();

/// 解析出的修正：目标字段下标与新值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub index: usize,
    pub value: String,
}

pub fn parse_correction(text: &str, fields: &[Field]) -> Option<Correction> {
    let re = CORRECTION_RE.get_or_init(|| {
        Regex::new(r"(?i)(?:change|update|set)?\s*(\w+)\s*(?:to|is)?\s*(.+)").unwrap()
    });

    let caps = re.captures(text.trim())?;
    let token = caps.get(1)?.as_str().to_lowercase();
    let value = caps.get(2)?.as_str().trim().to_string();
    if value.is_empty() {
        return None;
    }

    let index = fields.iter().position(|f| {
        f.name.to_lowercase() == token
            || f.label
                .as_deref()
                .is_some_and(|l| l.to_lowercase() == token)
    })?;

    Some(Correction { index, value })
}

//! 答案规整流水线
//!
//! 对单个字段的原始回答依次做：填充词剥离、选项模糊匹配、日期解析、
//! 时间解析、日期+时间合并。每一步都可跳过，任何一步失败都保留上一步
//! 的文本，绝不报错。分派依据是字段接入时判定好的 kind，不在每次回答
//! 时重测名称子串。

pub mod fuzzy;
pub mod temporal;

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::dialog::field::{Field, FieldKind};

pub use fuzzy::closest_choice;
pub use temporal::{parse_date_iso, parse_time_hhmm};

/// 已知填充词（大小写不敏感，整体移除）
const FILLER_PHRASES: &[&str] = &["for the quiet zone", "in the quiet zone"];

/// 选项匹配的接受阈值（编辑距离）
const CHOICE_DISTANCE_MAX: usize = 3;

/// 参与日期+时间合并的字段名
const COMBINE_TIME_FIELDS: &[&str] = &["booking_start_time", "booking_end_time"];

static FILLER_RES: OnceLock<Vec<Regex>> = OnceLock::new();
static BARE_TIME_RE: OnceLock<Regex> = OnceLock::new();
static DATE_PREFIX_RE: OnceLock<Regex> = OnceLock::new();

/// 把原始回答规整为存储值
///
/// 纯函数：只读取兄弟字段的既有答案，不持有任何跨调用状态。
/// `today` 是相对日期（tomorrow 等）的锚定日。
pub fn normalize_answer(raw: &str, field: &Field, siblings: &[Field], today: NaiveDate) -> String {
    let mut answer = strip_fillers(raw);

    match field.kind {
        FieldKind::Choice => {
            if let Some((choice, dist)) = fuzzy::closest_choice(&answer, &field.choices) {
                if dist <= CHOICE_DISTANCE_MAX {
                    answer = choice.value.clone();
                }
            }
        }
        FieldKind::Date => {
            if let Some(iso) = temporal::parse_date_iso(&answer, today) {
                answer = iso;
            }
        }
        FieldKind::Time => {
            if let Some(hhmm) = temporal::parse_time_hhmm(&answer) {
                answer = hhmm;
            }
        }
        FieldKind::Plain => {}
    }

    if let Some(combined) = combine_with_date(&answer, field, siblings) {
        answer = combined;
    }

    answer
}

/// 移除已知填充词并修剪首尾空白；幂等。
/// 只动填充词本身，不规整答案内部的空白
pub fn strip_fillers(text: &str) -> String {
    let patterns = FILLER_RES.get_or_init(|| {
        FILLER_PHRASES
            .iter()
            .map(|p| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(p))).unwrap())
            .collect()
    });

    let mut out = text.to_string();
    for pattern in patterns {
        out = pattern.replace_all(&out, "").into_owned();
    }
    out.trim().to_string()
}

/// 预订起止时间字段：答案是纯 HH:MM 且某个日期字段已有可识别的日期答案时，
/// 合并为 YYYY-MM-DD HH:MM:00
fn combine_with_date(answer: &str, field: &Field, siblings: &[Field]) -> Option<String> {
    if !COMBINE_TIME_FIELDS.contains(&field.name.as_str()) {
        return None;
    }

    let bare_time = BARE_TIME_RE.get_or_init(|| Regex::new(r"^\d{2}:\d{2}$").unwrap());
    if !bare_time.is_match(answer) {
        return None;
    }

    let date_field = siblings
        .iter()
        .find(|f| f.name.to_lowercase().contains("date") && f.answer.is_some())?;
    let date = date_part(date_field.answer.as_deref()?)?;
    Some(format!("{} {}:00", date, answer))
}

/// 从 YYYY-MM-DD 或 ISO 日期时间中取日期部分；其它形状不认
fn date_part(answer: &str) -> Option<&str> {
    let prefix = DATE_PREFIX_RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap());
    let matched = prefix.find(answer)?;
    if answer.len() == 10 || answer.as_bytes().get(10) == Some(&b'T') {
        Some(matched.as_str())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::field::Choice;

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
    }

    fn field(name: &str, kind: FieldKind) -> Field {
        Field {
            name: name.to_string(),
            label: None,
            question: None,
            kind,
            choices: Vec::new(),
            answer: None,
            display_name: None,
        }
    }

    fn choice_field(name: &str) -> Field {
        let mut f = field(name, FieldKind::Choice);
        f.choices = vec![
            Choice {
                label: "Quiet Zone".to_string(),
                value: "qz".to_string(),
            },
            Choice {
                label: "Open Desk".to_string(),
                value: "od".to_string(),
            },
        ];
        f
    }

    #[test]
    fn test_strip_fillers_idempotent() {
        let once = strip_fillers("book it for the quiet zone");
        assert_eq!(once, "book it");
        assert_eq!(strip_fillers(&once), once);
    }

    #[test]
    fn test_choice_within_threshold() {
        let f = choice_field("location");
        assert_eq!(normalize_answer("quite zone", &f, &[], anchor()), "qz");
    }

    #[test]
    fn test_choice_beyond_threshold_keeps_text() {
        let f = choice_field("location");
        assert_eq!(
            normalize_answer("the cafeteria", &f, &[], anchor()),
            "the cafeteria"
        );
    }

    #[test]
    fn test_date_field_normalized() {
        let f = field("booking_date", FieldKind::Date);
        assert_eq!(
            normalize_answer("tomorrow", &f, &[], anchor()),
            "2025-03-08"
        );
    }

    #[test]
    fn test_date_field_falls_back_to_raw() {
        let f = field("booking_date", FieldKind::Date);
        assert_eq!(
            normalize_answer("  whenever works  ", &f, &[], anchor()),
            "whenever works"
        );
    }

    #[test]
    fn test_time_combined_with_answered_date() {
        let mut date = field("booking_date", FieldKind::Date);
        date.answer = Some("2025-03-10".to_string());
        let time = field("booking_start_time", FieldKind::Time);
        let siblings = vec![date, time.clone()];

        assert_eq!(
            normalize_answer("2:00", &time, &siblings, anchor()),
            "2025-03-10 02:00:00"
        );
    }

    #[test]
    fn test_time_without_date_stays_bare() {
        let time = field("booking_start_time", FieldKind::Time);
        let siblings = vec![time.clone()];
        assert_eq!(normalize_answer("2:00", &time, &siblings, anchor()), "02:00");
    }

    #[test]
    fn test_non_booking_time_field_not_combined() {
        let mut date = field("booking_date", FieldKind::Date);
        date.answer = Some("2025-03-10".to_string());
        let time = field("reminder_time", FieldKind::Time);
        let siblings = vec![date, time.clone()];
        assert_eq!(normalize_answer("2:00", &time, &siblings, anchor()), "02:00");
    }

    #[test]
    fn test_unrecognizable_date_answer_blocks_combination() {
        let mut date = field("booking_date", FieldKind::Date);
        date.answer = Some("sometime next week".to_string());
        let time = field("booking_end_time", FieldKind::Time);
        let siblings = vec![date, time.clone()];
        assert_eq!(normalize_answer("4:30", &time, &siblings, anchor()), "04:30");
    }

    #[test]
    fn test_plain_field_trimmed_only() {
        let f = field("purpose", FieldKind::Plain);
        assert_eq!(
            normalize_answer("  team offsite  ", &f, &[], anchor()),
            "team offsite"
        );
    }
}

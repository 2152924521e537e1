//! 日期与时间文本规整
//!
//! 两个独立的纯转换：文本→ISO 日期（YYYY-MM-DD）、文本→24 小时制 HH:MM。
//! 解析失败一律返回 None，由流水线回退到原始文本；这里绝不报错。
//!
//! 相对日期（today / tomorrow / 星期名）以调用方注入的锚定日期计算，
//! 不读系统时钟，便于测试。

use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;

static ISO_DATE_RE: OnceLock<Regex> = OnceLock::new();
static IN_DAYS_RE: OnceLock<Regex> = OnceLock::new();
static HM_RE: OnceLock<Regex> = OnceLock::new();
static HOUR_RE: OnceLock<Regex> = OnceLock::new();

/// 文本→ISO 日期
///
/// 顺序：自然语言（相对 `today`）→ 字面 YYYY-MM-DD 原样接受 → 常见日期格式。
pub fn parse_date_iso(text: &str, today: NaiveDate) -> Option<String> {
    let cleaned = text.trim();
    if cleaned.is_empty() {
        return None;
    }

    if let Some(date) = parse_relative_date(cleaned, today) {
        return Some(date.format("%Y-%m-%d").to_string());
    }

    let iso = ISO_DATE_RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
    if iso.is_match(cleaned) {
        return Some(cleaned.to_string());
    }

    parse_generic_date(cleaned).map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_relative_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = text.to_lowercase();
    let lower = lower.trim();

    match lower {
        "today" | "tonight" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "day after tomorrow" | "the day after tomorrow" => return Some(today + Duration::days(2)),
        "yesterday" => return Some(today - Duration::days(1)),
        _ => {}
    }

    let in_days = IN_DAYS_RE.get_or_init(|| Regex::new(r"^in\s+(\d{1,3})\s+days?$").unwrap());
    if let Some(caps) = in_days.captures(lower) {
        let days: i64 = caps[1].parse().ok()?;
        return Some(today + Duration::days(days));
    }

    // 星期名：下一个该星期（允许 next / on 前缀；当天同名也取下一个）
    let stripped = lower
        .strip_prefix("next ")
        .or_else(|| lower.strip_prefix("on "))
        .unwrap_or(lower);
    if let Some(weekday) = parse_weekday(stripped) {
        let mut ahead = i64::from(weekday.num_days_from_monday())
            - i64::from(today.weekday().num_days_from_monday());
        if ahead <= 0 {
            ahead += 7;
        }
        return Some(today + Duration::days(ahead));
    }

    None
}

fn parse_weekday(token: &str) -> Option<Weekday> {
    match token {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thur" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn parse_generic_date(text: &str) -> Option<NaiveDate> {
    // ISO 日期时间前缀，如 2025-03-10T09:00:00
    if text.as_bytes().get(10) == Some(&b'T') {
        if let Some(prefix) = text.get(..10) {
            if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
                return Some(date);
            }
        }
    }

    let cleaned = text.replace(',', " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    const FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%m-%d-%Y",
        "%B %d %Y",
        "%b %d %Y",
        "%d %B %Y",
        "%d %b %Y",
    ];
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            return Some(date);
        }
    }
    None
}

/// 文本→24 小时制 HH:MM
///
/// 顺序：显式 H:MM / H.MM → 数字小时 + 可选 am/pm（pm 且小时 < 12 加 12）
/// → 英文小时词 one..twelve（分钟补 00）。
pub fn parse_time_hhmm(text: &str) -> Option<String> {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    let hm = HM_RE.get_or_init(|| Regex::new(r"(\d{1,2})\s*[:.]\s*(\d{2})").unwrap());
    if let Some(caps) = hm.captures(&lower) {
        let hour: u32 = caps[1].parse().ok()?;
        if hour < 24 {
            return Some(format!("{:02}:{}", hour, &caps[2]));
        }
    }

    let pm = lower.contains("pm");
    let hour_re = HOUR_RE.get_or_init(|| Regex::new(r"(\d{1,2})").unwrap());
    if let Some(caps) = hour_re.captures(&lower) {
        let mut hour: u32 = caps[1].parse().ok()?;
        if hour >= 24 {
            return None;
        }
        if pm && hour < 12 {
            hour += 12;
        }
        return Some(format!("{:02}:00", hour));
    }

    word_to_hour(&lower).map(|hour| format!("{:02}:00", hour))
}

fn word_to_hour(text: &str) -> Option<u32> {
    let token: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_ascii_whitespace())
        .collect();
    match token.trim() {
        "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        "eight" => Some(8),
        "nine" => Some(9),
        "ten" => Some(10),
        "eleven" => Some(11),
        "twelve" => Some(12),
        _ => None,
    }
}

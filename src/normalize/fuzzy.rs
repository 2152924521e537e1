//! 选项模糊匹配
//!
//! 对枚举选项做大小写不敏感的编辑距离匹配（带换位的 Damerau-Levenshtein，
//! 这样 "quite" 对 "quiet" 这类换位笔误距离为 1）。距离并列时取声明顺序在前者。

use strsim::damerau_levenshtein;

use crate::dialog::field::Choice;

/// 返回距离最小的选项及其距离；选项集为空时返回 None。
/// 同一查询与选项集的结果是确定的。
pub fn closest_choice<'a>(query: &str, choices: &'a [Choice]) -> Option<(&'a Choice, usize)> {
    let needle = query.trim().to_lowercase();
    let mut best: Option<(&Choice, usize)> = None;
    for choice in choices {
        let dist = damerau_levenshtein(&needle, &choice.label.trim().to_lowercase());
        match best {
            Some((_, lowest)) if dist >= lowest => {}
            _ => best = Some((choice, dist)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choices() -> Vec<Choice> {
        vec![
            Choice {
                label: "Quiet Zone".to_string(),
                value: "qz".to_string(),
            },
            Choice {
                label: "Open Desk".to_string(),
                value: "od".to_string(),
            },
        ]
    }

    #[test]
    fn test_transposed_typo_distance() {
        let choices = choices();
        let (choice, dist) = closest_choice("quite zone", &choices).unwrap();
        assert_eq!(choice.value, "qz");
        assert_eq!(dist, 1);
    }

    #[test]
    fn test_deterministic_across_calls() {
        let choices = choices();
        let first = closest_choice("open desk", &choices).unwrap();
        let second = closest_choice("open desk", &choices).unwrap();
        assert_eq!(first.0.value, second.0.value);
        assert_eq!(first.1, second.1);
        assert_eq!(first.1, 0);
    }

    #[test]
    fn test_tie_breaks_to_first_declared() {
        let choices = vec![
            Choice {
                label: "ab".to_string(),
                value: "first".to_string(),
            },
            Choice {
                label: "cd".to_string(),
                value: "second".to_string(),
            },
        ];
        // "ef" 到两个标签的距离都是 2，取声明在前的
        let (choice, dist) = closest_choice("ef", &choices).unwrap();
        assert_eq!(choice.value, "first");
        assert_eq!(dist, 2);
    }

    #[test]
    fn test_empty_choice_set() {
        assert!(closest_choice("anything", &[]).is_none());
    }
}

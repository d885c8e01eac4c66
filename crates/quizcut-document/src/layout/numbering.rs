// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Question-number detection for the text at the top of a candidate segment.

use std::sync::LazyLock;

use regex::Regex;

/// Leading question numbers, tried as alternatives:
///
/// 1. `1.` `12、` `3)` `(4)`: up to three digits, optionally parenthesised,
///    followed by `.`, `、` or `)`.
/// 2. `(1)` `（2）`: digits enclosed in ASCII or full-width parentheses.
/// 3. `一、` `十二.`: traditional Chinese numerals followed by `、` or `.`.
static QUESTION_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\(?\d{1,3}\)?[.、)]|[（(]\d+[）)]|[一二三四五六七八九十百千]+[、.])")
        .expect("valid question head regex")
});

/// True when `text`, after trimming, begins with a question number.
///
/// Sub-item numbering such as `(1)` matches exactly like a top-level number;
/// head-band text alone cannot tell the two apart.
pub fn starts_with_question_number(text: &str) -> bool {
    QUESTION_HEAD.is_match(text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arabic_numbers() {
        for head in ["1.", "2、", "12. Solve for x", "103)", "(7).", "  4. leading space"] {
            assert!(starts_with_question_number(head), "{head:?} should match");
        }
    }

    #[test]
    fn parenthesised_numbers() {
        for head in ["(1)", "（2） 求值", "(15) continued"] {
            assert!(starts_with_question_number(head), "{head:?} should match");
        }
    }

    #[test]
    fn chinese_numerals() {
        for head in ["一、选择题", "十二.", "三、"] {
            assert!(starts_with_question_number(head), "{head:?} should match");
        }
    }

    #[test]
    fn non_numbered_text() {
        for text in [
            "",
            "The figure below shows",
            "1234. four digits",
            "A. option",
            "x = 2.",
            "一 without delimiter",
            "3",
        ] {
            assert!(!starts_with_question_number(text), "{text:?} should not match");
        }
    }

    #[test]
    fn number_must_lead() {
        assert!(!starts_with_question_number("see question 2."));
    }
}

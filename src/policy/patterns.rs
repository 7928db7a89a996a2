//! Compiled-once pattern banks for the policy engine.
//!
//! Compiled behind `OnceLock` so the regex set is built once per process
//! and shared across every check.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

fn build(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

/// Sensitive-data pattern bank. Index order is meaningful: it determines
/// which pattern's source text is quoted in a violation string.
pub fn sensitive_data_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            build(r#"(?i)(password|secret|api[_-]?key|token)\s*[:=]\s*['"]?[\w\-.]+['"]?"#),
            build(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"),
            build(r"\b\d{3}-\d{2}-\d{4}\b"),
            build(r"sk-[a-zA-Z0-9]{20,}"),
            build(r"ghp_[a-zA-Z0-9]{36}"),
            build(r"AKIA[0-9A-Z]{16}"),
            build(r"sk_(live|test)_[a-zA-Z0-9]{24,}"),
        ]
    })
}

/// Prompt-injection pattern bank.
pub fn prompt_injection_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            build(r"ignore\s+(previous|all)\s+(instructions|prompts)"),
            build(r"system:\s*you\s+are\s+now"),
            build(r"forget\s+(everything|all)"),
            build(r"new\s+instructions:"),
            build(r"\[INST\].*?\[/INST\]"),
            build(r"<\|im_start\|>"),
            build(r"disregard\s+previous"),
            build(r"override\s+previous"),
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_banks_compile_once_and_reuse() {
        let a = sensitive_data_patterns() as *const _;
        let b = sensitive_data_patterns() as *const _;
        assert_eq!(a, b);
    }

    #[test]
    fn sensitive_data_bank_has_seven_patterns() {
        assert_eq!(sensitive_data_patterns().len(), 7);
    }

    #[test]
    fn prompt_injection_bank_has_eight_patterns() {
        assert_eq!(prompt_injection_patterns().len(), 8);
    }
}

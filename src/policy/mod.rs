//! The policy engine: pure, side-effect-free checks over already-parsed
//! message content. Every function here is deterministic given its inputs,
//! which is what makes them a good fit for property testing.

mod patterns;

use std::collections::VecDeque;

use serde_json::Value;

use patterns::{prompt_injection_patterns, sensitive_data_patterns};

/// Path prefixes that are always denied, regardless of the allowlist.
const DANGEROUS_PREFIXES: &[&str] = &[
    "/etc",
    "/root",
    "/sys",
    "/proc",
    "C:\\Windows\\System32",
];

/// Fixed candidate file-path parameter locations, checked in this order.
/// Order matters only for violation ordering, not correctness: each
/// location is checked independently.
const ARGUMENT_PATH_KEYS: &[&str] = &["path", "filePath", "file", "directory"];
const TOP_LEVEL_PATH_KEYS: &[&str] = &["path", "filePath"];

/// Scan `text` for prompt-injection patterns. Returns one violation per
/// matching pattern, in pattern-bank order, each carrying the first 50
/// characters of the actual match. Callers gate this on
/// `enablePromptInjectionDetection` themselves; an empty result here does
/// not distinguish "disabled" from "no match".
pub fn check_prompt_injection(text: &str) -> Vec<String> {
    prompt_injection_patterns()
        .iter()
        .filter_map(|re| re.find(text))
        .map(|m| {
            let snippet: String = m.as_str().chars().take(50).collect();
            format!("Potential prompt injection detected: \"{snippet}...\"")
        })
        .collect()
}

/// Scan `text` for sensitive-data patterns. Returns one violation per
/// matching pattern, each carrying only the first 30 characters of the
/// *pattern's source text* — never the matched value, so a logged violation
/// can never leak the secret it detected.
pub fn check_sensitive_data(text: &str) -> Vec<String> {
    sensitive_data_patterns()
        .iter()
        .filter(|re| re.is_match(text))
        .map(|re| {
            let snippet: String = re.as_str().chars().take(30).collect();
            format!("Sensitive data pattern detected (redacted): {snippet}...")
        })
        .collect()
}

/// Case-insensitive substring check against the configured `blockedPatterns`
/// list, matched against the serialized request params.
pub fn check_blocked_patterns(text: &str, blocked_patterns: &[String]) -> Vec<String> {
    let lower = text.to_lowercase();
    blocked_patterns
        .iter()
        .filter(|pattern| !pattern.is_empty() && lower.contains(&pattern.to_lowercase()))
        .map(|pattern| format!("Blocked pattern matched: {pattern}"))
        .collect()
}

/// Check a candidate file-system path against the dangerous-prefix denylist
/// and, if non-empty, the configured allowlist. All three checks are
/// independent — each may contribute its own violation regardless of
/// whether an earlier one already fired, so a traversal path outside the
/// allowlist can produce more than one violation.
pub fn check_file_access(path: &str, allowed_file_paths: &[String]) -> Vec<String> {
    let mut violations = Vec::new();

    if path.contains("..") {
        violations.push(format!("Path traversal attempt detected: {path}"));
    }

    if DANGEROUS_PREFIXES.iter().any(|p| path.starts_with(*p)) {
        violations.push(format!("Access to dangerous path detected: {path}"));
    }

    if !allowed_file_paths.is_empty()
        && !allowed_file_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    {
        violations.push(format!("File path not in allowed list: {path}"));
    }

    violations
}

/// Sliding-window rate-limit check. `timestamps` holds prior call times in
/// milliseconds; callers prune entries older than the 60s window before
/// calling this (see [`prune_window`]). Returns `true` when the call should
/// be admitted, i.e. the count of timestamps already in the window stays
/// strictly under `limit`.
pub fn check_rate_limit(timestamps: &VecDeque<i64>, limit: u32) -> bool {
    (timestamps.len() as u32) < limit
}

/// Drop timestamps older than the 60-second rolling window, in place.
pub fn prune_window(timestamps: &mut VecDeque<i64>, now_ms: i64) {
    const WINDOW_MS: i64 = 60_000;
    while let Some(&oldest) = timestamps.front() {
        if now_ms - oldest >= WINDOW_MS {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}

/// Extract candidate file-path parameters from a `tools/call` request's
/// `params` object, from exactly these fixed locations, in order:
/// `params.arguments.{path,filePath,file,directory}` then
/// `params.{path,filePath}`. Only string values are collected.
pub fn candidate_file_paths(params: &Value) -> Vec<String> {
    let mut found = Vec::new();

    let arguments = params.get("arguments");
    for key in ARGUMENT_PATH_KEYS {
        if let Some(s) = arguments.and_then(|a| a.get(*key)).and_then(Value::as_str) {
            found.push(s.to_string());
        }
    }
    for key in TOP_LEVEL_PATH_KEYS {
        if let Some(s) = params.get(*key).and_then(Value::as_str) {
            found.push(s.to_string());
        }
    }

    found
}

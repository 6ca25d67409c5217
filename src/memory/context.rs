//! Helpers for the orchestration layer around recall: per-turn block terms
//! and prompt context formatting.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::normalize_terms;
use crate::memory::clean::clean_text;
use crate::memory::noise::{is_blocked, NoiseClassifier};
use crate::memory::types::Recalled;

/// Phrases a user writes to steer away from a topic; group 1 is the topic list.
static NEGATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:nothing|not)\s+(?:about|to\s+do\s+with)\s+(.+)",
        r"(?i)other\s+than\s+(.+)",
        r"(?i)avoid\s+talking\s+about\s+(.+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static TERM_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i),|\band\b").unwrap());

/// Extract topics the user asked to avoid, e.g. "nothing about politics and
/// sports" → `["politics", "sports"]`.
pub fn extract_block_terms(user_text: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for pattern in NEGATION_PATTERNS.iter() {
        if let Some(topics) = pattern.captures(user_text).and_then(|c| c.get(1)) {
            let parts: Vec<String> = TERM_SEPARATOR
                .split(topics.as_str())
                .map(|p| p.trim().trim_end_matches(['.', '!', '?']).to_string())
                .collect();
            terms.extend(normalize_terms(&parts));
        }
    }
    terms.sort();
    terms.dedup();
    terms
}

/// Render recalled memories as `ROLE: text` blocks separated by `\n---\n`.
///
/// Snippets are re-checked for noise and block terms, re-cleaned, and capped
/// at `max_chars` characters each. Returns an empty string when nothing is left.
pub fn format_context(
    snippets: &[Recalled],
    block_terms: &[String],
    noise: &dyn NoiseClassifier,
    max_chars: usize,
) -> String {
    let blocked = normalize_terms(block_terms);
    snippets
        .iter()
        .filter(|s| !s.text.is_empty() && !noise.is_noise(&s.text))
        .filter(|s| !is_blocked(&s.text, &blocked))
        .filter_map(|s| {
            let text: String = clean_text(&s.text).chars().take(max_chars).collect();
            (!text.is_empty()).then(|| format!("{}: {}", s.role.as_str().to_uppercase(), text))
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

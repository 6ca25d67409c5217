//! Noise and block-term classification.
//!
//! Orchestration runs interleave real conversation with scaffolding: role
//! headers, turn markers, timestamps, "Thinking..." lines, model tags. Such
//! fragments must neither be stored nor fed back into a prompt. Detection is
//! heuristic; misclassifying genuine content as noise is acceptable, letting
//! scaffolding through is not.

use regex::Regex;
use std::sync::LazyLock;

/// Any line that starts with a scaffolding marker marks the whole text as noise.
static SCAFFOLDING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^\s*(?:topic:|creator:|mediator:|reviewer:|questioner:|scriber:|=== turn|# turn \d|\[\d{4}-\d\d-\d\dt|thinking\.\.\.|begin|end|<<|>>|\[llama|\x1b)",
    )
    .unwrap()
});

/// Classifies text as orchestration scaffolding rather than conversation.
pub trait NoiseClassifier: Send + Sync {
    fn is_noise(&self, text: &str) -> bool;
}

/// Default classifier: line-anchored scaffolding markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaffoldingFilter;

impl NoiseClassifier for ScaffoldingFilter {
    fn is_noise(&self, text: &str) -> bool {
        SCAFFOLDING_PATTERN.is_match(text)
    }
}

impl<F> NoiseClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_noise(&self, text: &str) -> bool {
        self(text)
    }
}

/// Returns `true` if the lowercased `text` contains any of `terms`.
///
/// `terms` are expected to be normalized already (trimmed, lowercased,
/// non-empty) — see [`crate::config::normalize_terms`].
pub fn is_blocked(text: &str, terms: &[String]) -> bool {
    if terms.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    terms.iter().any(|term| lower.contains(term.as_str()))
}

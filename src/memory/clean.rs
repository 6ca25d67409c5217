//! Text normalization applied before anything is embedded or stored.
//!
//! Terminal transcripts of local model runs carry escape sequences, spinner
//! animation frames, stray NULs and carriage returns. None of it belongs in a
//! prompt, and SQLite text columns reject embedded NULs from some drivers.

use regex::Regex;
use std::sync::LazyLock;

/// CSI sequences (7-bit `ESC [` or the single C1 byte U+009B), two-byte ESC
/// sequences, and OSC sequences terminated by BEL.
static ANSI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:(?:\x1B\[|\x{9B})[0-9;?]*[ -/]*[@-~])|(?:\x1B[@-Z\\-_])|(?:\x1B\][^\x07]*\x07)",
    )
    .unwrap()
});

/// Braille block (covers the common `⠋⠙⠹` spinners) plus circle quadrant frames.
static SPINNER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{2800}-\x{28FF}◐◓◑◒◴◷◶◵]+").unwrap());

/// C0 controls except tab, newline and carriage return, DEL, and C1 controls.
static CONTROL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F\x{80}-\x{9F}]").unwrap());

/// Strip NULs, escape sequences, spinner glyphs, control characters and
/// carriage returns, then trim surrounding whitespace.
///
/// Total and idempotent: `clean_text(&clean_text(s)) == clean_text(s)`.
/// The result may be empty when the input was nothing but noise.
pub fn clean_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let s = raw.replace('\0', "");
    let s = ANSI_PATTERN.replace_all(&s, "");
    let s = SPINNER_PATTERN.replace_all(&s, "");
    // Removes any ESC left over from a malformed sequence, so a second pass
    // never sees a new sequence.
    let s = CONTROL_PATTERN.replace_all(&s, "");
    let s = s.replace('\r', "");
    s.trim().to_string()
}

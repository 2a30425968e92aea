//! Content classification of a responder's consolidated reply.

use std::sync::LazyLock;

use regex::Regex;

/// Outcome of inspecting a reply's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Usable content.
    Success,
    /// The responder explicitly reported it has no data.
    NotFound,
    /// The responder deflected the command with an anti-spam notice.
    AntiSpam,
}

/// "No data" phrasings, each preceded by the `[⚠️]` warning marker.
static NOT_FOUND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)\[\x{26A0}\x{FE0F}?\]\s*(no se encontro información|no se encontró información|no se han encontrado resultados|no se encontró una|no hay resultados|no tenemos datos|no se encontraron registros)",
    )
    .expect("hardcoded regex")
});

const ANTI_SPAM_TOKEN: &str = "ANTI-SPAM";

/// Classify consolidated reply text.
///
/// A not-found phrase wins over an anti-spam notice present in the same text.
pub fn classify(text: &str) -> Classification {
    if NOT_FOUND_PATTERN.is_match(text) {
        return Classification::NotFound;
    }
    if text.to_uppercase().contains(ANTI_SPAM_TOKEN) {
        return Classification::AntiSpam;
    }
    Classification::Success
}

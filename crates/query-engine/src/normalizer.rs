//! Cleanup of responder message text.
//!
//! Responders decorate every reply with brand tags, a routing header, and a
//! footer (pagination, credits, attribution). [`normalize`] strips them:
//!
//! 1. Promotional bracket tags anywhere in the text.
//! 2. One leading `[token] → ... [token]` header line.
//! 3. Everything from the first footer marker to the end.
//! 4. Runs of three or more dashes.
//! 5. Surrounding whitespace.

use std::sync::LazyLock;

use regex::Regex;

static PROMO_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[#?LEDER_BOT\]|\[CONSULTA PE\]").expect("hardcoded regex")
});

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\A\[.*?\]\s*→\s*.*?\[.*?\](\r?\n){1,2}").expect("hardcoded regex")
});

static FOOTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)(\r?\n){1,2}\[|(P[áa]gina|Page)\s*\d+/\d+|Credits\s*:.+|\s*@lederdata|Cr[ée]ditos\s*:\s*\d+",
    )
    .expect("hardcoded regex")
});

static DASH_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{3,}").expect("hardcoded regex"));

/// Strip responder decorations from one message body.
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let mut text = clean_once(raw);
    // Stripping can expose another header or tag; repeat until stable.
    loop {
        let next = clean_once(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

fn clean_once(raw: &str) -> String {
    let text = PROMO_TAGS.replace_all(raw, "");
    let text = HEADER.replacen(&text, 1, "");
    let text = match FOOTER.find(&text) {
        Some(footer) => &text[..footer.start()],
        None => &text[..],
    };
    DASH_RUN.replace_all(text, "").trim().to_string()
}

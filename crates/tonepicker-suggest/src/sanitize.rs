use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

// Applied in order: later rules assume quotes and markdown are already gone.
static SURROUNDING_QUOTES: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^["']|["']$"#).unwrap());
static BOLD_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*\*.*?\*\*:?\s*").unwrap());
static REWRITTEN_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Rewritten text:?\s*").unwrap());
static CERTAINLY_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Certainly!?\s*").unwrap());
static HERE_IS_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Here is.*?:\s*").unwrap());
static THIS_VERSION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^This version.*$").unwrap());
static BRACKETED_GREETING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Good \[.*?\]").unwrap());

/// Strip the wrapping a chat model tends to put around a rewrite: quotes,
/// bold headers, "Certainly!"/"Here is..." preambles and trailing
/// "This version..." commentary.
///
/// Never turns non-blank input into an empty string; if every rule together
/// removes everything, the trimmed input is returned as-is.
pub fn sanitize(raw: &str) -> String {
    let trimmed = raw.trim();

    let mut text: Cow<'_, str> = SURROUNDING_QUOTES.replace_all(trimmed, "");
    for rule in [&*BOLD_HEADER, &*REWRITTEN_PREFIX, &*CERTAINLY_PREFIX, &*HERE_IS_PREFIX] {
        text = Cow::Owned(rule.replace(&text, "").into_owned());
    }
    text = Cow::Owned(THIS_VERSION_LINE.replace_all(&text, "").into_owned());
    text = Cow::Owned(BRACKETED_GREETING.replace(&text, "Good morning").into_owned());

    let cleaned = text.trim();
    if cleaned.is_empty() {
        trimmed.to_string()
    } else {
        cleaned.to_string()
    }
}

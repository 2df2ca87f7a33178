//! Text canonicalization for title and artist comparison.
//!
//! All matching in the engine happens over normalized text: lowercased,
//! stripped of punctuation, stripped of the qualifier tokens uploaders
//! decorate unreleased tracks with ("(Unreleased)", "FREE DOWNLOAD",
//! "edit", ...), with whitespace collapsed. Normalization is idempotent,
//! so normalized values can be compared and re-normalized freely.

use once_cell::sync::Lazy;
use regex::Regex;

/// Qualifier tokens that do not change track identity.
const QUALIFIER_TOKENS: &[&str] = &[
    "unreleased",
    "free download",
    "original mix",
    "clip",
    "preview",
    "edit",
    "remix",
];

// Every pattern below is a fixed literal; compilation cannot fail.
#[allow(clippy::unwrap_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

static NON_WORD: Lazy<Regex> = Lazy::new(|| compile(r"[^\w\s]"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| compile(r"\s+"));

static QUALIFIERS: Lazy<Regex> = Lazy::new(|| {
    let alternatives = QUALIFIER_TOKENS.join("|");
    compile(&format!(r"\b({alternatives})\b"))
});

static BRACKETED: Lazy<Regex> = Lazy::new(|| compile(r"[(\[][^)\]]*[)\]]"));

/// Canonicalize a title or artist name for comparison.
///
/// Total over all strings, including the empty string, and idempotent.
#[must_use]
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    let mut current = collapse(&stripped);

    // Dropping one qualifier can splice a new one together ("free edit
    // download" -> "free download"), so repeat until nothing changes.
    loop {
        let removed = QUALIFIERS.replace_all(&current, " ");
        let next = collapse(&removed);
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Remove parenthesized and bracketed segments from a title.
///
/// Used when building catalog search queries, where "(Unreleased Clip)"
/// only hurts recall.
#[must_use]
pub fn strip_bracketed(title: &str) -> String {
    let stripped = BRACKETED.replace_all(title, " ");
    collapse(&stripped)
}

/// The normalized `"artist - title"` key used for exact duplicate matching.
///
/// A missing artist contributes nothing, so two artist-less entries with
/// the same title still collide.
#[must_use]
pub fn entry_key(artist: Option<&str>, title: &str) -> String {
    normalize(&format!("{} - {}", artist.unwrap_or_default(), title))
}

fn collapse(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

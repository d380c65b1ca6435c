use std::sync::LazyLock;

use regex::Regex;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("url regex"));

static HTML_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("html tag regex"));

/// Anything outside word chars, whitespace, `'`, `!` and `-`.
static DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s'!\-]").expect("disallowed char regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Normalize one `text` cell.  Null becomes the empty string.
///
/// Steps run in a fixed order: lowercase, strip URLs, strip HTML tags,
/// replace disallowed characters, collapse whitespace and trim.  Each
/// removal substitutes a single space so neighbouring words stay apart.
pub fn normalize_text(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let text = raw.to_lowercase();
    let text = URL_RE.replace_all(&text, " ");
    let text = HTML_TAG_RE.replace_all(&text, " ");
    let text = DISALLOWED_RE.replace_all(&text, " ");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    text.trim().to_string()
}

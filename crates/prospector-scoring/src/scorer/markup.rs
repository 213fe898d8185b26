//! Pattern probes over lowercased page HTML.
//!
//! These are deliberately coarse string and regex checks, not a DOM parse.

use std::sync::LazyLock;

use regex::Regex;

static INLINE_STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\sstyle\s*=\s*["']?"#).expect("valid regex"));
static PLUGIN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:embed|object)\b").expect("valid regex"));
static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<meta\b[^>]*>").expect("valid regex"));
static GENERATOR_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bname\s*=\s*["']?generator\b"#).expect("valid regex")
});
static COPYRIGHT_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"copyright.*?(\d{4})").expect("valid regex"));
static HTTP_RESOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<(?:script|img|link)\b[^>]*?\s(?:src|href)\s*=\s*["']?http://"#)
        .expect("valid regex")
});

/// Legacy-markup indicators. An indicator counts once if any of its needles
/// occurs in the whitespace-stripped document.
const LEGACY_INDICATORS: &[(&str, &[&str])] = &[
    ("table-based layout", &["table-basedlayout"]),
    ("font tags", &["fonttags", "<font"]),
    ("center tags", &["centertags", "<center"]),
    ("marquee", &["marquee"]),
    ("blink", &["blink"]),
    ("frameset", &["frameset"]),
];

/// Number of distinct legacy indicators present in `html`.
///
/// All whitespace is removed before matching, so text such as "bl ink" in
/// visible copy also matches. Known false-positive source, kept as-is.
pub(crate) fn legacy_indicator_count(html: &str) -> usize {
    let stripped: String = html.chars().filter(|c| !c.is_whitespace()).collect();
    LEGACY_INDICATORS
        .iter()
        .filter(|(_, needles)| needles.iter().any(|n| stripped.contains(n)))
        .count()
}

/// Elements carrying an inline `style` attribute.
pub(crate) fn inline_style_count(html: &str) -> usize {
    INLINE_STYLE_RE.find_iter(html).count()
}

/// `<embed>`/`<object>` tags or any mention of "flash".
pub(crate) fn has_plugin_content(html: &str) -> bool {
    PLUGIN_TAG_RE.is_match(html) || html.contains("flash")
}

/// A `<meta name="generator">` tag whose text mentions `FrontPage`.
pub(crate) fn has_frontpage_generator(html: &str) -> bool {
    META_TAG_RE
        .find_iter(html)
        .map(|m| m.as_str())
        .any(|tag| GENERATOR_NAME_RE.is_match(tag) && tag.contains("frontpage"))
}

/// Years captured by `copyright ... YYYY`, in document order.
pub(crate) fn copyright_years(html: &str) -> impl Iterator<Item = i32> + '_ {
    COPYRIGHT_YEAR_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1).and_then(|y| y.as_str().parse::<i32>().ok()))
}

/// Scripts, images and stylesheets referenced over plain `http://`.
pub(crate) fn http_resource_count(html: &str) -> usize {
    HTTP_RESOURCE_RE.find_iter(html).count()
}

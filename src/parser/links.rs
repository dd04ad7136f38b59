//! Extraction of file links from raw page HTML.
//!
//! The default [`AttributeScanner`] is a lightweight attribute-value scanner,
//! not an HTML parser: it tolerates broken markup, both quote styles and links
//! dropped into plain text. Callers go through the [`LinkExtractor`] trait so
//! the scanner can be replaced by a DOM-based implementation.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

/// Attribute values of `href`, `src` and `data-src`, double or single quoted.
#[allow(clippy::expect_used)]
static ATTRIBUTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(data-src|href|src)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("attribute regex is valid") // Static pattern, safe to panic
});

/// Bare absolute URLs anywhere in the document text.
#[allow(clippy::expect_used)]
static BARE_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s"'<>]+"#).expect("bare URL regex is valid") // Static pattern, safe to panic
});

/// Where in the markup a link was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceAttribute {
    /// `href="…"`
    Href,
    /// `src="…"`
    Src,
    /// `data-src="…"` (lazy-loaded media)
    DataSrc,
    /// A bare URL outside any recognized attribute
    Text,
}

impl SourceAttribute {
    fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("href") {
            Self::Href
        } else if name.eq_ignore_ascii_case("data-src") {
            Self::DataSrc
        } else {
            Self::Src
        }
    }
}

/// A raw link found in a page, possibly relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    /// Link text as written in the page (trimmed, `&amp;` decoded).
    pub raw: String,
    /// Attribute the link was first seen in.
    pub source: SourceAttribute,
    /// Extension that matched (lower-case, no dot).
    pub extension: String,
}

/// Finds links to files of a given extension in a page.
pub trait LinkExtractor: Send + Sync {
    /// Returns the distinct links containing `.` + `extension`, in first-seen order.
    ///
    /// Never fails: malformed markup or no matches yield an empty list.
    fn extract(&self, html: &str, extension: &str) -> Vec<ExtractedLink>;

    /// Same as [`extract`](Self::extract) but returns only the raw link strings.
    fn extract_raw(&self, html: &str, extension: &str) -> Vec<String> {
        self.extract(html, extension)
            .into_iter()
            .map(|link| link.raw)
            .collect()
    }
}

/// Regex-based scanner over attribute values and bare URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeScanner;

impl AttributeScanner {
    /// Creates the scanner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for AttributeScanner {
    #[tracing::instrument(level = "trace", skip(self, html), fields(html_len = html.len()))]
    fn extract(&self, html: &str, extension: &str) -> Vec<ExtractedLink> {
        let needle = format!(".{extension}");
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        let mut push = |value: &str, source: SourceAttribute| {
            let Some(raw) = normalize_value(value) else {
                return;
            };
            if !raw.contains(&needle) || !seen.insert(raw.clone()) {
                return;
            }
            trace!(link = %raw, ?source, "matched link");
            links.push(ExtractedLink {
                raw,
                source,
                extension: extension.to_string(),
            });
        };

        for caps in ATTRIBUTE_PATTERN.captures_iter(html) {
            let source = caps
                .get(1)
                .map_or(SourceAttribute::Src, |name| {
                    SourceAttribute::from_name(name.as_str())
                });
            if let Some(value) = caps.get(2).or_else(|| caps.get(3)) {
                push(value.as_str(), source);
            }
        }

        for url in BARE_URL_PATTERN.find_iter(html) {
            push(url.as_str(), SourceAttribute::Text);
        }

        links
    }
}

/// Trims the attribute value and decodes `&amp;`; empty values are dropped.
fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.replace("&amp;", "&"))
}

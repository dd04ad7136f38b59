//! Relative link resolution against the page they were found on.
//!
//! Resolution is a pure string transformation: no network access, no redirect
//! following and no reachability checks. The rules mirror how the links are
//! written in forum markup rather than full RFC 3986 reference resolution.

/// How a link is written relative to its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// `http://…` or `https://…`
    Absolute,
    /// `//host/path`, inherits the page scheme
    ProtocolRelative,
    /// `/path`, inherits the page scheme and host
    RootRelative,
    /// Anything else, relative to the page's directory
    PathRelative,
    /// A non-web scheme such as `mailto:`, `javascript:`, `data:` or `ftp:`
    Unsupported,
}

/// Classifies a raw link by the way it references its target.
#[must_use]
pub fn classify(candidate: &str) -> LinkKind {
    let candidate = candidate.trim();
    if has_web_scheme(candidate) {
        LinkKind::Absolute
    } else if has_foreign_scheme(candidate) {
        LinkKind::Unsupported
    } else if candidate.starts_with("//") {
        LinkKind::ProtocolRelative
    } else if candidate.starts_with('/') {
        LinkKind::RootRelative
    } else {
        LinkKind::PathRelative
    }
}

/// Resolves `candidate` against `base_url`, returning an absolute URL.
///
/// - absolute candidates are returned unchanged
/// - candidates with another scheme ([`LinkKind::Unsupported`]) are also
///   returned unchanged; callers filter them with [`classify`]
/// - `//cdn/x` takes the scheme of `base_url`
/// - `/x` takes the scheme and host of `base_url`
/// - `x` is appended to the directory of the base path (the base path with
///   its last segment removed; query and fragment are ignored)
///
/// ```
/// use harvester_core::parser::resolve;
///
/// let base = "https://example.com/forum/thread.html";
/// assert_eq!(resolve(base, "video.mp4"), "https://example.com/forum/video.mp4");
/// assert_eq!(resolve(base, "/z.mp4"), "https://example.com/z.mp4");
/// ```
#[must_use]
pub fn resolve(base_url: &str, candidate: &str) -> String {
    let candidate = candidate.trim();
    match classify(candidate) {
        LinkKind::Absolute | LinkKind::Unsupported => candidate.to_string(),
        LinkKind::ProtocolRelative => format!("{}:{candidate}", scheme_of(base_url)),
        LinkKind::RootRelative => format!("{}{candidate}", origin_of(base_url)),
        LinkKind::PathRelative => {
            let relative = strip_current_dir_segments(candidate);
            let directory = directory_of(base_url);
            if directory.is_empty() {
                format!("{}/{relative}", origin_of(base_url))
            } else {
                format!("{}{directory}{relative}", origin_of(base_url))
            }
        }
    }
}

fn has_web_scheme(candidate: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        candidate
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// An RFC 3986 scheme token (`ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`)
/// followed by `:`.
fn has_foreign_scheme(candidate: &str) -> bool {
    let Some((scheme, _)) = candidate.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// `http` or `https` of the base URL (lower-cased).
fn scheme_of(base_url: &str) -> String {
    base_url
        .split_once("://")
        .map_or("http", |(scheme, _)| scheme)
        .to_ascii_lowercase()
}

/// Byte offset where the host part of `base_url` ends.
fn host_end(base_url: &str) -> usize {
    let host_start = base_url.find("://").map_or(0, |pos| pos + 3);
    base_url[host_start..]
        .find(['/', '?', '#'])
        .map_or(base_url.len(), |pos| host_start + pos)
}

/// `scheme://host[:port]` of the base URL.
fn origin_of(base_url: &str) -> &str {
    &base_url[..host_end(base_url)]
}

/// Base path up to and including its last `/`, or empty when there is no path.
fn directory_of(base_url: &str) -> &str {
    let rest = &base_url[host_end(base_url)..];
    let path = rest.find(['?', '#']).map_or(rest, |pos| &rest[..pos]);
    path.rfind('/').map_or("", |pos| &path[..=pos])
}

fn strip_current_dir_segments(candidate: &str) -> &str {
    let mut relative = candidate;
    while let Some(rest) = relative.strip_prefix("./") {
        relative = rest;
    }
    relative
}

//! Filename derivation, sanitization, and path resolution for downloads.
//!
//! Files are first written under a page-scoped staging name
//! (`<page>__<name>`) and renamed to their final name once the run ends.

use std::path::{Component, Path, PathBuf};

use url::Url;

/// Separator between the page index and the filename in staging names.
const STAGING_SEPARATOR: &str = "__";

/// Derives a local filename for a resolved download URL.
///
/// Uses the last path segment when it carries the matched extension, then a
/// query value carrying it (`get.php?file=a.zip`), and otherwise synthesizes
/// `page<N>_file_<M>.<ext>`. Never returns an empty name.
#[must_use]
pub fn suggested_filename(
    absolute_url: &str,
    extension: &str,
    page_index: usize,
    file_index: usize,
) -> String {
    let needle = format!(".{extension}");
    let parsed = Url::parse(absolute_url).ok();

    let from_path = parsed
        .as_ref()
        .and_then(|url| url.path_segments()?.next_back().map(decode_segment))
        .filter(|name| name.contains(&needle));

    let from_query = || {
        parsed.as_ref().and_then(|url| {
            url.query_pairs()
                .map(|(_, value)| value.rsplit('/').next().unwrap_or_default().to_string())
                .find(|value| value.contains(&needle))
        })
    };

    from_path
        .or_else(from_query)
        .map(|name| sanitize_filename(&name))
        .filter(|name| has_usable_stem(name))
        .unwrap_or_else(|| format!("page{page_index}_file_{file_index}.{extension}"))
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment).map_or_else(|_| segment.to_string(), |s| s.into_owned())
}

/// A name like `.mp4` or `_.mp4` has no usable basename.
fn has_usable_stem(name: &str) -> bool {
    name.rfind('.')
        .is_some_and(|dot| !name[..dot].trim_matches('_').is_empty())
}

/// Staging name that namespaces `filename` by page index.
#[must_use]
pub fn staged_filename(page_index: usize, filename: &str) -> String {
    format!("{page_index}{STAGING_SEPARATOR}{filename}")
}

/// Removes the page-index prefix added by [`staged_filename`].
///
/// Returns `None` when `name` is not a staging name.
#[must_use]
pub fn strip_page_prefix(name: &str) -> Option<&str> {
    let (prefix, rest) = name.split_once(STAGING_SEPARATOR)?;
    let is_index = !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit());
    (is_index && !rest.is_empty()).then_some(rest)
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            // Also handle null and control characters
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

/// Resolves a unique file path, adding a numeric suffix starting at `_2`
/// while the candidate exists.
///
/// Example: `file.pdf`, then `file_2.pdf`, `file_3.pdf`, ...
pub(crate) fn resolve_unique_path(dir: &Path, filename: &str) -> PathBuf {
    let base_path = dir.join(filename);
    if !base_path.exists() {
        return base_path;
    }

    let (stem, ext) = match filename.rfind('.') {
        Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
        _ => (filename, ""),
    };

    for i in 2..1000 {
        let new_path = dir.join(format!("{stem}_{i}{ext}"));
        if !new_path.exists() {
            return new_path;
        }
    }

    // Fallback (extremely unlikely)
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    dir.join(format!("{stem}_{timestamp}{ext}"))
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

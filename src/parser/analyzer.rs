//! Per-page file type statistics and link selection.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::catalog::{ExtensionCatalog, normalize_extension};
use super::links::{AttributeScanner, ExtractedLink, LinkExtractor};

/// Which extensions a download pass should collect.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every extension in the catalog.
    #[default]
    All,
    /// An explicit subset (lower-case, no dot). May include extensions the
    /// catalog does not list.
    Extensions(BTreeSet<String>),
}

impl Selection {
    /// Builds an explicit selection, normalizing `.MP4`-style input to `mp4`.
    ///
    /// An empty list yields [`Selection::All`].
    pub fn extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| !ext.is_empty())
            .collect();
        if set.is_empty() { Self::All } else { Self::Extensions(set) }
    }
}

/// Counts of links found in one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTypeReport {
    /// Non-zero link counts per extension.
    pub per_extension: BTreeMap<String, usize>,
    /// Non-zero totals per category.
    pub per_category: BTreeMap<String, usize>,
    /// Sum of all per-extension counts.
    pub grand_total: usize,
}

impl FileTypeReport {
    /// True when the page contained no recognized file links.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grand_total == 0
    }
}

/// Runs a [`LinkExtractor`] across an [`ExtensionCatalog`].
#[derive(Clone)]
pub struct FileTypeAnalyzer {
    catalog: ExtensionCatalog,
    extractor: Arc<dyn LinkExtractor>,
}

impl std::fmt::Debug for FileTypeAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTypeAnalyzer")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl Default for FileTypeAnalyzer {
    fn default() -> Self {
        Self::new(ExtensionCatalog::canonical())
    }
}

impl FileTypeAnalyzer {
    /// Creates an analyzer using the regex [`AttributeScanner`].
    #[must_use]
    pub fn new(catalog: ExtensionCatalog) -> Self {
        Self::with_extractor(catalog, Arc::new(AttributeScanner::new()))
    }

    /// Creates an analyzer with a custom extractor.
    #[must_use]
    pub fn with_extractor(catalog: ExtensionCatalog, extractor: Arc<dyn LinkExtractor>) -> Self {
        Self { catalog, extractor }
    }

    /// The catalog this analyzer classifies against.
    #[must_use]
    pub fn catalog(&self) -> &ExtensionCatalog {
        &self.catalog
    }

    /// Counts links per extension and per category.
    ///
    /// Each distinct extension is scanned once; an extension listed under
    /// several categories adds its count to each of them.
    #[must_use]
    pub fn analyze(&self, html: &str) -> FileTypeReport {
        self.analyze_selected(html, &Selection::All)
    }

    /// Like [`analyze`](Self::analyze), restricted to `selection`.
    ///
    /// Selected extensions outside the catalog are counted per extension but
    /// belong to no category.
    #[must_use]
    #[tracing::instrument(level = "debug", skip(self, html), fields(html_len = html.len()))]
    pub fn analyze_selected(&self, html: &str, selection: &Selection) -> FileTypeReport {
        let mut report = FileTypeReport::default();
        let extensions: Vec<&str> = match selection {
            Selection::All => self.catalog.extensions(),
            Selection::Extensions(set) => set.iter().map(String::as_str).collect(),
        };

        for extension in extensions {
            let count = self.extractor.extract(html, extension).len();
            if count == 0 {
                continue;
            }
            report.per_extension.insert(extension.to_string(), count);
            report.grand_total += count;
            for category in self.catalog.categories_of(extension) {
                *report.per_category.entry(category.to_string()).or_default() += count;
            }
        }

        debug!(
            total = report.grand_total,
            extensions = report.per_extension.len(),
            "analyzed page"
        );
        report
    }

    /// Collects links for the selected extensions, deduplicated across
    /// extensions in first-seen order.
    ///
    /// A file matching several selected extensions (`a.tar.gz`) is returned
    /// once, tagged with the first extension that matched.
    #[must_use]
    pub fn links(&self, html: &str, selection: &Selection) -> Vec<ExtractedLink> {
        let extensions: Vec<&str> = match selection {
            Selection::All => self.catalog.extensions(),
            Selection::Extensions(set) => set.iter().map(String::as_str).collect(),
        };

        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for extension in extensions {
            for link in self.extractor.extract(html, extension) {
                if seen.insert(link.raw.clone()) {
                    links.push(link);
                }
            }
        }
        links
    }
}

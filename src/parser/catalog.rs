//! Static mapping of file categories to recognized extensions.

/// Canonical categories and their extensions (lower-case, no leading dot).
const CANONICAL: &[(&str, &[&str])] = &[
    (
        "Video",
        &[
            "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp",
        ],
    ),
    (
        "Audio",
        &["mp3", "wav", "flac", "aac", "ogg", "m4a", "wma", "opus"],
    ),
    (
        "Image",
        &[
            "jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "tiff", "ico",
        ],
    ),
    (
        "Document",
        &[
            "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "rtf", "odt", "csv", "epub",
        ],
    ),
    ("Archive", &["zip", "rar", "7z", "tar", "gz", "bz2", "xz"]),
    ("Executable", &["exe", "msi", "dmg", "apk", "deb", "rpm"]),
];

/// One category and the extensions recognized for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Human-readable category name (e.g. `Video`).
    pub category: String,
    /// Extensions in declaration order, unique within the category.
    pub extensions: Vec<String>,
}

/// Category → extension table used to classify links.
///
/// Extensions may repeat across categories; such an extension is scanned once
/// and counted towards every category that lists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionCatalog {
    entries: Vec<CatalogEntry>,
}

impl Default for ExtensionCatalog {
    fn default() -> Self {
        Self::canonical()
    }
}

impl ExtensionCatalog {
    /// The built-in catalog (Video, Audio, Image, Document, Archive, Executable).
    #[must_use]
    pub fn canonical() -> Self {
        Self::from_entries(CANONICAL.iter().map(|(category, extensions)| {
            (
                (*category).to_string(),
                extensions.iter().map(|ext| (*ext).to_string()).collect(),
            )
        }))
    }

    /// Builds a catalog from `(category, extensions)` pairs.
    ///
    /// Extensions are normalized to lower-case without a leading dot, and
    /// duplicates within one category are dropped.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let entries = entries
            .into_iter()
            .map(|(category, extensions)| {
                let mut unique: Vec<String> = Vec::with_capacity(extensions.len());
                for ext in extensions {
                    let ext = normalize_extension(&ext);
                    if !ext.is_empty() && !unique.contains(&ext) {
                        unique.push(ext);
                    }
                }
                CatalogEntry {
                    category,
                    extensions: unique,
                }
            })
            .collect();
        Self { entries }
    }

    /// All catalog entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Category names in declaration order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.category.as_str())
    }

    /// Every distinct extension, first occurrence order.
    #[must_use]
    pub fn extensions(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for ext in self.entries.iter().flat_map(|entry| &entry.extensions) {
            if !seen.contains(&ext.as_str()) {
                seen.push(ext.as_str());
            }
        }
        seen
    }

    /// Categories listing `extension` (usually exactly one).
    pub fn categories_of<'a>(&'a self, extension: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |entry| entry.extensions.iter().any(|ext| ext == extension))
            .map(|entry| entry.category.as_str())
    }

    /// Whether any category lists `extension`.
    #[must_use]
    pub fn contains(&self, extension: &str) -> bool {
        let extension = normalize_extension(extension);
        self.entries
            .iter()
            .any(|entry| entry.extensions.contains(&extension))
    }
}

/// Lower-cases an extension and strips surrounding whitespace and a leading dot.
#[must_use]
pub fn normalize_extension(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_ascii_lowercase()
}

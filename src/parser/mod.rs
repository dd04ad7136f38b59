//! Page parsing: target validation, link extraction and resolution.
//!
//! This module turns raw page HTML plus the page URL into the set of absolute
//! file URLs worth downloading.
//!
//! # Pipeline
//!
//! - [`PageTarget`] validates user-submitted page URLs
//! - [`LinkExtractor`] / [`AttributeScanner`] find raw links per extension
//! - [`FileTypeAnalyzer`] counts links across the [`ExtensionCatalog`]
//! - [`resolve`] turns relative links into absolute URLs
//!
//! # Example
//!
//! ```
//! use harvester_core::parser::{FileTypeAnalyzer, Selection, resolve};
//!
//! let html = r#"<a href="clip.mp4">clip</a> <img src='/img/cover.jpg'>"#;
//! let analyzer = FileTypeAnalyzer::default();
//! assert_eq!(analyzer.analyze(html).grand_total, 2);
//!
//! let base = "https://example.com/forum/thread.html";
//! let urls: Vec<String> = analyzer
//!     .links(html, &Selection::All)
//!     .iter()
//!     .map(|link| resolve(base, &link.raw))
//!     .collect();
//! assert_eq!(urls, vec![
//!     "https://example.com/forum/clip.mp4",
//!     "https://example.com/img/cover.jpg",
//! ]);
//! ```

mod analyzer;
mod catalog;
mod error;
mod links;
mod resolve;
mod target;

pub use analyzer::{FileTypeAnalyzer, FileTypeReport, Selection};
pub use catalog::{CatalogEntry, ExtensionCatalog, normalize_extension};
pub use error::{MAX_URL_LENGTH, ParseError};
pub use links::{AttributeScanner, ExtractedLink, LinkExtractor, SourceAttribute};
pub use resolve::{LinkKind, classify, resolve};
pub use target::PageTarget;

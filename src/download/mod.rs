//! HTTP transport for pages, login forms and streamed file downloads.
//!
//! The pipeline talks to the network through the [`Transport`] trait;
//! [`HttpClient`] is the `reqwest` implementation used by the binary.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large files)
//! - One cookie jar shared by every request of a run
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Structured error types with full context
//! - Page-scoped staging filenames and duplicate-suffix resolution
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::download::{HttpClient, Transport};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let outcome = client
//!     .download(
//!         "https://example.com/files/report.pdf",
//!         Path::new("./downloads/1__report.pdf"),
//!         Some("https://example.com/files/"),
//!     )
//!     .await?;
//! println!("Downloaded {} bytes", outcome.bytes_written);
//! # Ok(())
//! # }
//! ```

mod client;
pub(crate) mod cookies;
pub mod constants;
mod error;
pub mod filename;
mod transport;

pub use client::{ClientOptions, HttpClient};
pub use error::DownloadError;
pub use filename::{staged_filename, strip_page_prefix, suggested_filename};
pub use transport::{DownloadOutcome, FetchResponse, Transport};

// Use `Result<T, DownloadError>` explicitly in function signatures; no
// module-local Result alias.

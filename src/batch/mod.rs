//! Batch processing of page targets.
//!
//! [`DownloadOrchestrator::run`] walks the targets strictly in order: log in
//! when needed, fetch the page, extract and resolve file links, then
//! download each file under a page-scoped staging name. Per-page and
//! per-file errors land in the [`RunSummary`]; only [`RunContext::new`] can
//! fail fatally.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use harvester_core::batch::{DownloadOrchestrator, RunContext};
//! use harvester_core::download::HttpClient;
//! use harvester_core::parser::PageTarget;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(HttpClient::new()?);
//! let ctx = RunContext::new("./downloads")?;
//! let targets = vec![PageTarget::new("https://example.com/gallery.html")?];
//! let summary = DownloadOrchestrator::new(transport).run(targets, ctx).await;
//! println!("{} of {} files downloaded", summary.files_downloaded, summary.files_found);
//! # Ok(())
//! # }
//! ```

mod context;
mod orchestrator;
mod summary;

pub use context::{CollisionPolicy, RunContext, RunError};
pub use orchestrator::{DownloadOrchestrator, PageAnalysis, ResolvedDownload, plan_downloads};
pub use summary::{Failure, RunSummary};

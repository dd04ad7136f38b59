//! Harvester Core Library
//!
//! This library provides the core functionality for the harvester tool,
//! which fetches web pages (optionally behind a forum-style login), finds
//! links to downloadable files by extension, and downloads them in batch.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Extension catalog, link extraction, URL resolution, page targets
//! - [`auth`] - Credential store, prompting, and form login
//! - [`download`] - HTTP transport with cookie jar and streaming downloads
//! - [`batch`] - Sequential run orchestration and run summary

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod batch;
pub mod download;
pub mod parser;
#[cfg(test)]
pub mod test_support;
pub mod user_agent;

// Re-export commonly used types
pub use auth::{
    AuthSession, AuthStatus, CredentialError, CredentialMode, CredentialStore, Credentials,
    LoginProfile,
};
pub use batch::{CollisionPolicy, DownloadOrchestrator, RunContext, RunError, RunSummary};
pub use download::{DownloadError, HttpClient, Transport};
pub use parser::{ExtensionCatalog, FileTypeAnalyzer, PageTarget, ParseError, Selection, resolve};

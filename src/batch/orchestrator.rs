//! Sequential page-to-files pipeline.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{Instrument, debug, info, info_span, warn};

use super::context::RunContext;
use super::summary::RunSummary;
use crate::auth::{AuthSession, AuthStatus, CredentialError, Credentials};
use crate::download::{
    DownloadError, FetchResponse, Transport, staged_filename, suggested_filename,
};
use crate::parser::{
    ExtractedLink, FileTypeAnalyzer, FileTypeReport, LinkKind, PageTarget, classify, resolve,
};

/// A link ready to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDownload {
    /// Absolute `http(s)` URL of the file.
    pub absolute_url: String,
    /// Local filename, before staging.
    pub suggested_filename: String,
    /// 1-based index of the page the link came from.
    pub page_index: usize,
}

/// File-type counts for one page of an analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAnalysis {
    /// Page URL.
    pub url: String,
    /// Counts for the run's selection, or why the page could not be read.
    pub report: Result<FileTypeReport, String>,
}

/// Resolves `links` against `page_url`, dropping duplicate absolute URLs
/// and links with a non-web scheme.
///
/// File indices in synthesized names count unique URLs from 1.
#[must_use]
pub fn plan_downloads(
    page_url: &str,
    links: &[ExtractedLink],
    page_index: usize,
) -> Vec<ResolvedDownload> {
    let mut seen = HashSet::new();
    let mut planned = Vec::new();
    for link in links {
        if classify(&link.raw) == LinkKind::Unsupported {
            debug!(link = %link.raw, "skipping link with unsupported scheme");
            continue;
        }
        let absolute_url = resolve(page_url, &link.raw);
        if !seen.insert(absolute_url.clone()) {
            continue;
        }
        let file_index = planned.len() + 1;
        planned.push(ResolvedDownload {
            suggested_filename: suggested_filename(
                &absolute_url,
                &link.extension,
                page_index,
                file_index,
            ),
            absolute_url,
            page_index,
        });
    }
    planned
}

/// Drives pages through login, fetch, extraction, and download.
pub struct DownloadOrchestrator {
    transport: Arc<dyn Transport>,
    analyzer: FileTypeAnalyzer,
    auth: AuthSession,
}

impl std::fmt::Debug for DownloadOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadOrchestrator")
            .field("analyzer", &self.analyzer)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl DownloadOrchestrator {
    /// Creates an orchestrator with the canonical catalog and default login profile.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            analyzer: FileTypeAnalyzer::default(),
            auth: AuthSession::default(),
        }
    }

    /// Replaces the analyzer (catalog and extractor).
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: FileTypeAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Replaces the login driver.
    #[must_use]
    pub fn with_auth_session(mut self, auth: AuthSession) -> Self {
        self.auth = auth;
        self
    }

    /// Processes `targets` one at a time and returns the run totals.
    ///
    /// Page and file failures are recorded in the summary and never stop the
    /// run. `ctx` is consumed; its cleanup (including the transport's session
    /// cookies) runs when this future completes or is dropped.
    pub async fn run(&self, targets: Vec<PageTarget>, mut ctx: RunContext) -> RunSummary {
        let mut summary = RunSummary::default();
        ctx.attach_transport(Arc::clone(&self.transport));
        info!(pages = targets.len(), output = %ctx.output_dir().display(), "run started");

        for (offset, target) in targets.iter().enumerate() {
            let page_index = offset + 1;
            let span = info_span!("page", index = page_index, url = %target.url());
            self.process_page(target, page_index, &mut ctx, &mut summary)
                .instrument(span)
                .await;
        }

        ctx.finalize();
        ctx.clear_session();
        info!(
            pages = summary.pages_processed,
            found = summary.files_found,
            downloaded = summary.files_downloaded,
            failed = summary.failures.len(),
            "run complete"
        );
        summary
    }

    /// Logs in and fetches each target like [`run`](Self::run), but only
    /// counts file links per extension and category. Nothing is downloaded.
    ///
    /// Counts honor the context's selection. Cleanup is the same as for `run`.
    pub async fn analyze(&self, targets: &[PageTarget], mut ctx: RunContext) -> Vec<PageAnalysis> {
        ctx.attach_transport(Arc::clone(&self.transport));
        info!(pages = targets.len(), "analysis started");

        let mut analyses = Vec::with_capacity(targets.len());
        for (offset, target) in targets.iter().enumerate() {
            let span = info_span!("page", index = offset + 1, url = %target.url());
            let report = async {
                let (_, html) = self.fetch_page(target, &mut ctx).await?;
                let report = self.analyzer.analyze_selected(&html, ctx.selection());
                info!(total_links = report.grand_total, "page analyzed");
                Ok::<_, String>(report)
            }
            .instrument(span)
            .await;
            analyses.push(PageAnalysis {
                url: target.url().to_string(),
                report,
            });
        }

        ctx.clear_session();
        analyses
    }

    async fn process_page(
        &self,
        target: &PageTarget,
        page_index: usize,
        ctx: &mut RunContext,
        summary: &mut RunSummary,
    ) {
        summary.pages_processed += 1;

        let (page, html) = match self.fetch_page(target, ctx).await {
            Ok(fetched) => fetched,
            Err(reason) => {
                summary.record_failure(target.url(), reason);
                return;
            }
        };

        let report = self.analyzer.analyze(&html);
        for (category, count) in &report.per_category {
            debug!(category = %category, count, "links by category");
        }

        let links = self.analyzer.links(&html, ctx.selection());
        let planned = plan_downloads(target.url(), &links, page_index);
        summary.files_found += planned.len();

        let mut downloaded = 0usize;
        for download in &planned {
            let staged = staged_filename(page_index, &download.suggested_filename);
            let destination = ctx.staging_path(&staged);
            match self
                .transport
                .download(&download.absolute_url, &destination, Some(target.url()))
                .await
            {
                Ok(outcome) => {
                    info!(
                        url = %download.absolute_url,
                        file = %download.suggested_filename,
                        bytes = outcome.bytes_written,
                        "file downloaded"
                    );
                    ctx.record_staged(outcome.path);
                    downloaded += 1;
                }
                Err(e) => {
                    warn!(url = %download.absolute_url, error = %e, "file download failed");
                    summary.record_failure(&download.absolute_url, e.to_string());
                }
            }
        }
        summary.files_downloaded += downloaded;

        info!(
            total_links = report.grand_total,
            files_found = planned.len(),
            downloaded,
            elapsed_ms = page.elapsed.as_millis(),
            "page processed"
        );
    }

    /// Logs in when needed and fetches the page body.
    ///
    /// The error is the failure reason to record against the page URL.
    async fn fetch_page(
        &self,
        target: &PageTarget,
        ctx: &mut RunContext,
    ) -> Result<(FetchResponse, String), String> {
        if let Err(e) = self.ensure_session(target, ctx).await {
            warn!(error = %e, "credentials unavailable, skipping page");
            return Err(e.to_string());
        }

        let page = match self.transport.fetch(target.url()).await {
            Ok(page) if page.is_empty() => {
                let e = DownloadError::empty_response(target.url());
                warn!(error = %e, "page fetch returned no content");
                return Err(e.to_string());
            }
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "page fetch failed");
                return Err(e.to_string());
            }
        };
        let html = page.text();

        if ctx
            .session(target.domain())
            .is_some_and(|s| s.status() == AuthStatus::Unconfirmed)
            && !self.auth.profile().is_logged_in(&html)
        {
            warn!(domain = target.domain(), "page content does not confirm a logged-in session");
        }
        Ok((page, html))
    }

    /// Logs in once per domain when the page carries or requires credentials.
    async fn ensure_session(
        &self,
        target: &PageTarget,
        ctx: &mut RunContext,
    ) -> Result<(), CredentialError> {
        let domain = target.domain();
        let Some(credentials) = Self::page_credentials(target, ctx)? else {
            return Ok(());
        };
        if ctx.session(domain).is_some() {
            debug!(domain, "reusing login session");
            return Ok(());
        }

        let state = self
            .auth
            .authenticate(self.transport.as_ref(), target.origin(), domain, &credentials)
            .await;
        ctx.store_session(state);
        Ok(())
    }

    fn page_credentials(
        target: &PageTarget,
        ctx: &mut RunContext,
    ) -> Result<Option<Credentials>, CredentialError> {
        let domain = target.domain();
        if let Some(attached) = target.credentials() {
            if let Some(store) = ctx.credentials_mut() {
                store.cache(domain, attached.clone());
            }
            return Ok(Some(attached.clone()));
        }
        if !target.requires_auth() {
            return Ok(None);
        }
        match ctx.credentials_mut() {
            Some(store) => store.resolve(domain).map(Some),
            None => Err(CredentialError::PromptUnavailable {
                domain: domain.to_string(),
            }),
        }
    }
}

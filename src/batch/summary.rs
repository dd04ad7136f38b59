//! Run totals and per-URL failures.

use serde::Serialize;

/// A page or file that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// Page URL or resolved file URL.
    pub url: String,
    /// Human-readable cause.
    pub reason: String,
}

/// Totals accumulated across one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Pages attempted, including ones that failed.
    pub pages_processed: usize,
    /// Unique resolved file URLs found across all pages.
    pub files_found: usize,
    /// Files written successfully.
    pub files_downloaded: usize,
    /// Everything that failed, in the order it happened.
    pub failures: Vec<Failure>,
}

impl RunSummary {
    /// Appends a failure entry.
    pub fn record_failure(&mut self, url: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(Failure {
            url: url.into(),
            reason: reason.into(),
        });
    }

    /// True when nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_summary_is_clean() {
        let summary = RunSummary::default();
        assert!(summary.is_clean());
        assert_eq!(summary.pages_processed, 0);
    }

    #[test]
    fn test_summary_serializes_snake_case_fields() {
        let mut summary = RunSummary {
            pages_processed: 2,
            files_found: 3,
            files_downloaded: 2,
            failures: Vec::new(),
        };
        summary.record_failure("https://example.com/b.zip", "HTTP 404");

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["pages_processed"], 2);
        assert_eq!(json["files_downloaded"], 2);
        assert_eq!(json["failures"][0]["url"], "https://example.com/b.zip");
        assert_eq!(json["failures"][0]["reason"], "HTTP 404");
        assert!(!summary.is_clean());
    }
}

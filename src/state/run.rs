use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;

/// How a crawl run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The frontier was exhausted
    Completed,
    /// The configured page budget was reached with URLs still pending
    Truncated,
    /// The run was cancelled from outside (Ctrl-C)
    Interrupted,
    /// A run-level failure (browser launch, storage) stopped the crawl
    Aborted,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Truncated => "truncated",
            Self::Interrupted => "interrupted",
            Self::Aborted => "aborted",
        }
    }

    /// Returns true if the run processed the whole frontier
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal state of one crawl run
///
/// `visited`, `pending` and `file_urls` are pairwise disjoint. `failed` and
/// `unsaved` are subsets of `visited`.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// URLs dequeued for a fetch attempt, successful or not
    pub visited: BTreeSet<String>,

    /// URLs still queued when the run stopped, in queue order
    pub pending: Vec<String>,

    /// Non-HTML resources discovered but never fetched
    pub file_urls: BTreeSet<String>,

    /// Visited URLs whose fetch failed
    pub failed: BTreeSet<String>,

    /// Visited URLs that were fetched but whose artifact could not be written
    pub unsaved: BTreeSet<String>,

    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlResult {
    /// Number of pages fetched and extracted successfully
    pub fn pages_extracted(&self) -> usize {
        self.visited.len() - self.failed.len()
    }

    /// Wall-clock duration of the run
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(visited: &[&str], failed: &[&str]) -> CrawlResult {
        let now = Utc::now();
        CrawlResult {
            visited: visited.iter().map(|s| s.to_string()).collect(),
            pending: vec![],
            file_urls: BTreeSet::new(),
            failed: failed.iter().map(|s| s.to_string()).collect(),
            unsaved: BTreeSet::new(),
            status: RunStatus::Completed,
            started_at: now,
            finished_at: now,
        }
    }

    #[test]
    fn test_pages_extracted() {
        let result = result_with(&["https://a.com/", "https://a.com/x"], &["https://a.com/x"]);
        assert_eq!(result.pages_extracted(), 1);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(RunStatus::Completed.to_string(), "completed");
        assert_eq!(RunStatus::Truncated.to_string(), "truncated");
        assert_eq!(RunStatus::Interrupted.to_string(), "interrupted");
        assert_eq!(RunStatus::Aborted.to_string(), "aborted");
    }

    #[test]
    fn test_is_complete() {
        assert!(RunStatus::Completed.is_complete());
        assert!(!RunStatus::Truncated.is_complete());
        assert!(!RunStatus::Aborted.is_complete());
    }
}

//! Run statistics derived from a crawl result
//!
//! This module provides functionality for summarizing and displaying
//! the outcome of a crawl run.

use crate::state::{CrawlResult, RunStatus};

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatistics {
    pub status: RunStatus,

    /// URLs dequeued for a fetch attempt
    pub visited: usize,

    /// Pages fetched and extracted
    pub extracted: usize,

    /// Visited URLs whose fetch failed
    pub failed: usize,

    /// Extracted pages whose artifact could not be written
    pub unsaved: usize,

    /// URLs still queued when the run stopped
    pub pending: usize,

    /// Non-HTML resources recorded
    pub file_urls: usize,

    pub duration_seconds: i64,
}

impl CrawlStatistics {
    pub fn from_result(result: &CrawlResult) -> Self {
        Self {
            status: result.status,
            visited: result.visited.len(),
            extracted: result.pages_extracted(),
            failed: result.failed.len(),
            unsaved: result.unsaved.len(),
            pending: result.pending.len(),
            file_urls: result.file_urls.len(),
            duration_seconds: result.duration().num_seconds(),
        }
    }

    /// Share of visited URLs that produced an artifact, in percent
    pub fn success_rate(&self) -> f64 {
        if self.visited == 0 {
            return 0.0;
        }
        let saved = self.extracted.saturating_sub(self.unsaved);
        (saved as f64 / self.visited as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Status: {}", stats.status);
    println!("  Duration: {}s", stats.duration_seconds);
    println!();

    println!("Pages:");
    println!("  Visited: {}", stats.visited);
    println!("  Extracted: {}", stats.extracted);
    println!("  Pending: {}", stats.pending);
    println!("  File URLs: {}", stats.file_urls);
    println!();

    if stats.failed > 0 || stats.unsaved > 0 {
        println!("Errors:");
        println!("  Fetch failures: {}", stats.failed);
        println!("  Unsaved artifacts: {}", stats.unsaved);
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages saved)",
        stats.success_rate(),
        stats.extracted.saturating_sub(stats.unsaved),
        stats.visited
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::collections::BTreeSet;

    fn set(urls: &[&str]) -> BTreeSet<String> {
        urls.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_statistics_from_result() {
        let started_at = Utc::now();
        let result = CrawlResult {
            visited: set(&["https://x.com/", "https://x.com/a", "https://x.com/b", "https://x.com/c"]),
            pending: vec!["https://x.com/d".to_string()],
            file_urls: set(&["https://x.com/f.pdf"]),
            failed: set(&["https://x.com/b"]),
            unsaved: set(&["https://x.com/c"]),
            status: RunStatus::Truncated,
            started_at,
            finished_at: started_at + Duration::seconds(12),
        };

        let stats = CrawlStatistics::from_result(&result);
        assert_eq!(stats.visited, 4);
        assert_eq!(stats.extracted, 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.unsaved, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.file_urls, 1);
        assert_eq!(stats.duration_seconds, 12);
        assert!((stats.success_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_success_rate_empty_run() {
        let now = Utc::now();
        let result = CrawlResult {
            visited: BTreeSet::new(),
            pending: vec![],
            file_urls: BTreeSet::new(),
            failed: BTreeSet::new(),
            unsaved: BTreeSet::new(),
            status: RunStatus::Aborted,
            started_at: now,
            finished_at: now,
        };
        assert_eq!(CrawlStatistics::from_result(&result).success_rate(), 0.0);
    }
}

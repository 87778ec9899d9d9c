//! Crawl frontier: the pending queue and the visited/file sets
//!
//! This module handles:
//! - FIFO (breadth-first) ordering of URLs awaiting a fetch
//! - Deduplication against visited, pending and file URLs
//! - Scope containment to the target's domain
//! - Diverting non-HTML resources into the file set
//! - The optional depth limit

use crate::state::{CrawlResult, RunStatus};
use crate::url::{classify_url, normalize_url, Target};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashSet, VecDeque};
use url::Url;

/// A URL awaiting a fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// The normalized URL; its string form is the dedup key
    pub url: Url,

    /// Link hops from the seed (the seed is depth 0)
    pub depth: u32,
}

/// What happened to a URL offered to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Appended to the pending queue
    Queued,
    /// Recorded as a non-HTML resource
    File,
    /// Already visited, pending or recorded as a file
    Duplicate,
    /// Different authority than the target
    OutOfScope,
    /// Beyond the configured depth limit
    TooDeep,
    /// Not an absolute HTTP(S) URL
    Invalid,
}

/// The frontier of one crawl run
///
/// Exclusively owned by the coordinator; nothing else mutates these sets.
#[derive(Debug)]
pub struct Frontier {
    target: Target,
    max_depth: Option<u32>,
    pending: VecDeque<FrontierEntry>,
    pending_keys: HashSet<String>,
    visited: BTreeSet<String>,
    file_urls: BTreeSet<String>,
}

impl Frontier {
    /// Creates a frontier seeded with the target URL
    ///
    /// A seed that classifies as a file is recorded in the file set and the
    /// frontier starts empty.
    pub fn new(target: Target, max_depth: Option<u32>) -> Self {
        let mut frontier = Self {
            target,
            max_depth,
            pending: VecDeque::new(),
            pending_keys: HashSet::new(),
            visited: BTreeSet::new(),
            file_urls: BTreeSet::new(),
        };

        let seed = frontier.target.url().clone();
        frontier.admit(seed, 0);
        frontier
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Offers a discovered link
    ///
    /// The link is normalized, scope-checked, classified and deduplicated.
    pub fn offer(&mut self, link: &str, depth: u32) -> Admission {
        let url = match normalize_url(link) {
            Ok(url) => url,
            Err(e) => {
                tracing::trace!("Ignoring link {}: {}", link, e);
                return Admission::Invalid;
            }
        };

        if !self.target.contains(&url) {
            return Admission::OutOfScope;
        }

        self.admit(url, depth)
    }

    fn admit(&mut self, url: Url, depth: u32) -> Admission {
        let key = url.as_str();

        if self.visited.contains(key)
            || self.pending_keys.contains(key)
            || self.file_urls.contains(key)
        {
            return Admission::Duplicate;
        }

        if !classify_url(&url).should_fetch() {
            self.file_urls.insert(key.to_string());
            return Admission::File;
        }

        if self.max_depth.is_some_and(|max| depth > max) {
            return Admission::TooDeep;
        }

        self.pending_keys.insert(key.to_string());
        self.pending.push_back(FrontierEntry { url, depth });
        Admission::Queued
    }

    /// Dequeues the next URL and marks it visited
    ///
    /// The check-and-mark is a single `insert`, so an entry is returned at
    /// most once per run.
    pub fn next(&mut self) -> Option<FrontierEntry> {
        while let Some(entry) = self.pending.pop_front() {
            self.pending_keys.remove(entry.url.as_str());
            if self.visited.insert(entry.url.as_str().to_string()) {
                return Some(entry);
            }
        }
        None
    }

    /// Number of URLs waiting to be fetched
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn file_urls_len(&self) -> usize {
        self.file_urls.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }

    /// Consumes the frontier into the terminal crawl result
    pub fn into_result(
        self,
        status: RunStatus,
        failed: BTreeSet<String>,
        unsaved: BTreeSet<String>,
        started_at: DateTime<Utc>,
    ) -> CrawlResult {
        CrawlResult {
            visited: self.visited,
            pending: self
                .pending
                .into_iter()
                .map(|entry| entry.url.to_string())
                .collect(),
            file_urls: self.file_urls,
            failed,
            unsaved,
            status,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frontier() -> Frontier {
        Frontier::new(Target::parse("https://x.com/").unwrap(), None)
    }

    fn drain(frontier: &mut Frontier) -> Vec<String> {
        std::iter::from_fn(|| frontier.next())
            .map(|entry| entry.url.to_string())
            .collect()
    }

    #[test]
    fn test_seeded_with_target() {
        let mut frontier = frontier();
        assert_eq!(frontier.pending_len(), 1);
        let entry = frontier.next().unwrap();
        assert_eq!(entry.url.as_str(), "https://x.com/");
        assert_eq!(entry.depth, 0);
        assert!(frontier.next().is_none());
        assert_eq!(frontier.visited_len(), 1);
    }

    #[test]
    fn test_fifo_order() {
        let mut frontier = frontier();
        frontier.next();
        frontier.offer("https://x.com/b", 1);
        frontier.offer("https://x.com/a", 1);
        frontier.offer("https://x.com/c", 1);
        assert_eq!(
            drain(&mut frontier),
            vec!["https://x.com/b", "https://x.com/a", "https://x.com/c"]
        );
    }

    #[test]
    fn test_fragments_collapse_to_one_entry() {
        let mut frontier = frontier();
        assert_eq!(frontier.offer("https://x.com/a#s1", 1), Admission::Queued);
        assert_eq!(frontier.offer("https://x.com/a#s2", 1), Admission::Duplicate);
        frontier.next();
        assert_eq!(drain(&mut frontier), vec!["https://x.com/a"]);
    }

    #[test]
    fn test_visited_never_requeued() {
        let mut frontier = frontier();
        frontier.next();
        assert_eq!(frontier.offer("https://x.com/", 1), Admission::Duplicate);
        assert_eq!(frontier.offer("https://x.com/#top", 2), Admission::Duplicate);
        assert!(frontier.is_exhausted());
    }

    #[test]
    fn test_file_links_recorded_not_queued() {
        let mut frontier = frontier();
        frontier.next();
        assert_eq!(frontier.offer("https://x.com/doc.pdf", 1), Admission::File);
        assert_eq!(frontier.offer("https://x.com/doc.pdf", 1), Admission::Duplicate);
        assert!(frontier.is_exhausted());

        let result = frontier.into_result(
            RunStatus::Completed,
            BTreeSet::new(),
            BTreeSet::new(),
            Utc::now(),
        );
        assert!(result.file_urls.contains("https://x.com/doc.pdf"));
        assert!(!result.visited.contains("https://x.com/doc.pdf"));
    }

    #[test]
    fn test_out_of_scope_ignored() {
        let mut frontier = frontier();
        assert_eq!(frontier.offer("https://y.com/", 1), Admission::OutOfScope);
        assert_eq!(frontier.offer("https://y.com/doc.pdf", 1), Admission::OutOfScope);
        assert_eq!(frontier.offer("https://evil@x.com/p", 1), Admission::OutOfScope);
        assert_eq!(frontier.offer("https://a:b@x.com/doc.pdf", 1), Admission::OutOfScope);
        assert_eq!(frontier.offer("mailto:a@x.com", 1), Admission::Invalid);
        assert_eq!(frontier.offer("not a url", 1), Admission::Invalid);
        assert_eq!(frontier.file_urls_len(), 0);
        assert_eq!(frontier.pending_len(), 1);
    }

    #[test]
    fn test_query_variants_distinct() {
        let mut frontier = frontier();
        assert_eq!(frontier.offer("https://x.com/p?a=1&b=2", 1), Admission::Queued);
        assert_eq!(frontier.offer("https://x.com/p?b=2&a=1", 1), Admission::Queued);
        assert_eq!(frontier.offer("https://x.com/p/", 1), Admission::Queued);
        assert_eq!(frontier.offer("https://x.com/p", 1), Admission::Queued);
    }

    #[test]
    fn test_depth_limit() {
        let mut frontier = Frontier::new(Target::parse("https://x.com/").unwrap(), Some(1));
        assert_eq!(frontier.offer("https://x.com/one", 1), Admission::Queued);
        assert_eq!(frontier.offer("https://x.com/two", 2), Admission::TooDeep);
        // Files are recorded regardless of depth
        assert_eq!(frontier.offer("https://x.com/deep.zip", 5), Admission::File);
    }

    #[test]
    fn test_file_seed_is_not_fetched() {
        let target = Target::parse("https://x.com/brochure.pdf").unwrap();
        let mut frontier = Frontier::new(target, None);
        assert!(frontier.next().is_none());
        let result = frontier.into_result(
            RunStatus::Completed,
            BTreeSet::new(),
            BTreeSet::new(),
            Utc::now(),
        );
        assert!(result.visited.is_empty());
        assert_eq!(result.file_urls.len(), 1);
    }

    #[test]
    fn test_into_result_keeps_pending_order() {
        let mut frontier = frontier();
        frontier.next();
        frontier.offer("https://x.com/z", 1);
        frontier.offer("https://x.com/a", 1);
        let result = frontier.into_result(
            RunStatus::Truncated,
            BTreeSet::new(),
            BTreeSet::new(),
            Utc::now(),
        );
        assert_eq!(result.pending, vec!["https://x.com/z", "https://x.com/a"]);
        assert_eq!(result.status, RunStatus::Truncated);
        assert_eq!(result.visited.len(), 1);
    }
}

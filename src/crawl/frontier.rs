//! Breadth-first crawl state.

use std::collections::{HashSet, VecDeque};

use url::Url;

/// A page waiting to be visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CrawlFrontierEntry {
    pub url: Url,
    pub depth: usize,
}

/// Visited set plus FIFO frontier for one crawl.
///
/// A URL is enqueued at most once: `enqueue` checks both the visited set and
/// the URLs currently queued.
#[derive(Debug)]
pub(crate) struct CrawlState {
    visited: HashSet<String>,
    queued: HashSet<String>,
    frontier: VecDeque<CrawlFrontierEntry>,
}

impl CrawlState {
    pub(crate) fn new(seed: Url) -> Self {
        let mut state = Self {
            visited: HashSet::new(),
            queued: HashSet::new(),
            frontier: VecDeque::new(),
        };
        state.enqueue(seed, 0);
        state
    }

    /// Adds `url` at `depth` unless it was already seen. Returns whether it
    /// was added.
    pub(crate) fn enqueue(&mut self, url: Url, depth: usize) -> bool {
        let key = url_key(&url);
        if self.visited.contains(&key) || self.queued.contains(&key) {
            return false;
        }
        self.queued.insert(key);
        self.frontier.push_back(CrawlFrontierEntry { url, depth });
        true
    }

    /// Dequeues the next entry and marks it visited.
    pub(crate) fn next_entry(&mut self) -> Option<CrawlFrontierEntry> {
        let entry = self.frontier.pop_front()?;
        let key = url_key(&entry.url);
        self.queued.remove(&key);
        self.visited.insert(key);
        Some(entry)
    }

    /// Records `url` as visited without dequeuing it, dropping any queued
    /// entry for it. Used for redirect targets. Returns whether it was new.
    pub(crate) fn mark_visited(&mut self, url: &Url) -> bool {
        let key = url_key(url);
        if self.queued.remove(&key) {
            self.frontier.retain(|entry| url_key(&entry.url) != key);
        }
        self.visited.insert(key)
    }

    /// Whether the URL was visited or is waiting in the frontier.
    pub(crate) fn is_known(&self, url: &Url) -> bool {
        let key = url_key(url);
        self.visited.contains(&key) || self.queued.contains(&key)
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.frontier.is_empty()
    }
}

/// Identity of a URL for visit tracking: fragment-free, and `/path/` and
/// `/path` are the same page.
fn url_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    let mut key = url.to_string();
    if url.path().len() > 1 && url.query().is_none() && key.ends_with('/') {
        key.pop();
    }
    key
}

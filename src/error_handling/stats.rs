//! Processing statistics tracking.
//!
//! Thread-safe per-kind counters, used to build the error summary of a crawl.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::ErrorKind;

/// Thread-safe processing statistics tracker.
///
/// Every `ErrorKind` is initialized to zero on creation, so lookups never miss.
pub struct ProcessingStats {
    errors: HashMap<ErrorKind, AtomicUsize>,
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStats {
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for kind in ErrorKind::iter() {
            errors.insert(kind, AtomicUsize::new(0));
        }
        ProcessingStats { errors }
    }

    pub fn increment(&self, kind: ErrorKind) {
        if let Some(counter) = self.errors.get(&kind) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter for {:?} which is not in the map. \
                 This indicates a bug in ProcessingStats initialization.",
                kind
            );
        }
    }

    pub fn get(&self, kind: ErrorKind) -> usize {
        self.errors
            .get(&kind)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Non-zero counters keyed by the kind's serialised name.
    pub fn summary(&self) -> BTreeMap<String, usize> {
        ErrorKind::iter()
            .filter_map(|kind| {
                let count = self.get(kind);
                (count > 0).then(|| (kind_key(kind), count))
            })
            .collect()
    }
}

fn kind_key(kind: ErrorKind) -> String {
    serde_json::to_value(kind)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{kind:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_stats_initialization() {
        let stats = ProcessingStats::new();
        for kind in ErrorKind::iter() {
            assert_eq!(stats.get(kind), 0);
        }
        assert!(stats.summary().is_empty());
    }

    #[test]
    fn test_summary_uses_serialised_names() {
        let stats = ProcessingStats::new();
        stats.increment(ErrorKind::HttpBlocked);
        stats.increment(ErrorKind::HttpBlocked);
        stats.increment(ErrorKind::Timeout);

        let summary = stats.summary();
        assert_eq!(summary.get("http-blocked"), Some(&2));
        assert_eq!(summary.get("timeout"), Some(&1));
        assert_eq!(summary.len(), 2);
    }

    #[test]
    fn test_concurrent_increments() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(ProcessingStats::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..100 {
                        stats.increment(ErrorKind::RenderFailed);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread panicked");
        }
        assert_eq!(stats.get(ErrorKind::RenderFailed), 400);
    }
}

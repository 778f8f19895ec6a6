//! URL frontier: visited set plus FIFO pending queue
//!
//! The frontier is the single deduplication point of a crawl. A URL moves
//! from pending to visited exactly once, in [`Frontier::take_batch`], and the
//! page cap is enforced when links are offered rather than by truncating
//! results afterwards.

use std::collections::{HashSet, VecDeque};

#[derive(Debug)]
pub struct Frontier {
    visited: HashSet<String>,
    pending: VecDeque<String>,
    pending_index: HashSet<String>,
    cap: usize,
}

impl Frontier {
    /// Creates an empty frontier admitting at most `cap` distinct URLs
    pub fn new(cap: usize) -> Self {
        Self {
            visited: HashSet::new(),
            pending: VecDeque::new(),
            pending_index: HashSet::new(),
            cap,
        }
    }

    /// Queues a starting URL regardless of the cap
    ///
    /// Returns false if the URL was already visited or pending.
    pub fn seed(&mut self, url: &str) -> bool {
        if self.is_known(url) {
            return false;
        }
        self.push(url);
        true
    }

    /// Admits a discovered URL if it is new and the cap leaves room
    ///
    /// Returns true if the URL was queued.
    pub fn offer(&mut self, url: &str) -> bool {
        if self.is_known(url) || self.visited.len() + self.pending.len() >= self.cap {
            return false;
        }
        self.push(url);
        true
    }

    /// Removes up to `n` URLs from the front of the queue and marks them visited
    ///
    /// URLs that are already visited are dropped instead of returned.
    pub fn take_batch(&mut self, n: usize) -> Vec<String> {
        let mut batch = Vec::with_capacity(n.min(self.pending.len()));

        for _ in 0..n {
            let Some(url) = self.pending.pop_front() else {
                break;
            };
            self.pending_index.remove(&url);
            if self.visited.insert(url.clone()) {
                batch.push(url);
            }
        }

        batch
    }

    fn is_known(&self, url: &str) -> bool {
        self.visited.contains(url) || self.pending_index.contains(url)
    }

    fn push(&mut self, url: &str) {
        self.pending_index.insert(url.to_string());
        self.pending.push_back(url.to_string());
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_and_take() {
        let mut frontier = Frontier::new(10);
        assert!(frontier.seed("https://a.com/"));
        assert!(!frontier.seed("https://a.com/"));

        let batch = frontier.take_batch(3);
        assert_eq!(batch, vec!["https://a.com/".to_string()]);
        assert_eq!(frontier.visited_count(), 1);
        assert_eq!(frontier.pending_count(), 0);
        assert!(frontier.is_visited("https://a.com/"));
    }

    #[test]
    fn test_fifo_order() {
        let mut frontier = Frontier::new(10);
        for path in ["a", "b", "c", "d"] {
            frontier.offer(&format!("https://a.com/{}", path));
        }

        assert_eq!(
            frontier.take_batch(2),
            vec!["https://a.com/a".to_string(), "https://a.com/b".to_string()]
        );
        assert_eq!(
            frontier.take_batch(5),
            vec!["https://a.com/c".to_string(), "https://a.com/d".to_string()]
        );
        assert!(frontier.take_batch(5).is_empty());
    }

    #[test]
    fn test_offer_rejects_visited_and_pending() {
        let mut frontier = Frontier::new(10);
        frontier.seed("https://a.com/");
        frontier.take_batch(1);

        assert!(!frontier.offer("https://a.com/"));
        assert!(frontier.offer("https://a.com/x"));
        assert!(!frontier.offer("https://a.com/x"));
        assert_eq!(frontier.pending_count(), 1);
    }

    #[test]
    fn test_offer_respects_cap() {
        let mut frontier = Frontier::new(3);
        frontier.seed("https://a.com/");
        frontier.take_batch(1);

        assert!(frontier.offer("https://a.com/1"));
        assert!(frontier.offer("https://a.com/2"));
        assert!(!frontier.offer("https://a.com/3"));

        assert_eq!(frontier.visited_count() + frontier.pending_count(), 3);
    }

    #[test]
    fn test_visited_and_pending_stay_disjoint() {
        let mut frontier = Frontier::new(100);
        frontier.seed("https://a.com/");
        for round in 0..5 {
            for url in frontier.take_batch(3) {
                assert!(frontier.is_visited(&url));
                for i in 0..4 {
                    frontier.offer(&format!("https://a.com/{}/{}", round, i));
                }
                frontier.offer(&url);
            }
        }

        let mut drained = Vec::new();
        while frontier.has_pending() {
            drained.extend(frontier.take_batch(10));
        }
        let unique: HashSet<_> = drained.iter().collect();
        assert_eq!(unique.len(), drained.len());
    }

    #[test]
    fn test_take_batch_zero() {
        let mut frontier = Frontier::new(10);
        frontier.seed("https://a.com/");
        assert!(frontier.take_batch(0).is_empty());
        assert_eq!(frontier.pending_count(), 1);
    }
}

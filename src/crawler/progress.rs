//! Throttled progress reporting
//!
//! Samples are published on a broadcast channel. Unforced samples are
//! dropped if one was emitted less than the throttle window ago, but the
//! latest sample is always remembered so a later forced flush publishes the
//! final state.

use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// Capacity of the progress channel; slow subscribers skip old samples
const PROGRESS_CHANNEL_CAPACITY: usize = 256;

/// One progress sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlProgress {
    /// URLs visited so far
    pub visited: usize,

    /// Page cap of the crawl
    pub total: usize,

    /// URL being processed, or a lifecycle message
    pub current_url: String,

    /// URLs waiting in the frontier
    pub found: usize,

    /// `round(visited / total * 100)`, 0 when total is 0
    pub percent: u8,
}

impl CrawlProgress {
    pub fn new(visited: usize, total: usize, current_url: impl Into<String>, found: usize) -> Self {
        Self {
            visited,
            total,
            current_url: current_url.into(),
            found,
            percent: percent_of(visited, total),
        }
    }

    /// Sample with the percentage pinned to a fixed value
    pub fn with_percent(mut self, percent: u8) -> Self {
        self.percent = percent;
        self
    }
}

fn percent_of(visited: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (visited as f64 / total as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

#[derive(Debug, Default)]
struct ReporterState {
    last_emitted: Option<Instant>,
    last_sample: Option<CrawlProgress>,
}

/// Per-crawl progress emitter
///
/// Safe to share between the concurrent fetches of a batch.
#[derive(Debug)]
pub struct ProgressReporter {
    sender: broadcast::Sender<CrawlProgress>,
    throttle: Duration,
    state: Mutex<ReporterState>,
}

impl ProgressReporter {
    pub fn new(throttle: Duration) -> Self {
        let (sender, _) = broadcast::channel(PROGRESS_CHANNEL_CAPACITY);
        Self::with_sender(sender, throttle)
    }

    pub fn with_sender(sender: broadcast::Sender<CrawlProgress>, throttle: Duration) -> Self {
        Self {
            sender,
            throttle,
            state: Mutex::new(ReporterState::default()),
        }
    }

    /// Subscribes to the sample stream
    pub fn subscribe(&self) -> broadcast::Receiver<CrawlProgress> {
        self.sender.subscribe()
    }

    /// Sender for components that publish unthrottled samples
    pub fn sender(&self) -> broadcast::Sender<CrawlProgress> {
        self.sender.clone()
    }

    /// Records a sample and emits it if forced or outside the throttle window
    ///
    /// Returns true if the sample was emitted.
    pub fn report(&self, sample: CrawlProgress, force: bool) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let due = match state.last_emitted {
            None => true,
            Some(last) => now.duration_since(last) > self.throttle,
        };

        state.last_sample = Some(sample.clone());

        if force || due {
            state.last_emitted = Some(now);
            // No subscribers is not an error
            let _ = self.sender.send(sample);
            true
        } else {
            false
        }
    }

    /// Re-emits the most recent sample, bypassing the throttle
    pub fn flush(&self) -> bool {
        let last = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.last_sample.clone()
        };

        match last {
            Some(sample) => self.report(sample, true),
            None => false,
        }
    }

    /// The most recently recorded sample, emitted or not
    pub fn last_sample(&self) -> Option<CrawlProgress> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_sample
            .clone()
    }
}

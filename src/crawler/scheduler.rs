//! Fetch pool: bounded concurrent page fetching
//!
//! This module handles:
//! - Owning a fixed number of render contexts, one per pool slot
//! - Exclusive slot acquisition backed by a semaphore
//! - Applying the navigation timeout to every fetch
//! - Turning navigations into page records, failures included
//! - Normalizing and origin-filtering discovered anchors

use crate::crawler::fetcher::{RenderContext, RenderHost, RequestInterceptor};
use crate::state::PageRecord;
use crate::url::{normalize_url, UrlScope};
use crate::{CrawlError, NavigationError};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};

/// One pool member and the render context it owns
struct RenderContextSlot {
    id: usize,
    context: Box<dyn RenderContext>,
}

/// Exclusive ownership of one pool slot
///
/// Dropping the guard releases the slot.
pub struct SlotGuard<'a> {
    pool: &'a FetchPool,
    id: usize,
    _permit: SemaphorePermit<'a>,
}

impl SlotGuard<'_> {
    /// Index of the held slot
    pub fn id(&self) -> usize {
        self.id
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.pool.release(self.id);
    }
}

/// A fixed-size pool of render contexts
///
/// Pool exhaustion is backpressure: [`FetchPool::acquire`] waits until a
/// slot frees up and never fails. Each slot is held by at most one fetch.
pub struct FetchPool {
    slots: Vec<RenderContextSlot>,
    busy: Mutex<Vec<bool>>,
    semaphore: Semaphore,
    interceptor: RequestInterceptor,
    scope: UrlScope,
    navigation_timeout: Duration,
}

impl FetchPool {
    /// Opens `size` render contexts on `host`
    pub async fn open(
        host: &dyn RenderHost,
        size: usize,
        interceptor: RequestInterceptor,
        scope: UrlScope,
        navigation_timeout: Duration,
    ) -> Result<Self, CrawlError> {
        tracing::debug!("Opening fetch pool with {} render contexts", size);

        let mut slots = Vec::with_capacity(size);
        for id in 0..size {
            match host.open_context(id).await {
                Ok(context) => slots.push(RenderContextSlot { id, context }),
                Err(e) => {
                    for slot in &slots {
                        slot.context.close().await;
                    }
                    return Err(e);
                }
            }
        }

        Ok(Self {
            busy: Mutex::new(vec![false; size]),
            semaphore: Semaphore::new(size),
            slots,
            interceptor,
            scope,
            navigation_timeout,
        })
    }

    /// Number of slots in the pool
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots not currently held
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for a free slot and marks it busy
    pub async fn acquire(&self) -> SlotGuard<'_> {
        let permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => unreachable!("fetch pool semaphore is never closed"),
        };

        let mut busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        // A permit guarantees at least one idle slot
        let id = busy
            .iter()
            .position(|held| !*held)
            .unwrap_or_else(|| unreachable!("permit held without an idle slot"));
        busy[id] = true;

        tracing::debug!("Acquired render context {}", id);
        SlotGuard {
            pool: self,
            id,
            _permit: permit,
        }
    }

    fn release(&self, id: usize) {
        let mut busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        busy[id] = false;
        tracing::debug!("Released render context {}", id);
    }

    /// Acquires a slot, fetches `url` on it, and releases the slot
    pub async fn fetch(&self, url: &str) -> PageRecord {
        let slot = self.acquire().await;
        self.fetch_on(&slot, url).await
    }

    /// Fetches `url` on an already acquired slot
    ///
    /// Never fails: timeouts and navigation errors become a record with
    /// status 0 and the error text.
    pub async fn fetch_on(&self, slot: &SlotGuard<'_>, url: &str) -> PageRecord {
        let context = &self.slots[slot.id()].context;
        let navigation = tokio::time::timeout(
            self.navigation_timeout,
            context.navigate(url, &self.interceptor),
        )
        .await
        .unwrap_or_else(|_| {
            Err(NavigationError::Timeout {
                url: url.to_string(),
                after: self.navigation_timeout,
            })
        });

        match navigation {
            Ok(navigation) => {
                let links = self.filter_links(&navigation.anchors);
                tracing::debug!(
                    "Fetched {} (HTTP {}, {} same-origin links)",
                    url,
                    navigation.status,
                    links.len()
                );
                PageRecord::fetched(url.to_string(), navigation.status, navigation.html, links)
            }
            Err(e) => {
                tracing::warn!("Navigation failed for {}: {}", url, e);
                PageRecord::failed(url.to_string(), e.to_string())
            }
        }
    }

    /// Normalizes anchors and keeps those on the crawl hostname
    fn filter_links(&self, anchors: &[String]) -> Vec<String> {
        anchors
            .iter()
            .map(|anchor| normalize_url(anchor))
            .filter(|link| self.scope.is_same_origin(link))
            .collect()
    }

    /// Closes every render context, best effort
    pub async fn close(self) {
        for slot in &self.slots {
            tracing::trace!("Closing render context {}", slot.id);
            slot.context.close().await;
        }
    }
}

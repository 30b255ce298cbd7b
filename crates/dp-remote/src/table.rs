//! Requester-side bookkeeping of outstanding promises.
//!
//! Each processor owns one [`PromiseTable`].  Issuing a remote request
//! registers the requester's promise here under a fresh [`PromiseId`]; the
//! matching reply looks the id up and settles the promise.  Ids are serial
//! per table and never reused, so a late reply to an evicted promise can be
//! recognized and dropped instead of settling the wrong cell.

use dp_core::{PromiseId, Tick};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::promise::Promise;
use crate::wire::RemoteOutcome;

struct TableEntry {
    promise: Promise<RemoteOutcome>,
    issued: Tick,
    expires: Option<Tick>,
}

/// Outstanding promises, keyed by the id the reply will quote back.
#[derive(Default)]
pub struct PromiseTable {
    next: u64,
    entries: FxHashMap<PromiseId, TableEntry>,
}

impl PromiseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a promise issued at `now`.  With a TTL, the entry becomes
    /// eligible for [`evict_expired`](Self::evict_expired) once `now + ttl`
    /// passes; without one it stays until fulfilled.
    pub fn register(
        &mut self,
        promise: Promise<RemoteOutcome>,
        now: Tick,
        ttl: Option<u64>,
    ) -> PromiseId {
        let id = PromiseId(self.next);
        self.next += 1;
        let entry = TableEntry {
            promise,
            issued: now,
            expires: ttl.map(|t| Tick(now.0.saturating_add(t))),
        };
        self.entries.insert(id, entry);
        id
    }

    /// Settle the promise registered under `id` and drop the entry.
    ///
    /// An unknown id is not an error: it means the entry was evicted after
    /// its TTL lapsed, and the late outcome is discarded with a warning.
    pub fn fulfill(&mut self, id: PromiseId, outcome: RemoteOutcome) {
        match self.entries.remove(&id) {
            Some(entry) => {
                if entry.promise.fulfill(outcome).is_err() {
                    warn!(promise = id.0, "promise was already fulfilled");
                }
            }
            None => {
                warn!(promise = id.0, ?outcome, "dropping reply to evicted promise");
            }
        }
    }

    /// Drop every entry whose TTL lapsed before `now`.  Returns the number
    /// evicted.  The requester-side promise stays `Pending` forever, which is
    /// the table's signal that the request timed out.
    pub fn evict_expired(&mut self, now: Tick) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, entry| match entry.expires {
            Some(expires) if now > expires => {
                debug!(promise = id.0, issued = entry.issued.0, "evicting expired promise");
                false
            }
            _ => true,
        });
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Local reflection of the remote stop collection plus the edit buffer.
//!
//! Writes go to the [`StopStore`] and are never applied locally; the reflected list only
//! changes when a snapshot is delivered. After each awaited write the registry drains
//! whatever the store has already pushed, in receipt order.

pub mod buffer;
pub mod cache;
pub mod form;
pub mod model;
pub mod store;

pub use buffer::{EditBuffer, EditEntry, ReconcileReport};
pub use cache::SnapshotCache;
pub use form::{StopForm, TimeInput, TimeState, TimesForm};
pub use model::{BusStop, NewStop, StopTimes, TimeSlot};
pub use store::{SqliteStopStore, StopSnapshot, StopStore, Subscription};

use crate::admin::{Capability, Confirmation, Outcome};
use crate::error::StoreError;
use crate::search::search_stops;
use std::sync::Arc;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::Receiver;
use tracing::{debug, error, info, warn};

pub struct LocationRegistry {
    store: Arc<dyn StopStore>,
    updates: Receiver<StopSnapshot>,
    stops: Arc<Vec<BusStop>>,
    last_seq: Option<u64>,
    buffer: EditBuffer,
    cache: Option<SnapshotCache>,
}

fn surface(op: &'static str, e: StoreError) -> StoreError {
    if matches!(e, StoreError::Network { .. }) {
        error!(op, error = %e, "stop store call failed");
    }
    e
}

impl LocationRegistry {
    /// Subscribes to `store`. A cached list, if any, is shown until the first snapshot
    /// is applied, which happens before this returns.
    pub async fn connect(
        store: Arc<dyn StopStore>,
        cache: Option<SnapshotCache>,
    ) -> Result<Self, StoreError> {
        let Subscription { initial, updates } = store
            .subscribe()
            .await
            .map_err(|e| surface("subscribe", e))?;
        let mut registry = Self {
            store,
            updates,
            stops: Arc::new(Vec::new()),
            last_seq: None,
            buffer: EditBuffer::new(),
            cache,
        };
        if let Some(cached) = registry.cache.as_ref().and_then(SnapshotCache::load) {
            debug!(stops = cached.len(), "seeded stops from cache");
            registry.buffer.reconcile(&cached);
            registry.stops = Arc::new(cached);
        }
        registry.apply(initial);
        Ok(registry)
    }

    pub fn stops(&self) -> &[BusStop] {
        &self.stops
    }

    pub fn stop(&self, id: &str) -> Option<&BusStop> {
        self.stops.iter().find(|s| s.id == id)
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    pub fn last_seq(&self) -> Option<u64> {
        self.last_seq
    }

    pub fn search(&self, term: &str, default_term: &str) -> Vec<&BusStop> {
        search_stops(&self.stops, term, default_term)
    }

    fn apply(&mut self, snapshot: StopSnapshot) {
        if self.last_seq.is_some_and(|seen| snapshot.seq <= seen) {
            debug!(seq = snapshot.seq, "ignoring stale stop snapshot");
            return;
        }
        let report = self.buffer.reconcile(&snapshot.stops);
        if report.conflicted > 0 {
            warn!(
                seq = snapshot.seq,
                conflicted = report.conflicted,
                "stops changed remotely under unsaved edits"
            );
        }
        info!(
            seq = snapshot.seq,
            stops = snapshot.stops.len(),
            seeded = report.seeded,
            refreshed = report.refreshed,
            kept = report.kept,
            dropped = report.dropped,
            "stop snapshot applied"
        );
        if let Some(cache) = &self.cache {
            cache.store(&snapshot.stops);
        }
        self.stops = snapshot.stops;
        self.last_seq = Some(snapshot.seq);
    }

    /// Applies every delivery already queued, oldest first. Returns how many were applied.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.updates.try_recv() {
                Ok(snapshot) => {
                    self.apply(snapshot);
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                // Every snapshot is a full list, so skipping ahead loses nothing.
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "stop subscription lagged");
                }
                Err(TryRecvError::Closed) => {
                    warn!("stop subscription closed");
                    break;
                }
            }
        }
        applied
    }

    /// Waits for the next delivery. Returns `false` once the store has gone away.
    pub async fn next_delivery(&mut self) -> bool {
        loop {
            match self.updates.recv().await {
                Ok(snapshot) => {
                    self.apply(snapshot);
                    return true;
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "stop subscription lagged");
                }
                Err(RecvError::Closed) => return false,
            }
        }
    }

    pub async fn create(
        &mut self,
        cap: Capability,
        form: &StopForm,
    ) -> Result<Outcome<String>, StoreError> {
        if !cap.is_admin() {
            debug!("stops.create skipped: not admin");
            return Ok(Outcome::Skipped);
        }
        let stop = form.validate()?;
        let apt = stop.apt.clone();
        let id = self
            .store
            .add(stop)
            .await
            .map_err(|e| surface("add", e))?;
        self.apply_pending();
        info!(id = %id, apt = %apt, "stop created");
        Ok(Outcome::Applied(id))
    }

    /// Writes a complete set of times for `id`, bypassing the edit buffer.
    pub async fn update(
        &mut self,
        cap: Capability,
        id: &str,
        form: &TimesForm,
    ) -> Result<Outcome<StopTimes>, StoreError> {
        if !cap.is_admin() {
            debug!(id, "stops.update skipped: not admin");
            return Ok(Outcome::Skipped);
        }
        let times = form.validate()?;
        self.write_times(id, times).await.map(Outcome::Applied)
    }

    /// Saves the buffered edits for `id`.
    pub async fn save_edit(
        &mut self,
        cap: Capability,
        id: &str,
    ) -> Result<Outcome<StopTimes>, StoreError> {
        if !cap.is_admin() {
            debug!(id, "stops.save skipped: not admin");
            return Ok(Outcome::Skipped);
        }
        let times = self.buffer.pending_times(id)?;
        self.write_times(id, times).await.map(Outcome::Applied)
    }

    async fn write_times(&mut self, id: &str, times: StopTimes) -> Result<StopTimes, StoreError> {
        self.store
            .update_times(id, times.clone())
            .await
            .map_err(|e| surface("update_times", e))?;
        // Mark clean before draining, or our own write would read as a remote conflict.
        self.buffer.mark_saved(id, times.clone());
        self.apply_pending();
        info!(id, in_time = %times.in_time, out_time = %times.out_time, out_time2 = %times.out_time2, "stop times saved");
        Ok(times)
    }

    pub async fn remove(
        &mut self,
        cap: Capability,
        id: &str,
        confirmation: Confirmation,
    ) -> Result<Outcome<()>, StoreError> {
        if !cap.is_admin() {
            debug!(id, "stops.remove skipped: not admin");
            return Ok(Outcome::Skipped);
        }
        if confirmation == Confirmation::Declined {
            return Err(StoreError::ConfirmationDeclined);
        }
        self.store
            .delete(id)
            .await
            .map_err(|e| surface("delete", e))?;
        self.apply_pending();
        info!(id, "stop removed");
        Ok(Outcome::Applied(()))
    }

    /// Buffer edits are local until saved, so they are not gated.
    pub fn edit_time(&mut self, id: &str, slot: TimeSlot, value: &str) -> Result<(), StoreError> {
        self.buffer.edit_time(id, slot, value)
    }

    pub fn set_none(&mut self, id: &str, slot: TimeSlot, none: bool) -> Result<(), StoreError> {
        self.buffer.set_none(id, slot, none)
    }

    pub fn discard_edit(&mut self, id: &str) -> Result<(), StoreError> {
        self.buffer.discard(id)
    }
}

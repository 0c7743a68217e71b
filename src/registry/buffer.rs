//! Unsaved time edits, one entry per stop.
//!
//! Entries are reconciled against each delivered snapshot instead of being thrown away:
//! a clean entry is reseeded from the fresh values, an entry with unsaved edits is kept.
//! If the stop changed remotely underneath unsaved edits the entry is flagged as a
//! conflict; saving it still wins (the store is last-write-wins per document).

use super::form::TimesForm;
use super::model::{BusStop, StopTimes, TimeSlot};
use crate::error::StoreError;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditEntry {
    pub form: TimesForm,
    /// Remote values the entry was last seeded from.
    pub base: StopTimes,
    pub dirty: bool,
    pub conflict: bool,
}

impl EditEntry {
    fn seed(times: StopTimes) -> Self {
        Self {
            form: TimesForm::from_stored(&times),
            base: times,
            dirty: false,
            conflict: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub seeded: usize,
    pub refreshed: usize,
    pub kept: usize,
    pub conflicted: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    entries: BTreeMap<String, EditEntry>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&EditEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EditEntry)> {
        self.entries.iter().map(|(id, e)| (id.as_str(), e))
    }

    pub fn reconcile(&mut self, stops: &[BusStop]) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut next = BTreeMap::new();
        for stop in stops {
            let remote = stop.times();
            let entry = match self.entries.remove(&stop.id) {
                None => {
                    report.seeded += 1;
                    EditEntry::seed(remote)
                }
                Some(prev) if !prev.dirty => {
                    if prev.base != remote {
                        report.refreshed += 1;
                    }
                    EditEntry::seed(remote)
                }
                Some(mut prev) => {
                    if prev.base != remote {
                        prev.base = remote;
                        prev.conflict = true;
                        report.conflicted += 1;
                    } else {
                        report.kept += 1;
                    }
                    prev
                }
            };
            next.insert(stop.id.clone(), entry);
        }
        report.dropped = self.entries.len();
        self.entries = next;
        report
    }

    /// Typing a time unchecks "none" for that slot.
    pub fn edit_time(&mut self, id: &str, slot: TimeSlot, value: &str) -> Result<(), StoreError> {
        let entry = self.entry_mut(id)?;
        let input = entry.form.slot_mut(slot);
        input.value = value.trim().to_string();
        input.none = false;
        entry.dirty = true;
        Ok(())
    }

    pub fn set_none(&mut self, id: &str, slot: TimeSlot, none: bool) -> Result<(), StoreError> {
        let entry = self.entry_mut(id)?;
        entry.form.slot_mut(slot).set_none(none);
        entry.dirty = true;
        Ok(())
    }

    /// Drops unsaved edits, returning to the last seeded values.
    pub fn discard(&mut self, id: &str) -> Result<(), StoreError> {
        let entry = self.entry_mut(id)?;
        *entry = EditEntry::seed(entry.base.clone());
        Ok(())
    }

    /// Validated times to write for `id`.
    pub fn pending_times(&self, id: &str) -> Result<StopTimes, StoreError> {
        self.entries
            .get(id)
            .ok_or_else(|| StoreError::not_found(format!("stop {id}")))?
            .form
            .validate()
    }

    /// Records a successful write so the next delivery reseeds the entry.
    pub fn mark_saved(&mut self, id: &str, times: StopTimes) {
        if let Some(entry) = self.entries.get_mut(id) {
            *entry = EditEntry::seed(times);
        }
    }

    fn entry_mut(&mut self, id: &str) -> Result<&mut EditEntry, StoreError> {
        self.entries
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(format!("stop {id}")))
    }
}

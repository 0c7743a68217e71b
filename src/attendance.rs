//! Sparse absence marks: `date -> class -> student`. A missing entry means present.

use crate::classes::ClassId;
use crate::error::StoreError;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses and canonicalizes a `YYYY-MM-DD` day key.
pub fn parse_day(raw: &str) -> Result<String, StoreError> {
    let t = raw.trim();
    NaiveDate::parse_from_str(t, DATE_FORMAT)
        .map(|d| d.format(DATE_FORMAT).to_string())
        .map_err(|_| StoreError::InvalidDate(t.to_string()))
}

/// Today's key in local time.
pub fn today() -> String {
    chrono::Local::now().date_naive().format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceStore {
    days: BTreeMap<String, BTreeMap<ClassId, BTreeSet<String>>>,
}

type AttendanceBlob = BTreeMap<String, BTreeMap<String, BTreeMap<String, bool>>>;

impl AttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the persisted blob. `false` values and unknown classes are dropped.
    pub fn from_blob(raw: &str) -> Result<Self, StoreError> {
        let parsed: AttendanceBlob = serde_json::from_str(raw)?;
        let mut days = BTreeMap::new();
        for (date, classes) in parsed {
            let mut by_class = BTreeMap::new();
            for (id, marks) in classes {
                let Ok(class_id) = id.parse::<ClassId>() else {
                    warn!(date = %date, class_id = %id, "dropping marks for unknown class");
                    continue;
                };
                let names: BTreeSet<String> = marks
                    .into_iter()
                    .filter_map(|(name, absent)| absent.then_some(name))
                    .collect();
                by_class.insert(class_id, names);
            }
            days.insert(date, by_class);
        }
        Ok(Self { days })
    }

    pub fn to_blob(&self) -> Result<String, StoreError> {
        let out: AttendanceBlob = self
            .days
            .iter()
            .map(|(date, classes)| {
                let classes = classes
                    .iter()
                    .map(|(id, names)| {
                        let marks = names.iter().map(|n| (n.clone(), true)).collect();
                        (id.as_str().to_string(), marks)
                    })
                    .collect();
                (date.clone(), classes)
            })
            .collect();
        Ok(serde_json::to_string(&out)?)
    }

    pub fn is_absent(&self, date: &str, class_id: ClassId, name: &str) -> bool {
        self.days
            .get(date)
            .and_then(|c| c.get(&class_id))
            .is_some_and(|names| names.contains(name))
    }

    pub fn mark_absent(&mut self, date: &str, class_id: ClassId, name: &str) {
        self.days
            .entry(date.to_string())
            .or_default()
            .entry(class_id)
            .or_default()
            .insert(name.to_string());
    }

    /// Deletes the entry outright; the store never holds an explicit "present".
    pub fn mark_present(&mut self, date: &str, class_id: ClassId, name: &str) {
        if let Some(names) = self.days.get_mut(date).and_then(|c| c.get_mut(&class_id)) {
            names.remove(name);
        }
    }

    pub fn set_absent(&mut self, date: &str, class_id: ClassId, name: &str, absent: bool) {
        if absent {
            self.mark_absent(date, class_id, name);
        } else {
            self.mark_present(date, class_id, name);
        }
    }

    pub fn count_absent(&self, date: &str, class_id: ClassId) -> usize {
        self.days
            .get(date)
            .and_then(|c| c.get(&class_id))
            .map_or(0, BTreeSet::len)
    }

    pub fn absentees(&self, date: &str, class_id: ClassId) -> Vec<String> {
        self.days
            .get(date)
            .and_then(|c| c.get(&class_id))
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Empties an existing date/class entry, keeping the key. Returns whether one existed.
    pub fn clear_day(&mut self, date: &str, class_id: ClassId) -> bool {
        match self.days.get_mut(date).and_then(|c| c.get_mut(&class_id)) {
            Some(names) => {
                names.clear();
                true
            }
            None => false,
        }
    }

    /// Removes every mark for the student across all dates. Returns how many were removed.
    pub fn purge_student(&mut self, class_id: ClassId, name: &str) -> usize {
        let mut removed = 0;
        for names in self.days.values_mut().filter_map(|c| c.get_mut(&class_id)) {
            if names.remove(name) {
                removed += 1;
            }
        }
        removed
    }

    /// Rewrites every mark to the name `resolve` returns for it. Marks that resolve to
    /// the same name merge; marks `resolve` rejects are dropped. Returns how many were
    /// dropped.
    pub fn align_names(
        &mut self,
        mut resolve: impl FnMut(ClassId, &str) -> Option<String>,
    ) -> usize {
        let mut dropped = 0;
        for (date, classes) in self.days.iter_mut() {
            for (&class_id, names) in classes.iter_mut() {
                for name in std::mem::take(names) {
                    match resolve(class_id, &name) {
                        Some(stored) => {
                            names.insert(stored);
                        }
                        None => {
                            warn!(date = %date, class_id = %class_id, name = %name, "dropping absence mark for student not on roster");
                            dropped += 1;
                        }
                    }
                }
            }
        }
        dropped
    }

    /// Dates on which the student is marked absent.
    pub fn dates_for(&self, class_id: ClassId, name: &str) -> Vec<&str> {
        self.days
            .iter()
            .filter(|(_, c)| c.get(&class_id).is_some_and(|n| n.contains(name)))
            .map(|(d, _)| d.as_str())
            .collect()
    }
}

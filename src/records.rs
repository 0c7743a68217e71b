//! Locally persisted roster and attendance, kept consistent with each other.
//!
//! Each mutation is computed on a copy, written to SQLite (in one transaction when both
//! blobs change), and only then swapped into memory. A failed check or write leaves
//! both the database and the in-memory state as they were.

use crate::admin::{Capability, Confirmation, Outcome};
use crate::attendance::{parse_day, AttendanceStore};
use crate::classes::ClassId;
use crate::db::{self, ATTENDANCE_KEY, ROSTER_KEY};
use crate::error::StoreError;
use crate::roster::RosterStore;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AbsenceCount {
    pub absent: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedStudent {
    pub name: String,
    pub marks_removed: usize,
}

pub struct Records {
    conn: Connection,
    roster: RosterStore,
    attendance: AttendanceStore,
}

impl Records {
    /// Loads both blobs. A malformed blob is treated as empty.
    pub fn load(conn: Connection) -> Result<Self, StoreError> {
        let roster = match db::blob_get(&conn, ROSTER_KEY)? {
            Some(raw) => RosterStore::from_blob(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "roster blob unreadable, starting empty");
                RosterStore::new()
            }),
            None => RosterStore::new(),
        };
        let mut attendance = match db::blob_get(&conn, ATTENDANCE_KEY)? {
            Some(raw) => AttendanceStore::from_blob(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "attendance blob unreadable, starting empty");
                AttendanceStore::new()
            }),
            None => AttendanceStore::new(),
        };
        // Saved marks may predate roster normalization; key them by the stored spelling.
        let dropped = attendance.align_names(|class_id, name| {
            roster.find(class_id, name).map(str::to_string)
        });
        if dropped > 0 {
            warn!(dropped, "absence marks without a roster entry were dropped");
        }
        Ok(Self {
            conn,
            roster,
            attendance,
        })
    }

    pub fn roster(&self) -> &RosterStore {
        &self.roster
    }

    pub fn attendance(&self) -> &AttendanceStore {
        &self.attendance
    }

    pub fn add_student(
        &mut self,
        cap: Capability,
        class_id: ClassId,
        raw_name: &str,
    ) -> Result<Outcome<String>, StoreError> {
        if !cap.is_admin() {
            debug!(class_id = %class_id, "students.add skipped: not admin");
            return Ok(Outcome::Skipped);
        }
        let mut next = self.roster.clone();
        let name = next.insert(class_id, raw_name)?;
        db::blob_put(&self.conn, ROSTER_KEY, &next.to_blob()?)?;
        self.roster = next;
        info!(class_id = %class_id, name = %name, "student added");
        Ok(Outcome::Applied(name))
    }

    /// Removes the student and every absence mark they have on any date.
    pub fn remove_student(
        &mut self,
        cap: Capability,
        class_id: ClassId,
        name: &str,
        confirmation: Confirmation,
    ) -> Result<Outcome<RemovedStudent>, StoreError> {
        if !cap.is_admin() {
            debug!(class_id = %class_id, "students.remove skipped: not admin");
            return Ok(Outcome::Skipped);
        }
        if confirmation == Confirmation::Declined {
            return Err(StoreError::ConfirmationDeclined);
        }

        let mut roster = self.roster.clone();
        let stored = roster
            .remove(class_id, name)
            .ok_or_else(|| StoreError::not_found(format!("student {name:?} in {class_id}")))?;
        let mut attendance = self.attendance.clone();
        let marks_removed = attendance.purge_student(class_id, &stored);

        let roster_blob = roster.to_blob()?;
        let attendance_blob = attendance.to_blob()?;
        let tx = self.conn.unchecked_transaction()?;
        db::blob_put(&tx, ROSTER_KEY, &roster_blob)?;
        db::blob_put(&tx, ATTENDANCE_KEY, &attendance_blob)?;
        tx.commit()?;

        self.roster = roster;
        self.attendance = attendance;
        info!(class_id = %class_id, name = %stored, marks_removed, "student removed");
        Ok(Outcome::Applied(RemovedStudent {
            name: stored,
            marks_removed,
        }))
    }

    /// Sets or clears one absence mark. Not gated: anyone may record attendance.
    pub fn toggle_absent(
        &mut self,
        date: &str,
        class_id: ClassId,
        name: &str,
        absent: bool,
    ) -> Result<AbsenceCount, StoreError> {
        let date = parse_day(date)?;
        let stored = self
            .roster
            .find(class_id, name)
            .ok_or_else(|| StoreError::not_found(format!("student {name:?} in {class_id}")))?
            .to_string();
        let mut next = self.attendance.clone();
        next.set_absent(&date, class_id, &stored, absent);
        self.persist_attendance(next)?;
        debug!(date = %date, class_id = %class_id, name = %stored, absent, "attendance toggled");
        Ok(self.count(&date, class_id))
    }

    pub fn count_absent(&self, date: &str, class_id: ClassId) -> Result<AbsenceCount, StoreError> {
        let date = parse_day(date)?;
        Ok(self.count(&date, class_id))
    }

    pub fn clear_day(&mut self, date: &str, class_id: ClassId) -> Result<AbsenceCount, StoreError> {
        let date = parse_day(date)?;
        let mut next = self.attendance.clone();
        if next.clear_day(&date, class_id) {
            self.persist_attendance(next)?;
            info!(date = %date, class_id = %class_id, "attendance cleared for day");
        }
        Ok(self.count(&date, class_id))
    }

    pub fn absentees(&self, date: &str, class_id: ClassId) -> Result<Vec<String>, StoreError> {
        let date = parse_day(date)?;
        Ok(self.attendance.absentees(&date, class_id))
    }

    fn count(&self, date: &str, class_id: ClassId) -> AbsenceCount {
        AbsenceCount {
            absent: self.attendance.count_absent(date, class_id),
            total: self.roster.total(class_id),
        }
    }

    fn persist_attendance(&mut self, next: AttendanceStore) -> Result<(), StoreError> {
        db::blob_put(&self.conn, ATTENDANCE_KEY, &next.to_blob()?)?;
        self.attendance = next;
        Ok(())
    }
}

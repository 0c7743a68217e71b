//! Last applied stop list, kept in the workspace database so a restarted session can
//! show stops before the first delivery arrives.
//!
//! Everything here is best-effort. A cache that cannot be opened is reported once and the
//! registry runs without it; read and write failures are logged and ignored.

use super::model::BusStop;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

const BUSY_TIMEOUT: Duration = Duration::from_millis(250);

pub struct SnapshotCache {
    conn: Connection,
}

impl SnapshotCache {
    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Opens the cache or degrades to no cache at all.
    pub fn open_or_degrade(db_path: &Path) -> Option<Self> {
        match Self::open(db_path) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(path = %db_path.display(), error = %e, "stop cache unavailable; running uncached");
                None
            }
        }
    }

    fn init(conn: Connection) -> anyhow::Result<Self> {
        // The write lock is taken here, so a second session holding it fails setup.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS stop_cache(
                slot INTEGER PRIMARY KEY CHECK (slot = 1),
                stops_json TEXT NOT NULL,
                saved_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn load(&self) -> Option<Vec<BusStop>> {
        let raw: Option<String> = match self
            .conn
            .query_row("SELECT stops_json FROM stop_cache WHERE slot = 1", [], |r| {
                r.get(0)
            })
            .optional()
        {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "stop cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw?) {
            Ok(stops) => Some(stops),
            Err(e) => {
                warn!(error = %e, "stop cache unreadable; ignoring");
                None
            }
        }
    }

    pub fn store(&self, stops: &[BusStop]) {
        let json = match serde_json::to_string(stops) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, "stop cache encode failed");
                return;
            }
        };
        let res = self.conn.execute(
            "INSERT INTO stop_cache(slot, stops_json, saved_at) VALUES(1, ?1, ?2)
             ON CONFLICT(slot) DO UPDATE SET
               stops_json = excluded.stops_json,
               saved_at = excluded.saved_at",
            (&json, chrono::Utc::now().to_rfc3339()),
        );
        match res {
            Ok(_) => debug!(stops = stops.len(), "stop cache updated"),
            Err(e) => warn!(error = %e, "stop cache write failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn stores_and_loads_last_list() {
        let cache = SnapshotCache::open_in_memory().unwrap();
        assert!(cache.load().is_none());
        let now = Utc::now();
        let stop = BusStop {
            id: "a".into(),
            apt: "검단신도시".into(),
            stop: "정문".into(),
            in_time: "08:00".into(),
            out_time: String::new(),
            out_time2: String::new(),
            created_at: now,
            updated_at: now,
        };
        cache.store(&[stop.clone()]);
        cache.store(&[stop.clone()]);
        assert_eq!(cache.load().unwrap(), vec![stop]);
    }

    #[test]
    fn unopenable_path_degrades() {
        let dir = std::env::temp_dir().join("eunhad-cache-missing-dir/does/not/exist.sqlite3");
        assert!(SnapshotCache::open_or_degrade(&dir).is_none());
    }
}

//! The remote stop collection and its push channel.
//!
//! Every write is followed by a full snapshot on the broadcast channel, ordered by
//! apartment name. Consumers never apply their own writes locally; they wait for the
//! snapshot that carries them.

use super::model::{BusStop, NewStop, StopTimes};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 64;

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS bus_stops (
        id TEXT PRIMARY KEY,
        apt TEXT NOT NULL,
        stop TEXT NOT NULL,
        in_time TEXT NOT NULL DEFAULT '',
        out_time TEXT NOT NULL DEFAULT '',
        out_time2 TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_bus_stops_apt ON bus_stops(apt);
";

/// One delivery: the whole collection as of `seq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopSnapshot {
    pub seq: u64,
    pub stops: Arc<Vec<BusStop>>,
}

pub struct Subscription {
    pub initial: StopSnapshot,
    pub updates: broadcast::Receiver<StopSnapshot>,
}

#[async_trait]
pub trait StopStore: Send + Sync {
    /// Adds a document and returns its id. Timestamps are assigned by the store.
    async fn add(&self, stop: NewStop) -> Result<String, StoreError>;

    /// Overwrites the three time fields and refreshes `updatedAt`.
    async fn update_times(&self, id: &str, times: StopTimes) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    async fn subscribe(&self) -> Result<Subscription, StoreError>;
}

struct Inner {
    conn: Connection,
    seq: u64,
}

/// SQLite-backed collection shared by every session holding the same `Arc`. Snapshots
/// only reach subscribers in this process.
pub struct SqliteStopStore {
    inner: Mutex<Inner>,
    tx: broadcast::Sender<StopSnapshot>,
}

impl SqliteStopStore {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path.as_ref())?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Ok(Self {
            inner: Mutex::new(Inner { conn, seq: 0 }),
            tx,
        })
    }

    /// Runs `write` and publishes the resulting snapshot under one lock, so sequence
    /// numbers follow commit order.
    fn write<T>(
        &self,
        write: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::network("stop store lock poisoned"))?;
        let out = write(&inner.conn)?;
        inner.seq += 1;
        let snapshot = StopSnapshot {
            seq: inner.seq,
            stops: Arc::new(list_stops(&inner.conn).map_err(StoreError::network)?),
        };
        // No receivers is fine: nobody is watching yet.
        let receivers = self.tx.send(snapshot).unwrap_or(0);
        debug!(seq = inner.seq, receivers, "stop snapshot published");
        Ok(out)
    }
}

fn list_stops(conn: &Connection) -> rusqlite::Result<Vec<BusStop>> {
    let mut stmt = conn.prepare(
        "SELECT id, apt, stop, in_time, out_time, out_time2, created_at, updated_at
         FROM bus_stops
         ORDER BY apt, created_at, id",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(BusStop {
            id: r.get(0)?,
            apt: r.get(1)?,
            stop: r.get(2)?,
            in_time: r.get(3)?,
            out_time: r.get(4)?,
            out_time2: r.get(5)?,
            created_at: r.get(6)?,
            updated_at: r.get(7)?,
        })
    })?;
    let stops = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(stops)
}

#[async_trait]
impl StopStore for SqliteStopStore {
    async fn add(&self, stop: NewStop) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.write(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO bus_stops(id, apt, stop, in_time, out_time, out_time2, created_at, updated_at)
                 VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    &id,
                    &stop.apt,
                    &stop.stop,
                    &stop.times.in_time,
                    &stop.times.out_time,
                    &stop.times.out_time2,
                    now
                ],
            )
            .map_err(StoreError::network)?;
            Ok(())
        })?;
        Ok(id)
    }

    async fn update_times(&self, id: &str, times: StopTimes) -> Result<(), StoreError> {
        self.write(|conn| {
            let changed = conn
                .execute(
                    "UPDATE bus_stops
                     SET in_time = ?2, out_time = ?3, out_time2 = ?4, updated_at = ?5
                     WHERE id = ?1",
                    params![id, &times.in_time, &times.out_time, &times.out_time2, Utc::now()],
                )
                .map_err(StoreError::network)?;
            if changed == 0 {
                return Err(StoreError::not_found(format!("stop {id}")));
            }
            Ok(())
        })
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.write(|conn| {
            let changed = conn
                .execute("DELETE FROM bus_stops WHERE id = ?1", [id])
                .map_err(StoreError::network)?;
            if changed == 0 {
                return Err(StoreError::not_found(format!("stop {id}")));
            }
            Ok(())
        })
    }

    async fn subscribe(&self) -> Result<Subscription, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::network("stop store lock poisoned"))?;
        let stops = list_stops(&inner.conn).map_err(StoreError::network)?;
        Ok(Subscription {
            initial: StopSnapshot {
                seq: inner.seq,
                stops: Arc::new(stops),
            },
            updates: self.tx.subscribe(),
        })
    }
}

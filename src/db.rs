use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE_NAME: &str = "eunha.sqlite3";

/// Keys of the two locally persisted blobs.
pub const ROSTER_KEY: &str = "eunha-students-v1";
pub const ATTENDANCE_KEY: &str = "eunha-absent-v1";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS local_blobs(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

pub fn blob_get(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM local_blobs WHERE key = ?",
        [key],
        |r| r.get(0),
    )
    .optional()
}

/// Replaces the whole blob. Callers that write several blobs wrap this in a transaction.
pub fn blob_put(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO local_blobs(key, value, updated_at)
         VALUES(?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET
           value = excluded.value,
           updated_at = excluded.updated_at",
        (key, value, &now),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_put_overwrites() {
        let conn = open_in_memory().unwrap();
        assert_eq!(blob_get(&conn, ROSTER_KEY).unwrap(), None);
        blob_put(&conn, ROSTER_KEY, "{}").unwrap();
        blob_put(&conn, ROSTER_KEY, r#"{"green":[]}"#).unwrap();
        assert_eq!(
            blob_get(&conn, ROSTER_KEY).unwrap().as_deref(),
            Some(r#"{"green":[]}"#)
        );
        assert_eq!(blob_get(&conn, ATTENDANCE_KEY).unwrap(), None);
    }
}

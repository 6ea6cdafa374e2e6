//! SQLite schema for Pulsecore
//!
//! A single table mapping session ids to the last reported BPM.

use rusqlite::{Connection, Result};

/// Initialize the database with required tables
///
/// Safe to call on every start-up.
pub fn init_db(conn: &Connection) -> Result<()> {
    // bpm is kept as text; the store never interprets it
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
            sessionid INTEGER PRIMARY KEY,
            bpm TEXT
        )",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_db() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(init_db(&conn).is_ok());

        let table_count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='sessions'",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(table_count, 1);
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        conn.execute("INSERT INTO sessions VALUES (7, '60')", [])
            .unwrap();

        init_db(&conn).unwrap();

        let bpm: String = conn
            .query_row("SELECT bpm FROM sessions WHERE sessionid = 7", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(bpm, "60");
    }
}

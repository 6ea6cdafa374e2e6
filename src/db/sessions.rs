//! Session store operations
//!
//! Plain functions over a borrowed connection. Each mutating call is a
//! single autocommitted statement, except [`allocate_session`] which wraps
//! its read and insert in one transaction.

use crate::error::{CoreError, Result};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::fmt;

/// Last reported heart-rate value, exactly as it was stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bpm(String);

impl Bpm {
    pub fn new(value: impl Into<String>) -> Self {
        Bpm(value.into())
    }

    /// Value written when a session is opened
    pub fn initial() -> Self {
        Bpm("0".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// JSON form: a number when the stored text is numeric, else a string
    pub fn to_json(&self) -> serde_json::Value {
        match serde_json::from_str::<serde_json::Number>(self.0.trim()) {
            Ok(number) => serde_json::Value::Number(number),
            Err(_) => serde_json::Value::String(self.0.clone()),
        }
    }
}

impl fmt::Display for Bpm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Id to allocate after `last`
pub fn next_session_id(last: Option<i64>) -> Result<i64> {
    match last {
        Some(id) => id
            .checked_add(1)
            .ok_or(CoreError::SessionIdsExhausted(id)),
        None => Ok(0),
    }
}

/// Insert a new session row with the initial BPM
pub fn open_session(conn: &Connection, id: i64) -> Result<()> {
    let result = conn.execute(
        "INSERT INTO sessions (sessionid, bpm) VALUES (?1, ?2)",
        params![id, Bpm::initial().as_str()],
    );

    match result {
        Ok(_) => {
            tracing::info!("Opened session {}", id);
            Ok(())
        }
        Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
            Err(CoreError::SessionExists(id))
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete a session row. Returns the number of rows removed (0 if absent).
pub fn close_session(conn: &Connection, id: i64) -> Result<usize> {
    let removed = conn.execute("DELETE FROM sessions WHERE sessionid = ?1", [id])?;
    tracing::info!("Closed session {} ({} row(s) removed)", id, removed);
    Ok(removed)
}

/// Overwrite the BPM of a session. Returns rows affected (0 if absent).
pub fn set_bpm(conn: &Connection, id: i64, bpm: &Bpm) -> Result<usize> {
    let updated = conn.execute(
        "UPDATE sessions SET bpm = ?1 WHERE sessionid = ?2",
        params![bpm.as_str(), id],
    )?;
    tracing::debug!("Set bpm of session {} to {} ({} row(s))", id, bpm, updated);
    Ok(updated)
}

/// All BPM rows for a session id; empty when the session does not exist
pub fn get_bpm(conn: &Connection, id: i64) -> Result<Vec<Bpm>> {
    let mut stmt = conn.prepare("SELECT bpm FROM sessions WHERE sessionid = ?1")?;
    let rows = stmt
        .query_map([id], |row| row.get::<_, Option<String>>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    // A NULL bpm can only come from rows written outside this service
    Ok(rows
        .into_iter()
        .map(|bpm| Bpm(bpm.unwrap_or_default()))
        .collect())
}

/// Highest session id currently stored
pub fn get_last_id(conn: &Connection) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT sessionid FROM sessions ORDER BY sessionid DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Number of open sessions
pub fn count_sessions(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
    Ok(count)
}

/// Open the next session id atomically and return it
pub fn allocate_session(conn: &mut Connection) -> Result<i64> {
    let tx = conn.transaction()?;
    let id = next_session_id(get_last_id(&tx)?)?;
    open_session(&tx, id)?;
    tx.commit()?;
    Ok(id)
}

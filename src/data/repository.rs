use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::AppError;

pub fn get_state(conn: &Connection, key: &str) -> Result<Option<String>, AppError> {
    let value = conn
        .query_row(
            "SELECT value FROM local_state WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

pub fn set_state(conn: &Connection, key: &str, value: &str) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO local_state (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

pub fn delete_state(conn: &Connection, key: &str) -> Result<bool, AppError> {
    let count = conn.execute("DELETE FROM local_state WHERE key = ?1", params![key])?;
    Ok(count > 0)
}

use anyhow::Result;
use log::{info, warn};
use rusqlite::Connection;

use crate::request::message::SpoolMessage;

/// Load a SpoolMessage into the database
///
/// The message is stored in a JSON column and the schema will automatically extract the
/// simulation ID and add an insertion timestamp. Messages already in the database are skipped,
/// so re-running against an unchanged spool directory is safe.
pub fn ingest_message(conn: &Connection, message: &SpoolMessage) -> Result<()> {
    if already_ingested(conn, &message.key)? {
        warn!("{} is already in the db, skipping", &message.key);
        return Ok(());
    }

    info!("Adding {} to db", &message.key);
    let json = &message.content;
    let valid = &message.valid;

    conn.execute(
        "INSERT INTO job (manifest, valid) VALUES (?1, ?2)",
        (json, valid),
    )?;

    Ok(())
}

fn already_ingested(conn: &Connection, key: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM job WHERE simulation_id = ?1",
        [key],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

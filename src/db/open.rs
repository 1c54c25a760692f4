use log::info;
use crate::WorkingDirectory;

pub fn open_db(wd: &WorkingDirectory) -> rusqlite::Result<rusqlite::Connection> {
    let path = &wd.path.join("nipsu.db");
    if !path.exists() { info!("Creating new database {}", path.display()) }
    let conn = rusqlite::Connection::open(path)?;

    static SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/db/schema.sql"));
    conn.execute(SCHEMA, [])?;

    info!("Creating dry run save point");
    conn.execute("SAVEPOINT dry_run", [])?;

    Ok(conn)
}

/// Finish the run: keep the database changes, or throw them away under --dry-run
pub fn release_or_rollback(conn: &rusqlite::Connection, dry_run: bool) -> rusqlite::Result<()> {
    match dry_run {
        true => {
            info!("--dry-run set, rolling back database state");
            conn.execute("ROLLBACK TO dry_run", [])?;
        }
        false => {
            info!("--dry-run not set, releasing dry run save point");
            conn.execute("RELEASE dry_run", [])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_is_idempotent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let wd = WorkingDirectory { path: temp.path().to_path_buf() };

        let conn = open_db(&wd).expect("open");
        release_or_rollback(&conn, false).expect("release");
        drop(conn);

        // table already exists on the second open
        let conn = open_db(&wd).expect("reopen");
        release_or_rollback(&conn, false).expect("release");
    }
}

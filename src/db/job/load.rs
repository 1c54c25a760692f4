use anyhow::{Context, Result};
use log::info;
use rusqlite::Connection;

use crate::slurm::job_request::JobRequest;

/// Load valid jobs that haven't been staged or submitted yet
pub fn get_valid_jobs(conn: &Connection) -> Result<Vec<JobRequest>> {
    let mut stmt =
        conn.prepare("SELECT manifest FROM job WHERE valid == 1 AND staged == 0 AND submitted == 0")?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut json: Vec<String> = Vec::new();
    for row in rows {
        let json_string: String = row?;
        info!("Loading valid job from db: {} ...", truncate(&json_string, 50));
        json.push(json_string);
    }

    deserialise(json)
}

fn deserialise(json_strings: Vec<String>) -> Result<Vec<JobRequest>> {
    let mut jobs: Vec<JobRequest> = Vec::new();
    for string in json_strings {
        let job: JobRequest =
            serde_json::from_str(&string).context("Deserialising a manifest marked valid")?;
        jobs.push(job);
    }
    Ok(jobs)
}

/// Manifests can be shorter than the log preview length
fn truncate(json: &str, limit: usize) -> &str {
    match json.char_indices().nth(limit) {
        Some((idx, _)) => &json[..idx],
        None => json,
    }
}

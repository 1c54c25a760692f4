use std::process::Command;

use anyhow::{bail, Context, Result};
use log::info;
use rusqlite::Connection;

use crate::db::job::state::JobState;
use crate::slurm::job::JobPath;
use crate::slurm::job_request::JobRequest;

/// sbatch is pinned to the same path on every login node
static SBATCH: &str = "/usr/bin/sbatch";

impl JobRequest {
    pub fn stage(&self, conn: &Connection) -> Result<()> {
        self.update(conn, JobState::Staged)
    }

    pub fn submit(&self, conn: &Connection, job: &JobPath) -> Result<()> {
        let job_id = self.run_sbatch(job)?;
        info!("SLURM job id: {job_id}");
        self.update(conn, JobState::Submitted)?;
        self.update_slurm(conn, &job_id)
    }

    /// Record a job that ran to completion on the local host, with no scheduler involved
    pub fn complete_local(&self, conn: &Connection) -> Result<()> {
        self.update(conn, JobState::Submitted)?;
        self.update_slurm(conn, "local")
    }

    fn update_slurm(&self, conn: &Connection, slurm_id: &str) -> Result<()> {
        let id = &self.simulation.id;
        info!("Updating {id} with slurm ID {slurm_id}");
        conn.execute(
            "UPDATE job SET slurm_id = ?1 WHERE simulation_id = ?2",
            [slurm_id, id.as_str()],
        )?;
        Ok(())
    }

    fn update(&self, conn: &Connection, state: JobState) -> Result<()> {
        let id = &self.simulation.id;
        let col = state.as_column();
        info!("Updating {id} with state {col}");
        let stmt = format!("UPDATE job SET {col} = 1 WHERE simulation_id = (?1)");

        conn.execute(&stmt, [id.as_str()])?;
        Ok(())
    }

    fn run_sbatch(&self, job_path: &JobPath) -> Result<String> {
        let job_script_path = job_path.path.to_str().context("Job script path")?;
        let arguments = vec!["--parsable", job_script_path];

        let mut sbatch = Command::new(SBATCH);
        let cmd = sbatch.args(&arguments);
        info!("Running sbatch process");
        info!("{:?}", &cmd);
        let output = cmd.output().context("Failed to execute sbatch")?;
        if !output.status.success() {
            bail!(
                "sbatch exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
        }

        // --parsable prints the job id with a trailing newline
        let job_id = String::from_utf8(output.stdout).context("job id")?;
        Ok(job_id.trim_end().to_string())
    }
}

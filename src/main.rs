use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use crate::db::ingest::message::ingest_message;
use crate::db::job::load::get_valid_jobs;
use crate::db::open::{open_db, release_or_rollback};
use crate::namespace::PlatformNamespace;
use crate::request::message::Message;
use crate::request::read::get_message_paths;
use crate::request::schema::load_schema;

mod db;
mod exec;
mod namespace;
mod request;
mod slurm;

/// Stage connectome manipulation jobs and submit them to a SLURM cluster
#[derive(Debug, Parser)]
#[command(name = "nipsu")]
#[command(about = "Stage connectome manipulation jobs and submit them to SLURM")]
struct Args {
    /// Directory containing job request messages (one JSON file per job)
    #[arg(long)]
    message_dir: PathBuf,

    /// Directory where job scripts are rendered and job state is tracked
    #[arg(long)]
    work_dir: PathBuf,

    /// Directory containing the job request JSON schema
    #[arg(long)]
    schema_dir: PathBuf,

    /// Deployment namespace, decorates job names outside prod
    #[arg(long, value_enum, default_value_t = PlatformNamespace::Dev)]
    namespace: PlatformNamespace,

    /// Ingest and render jobs without submitting anything, then roll the database back
    #[arg(long)]
    dry_run: bool,

    /// Run jobs on this host instead of submitting to SLURM, passing exit codes through
    #[arg(long)]
    local: bool,
}

/// Directory where job scripts are staged and job state is tracked
pub struct WorkingDirectory {
    pub path: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    info!("terve! starting up :)");

    let args = Args::parse();
    let wd = WorkingDirectory { path: args.work_dir.clone() };
    fs::create_dir_all(&wd.path).context("Create working directory")?;

    let schema = load_schema(args.schema_dir.as_path());
    let conn = open_db(&wd)?;

    for path in get_message_paths(args.message_dir.as_path())? {
        let message = Message { path };
        match message.read(&schema) {
            Ok(spool) => ingest_message(&conn, &spool)?,
            Err(err) => warn!("Skipping {}: {:?}", message.path.display(), err),
        }
    }

    let jobs = get_valid_jobs(&conn)?;
    if jobs.is_empty() {
        info!("No valid unsubmitted jobs, nothing to do");
    }

    let mut exit_code = 0;
    for job in &jobs {
        let job_path = job.create(&wd, &args.namespace);
        job.stage(&conn)?;

        if args.dry_run {
            info!("--dry-run set, not submitting {}", &job.simulation.id);
            continue;
        }

        if args.local {
            match exec::run(job) {
                Ok(status) => {
                    let code = status.code().unwrap_or(1);
                    if code == 0 {
                        job.complete_local(&conn)?;
                    } else {
                        warn!("{} exited with {code}", &job.simulation.id);
                        exit_code = code;
                        break;
                    }
                }
                Err(err) => {
                    warn!("Can't run {} locally: {:?}", &job.simulation.id, err);
                    exit_code = err.exit_code();
                    break;
                }
            }
        } else {
            job.submit(&conn, &job_path)?;
        }
    }

    release_or_rollback(&conn, args.dry_run)?;

    if exit_code != 0 {
        // pass the failing program's status through as our own
        std::process::exit(exit_code);
    }
    Ok(())
}

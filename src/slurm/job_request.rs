use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A validated job request message, ready to stage
#[derive(Debug, Deserialize, Serialize)]
pub struct JobRequest {
    pub simulation: SimulationSpec,
    pub environment: EnvironmentSpec,
    pub resources: ResourceRequest,
}

/// The simulation program to run on the allocated node
#[derive(Debug, Deserialize, Serialize)]
pub struct SimulationSpec {
    pub id: String,
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    /// Run the interpreter with unbuffered stdout/stderr so logs stream in real time
    #[serde(default = "default_unbuffered")]
    pub unbuffered: bool,
}

/// A pre-built virtualenv on shared storage, activated before the program runs
#[derive(Debug, Deserialize, Serialize)]
pub struct EnvironmentSpec {
    pub venv_path: PathBuf,
}

/// Resource request directives consumed by the scheduler
///
/// These are hints for sbatch, not things nipsu enforces: the scheduler owns queueing,
/// allocation, exclusivity, and walltime. Kept separate from script assembly so the directive
/// set can be checked without rendering anything.
#[derive(Debug, Deserialize, Serialize)]
pub struct ResourceRequest {
    /// Defaults to the simulation id when missing
    pub job_name: Option<String>,
    /// Walltime in H:MM:SS
    pub job_time: String,
    /// Accounting project the job is billed to
    pub account: String,
    pub partition: String,
    /// `0` means "all memory on the node", the SLURM convention for whole-node jobs
    #[serde(default = "default_memory")]
    pub memory: String,
    #[serde(default = "default_exclusive")]
    pub exclusive: bool,
    /// Hardware feature tag, e.g. `cpu`
    pub constraint: Option<String>,
}

fn default_unbuffered() -> bool {
    true
}

fn default_memory() -> String {
    "0".to_string()
}

fn default_exclusive() -> bool {
    true
}

impl JobRequest {
    /// Job name as it appears in squeue, decorated by the caller's namespace if needed
    pub fn base_name(&self) -> &str {
        self.resources.job_name.as_deref().unwrap_or(&self.simulation.id)
    }
}

impl ResourceRequest {
    /// Render the `#SBATCH` directive lines for the script header
    ///
    /// Every line is a shell comment: sbatch parses them, bash ignores them, so running the
    /// script outside the scheduler behaves identically.
    pub fn directive_lines(&self, job_name: &str) -> Vec<String> {
        let mut lines = vec![
            format!("#SBATCH --job-name={job_name}"),
            format!("#SBATCH --time={}", self.job_time),
            format!("#SBATCH --account={}", self.account),
            format!("#SBATCH --partition={}", self.partition),
            format!("#SBATCH --mem={}", self.memory),
        ];

        if self.exclusive {
            lines.push("#SBATCH --exclusive".to_string());
        }
        if let Some(constraint) = &self.constraint {
            lines.push(format!("#SBATCH --constraint={constraint}"));
        }

        lines
    }
}

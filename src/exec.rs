//! Run a job directly on the current host, without the scheduler
//!
//! This is the same two-step sequence the rendered job script performs (activate the
//! virtualenv, run the program unbuffered), done in-process so failures get typed errors and
//! the program's exit status passes through unchanged.

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use log::info;

use crate::slurm::job_request::JobRequest;

#[derive(Debug)]
pub enum ExecError {
    /// The virtualenv has no activate script at the expected path
    EnvironmentNotFound(PathBuf),
    /// The simulation program doesn't exist
    ProgramNotFound(PathBuf),
    /// The interpreter couldn't be started
    SpawnFailure(io::Error),
}

impl ExecError {
    /// Conventional shell exit codes: 127 for a missing command, 126 for one that can't run
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecError::EnvironmentNotFound(_) => 1,
            ExecError::ProgramNotFound(_) => 127,
            ExecError::SpawnFailure(_) => 126,
        }
    }
}

/// Activate the job's virtualenv and run its program, returning the program's own exit status
///
/// The environment is checked before the program: a broken virtualenv aborts the run without
/// attempting the program, matching the job script's `set -e` behaviour. No retries and no
/// output capture; the program inherits stdout/stderr.
pub fn run(job: &JobRequest) -> Result<ExitStatus, ExecError> {
    let venv = &job.environment.venv_path;
    let activate = venv.join("bin").join("activate");
    if !activate.exists() {
        return Err(ExecError::EnvironmentNotFound(activate));
    }

    let program = &job.simulation.program;
    if !program.exists() {
        return Err(ExecError::ProgramNotFound(program.clone()));
    }

    let python = venv.join("bin").join("python");
    let mut cmd = Command::new(&python);
    cmd.env("VIRTUAL_ENV", venv).env("PATH", activated_path(venv));
    if job.simulation.unbuffered {
        cmd.arg("-u");
    }
    cmd.arg(program).args(&job.simulation.args);

    info!("Running {} locally", &job.simulation.id);
    info!("{:?}", &cmd);
    cmd.status().map_err(ExecError::SpawnFailure)
}

/// What `bin/activate` would do to PATH: put the virtualenv's bin directory first
fn activated_path(venv: &PathBuf) -> OsString {
    let mut path = OsString::from(venv.join("bin").as_os_str());
    if let Some(existing) = env::var_os("PATH") {
        path.push(":");
        path.push(existing);
    }
    path
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    use super::*;
    use crate::slurm::job_request::{EnvironmentSpec, ResourceRequest, SimulationSpec};

    /// A virtualenv that's just enough for exec: bin/activate plus a fake interpreter
    fn fake_venv(dir: &Path, python_body: &str) -> PathBuf {
        let venv = dir.join("venv");
        fs::create_dir_all(venv.join("bin")).expect("venv bin");
        fs::write(venv.join("bin").join("activate"), "").expect("activate");

        let python = venv.join("bin").join("python");
        fs::write(&python, python_body).expect("python");
        let mut perms = fs::metadata(&python).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&python, perms).expect("chmod");

        venv
    }

    fn job(venv: PathBuf, program: PathBuf) -> JobRequest {
        JobRequest {
            simulation: SimulationSpec {
                id: "exec_test".to_string(),
                program,
                args: vec![],
                unbuffered: true,
            },
            environment: EnvironmentSpec { venv_path: venv },
            resources: ResourceRequest {
                job_name: None,
                job_time: "0:10:00".to_string(),
                account: "proj83".to_string(),
                partition: "prod".to_string(),
                memory: "0".to_string(),
                exclusive: false,
                constraint: None,
            },
        }
    }

    #[test]
    fn missing_environment_stops_the_run() {
        let temp = tempfile::tempdir().expect("tempdir");
        let program = temp.path().join("sim.py");
        fs::write(&program, "").expect("program");

        let missing = temp.path().join("no_venv");
        let result = run(&job(missing, program));
        assert!(matches!(result, Err(ExecError::EnvironmentNotFound(_))));
        assert_eq!(result.unwrap_err().exit_code(), 1);
    }

    #[test]
    fn missing_program_is_reported_after_activation() {
        let temp = tempfile::tempdir().expect("tempdir");
        let venv = fake_venv(temp.path(), "#!/bin/sh\nexit 0\n");

        let result = run(&job(venv, temp.path().join("no_such_program.py")));
        assert!(matches!(result, Err(ExecError::ProgramNotFound(_))));
        assert_eq!(result.unwrap_err().exit_code(), 127);
    }

    #[test]
    fn successful_programs_pass_zero_through() {
        let temp = tempfile::tempdir().expect("tempdir");
        let venv = fake_venv(temp.path(), "#!/bin/sh\nexit 0\n");
        let program = temp.path().join("sim.py");
        fs::write(&program, "").expect("program");

        let status = run(&job(venv, program)).expect("status");
        assert_eq!(status.code(), Some(0));
    }

    #[test]
    fn failing_programs_pass_their_status_through() {
        let temp = tempfile::tempdir().expect("tempdir");
        let venv = fake_venv(temp.path(), "#!/bin/sh\nexit 42\n");
        let program = temp.path().join("sim.py");
        fs::write(&program, "").expect("program");

        let status = run(&job(venv, program)).expect("status");
        assert_eq!(status.code(), Some(42));
    }

    #[test]
    fn unbuffered_jobs_pass_the_flag_to_the_interpreter() {
        let temp = tempfile::tempdir().expect("tempdir");
        let args_file = temp.path().join("argv.txt");
        let body = format!("#!/bin/sh\necho \"$@\" > {}\nexit 0\n", args_file.display());
        let venv = fake_venv(temp.path(), &body);
        let program = temp.path().join("sim.py");
        fs::write(&program, "").expect("program");

        run(&job(venv.clone(), program.clone())).expect("status");
        let argv = fs::read_to_string(&args_file).expect("argv");
        assert!(argv.starts_with("-u "));

        let mut buffered = job(venv, program);
        buffered.simulation.unbuffered = false;
        run(&buffered).expect("status");
        let argv = fs::read_to_string(&args_file).expect("argv");
        assert!(!argv.contains("-u"));
    }
}

use std::{fs, io};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use tinytemplate::TinyTemplate;

use crate::namespace::PlatformNamespace;
use crate::slurm::job_request::JobRequest;
use crate::WorkingDirectory;

/// A JobPath is the path to a job script that's submitted to SLURM via sbatch
///
/// The script's working directory also contains `manifest.json`, a copy of the job request the
/// script was rendered from.
pub struct JobPath {
    pub path: PathBuf,
}

impl JobRequest {
    /// Render this request into a job script in its own working directory
    pub fn create(&self, wd: &WorkingDirectory, namespace: &PlatformNamespace) -> JobPath {
        let instance_wd = WorkingDirectory { path: wd.path.join(&self.simulation.id) };
        info!("Creating job {} in working directory {}", &self.simulation.id, &instance_wd.path.display());

        if instance_wd.path.exists() {
            warn!("Job directory already exists, files will be overwritten");
            fs::remove_dir_all(&instance_wd.path).expect("Delete existing directory");
        }
        fs::create_dir_all(&instance_wd.path).expect("Create working directory");

        let name = namespace.decorate(self.base_name());
        let header: Header = render_header(self, &name);
        let activation: Activation = render_activation(self);
        let run: Run = render_run(self, &instance_wd.path);
        let job = JobTemplate { header, activation, run };

        let path = &instance_wd.path.join("job.sh");
        job.write(path).expect("Can't write job script");
        write_manifest(self, &instance_wd);

        JobPath { path: path.clone() }
    }
}

/// All rendered sections of an sbatch job script
struct JobTemplate {
    header: Header,
    activation: Activation,
    run: Run,
}

impl JobTemplate {
    /// Write complete job script to disk by appending rendered template sections to the file
    fn write(self, out_path: &Path) -> Result<(), io::Error> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(out_path)?;

        // order is important when writing the file
        let contents = [
            self.header.content,
            self.activation.content,
            self.run.content,
        ];

        for content in contents.iter() {
            file.write_all(content.as_bytes())?;
        }

        Ok(())
    }
}

/// Rendered SBATCH header
///
/// SLURM job options are parsed by sbatch from #SBATCH lines [before executable commands](https://slurm.schedmd.com/sbatch.html#SECTION_DESCRIPTION).
/// All directive values come from the resource request in the message: job name, walltime,
/// accounting project, partition, memory policy, exclusivity, and hardware constraint.
struct Header {
    content: String,
}

/// Rendered environment activation section
///
/// Sources the virtualenv's activate script. The section sets `set -euo pipefail` first, so a
/// broken virtualenv path aborts the script before the simulation program is attempted.
struct Activation {
    content: String,
}

/// Rendered program invocation
///
/// Changes into the job working directory and runs the simulation program with the
/// virtualenv's interpreter, unbuffered by default.
struct Run {
    content: String,
}

/// Rendering context for header
#[derive(Serialize)]
struct HeaderContext {
    name: String,
    time_now: String,
    directives: String,
}

/// Rendering context for environment activation
#[derive(Serialize)]
struct ActivationContext {
    venv_path: String,
}

/// Rendering context for program invocation
#[derive(Serialize)]
struct RunContext {
    work_dir: String,
    interpreter: String,
    program: String,
    args: String,
}

/// Build a renderer for one template
///
/// The default formatter HTML-escapes values, which mangles shell text, so templates render
/// unescaped.
fn template<'a>(name: &'a str, text: &'a str) -> TinyTemplate<'a> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template(name, text).expect("Template");
    tt
}

/// Render the SBATCH header using TinyTemplate
fn render_header(job: &JobRequest, name: &str) -> Header {
    /// included header template
    static HEADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/header.txt"));
    let tt = template("header", HEADER);

    let context = HeaderContext {
        name: name.to_string(),
        time_now: Utc::now().to_string(),
        directives: job.resources.directive_lines(name).join("\n"),
    };

    Header { content: tt.render("header", &context).expect("Rendered header") }
}

/// Render the environment activation section using TinyTemplate
fn render_activation(job: &JobRequest) -> Activation {
    /// included activation template
    static ACTIVATE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/activate.txt"));
    let tt = template("activate", ACTIVATE);

    let context = ActivationContext {
        venv_path: job.environment.venv_path.to_str().expect("venv path").to_string(),
    };

    Activation { content: tt.render("activate", &context).expect("Rendered activation") }
}

/// Render the program invocation using TinyTemplate
fn render_run(job: &JobRequest, work_dir: &Path) -> Run {
    /// included run template
    static RUN: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/run.txt"));
    let tt = template("run", RUN);

    let interpreter = match job.simulation.unbuffered {
        true => "python -u",
        false => "python",
    };
    let args = match job.simulation.args.is_empty() {
        true => String::new(),
        false => format!(" {}", job.simulation.args.join(" ")),
    };
    let context = RunContext {
        work_dir: work_dir.to_str().expect("work dir").to_string(),
        interpreter: interpreter.to_string(),
        program: job.simulation.program.to_str().expect("program path").to_string(),
        args,
    };

    Run { content: tt.render("run", &context).expect("Rendered run") }
}

/// Write a copy of the job request to the working directory
fn write_manifest(job: &JobRequest, wd: &WorkingDirectory) {
    let manifest: String = serde_json::to_string(job).expect("Serialised");
    let out_path = wd.path.join("manifest.json");
    info!("Writing manifest to {}", out_path.display());
    fs::write(out_path, manifest).expect("Can't write manifest");
}

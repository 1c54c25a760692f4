use std::fmt;
use clap::ValueEnum;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum PlatformNamespace {
    Dev,
    Test,
    Prod
}

impl fmt::Display for PlatformNamespace {
      fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlatformNamespace::Dev => write!(f, "dev"),
            PlatformNamespace::Test => write!(f, "test"),
            PlatformNamespace::Prod => write!(f, "prod")
        }
    }
}

impl PlatformNamespace {
    /// Decorate a SLURM job name with the deployment namespace
    ///
    /// Jobs submitted from dev or test deployments get a namespace prefix so they're easy to
    /// spot (and cancel) in squeue output. Production jobs keep their bare name.
    pub fn decorate(&self, name: &str) -> String {
        match self {
            PlatformNamespace::Prod => name.to_string(),
            _ => format!("{self}-{name}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prod_jobs_keep_bare_names() {
        assert_eq!(PlatformNamespace::Prod.decorate("SSCxWMsub50"), "SSCxWMsub50");
    }

    #[test]
    fn dev_and_test_jobs_get_prefixed() {
        assert_eq!(PlatformNamespace::Dev.decorate("SSCxWMsub50"), "dev-SSCxWMsub50");
        assert_eq!(PlatformNamespace::Test.decorate("SSCxWMsub50"), "test-SSCxWMsub50");
    }
}

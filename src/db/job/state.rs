pub enum JobState {
    Staged,
    Submitted
}

/// A simple way to keep track of job state.
///
/// Staged means the rendered job script is on disk; submitted means sbatch accepted it (or the
/// job ran to completion in local mode). Other states could include things like INITIALISED
/// (request ingested) or PENDING (parsing squeue output) in the future.
impl JobState {
    /// db columns are all lower case, enum used in sql statement
    /// TODO: migrate to a single enum column called "state"
    pub fn as_column(&self) -> &str {
        match self {
            JobState::Staged => "staged",
            JobState::Submitted => "submitted"
        }
    }
}

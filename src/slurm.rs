//! Render job request messages into sbatch job scripts

/// Valid JSON messages are deserialised into a set of structs defined here
pub mod job_request;

/// Read script section templates and render them with message content
pub mod job;

//! Read job request messages from the spool directory and validate them

/// Read and validate a single message
pub mod message;

/// List message paths waiting in the spool directory
pub mod read;

/// Load and compile the job request JSON schema
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use jsonschema::JSONSchema;
use log::{info, warn};
use serde_json::Value;

use crate::slurm::job_request::JobRequest;

#[derive(Debug)]
pub enum MessageError {
    JSONValidationError,
    JSONDecodeError,
    DeserialisationError,
    MessageReadError,
}

/// A job request message sitting in the spool directory
pub struct Message {
    pub path: PathBuf,
}

/// A message that has been read and checked, ready to ingest into the database
///
/// Messages that fail schema validation are still ingested (with `valid` unset) so there's a
/// record of what arrived, but they'll never be staged or submitted.
pub struct SpoolMessage {
    pub key: String,
    pub content: String,
    pub valid: bool,
}

impl Message {
    pub fn read(&self, schema: &JSONSchema) -> Result<SpoolMessage, MessageError> {
        let content = self.read_file()?;
        let json = self.parse_untyped_json(&content)?;

        let valid = match self.check(&json, schema) {
            Ok(()) => {
                info!("Message is valid");
                true
            }
            Err(err) => {
                warn!("Message fails validation: {:?}", err);
                false
            }
        };

        Ok(SpoolMessage { key: message_key(&json, &self.path), content, valid })
    }

    /// Schema validation first, then a typed parse to catch anything the schema can't express
    fn check(&self, json: &Value, schema: &JSONSchema) -> Result<(), MessageError> {
        self.validate(json, schema)?;
        self.parse_json(json)?;
        Ok(())
    }

    fn validate(&self, json: &Value, schema: &JSONSchema) -> Result<(), MessageError> {
        info!("Validating raw message against JSON schema");
        match schema.validate(json) {
            Ok(_) => Ok(()),
            Err(_) => Err(MessageError::JSONValidationError),
        }
    }

    fn read_file(&self) -> Result<String, MessageError> {
        let path: &Path = self.path.as_path();
        info!("Reading message at {}", path.display());
        fs::read_to_string(path).map_err(|err| {
            warn!("Can't read message job request at path {}: {}", path.display(), err);
            MessageError::MessageReadError
        })
    }

    fn parse_json(&self, value: &Value) -> Result<JobRequest, MessageError> {
        info!("Deserialising valid JSON into typed Rust object");
        // from_value is a generic function, so request JobRequest specifically
        serde_json::from_value::<JobRequest>(value.clone())
            .map_err(|_| MessageError::DeserialisationError)
    }

    fn parse_untyped_json(&self, content: &str) -> Result<Value, MessageError> {
        info!("Parsing JSON into untyped structure");
        // from_str is a generic function, so request Value (generic json) specifically
        serde_json::from_str::<Value>(content)
            .map_err(|_| MessageError::JSONDecodeError)
    }
}

/// Database key for a message: the simulation id, or the file stem when the id is missing
fn message_key(json: &Value, path: &Path) -> String {
    match json.pointer("/simulation/id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("unknown")
            .to_string(),
    }
}

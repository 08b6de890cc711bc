use thiserror::Error;

use crate::domain::utils::id::DeviceId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON input: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to write CSV output: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Malformed topology: {0}")]
    InvalidTopology(String),

    #[error("Invalid simulation configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid task record: {0}")]
    InvalidTask(String),

    #[error("Device {0} is not attached to any topology node")]
    UnattachedDevice(DeviceId),

    #[error("Topology contains no server nodes, but offload-eligible devices exist")]
    NoServerCandidates,

    #[error("No eligible destination: the candidate set is empty")]
    NoEligibleDestination,
}

pub type Result<T> = std::result::Result<T, Error>;

use std::time::Duration;

/// Malformed descriptor: the input had the delimiter but its content
/// violates the positional contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("descriptor has {found} fields, at least {required} required")]
    MissingFields { found: usize, required: usize },
    #[error("field {field} ({name}) is not an integer: {value:?}")]
    InvalidInteger {
        field: usize,
        name: &'static str,
        value: String,
    },
    #[error("field {field} is not a recognised date/time: {value:?}")]
    InvalidTimestamp { field: usize, value: String },
}

/// Failure talking to one of the lookup collaborators.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("{service} lookup timed out after {timeout:?}")]
    Timeout {
        service: &'static str,
        timeout: Duration,
    },
    #[error("{service} unavailable: {reason}")]
    Unavailable {
        service: &'static str,
        reason: String,
    },
    #[error("{service} rejected request: {reason}")]
    Rejected {
        service: &'static str,
        reason: String,
    },
    #[error("invalid {service} response: {source}")]
    InvalidResponse {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Submission to the transport failed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("submission to {destination} failed: {reason}")]
    Submit { destination: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config {path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid {field} in config {path}: {format:?} is not a valid strftime format")]
    InvalidFormat {
        path: String,
        field: &'static str,
        format: String,
    },
}

/// Everything that aborts a pipeline run with an error signal.
///
/// The "nothing to do" outcomes (absent input, resolution miss) are not
/// errors and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("malformed descriptor: {0}")]
    Malformed(#[from] DecodeError),
    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("dispatch failed: {0}")]
    Transport(#[from] TransportError),
    #[error("run exceeded timeout of {0:?}")]
    Timeout(Duration),
}

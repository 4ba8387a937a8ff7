use std::{io, path::PathBuf};

use thiserror::Error;

use crate::test::test_config::TestStatus;

/// Rejected `start` parameters. Always raised before any external side effect.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid source IP address")]
    SrcIp,
    #[error("Invalid destination IP address")]
    DstIp,
    #[error("Invalid source port")]
    SrcPort,
    #[error("Invalid destination port")]
    DstPort,
    #[error("Invalid protocol (must be 'tcp' or 'udp')")]
    Protocol,
    #[error("Invalid direction (must be 'upstream' or 'downstream')")]
    Direction,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    #[error("no throughput value found in stats output")]
    NoThroughput,
    #[error("malformed throughput value: {0}")]
    BadNumber(String),
    #[error("unknown throughput unit: {0}")]
    UnknownUnit(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed session record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Stats retrieval either fails at the control surface or in parsing its text.
#[derive(Debug, Error)]
pub enum ResultsError {
    #[error(transparent)]
    Fetch(#[from] BackendError),
    #[error(transparent)]
    Parse(#[from] StatsError),
}

/// Operation-level failures. `Display` is the message reported in the JSON `error` field.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Test already running")]
    AlreadyRunning,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to load kernel module")]
    Activate(#[source] BackendError),
    #[error("Failed to configure test")]
    Configure(#[source] BackendError),
    #[error("Failed to record test session")]
    Session(#[source] SessionError),
    #[error("Failed to start test")]
    Start(#[source] BackendError),
    #[error("No test running")]
    NotRunning,
    #[error("Failed to stop test")]
    Stop(#[source] BackendError),
    #[error("Failed to get test results")]
    Results(#[source] ResultsError),
    #[error("Failed to get final results")]
    FinalResults(#[source] ResultsError),
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: TestStatus, to: TestStatus },
}

pub type ControlResult<T> = Result<T, ControlError>;

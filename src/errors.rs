use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("No {0} job bound; submit a new request or bind to an existing job first")]
    Unbound(&'static str),
    #[error("Job {0} has not completed yet")]
    JobPending(String),
    #[error("Job {uuid} failed with message ==> [{message}]")]
    JobFailed { uuid: String, message: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Export failed for dates: {}", .0.join(", "))]
    PartialExport(Vec<String>),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::errors::ClientError;

/// The two job kinds served by the generic resource-addressing scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    RiskModel,
    Optimization,
}

impl JobKind {
    /// Submission / addressing endpoint for this kind.
    pub fn endpoint(&self) -> &'static str {
        match self {
            JobKind::RiskModel => "risk-model",
            JobKind::Optimization => "optimization",
        }
    }

    /// Numeric TYPEID used by the job-list payload.
    pub fn type_id(&self) -> i64 {
        match self {
            JobKind::RiskModel => 1,
            JobKind::Optimization => 2,
        }
    }

    pub fn from_type_id(type_id: i64) -> Option<Self> {
        match type_id {
            1 => Some(JobKind::RiskModel),
            2 => Some(JobKind::Optimization),
            _ => None,
        }
    }
}

/// Server-side job status. The only transition is STARTED to SUCCESS or ERROR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Started,
    Success,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Started)
    }
}

/// One entry of the caller's job history, as observed by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub uuid: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub start_time: DateTime<Utc>,
    /// Absent while the job is still running.
    pub end_time: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub files: Option<Vec<String>>,
}

/// Wire shape of one job-list entry (UPPERCASE keys, millisecond epochs).
#[derive(Debug, Deserialize)]
pub(crate) struct RawJob {
    #[serde(rename = "UUID")]
    pub uuid: String,
    #[serde(rename = "TYPEID")]
    pub type_id: i64,
    #[serde(rename = "STATUS")]
    pub status: JobStatus,
    #[serde(rename = "STARTTIME")]
    pub start_time: i64,
    #[serde(rename = "ENDTIME", default)]
    pub end_time: Option<i64>,
    #[serde(rename = "MESSAGE", default)]
    pub message: Option<String>,
    #[serde(rename = "FILES", default)]
    pub files: Option<Vec<String>>,
}

impl RawJob {
    pub fn into_job(self) -> Result<Job, ClientError> {
        let kind = JobKind::from_type_id(self.type_id)
            .ok_or_else(|| ClientError::Decode(format!("unknown job TYPEID {}", self.type_id)))?;

        let start_time = millis_to_datetime(self.start_time)
            .ok_or_else(|| ClientError::Decode(format!("bad STARTTIME {}", self.start_time)))?;

        // A zero or missing end time means the job is still running.
        let end_time = match self.end_time {
            None | Some(0) => None,
            Some(ms) => Some(
                millis_to_datetime(ms)
                    .ok_or_else(|| ClientError::Decode(format!("bad ENDTIME {}", ms)))?,
            ),
        };

        Ok(Job {
            uuid: self.uuid,
            kind,
            status: self.status,
            start_time,
            end_time,
            message: self.message,
            files: self.files,
        })
    }
}

fn millis_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Current status document of one job, fetched through its resource handle.
#[derive(Debug, Clone, Deserialize)]
pub struct JobInfo {
    pub status: JobStatus,
    /// Result file names, present once the job has succeeded.
    #[serde(default)]
    pub files: Option<Vec<String>>,
    /// Server-side failure message, present on error.
    #[serde(default)]
    pub message: Option<String>,
}

/// Strips a trailing `.csv` so result tables are keyed by base name.
pub(crate) fn file_base_name(file: &str) -> &str {
    file.strip_suffix(".csv").unwrap_or(file)
}

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::ClientError;
use crate::models::{decode_table, JobInfo, JobKind, JobStatus, ResultTable};
use crate::transport::Transport;

/// Seconds added to the poll interval after every poll.
pub const POLL_STEP_SECS: u64 = 5;

/// Addresses one server-side job and its sub-resources.
///
/// Holds only the `(kind, uuid)` pair; every operation re-fetches from the
/// server.
#[derive(Clone)]
pub struct ResourceHandle {
    transport: Arc<dyn Transport>,
    kind: JobKind,
    uuid: String,
}

impl ResourceHandle {
    pub(crate) fn new(transport: Arc<dyn Transport>, kind: JobKind, uuid: String) -> Self {
        Self {
            transport,
            kind,
            uuid,
        }
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Fetches and decodes the job's current status document.
    pub async fn info(&self) -> Result<JobInfo, ClientError> {
        let path = format!("{}/{}", self.kind.endpoint(), self.uuid);
        let text = self.transport.get_text(&path).await?;
        serde_json::from_str(&text)
            .map_err(|e| ClientError::Decode(format!("info for {}: {}", self.uuid, e)))
    }

    /// Raw text content at `{kind}/{uuid}/{path}`.
    pub async fn fetch_raw(&self, path: &str) -> Result<String, ClientError> {
        let full = format!("{}/{}/{}", self.kind.endpoint(), self.uuid, path);
        self.transport.get_text(&full).await
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let text = self.fetch_raw(path).await?;
        serde_json::from_str(&text)
            .map_err(|e| ClientError::Decode(format!("{}/{}: {}", self.uuid, path, e)))
    }

    pub async fn fetch_table(&self, path: &str) -> Result<ResultTable, ClientError> {
        let text = self.fetch_raw(path).await?;
        decode_table(&text)
    }

    /// Polls until the job leaves STARTED or the wait budget runs out.
    ///
    /// The poll interval grows linearly: 0s before the first re-poll, then
    /// 5s more after each one, backing off from hammering the server on
    /// long-running jobs. Exceeding `max_wait_secs` is not an error; the
    /// last observed info is returned and the caller re-checks `status`.
    pub async fn wait(&self, max_wait_secs: u64) -> Result<JobInfo, ClientError> {
        let mut interval = 0u64;
        let mut info = self.info().await?;

        while info.status == JobStatus::Started && interval < max_wait_secs {
            debug!(
                "{} job {} still running, polling again in {}s",
                self.kind.endpoint(),
                self.uuid,
                interval
            );
            tokio::time::sleep(Duration::from_secs(interval)).await;
            info = self.info().await?;
            interval += POLL_STEP_SECS;
        }

        Ok(info)
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::connection::Connection;
use crate::errors::ClientError;
use crate::models::job::file_base_name;
use crate::models::{Job, JobInfo, JobKind, JobStatus, ResultTable};
use crate::services::handle::ResourceHandle;

/// Shared job-lifecycle core behind the optimizer and risk-model fronts.
///
/// A controller starts unbound. `submit`, `bind` or `bind_latest` attach a
/// resource handle; status, wait and result retrieval then delegate to it.
pub struct JobController {
    conn: Connection,
    kind: JobKind,
    handle: Option<ResourceHandle>,
    results: Option<Arc<HashMap<String, ResultTable>>>,
}

impl JobController {
    pub(crate) fn new(conn: Connection, kind: JobKind) -> Self {
        Self {
            conn,
            kind,
            handle: None,
            results: None,
        }
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn is_bound(&self) -> bool {
        self.handle.is_some()
    }

    /// Bound job uuid, if any.
    pub fn uuid(&self) -> Option<&str> {
        self.handle.as_ref().map(ResourceHandle::uuid)
    }

    pub(crate) fn require_handle(&self) -> Result<&ResourceHandle, ClientError> {
        self.handle
            .as_ref()
            .ok_or(ClientError::Unbound(self.kind.endpoint()))
    }

    /// Submits a request body to this kind's endpoint and binds to the new
    /// job. On transport failure the controller is left unbound.
    pub async fn submit(&mut self, body: &Value) -> Result<String, ClientError> {
        self.handle = None;
        self.results = None;

        let response = self
            .conn
            .transport()
            .post_json(self.kind.endpoint(), body)
            .await?;
        let uuid = response.trim().trim_matches('"').to_string();

        info!("submitted {} job {}", self.kind.endpoint(), uuid);
        self.handle = Some(ResourceHandle::new(
            self.conn.transport().clone(),
            self.kind,
            uuid.clone(),
        ));
        Ok(uuid)
    }

    /// Attaches to an existing job. No network call is made here.
    pub fn bind(&mut self, uuid: impl Into<String>) {
        let uuid = uuid.into();
        info!("bound {} job {}", self.kind.endpoint(), uuid);
        self.results = None;
        self.handle = Some(ResourceHandle::new(
            self.conn.transport().clone(),
            self.kind,
            uuid,
        ));
    }

    /// Binds to the k-th most recent successful job of this kind (0 =
    /// latest). Returns false, leaving the controller unbound, when fewer
    /// than `k + 1` successful jobs exist.
    pub async fn bind_latest(&mut self, k: usize) -> Result<bool, ClientError> {
        let jobs = self.conn.success_jobs(self.kind).await?;
        match jobs.get(k) {
            Some(job) => {
                self.bind(job.uuid.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn info(&self) -> Result<JobInfo, ClientError> {
        self.require_handle()?.info().await
    }

    pub async fn status(&self) -> Result<JobStatus, ClientError> {
        Ok(self.info().await?.status)
    }

    /// Polls the bound job to completion or budget exhaustion. See
    /// [`ResourceHandle::wait`] for the non-erroring timeout contract.
    pub async fn wait(&self, max_wait_secs: u64) -> Result<JobInfo, ClientError> {
        self.require_handle()?.wait(max_wait_secs).await
    }

    /// Successful jobs of this kind from the caller's history.
    pub async fn completed(&self) -> Result<Vec<Job>, ClientError> {
        self.conn.success_jobs(self.kind).await
    }

    /// Failed jobs of this kind from the caller's history.
    pub async fn failed(&self) -> Result<Vec<Job>, ClientError> {
        self.conn.failed_jobs(self.kind).await
    }

    /// Fetches every result file of the bound, successfully completed job,
    /// keyed by file base name. The mapping is cached on the controller;
    /// repeated calls return the same snapshot without re-fetching.
    pub async fn results(&mut self) -> Result<Arc<HashMap<String, ResultTable>>, ClientError> {
        if let Some(results) = &self.results {
            return Ok(results.clone());
        }

        let handle = self.require_handle()?.clone();
        let info = handle.info().await?;
        match info.status {
            JobStatus::Started => Err(ClientError::JobPending(handle.uuid().to_string())),
            JobStatus::Error => Err(ClientError::JobFailed {
                uuid: handle.uuid().to_string(),
                message: info.message.unwrap_or_default(),
            }),
            JobStatus::Success => {
                let mut tables = HashMap::new();
                for file in info.files.unwrap_or_default() {
                    let table = handle.fetch_table(&file).await?;
                    tables.insert(file_base_name(&file).to_string(), table);
                }
                let results = Arc::new(tables);
                self.results = Some(results.clone());
                info!(
                    "retrieved {} result tables for {} job {}",
                    results.len(),
                    self.kind.endpoint(),
                    handle.uuid()
                );
                Ok(results)
            }
        }
    }
}

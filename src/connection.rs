use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::info;

use crate::config::ConnectionConfig;
use crate::errors::ClientError;
use crate::models::job::RawJob;
use crate::models::template::RawTemplate;
use crate::models::{Job, JobKind, JobStatus, TemplateVariant};
use crate::services::{Optimizer, RiskModelBuilder};
use crate::transport::{HttpTransport, Transport};

/// One authenticated session against the service.
///
/// Cheap to clone; controllers created from the same connection share the
/// transport and the job-index cache without coordination.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    transport: Arc<dyn Transport>,
    // Lazily fetched job snapshot. Replaced wholesale on refresh so readers
    // holding an old Arc never observe a torn view.
    jobs: RwLock<Option<Arc<Vec<Job>>>>,
}

impl Connection {
    pub fn new(config: ConnectionConfig) -> Result<Self, ClientError> {
        Ok(Self::with_transport(Arc::new(HttpTransport::new(config)?)))
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ConnectionConfig::from_env()?)
    }

    /// Builds a connection over a caller-provided transport. Used by tests
    /// to drive the client against an in-memory server double.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                transport,
                jobs: RwLock::new(None),
            }),
        }
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// The caller's job history, most recent first. Fetched at most once per
    /// connection; use `refresh_jobs` to re-fetch.
    pub async fn jobs(&self) -> Result<Arc<Vec<Job>>, ClientError> {
        if let Some(snapshot) = self.inner.jobs.read().clone() {
            return Ok(snapshot);
        }
        self.refresh_jobs().await
    }

    /// Re-fetches the job history and atomically replaces the cached
    /// snapshot.
    pub async fn refresh_jobs(&self) -> Result<Arc<Vec<Job>>, ClientError> {
        let text = self.inner.transport.get_text("job").await?;
        let raw: Vec<RawJob> = serde_json::from_str(&text)
            .map_err(|e| ClientError::Decode(format!("job list: {}", e)))?;

        let mut jobs = raw
            .into_iter()
            .map(RawJob::into_job)
            .collect::<Result<Vec<_>, _>>()?;
        // Stable sort: ties keep the server-provided order.
        jobs.sort_by(|a, b| b.start_time.cmp(&a.start_time));

        let snapshot = Arc::new(jobs);
        *self.inner.jobs.write() = Some(snapshot.clone());
        info!("refreshed job index: {} jobs", snapshot.len());
        Ok(snapshot)
    }

    /// Jobs of one kind in one status, filtered over the cached snapshot.
    pub async fn filter_jobs(
        &self,
        status: JobStatus,
        kind: JobKind,
    ) -> Result<Vec<Job>, ClientError> {
        let jobs = self.jobs().await?;
        Ok(jobs
            .iter()
            .filter(|job| job.status == status && job.kind == kind)
            .cloned()
            .collect())
    }

    pub async fn success_jobs(&self, kind: JobKind) -> Result<Vec<Job>, ClientError> {
        self.filter_jobs(JobStatus::Success, kind).await
    }

    pub async fn failed_jobs(&self, kind: JobKind) -> Result<Vec<Job>, ClientError> {
        self.filter_jobs(JobStatus::Error, kind).await
    }

    /// All templates visible to the caller, dispatched to typed variants.
    pub async fn templates(&self) -> Result<Vec<TemplateVariant>, ClientError> {
        let raw: Vec<RawTemplate> = self.get_json("template").await?;
        raw.into_iter().map(TemplateVariant::from_raw).collect()
    }

    pub async fn optimization_templates(&self) -> Result<Vec<TemplateVariant>, ClientError> {
        Ok(self
            .templates()
            .await?
            .into_iter()
            .filter(|t| matches!(t, TemplateVariant::Optimization(_)))
            .collect())
    }

    pub async fn risk_templates(&self) -> Result<Vec<TemplateVariant>, ClientError> {
        Ok(self
            .templates()
            .await?
            .into_iter()
            .filter(|t| matches!(t, TemplateVariant::RiskModel(_)))
            .collect())
    }

    // Catalog browsing. Raw JSON listings, no client-side modelling.

    pub async fn universes(&self) -> Result<Value, ClientError> {
        self.get_json("universe").await
    }

    pub async fn factors(&self) -> Result<Value, ClientError> {
        self.get_json("factor").await
    }

    pub async fn meta_factors(&self) -> Result<Value, ClientError> {
        self.get_json("meta").await
    }

    pub async fn portfolios(&self) -> Result<Value, ClientError> {
        self.get_json("portfolio").await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ClientError> {
        let text = self.inner.transport.get_text(path).await?;
        serde_json::from_str(&text).map_err(|e| ClientError::Decode(format!("{}: {}", path, e)))
    }

    /// A fresh, unbound optimizer controller.
    pub fn optimizer(&self) -> Optimizer {
        Optimizer::new(self.clone())
    }

    /// A risk-model controller, auto-bound to the most recent successful
    /// risk-model job when one exists.
    pub async fn risk_model_builder(&self) -> Result<RiskModelBuilder, ClientError> {
        RiskModelBuilder::connect(self.clone()).await
    }
}

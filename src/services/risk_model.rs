use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::connection::Connection;
use crate::errors::ClientError;
use crate::models::job::file_base_name;
use crate::models::{JobKind, ResultTable};
use crate::services::controller::JobController;

/// Arguments for one risk-model build.
#[derive(Debug, Clone)]
pub struct RiskModelRequest {
    pub universe: String,
    pub template: String,
    pub start_date: String,
    pub end_date: String,
    pub freq: String,
}

impl RiskModelRequest {
    pub fn new(
        universe: impl Into<String>,
        template: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        freq: impl Into<String>,
    ) -> Self {
        Self {
            universe: universe.into(),
            template: template.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            freq: freq.into(),
        }
    }

    fn to_body(&self) -> Value {
        json!({
            "universe": self.universe,
            "template": self.template,
            "startDate": self.start_date,
            "endDate": self.end_date,
            "freq": self.freq,
        })
    }
}

/// Date-partition listing under a risk-model job.
#[derive(Debug, Deserialize)]
struct DateListing {
    dates: Vec<String>,
}

/// File listing of one date partition.
#[derive(Debug, Deserialize)]
struct PartitionListing {
    files: Vec<String>,
}

/// Controller for risk-model jobs. Results are partitioned by date; tables
/// are keyed `{date}/{file base name}`.
pub struct RiskModelBuilder {
    inner: JobController,
}

impl RiskModelBuilder {
    /// A fresh, unbound controller.
    pub fn new(conn: Connection) -> Self {
        Self {
            inner: JobController::new(conn, JobKind::RiskModel),
        }
    }

    /// Builds a controller auto-bound to the caller's most recent
    /// successful risk-model job; stays unbound when none exists.
    pub async fn connect(conn: Connection) -> Result<Self, ClientError> {
        let mut builder = Self::new(conn);
        builder.inner.bind_latest(0).await?;
        Ok(builder)
    }

    /// Submits a new risk-model build, binding to the new job.
    pub async fn new_request(&mut self, request: &RiskModelRequest) -> Result<String, ClientError> {
        self.inner.submit(&request.to_body()).await
    }

    /// Result dates available under the bound job.
    pub async fn dates(&self) -> Result<Vec<String>, ClientError> {
        let listing: DateListing = self.inner.require_handle()?.fetch_json("").await?;
        Ok(listing.dates)
    }

    /// Fetches and decodes every file under one date partition.
    pub async fn data_for_date(
        &self,
        date: &str,
    ) -> Result<HashMap<String, ResultTable>, ClientError> {
        let handle = self.inner.require_handle()?.clone();
        let listing: PartitionListing = handle.fetch_json(date).await?;

        let mut tables = HashMap::new();
        for file in listing.files {
            let table = handle.fetch_table(&format!("{}/{}", date, file)).await?;
            tables.insert(format!("{}/{}", date, file_base_name(&file)), table);
        }
        Ok(tables)
    }

    /// Exports every date partition as CSV files under
    /// `{out_dir}/{date}/{file base name}.csv`, creating directories as
    /// needed.
    ///
    /// Best-effort batch: a failure on one date does not stop the others.
    /// Failed dates are collected and reported together as
    /// `PartialExport` once every date has been attempted.
    pub async fn download_all(&self, out_dir: impl AsRef<Path>) -> Result<(), ClientError> {
        let out_dir = out_dir.as_ref();
        let dates = self.dates().await?;

        let mut failed = Vec::new();
        for date in &dates {
            if let Err(err) = self.export_date(out_dir, date).await {
                warn!("export for date {} failed: {}", date, err);
                failed.push(date.clone());
            }
        }

        if failed.is_empty() {
            info!("exported {} dates to {}", dates.len(), out_dir.display());
            Ok(())
        } else {
            Err(ClientError::PartialExport(failed))
        }
    }

    async fn export_date(&self, out_dir: &Path, date: &str) -> Result<(), ClientError> {
        let tables = self.data_for_date(date).await?;
        for (key, table) in &tables {
            let path = out_dir.join(format!("{}.csv", key));
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::File::create(&path)?;
            table.write_csv(file)?;
        }
        info!("exported {} files for {}", tables.len(), date);
        Ok(())
    }
}

impl std::ops::Deref for RiskModelBuilder {
    type Target = JobController;

    fn deref(&self) -> &JobController {
        &self.inner
    }
}

impl std::ops::DerefMut for RiskModelBuilder {
    fn deref_mut(&mut self) -> &mut JobController {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_uses_wire_field_names() {
        let request = RiskModelRequest::new("sp500", "default", "2023-01-01", "2023-12-31", "1me");
        let body = request.to_body();

        assert_eq!(body["universe"], json!("sp500"));
        assert_eq!(body["template"], json!("default"));
        assert_eq!(body["startDate"], json!("2023-01-01"));
        assert_eq!(body["endDate"], json!("2023-12-31"));
        assert_eq!(body["freq"], json!("1me"));
    }
}

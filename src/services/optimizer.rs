use serde_json::{json, Value};

use crate::connection::Connection;
use crate::errors::ClientError;
use crate::models::JobKind;
use crate::services::controller::JobController;

/// Arguments for one optimization run.
///
/// `alpha` passes through to the server unmodified; dates use the wire
/// `YYYY-MM-DD` form.
#[derive(Debug, Clone)]
pub struct OptimizationRequest {
    pub portfolio_id: String,
    pub alpha: Value,
    pub notional: f64,
    pub template: String,
    pub start_date: String,
    pub end_date: String,
    pub freq: String,
    pub base_currency: String,
}

impl OptimizationRequest {
    pub fn new(
        portfolio_id: impl Into<String>,
        alpha: Value,
        notional: f64,
        template: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        freq: impl Into<String>,
    ) -> Self {
        Self {
            portfolio_id: portfolio_id.into(),
            alpha,
            notional,
            template: template.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            freq: freq.into(),
            base_currency: "USD".to_string(),
        }
    }

    pub fn with_base_currency(mut self, base_currency: impl Into<String>) -> Self {
        self.base_currency = base_currency.into();
        self
    }

    /// Submission body, embedding the default risk-model reference keyed to
    /// the same portfolio.
    fn to_body(&self) -> Value {
        json!({
            "portfolioId": self.portfolio_id,
            "alpha": self.alpha,
            "template": self.template,
            "startDate": self.start_date,
            "endDate": self.end_date,
            "notionalValue": self.notional,
            "baseCurrency": self.base_currency,
            "freq": self.freq,
            "riskModel": {
                "universe": self.portfolio_id,
                "template": "default",
            },
        })
    }
}

/// Controller for optimization jobs: submit new runs, attach to previous
/// ones, and pull their summary and weights tables.
pub struct Optimizer {
    inner: JobController,
}

impl Optimizer {
    pub(crate) fn new(conn: Connection) -> Self {
        Self {
            inner: JobController::new(conn, JobKind::Optimization),
        }
    }

    /// Builds the composite request and submits it, binding to the new job.
    pub async fn new_request(&mut self, request: &OptimizationRequest) -> Result<String, ClientError> {
        self.inner.submit(&request.to_body()).await
    }
}

impl std::ops::Deref for Optimizer {
    type Target = JobController;

    fn deref(&self) -> &JobController {
        &self.inner
    }
}

impl std::ops::DerefMut for Optimizer {
    fn deref_mut(&mut self) -> &mut JobController {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_embeds_default_risk_model() {
        let request = OptimizationRequest::new(
            "port-7",
            json!("alpha-signal"),
            1_000_000.0,
            "aggressive",
            "2023-01-01",
            "2023-06-30",
            "1me",
        );
        let body = request.to_body();

        assert_eq!(body["portfolioId"], json!("port-7"));
        assert_eq!(body["baseCurrency"], json!("USD"));
        assert_eq!(body["endDate"], json!("2023-06-30"));
        assert_eq!(body["riskModel"]["universe"], json!("port-7"));
        assert_eq!(body["riskModel"]["template"], json!("default"));
    }

    #[test]
    fn test_base_currency_override() {
        let request = OptimizationRequest::new(
            "port-7",
            json!(null),
            1.0,
            "t",
            "2023-01-01",
            "2023-06-30",
            "1me",
        )
        .with_base_currency("EUR");
        assert_eq!(request.to_body()["baseCurrency"], json!("EUR"));
    }
}

//! Client library for the QES analytics microservice.
//!
//! Callers open a [`Connection`], build or load a request template, submit a
//! job through the [`Optimizer`] or [`RiskModelBuilder`] controller, poll it
//! to completion with `wait`, and retrieve decoded result tables keyed by
//! file name.
//!
//! ```no_run
//! use qes_client::{Connection, ConnectionConfig};
//!
//! # async fn run() -> Result<(), qes_client::ClientError> {
//! let conn = Connection::new(ConnectionConfig::new("user", "secret"))?;
//! let mut optimizer = conn.optimizer();
//! optimizer.bind_latest(0).await?;
//! let results = optimizer.results().await?;
//! println!("weights rows: {}", results["weights"].len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod errors;
pub mod logging;
pub mod models;
pub mod services;
pub mod transport;

pub use config::ConnectionConfig;
pub use connection::Connection;
pub use errors::ClientError;
pub use logging::{init_logging, LoggingConfig};
pub use models::{
    decode_table, Job, JobInfo, JobKind, JobStatus, OptimizationTemplate, ResultTable,
    RiskModelTemplate, Template, TemplateKind, TemplateVariant,
};
pub use services::{
    JobController, OptimizationRequest, Optimizer, ResourceHandle, RiskModelBuilder,
    RiskModelRequest,
};
pub use transport::{HttpTransport, Transport};

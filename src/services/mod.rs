pub mod controller;
pub mod handle;
pub mod optimizer;
pub mod risk_model;

pub use controller::JobController;
pub use handle::{ResourceHandle, POLL_STEP_SECS};
pub use optimizer::{OptimizationRequest, Optimizer};
pub use risk_model::{RiskModelBuilder, RiskModelRequest};

pub mod job;
pub mod table;
pub mod template;

pub use job::{Job, JobInfo, JobKind, JobStatus};
pub use table::{decode_table, ResultTable};
pub use template::{
    OptimizationTemplate, RiskModelTemplate, Template, TemplateKind, TemplateVariant,
};

//! Host Assessment Service
//!
//! Periodic assessment passes, metrics, and the REST API.

pub mod api;
pub mod assessor;
pub mod metrics;

pub use api::{ApiServer, ApiServerConfig, RestRouter};
pub use assessor::{assess_parallel, AssessorConfig, HostAssessor, HostReport};
pub use metrics::AssessmentMetrics;

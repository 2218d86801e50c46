//! Drive Health Advisor
//!
//! Risk classification and predictive replacement for host storage devices.
//! Turns normalized SMART/NVMe telemetry into a risk tier, discrete health
//! warnings and a replacement timeline with a stated confidence.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Host Assessment Service                       │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────┐  │
//! │  │    REST API     │  │  Host Assessor  │  │      Metrics        │  │
//! │  │     (axum)      │  │ (periodic pass) │  │   (prometheus)      │  │
//! │  └────────┬────────┘  └────────┬────────┘  └─────────────────────┘  │
//! ├───────────┴────────────────────┴────────────────────────────────────┤
//! │                        Assessment Engine                             │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌───────────────────────┐  │
//! │  │    Risk      │  │  Health Warning  │  │     Replacement       │  │
//! │  │  Classifier  │  │     Detector     │  │      Predictor        │  │
//! │  └──────────────┘  └──────────────────┘  └───────────────────────┘  │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                        Diagnostic Sources                            │
//! │  ┌─────────────────────────────┐  ┌─────────────────────────────┐   │
//! │  │  smartctl JSON normalizer   │  │   Record files / static     │   │
//! │  └─────────────────────────────┘  └─────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`health`]: Classifier, warning detector, predictor and assessment engine
//! - [`discovery`]: Diagnostic sources producing normalized records
//! - [`service`]: Periodic host assessment, metrics and REST API
//! - [`config`]: Engine configuration
//! - [`domain`]: Normalized record and source trait
//! - [`error`]: Error types and handling

pub mod config;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod health;
pub mod service;

// Re-export commonly used types
pub use config::{EngineConfig, HourThresholds};

pub use discovery::{FileSource, SmartctlNormalizer, SmartctlSource, StaticSource};

pub use domain::ports::{
    DeviceFamily, DiagnosticSource, DiagnosticSourceRef, HealthFlag, NormalizedDeviceRecord,
};

pub use error::{Error, Result};

pub use health::{
    AssessmentEngine, AssessmentSummary, Confidence, DeviceAssessment, HealthWarning,
    PredictionMethod, PredictionMode, ReplacementEstimate, RiskTier, TimelineClass,
    WarningSeverity,
};

pub use service::{
    ApiServer, ApiServerConfig, AssessmentMetrics, AssessorConfig, HostAssessor, HostReport,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

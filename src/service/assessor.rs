//! Host Assessor
//!
//! Runs assessment passes over a diagnostic source and keeps the latest
//! host report. Devices are assessed in parallel on the blocking pool;
//! report order always matches the order the source returned.

use crate::config::EngineConfig;
use crate::domain::ports::{DiagnosticSourceRef, NormalizedDeviceRecord};
use crate::error::{Error, Result};
use crate::health::assessment::{AssessmentEngine, AssessmentSummary, DeviceAssessment};
use crate::health::mode::PredictionMode;
use crate::service::metrics::AssessmentMetrics;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

// =============================================================================
// Configuration
// =============================================================================

/// Host assessor configuration
#[derive(Debug, Clone)]
pub struct AssessorConfig {
    /// Engine configuration applied to every pass
    pub engine: EngineConfig,
    /// Seconds between periodic passes
    pub interval_secs: u64,
}

impl Default for AssessorConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            interval_secs: 300,
        }
    }
}

// =============================================================================
// Host Report
// =============================================================================

/// Result of one assessment pass over every device of a host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostReport {
    pub assessed_at: DateTime<Utc>,
    /// Diagnostic source the records came from
    pub source: String,
    pub mode: PredictionMode,
    pub devices: Vec<DeviceAssessment>,
    pub summary: AssessmentSummary,
}

impl HostReport {
    pub fn new(
        source: impl Into<String>,
        mode: PredictionMode,
        devices: Vec<DeviceAssessment>,
    ) -> Self {
        Self::with_timestamp(Utc::now(), source, mode, devices)
    }

    /// Report stamped with the time its pass started
    pub fn with_timestamp(
        assessed_at: DateTime<Utc>,
        source: impl Into<String>,
        mode: PredictionMode,
        devices: Vec<DeviceAssessment>,
    ) -> Self {
        let summary = AssessmentSummary::from_assessments(&devices);
        Self {
            assessed_at,
            source: source.into(),
            mode,
            devices,
            summary,
        }
    }

    /// Find a device by full path (`/dev/sda`) or bare name (`sda`)
    pub fn device(&self, name: &str) -> Option<&DeviceAssessment> {
        self.devices.iter().find(|d| {
            d.device_path == name || d.device_path.rsplit('/').next() == Some(name)
        })
    }
}

/// Assess records in parallel, preserving input order
pub async fn assess_parallel(
    engine: AssessmentEngine,
    records: Vec<NormalizedDeviceRecord>,
) -> Result<Vec<DeviceAssessment>> {
    let count = records.len();
    let mut tasks = JoinSet::new();
    for (index, record) in records.into_iter().enumerate() {
        tasks.spawn_blocking(move || (index, engine.assess(&record)));
    }

    let mut slots: Vec<Option<DeviceAssessment>> = vec![None; count];
    while let Some(joined) = tasks.join_next().await {
        let (index, assessment) =
            joined.map_err(|e| Error::Internal(format!("Assessment task failed: {}", e)))?;
        slots[index] = Some(assessment);
    }

    Ok(slots.into_iter().flatten().collect())
}

// =============================================================================
// Host Assessor
// =============================================================================

/// Periodic assessor holding the latest host report
pub struct HostAssessor {
    config: AssessorConfig,
    engine: AssessmentEngine,
    source: DiagnosticSourceRef,
    metrics: Arc<AssessmentMetrics>,
    latest: RwLock<Option<Arc<HostReport>>>,
}

impl HostAssessor {
    pub fn new(
        config: AssessorConfig,
        source: DiagnosticSourceRef,
        metrics: Arc<AssessmentMetrics>,
    ) -> Arc<Self> {
        let engine = AssessmentEngine::new(config.engine);
        Arc::new(Self {
            config,
            engine,
            source,
            metrics,
            latest: RwLock::new(None),
        })
    }

    pub fn engine(&self) -> &AssessmentEngine {
        &self.engine
    }

    pub fn metrics(&self) -> &Arc<AssessmentMetrics> {
        &self.metrics
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Latest completed report, if any pass has finished
    pub fn latest(&self) -> Option<Arc<HostReport>> {
        self.latest.read().clone()
    }

    /// Store `report` unless a report from a later-started pass is already
    /// stored. Returns whether it was stored.
    pub fn publish(&self, report: Arc<HostReport>) -> bool {
        let mut latest = self.latest.write();
        if latest.as_ref().is_some_and(|current| current.assessed_at > report.assessed_at) {
            debug!(
                assessed_at = %report.assessed_at,
                "Discarding report older than the stored one"
            );
            return false;
        }
        *latest = Some(report);
        true
    }

    /// Collect from the source, assess every device, and publish the report
    pub async fn run_pass(&self) -> Result<Arc<HostReport>> {
        let assessed_at = Utc::now();
        let started = Instant::now();
        let records = self.source.collect().await?;
        debug!(source = self.source.name(), devices = records.len(), "Collected records");

        let devices = assess_parallel(self.engine, records).await?;
        self.metrics.record_pass(&devices, started.elapsed());

        let report = Arc::new(HostReport::with_timestamp(
            assessed_at,
            self.source.name(),
            self.engine.config().mode,
            devices,
        ));
        info!(
            source = self.source.name(),
            devices = report.summary.total,
            high = report.summary.high,
            replace_now = report.summary.replace_now,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Assessment pass complete"
        );
        if report.summary.with_critical_warnings > 0 {
            warn!(
                count = report.summary.with_critical_warnings,
                "Devices with critical health warnings"
            );
        }

        self.publish(report.clone());
        Ok(report)
    }

    /// Run passes on the configured interval until shutdown
    pub async fn run(self: Arc<Self>, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(self.config.interval_secs.max(1)));
        info!(
            interval_secs = self.config.interval_secs,
            source = self.source.name(),
            "Starting periodic assessment"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_pass().await {
                        error!("Assessment pass failed: {}", e);
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Periodic assessment stopped");
                    break;
                }
            }
        }
    }
}

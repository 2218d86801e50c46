//! File and in-memory diagnostic sources
//!
//! Read already-normalized records, for hosts where another agent performs
//! acquisition, and for replaying captured telemetry.

use crate::domain::ports::{DiagnosticSource, NormalizedDeviceRecord};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Accepted document shapes: a bare list or `{devices: [...]}`
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordDocument {
    List(Vec<NormalizedDeviceRecord>),
    Wrapped { devices: Vec<NormalizedDeviceRecord> },
}

/// Parse records from YAML or JSON text
pub fn parse_records(contents: &str) -> Result<Vec<NormalizedDeviceRecord>> {
    let document: RecordDocument = serde_yaml::from_str(contents)?;
    Ok(match document {
        RecordDocument::List(records) => records,
        RecordDocument::Wrapped { devices } => devices,
    })
}

// =============================================================================
// File Source
// =============================================================================

/// Reads normalized records from a YAML or JSON file on every collection
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }
}

#[async_trait]
impl DiagnosticSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn collect(&self) -> Result<Vec<NormalizedDeviceRecord>> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            debug!("Cannot read {}: {}", self.path.display(), e);
            Error::SourceUnavailable {
                source_name: self.name.clone(),
            }
        })?;
        let records = parse_records(&contents)?;
        debug!("Read {} records from {}", records.len(), self.path.display());
        Ok(records)
    }
}

// =============================================================================
// Static Source
// =============================================================================

/// Fixed set of records
pub struct StaticSource {
    records: Vec<NormalizedDeviceRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<NormalizedDeviceRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl DiagnosticSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn collect(&self) -> Result<Vec<NormalizedDeviceRecord>> {
        Ok(self.records.clone())
    }
}

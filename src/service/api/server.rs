//! API Server
//!
//! Runs the REST server alongside periodic host assessment, with a shared
//! shutdown signal.

use crate::error::{Error, Result};
use crate::service::assessor::HostAssessor;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

use super::rest::RestRouter;

// =============================================================================
// Server Configuration
// =============================================================================

/// Default REST bind address
pub const DEFAULT_REST_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8090);

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// REST API bind address
    pub rest_addr: SocketAddr,
    /// Run periodic assessment passes while serving
    pub periodic_assessment: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            rest_addr: DEFAULT_REST_ADDR,
            periodic_assessment: true,
        }
    }
}

// =============================================================================
// API Server
// =============================================================================

pub struct ApiServer {
    config: ApiServerConfig,
    assessor: Arc<HostAssessor>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, assessor: Arc<HostAssessor>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            assessor,
            shutdown_tx,
        }
    }

    /// Run until the REST server exits or shutdown is triggered
    pub async fn run(&self) -> Result<()> {
        info!("Starting API server");
        info!("  REST API: {}", self.config.rest_addr);
        info!("  Source: {}", self.assessor.source_name());

        if self.config.periodic_assessment {
            tokio::spawn(self.assessor.clone().run(self.shutdown_tx.subscribe()));
        }

        let addr = self.config.rest_addr;
        let assessor = self.assessor.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();
        let rest_handle =
            tokio::spawn(async move { run_rest_server(addr, assessor, shutdown_rx).await });

        match rest_handle.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!("REST server error: {}", e);
                Err(e)
            }
            Err(e) => Err(Error::Internal(format!("REST server task failed: {}", e))),
        }
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Handle for triggering shutdown from another task
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }
}

/// Run the REST API server
async fn run_rest_server(
    addr: SocketAddr,
    assessor: Arc<HostAssessor>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let app = RestRouter::new(assessor).build();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind REST server: {}", e)))?;
    info!("REST API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("REST server shutting down");
        })
        .await
        .map_err(|e| Error::Internal(format!("REST server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::StaticSource;
    use crate::service::assessor::AssessorConfig;
    use crate::service::metrics::AssessmentMetrics;

    #[test]
    fn test_default_config() {
        let config = ApiServerConfig::default();
        assert_eq!(config.rest_addr.port(), 8090);
        assert!(config.periodic_assessment);
    }

    #[tokio::test]
    async fn test_shutdown() {
        let assessor = HostAssessor::new(
            AssessorConfig::default(),
            Arc::new(StaticSource::new(vec![])),
            Arc::new(AssessmentMetrics::new().unwrap()),
        );
        let server = Arc::new(ApiServer::new(
            ApiServerConfig {
                rest_addr: "127.0.0.1:0".parse().unwrap(),
                periodic_assessment: true,
            },
            assessor,
        ));

        let running = server.clone();
        let handle = tokio::spawn(async move { running.run().await });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        server.shutdown();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}

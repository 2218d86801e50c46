//! REST API Handlers
//!
//! Ad-hoc assessment of submitted records, the latest host report, and
//! Prometheus exposition.

use crate::domain::ports::NormalizedDeviceRecord;
use crate::error::Error;
use crate::health::assessment::{AssessmentEngine, AssessmentSummary, DeviceAssessment};
use crate::health::mode::PredictionMode;
use crate::service::assessor::{assess_parallel, HostAssessor};
use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Ad-hoc assessment request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessRequest {
    pub devices: Vec<NormalizedDeviceRecord>,
}

/// Query parameters for `POST /v1/assess`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssessParams {
    /// Overrides the configured mode for this request only
    #[serde(default)]
    pub mode: Option<String>,
}

/// Ad-hoc assessment response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessResponse {
    pub mode: PredictionMode,
    pub devices: Vec<DeviceAssessment>,
    pub summary: AssessmentSummary,
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn error_response(status: StatusCode, error: &str, message: String) -> Response {
    (
        status,
        Json(ApiErrorResponse {
            error: error.into(),
            message,
            details: None,
        }),
    )
        .into_response()
}

// =============================================================================
// REST Router
// =============================================================================

/// REST API router builder
pub struct RestRouter {
    assessor: Arc<HostAssessor>,
}

impl RestRouter {
    pub fn new(assessor: Arc<HostAssessor>) -> Self {
        Self { assessor }
    }

    /// Build the Axum router
    pub fn build(self) -> Router {
        let state = AppState {
            assessor: self.assessor,
        };

        Router::new()
            // Assessment endpoints
            .route("/v1/assess", post(assess_devices))
            .route("/v1/report", get(get_report))
            .route("/v1/report/refresh", post(refresh_report))
            .route("/v1/report/devices/:name", get(get_device))
            // Observability
            .route("/metrics", get(metrics))
            .route("/health", get(health_check))
            .route("/ready", get(readiness_check))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    assessor: Arc<HostAssessor>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Assess submitted records without touching the host report
async fn assess_devices(
    State(state): State<AppState>,
    Query(params): Query<AssessParams>,
    Json(request): Json<AssessRequest>,
) -> Response {
    if request.devices.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "empty_request",
            Error::ApiValidation("devices must not be empty".into()).to_string(),
        );
    }

    let mut config = *state.assessor.engine().config();
    if let Some(raw) = params.mode.as_deref() {
        match raw.parse::<PredictionMode>() {
            Ok(mode) => config = config.with_mode(mode),
            Err(e) => return error_response(StatusCode::BAD_REQUEST, "invalid_mode", e.to_string()),
        }
    }

    info!(devices = request.devices.len(), mode = %config.mode, "Ad-hoc assessment");
    let engine = AssessmentEngine::new(config);
    match assess_parallel(engine, request.devices).await {
        Ok(devices) => {
            state.assessor.metrics().record_assessments(&devices);
            let summary = AssessmentSummary::from_assessments(&devices);
            (
                StatusCode::OK,
                Json(AssessResponse {
                    mode: config.mode,
                    devices,
                    summary,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Ad-hoc assessment failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "assessment_failed",
                e.to_string(),
            )
        }
    }
}

/// Latest host report
async fn get_report(State(state): State<AppState>) -> Response {
    match state.assessor.latest() {
        Some(report) => (StatusCode::OK, Json(report.as_ref().clone())).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            "no_report",
            "No assessment pass has completed yet".into(),
        ),
    }
}

/// Run a pass now and return its report
async fn refresh_report(State(state): State<AppState>) -> Response {
    match state.assessor.run_pass().await {
        Ok(report) => (StatusCode::OK, Json(report.as_ref().clone())).into_response(),
        Err(e) => {
            error!("Refresh failed: {}", e);
            let status = if e.is_configuration() {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            error_response(status, "refresh_failed", e.to_string())
        }
    }
}

/// Single device from the latest report
async fn get_device(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let Some(report) = state.assessor.latest() else {
        return error_response(
            StatusCode::NOT_FOUND,
            "no_report",
            "No assessment pass has completed yet".into(),
        );
    };

    match report.device(&name) {
        Some(device) => (StatusCode::OK, Json(device.clone())).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            "device_not_found",
            format!("Device not found: {}", name),
        ),
    }
}

/// Prometheus exposition
async fn metrics(State(state): State<AppState>) -> Response {
    let metrics = state.assessor.metrics();
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, metrics.content_type())],
            body,
        )
            .into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "metrics_failed",
            e.to_string(),
        ),
    }
}

/// Health check
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Readiness check
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.assessor.latest().is_some() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "no assessment pass completed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::StaticSource;
    use crate::domain::ports::{DeviceFamily, HealthFlag};
    use crate::health::tier::RiskTier;
    use crate::service::assessor::{AssessorConfig, HostReport};
    use crate::service::metrics::AssessmentMetrics;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn make_record(path: &str, hours: u64) -> NormalizedDeviceRecord {
        let mut record = NormalizedDeviceRecord::new(path, DeviceFamily::Mechanical);
        record.power_on_hours = Some(hours);
        record.overall_health_flag = HealthFlag::Passed;
        record
    }

    fn make_assessor() -> Arc<HostAssessor> {
        HostAssessor::new(
            AssessorConfig::default(),
            Arc::new(StaticSource::new(vec![
                make_record("/dev/sda", 1_000),
                make_record("/dev/sdb", 40_000),
            ])),
            Arc::new(AssessmentMetrics::new().unwrap()),
        )
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn post_json(uri: &str, body: String) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_assess_endpoint() {
        let router = RestRouter::new(make_assessor()).build();
        let body = serde_json::to_string(&AssessRequest {
            devices: vec![make_record("/dev/sdc", 30_000)],
        })
        .unwrap();

        let (status, bytes) = send(router, post_json("/v1/assess?mode=aggressive", body)).await;
        assert_eq!(status, StatusCode::OK);
        let response: AssessResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(response.mode, PredictionMode::Aggressive);
        assert_eq!(response.devices[0].tier, Some(RiskTier::Moderate));
        assert_eq!(response.summary.moderate, 1);
    }

    #[tokio::test]
    async fn test_assess_rejects_bad_input() {
        let assessor = make_assessor();

        let empty = serde_json::to_string(&AssessRequest { devices: vec![] }).unwrap();
        let (status, bytes) = send(
            RestRouter::new(assessor.clone()).build(),
            post_json("/v1/assess", empty),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ApiErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(err.error, "empty_request");

        let body = serde_json::to_string(&AssessRequest {
            devices: vec![make_record("/dev/sda", 1)],
        })
        .unwrap();
        let (status, _) = send(
            RestRouter::new(assessor).build(),
            post_json("/v1/assess?mode=reckless", body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_report_lifecycle() {
        let assessor = make_assessor();
        let get = |uri: &str| Request::get(uri).body(Body::empty()).unwrap();

        let (status, _) = send(RestRouter::new(assessor.clone()).build(), get("/v1/report")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(RestRouter::new(assessor.clone()).build(), get("/ready")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, bytes) = send(
            RestRouter::new(assessor.clone()).build(),
            post_json("/v1/report/refresh", String::new()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let report: HostReport = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(report.summary.total, 2);

        let (status, bytes) = send(
            RestRouter::new(assessor.clone()).build(),
            get("/v1/report/devices/sdb"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let device: DeviceAssessment = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(device.tier, Some(RiskTier::Elevated));

        let (status, _) = send(
            RestRouter::new(assessor.clone()).build(),
            get("/v1/report/devices/sdz"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, bytes) = send(RestRouter::new(assessor).build(), get("/metrics")).await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("drive_health_assessments_total"));
    }

    #[tokio::test]
    async fn test_health() {
        let router = RestRouter::new(make_assessor()).build();
        let (status, bytes) =
            send(router, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, b"ok");
    }
}

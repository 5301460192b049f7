//! HTTP API for calculations, health checks and Prometheus metrics

use calculator_lib::{
    health::{ComponentStatus, HealthRegistry, Subsystem},
    observability::{CalculationKind, CalculationSummary, CalculatorMetrics, StructuredLogger},
    sizing, CollectorProfile, CollectorResponse, PlanResponse, SizingConfig, SizingError,
    SizingResult, StorageProfile, StorageResponse, WorkloadProfile,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: CalculatorMetrics,
    pub logger: StructuredLogger,
    pub sizing: Arc<SizingConfig>,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: CalculatorMetrics,
        logger: StructuredLogger,
        sizing: SizingConfig,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            logger,
            sizing: Arc::new(sizing),
        }
    }

    fn reject(&self, error: SizingError) -> ApiError {
        self.metrics.inc_rejected_requests();
        self.logger.log_rejected(&error);
        ApiError(error)
    }

    async fn fail(&self, error: SizingError) -> ApiError {
        if error.is_invariant_violation() {
            self.metrics.inc_invariant_violations();
            self.logger.log_invariant_violation(&error);
            self.health_registry
                .set_degraded(Subsystem::Calculator, error.to_string())
                .await;
        }
        ApiError(error)
    }

    /// Validate, run and record one calculation
    async fn run<T>(
        &self,
        kind: CalculationKind,
        validation: SizingResult<()>,
        calculation: impl FnOnce(&SizingConfig) -> SizingResult<T>,
    ) -> Result<T, ApiError>
    where
        for<'a> CalculationSummary<'a>: From<&'a T>,
    {
        validation.map_err(|e| self.reject(e))?;

        let started = Instant::now();
        let response = match calculation(&self.sizing) {
            Ok(response) => response,
            Err(e) => return Err(self.fail(e).await),
        };
        self.metrics
            .observe_calculation(kind, started.elapsed().as_secs_f64());
        self.logger
            .log_calculation(kind, &CalculationSummary::from(&response));

        Ok(response)
    }
}

/// Error body for rejected or failed calculations
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A [`SizingError`] mapped onto an HTTP response
#[derive(Debug)]
pub struct ApiError(pub SizingError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, code) = match &self.0 {
            SizingError::InvalidProfile { .. } => (
                StatusCode::BAD_REQUEST,
                "Invalid workload profile",
                "invalid_profile",
            ),
            SizingError::InvalidCalibration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Invalid calibration",
                "invalid_calibration",
            ),
            SizingError::LimitBelowRequest { .. } | SizingError::MalformedQuantity { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Sizing invariant violated",
                "invariant_violation",
            ),
        };

        let body = ErrorResponse {
            error: error.to_string(),
            code: code.to_string(),
            details: Some(self.0.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

async fn calculate(
    State(state): State<Arc<AppState>>,
    Json(profile): Json<WorkloadProfile>,
) -> Result<Json<PlanResponse>, ApiError> {
    state
        .run(CalculationKind::Plan, profile.validate(), |config| {
            sizing::calculate(&profile, config)
        })
        .await
        .map(Json)
}

async fn pool_resources(
    State(state): State<Arc<AppState>>,
    Json(profile): Json<WorkloadProfile>,
) -> Result<Json<PlanResponse>, ApiError> {
    state
        .run(CalculationKind::Pool, profile.validate(), |config| {
            sizing::pool_resources(&profile, config)
        })
        .await
        .map(Json)
}

async fn collector_resources(
    State(state): State<Arc<AppState>>,
    Json(profile): Json<CollectorProfile>,
) -> Result<Json<CollectorResponse>, ApiError> {
    state
        .run(CalculationKind::Collector, profile.validate(), |config| {
            sizing::collector_resources(&profile, config)
        })
        .await
        .map(Json)
}

async fn storage(
    State(state): State<Arc<AppState>>,
    Json(profile): Json<StorageProfile>,
) -> Result<Json<StorageResponse>, ApiError> {
    state
        .run(CalculationKind::Storage, profile.validate(), |config| {
            sizing::estimate_storage(&profile, config)
        })
        .await
        .map(Json)
}

/// The calibration in effect
async fn calibration(State(state): State<Arc<AppState>>) -> Json<SizingConfig> {
    Json(state.sizing.as_ref().clone())
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/calculate", post(calculate))
        .route("/api/calculate/pool_resources", post(pool_resources))
        .route("/api/calculate/collector_resources", post(collector_resources))
        .route("/api/calculate/storage", post(storage))
        .route("/api/calibration", get(calibration))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

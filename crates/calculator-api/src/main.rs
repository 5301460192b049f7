//! Thanos resource calculator service
//!
//! Serves resource plans for Thanos ingestion and query pipelines over HTTP,
//! together with health probes and Prometheus metrics.

use anyhow::{Context, Result};
use calculator_api::{api, config};
use calculator_lib::{
    health::HealthRegistry,
    observability::{CalculatorMetrics, StructuredLogger},
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_NAME: &str = "thanos-calculator";
const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting {}", SERVICE_NAME);

    let config = config::ApiConfig::load()?;
    info!(
        api_port = config.api_port,
        calibration = %config.calibration_source(),
        "Service configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register_all().await;

    let sizing = match config.load_calibration() {
        Ok(sizing) => sizing,
        Err(e) => {
            error!(error = %e, "Failed to load calibration");
            return Err(e.context("Calibration is invalid, refusing to start"));
        }
    };

    let metrics = CalculatorMetrics::new();
    metrics.set_formula_version(&sizing.formula_version);

    let logger = StructuredLogger::new(SERVICE_NAME);
    logger.log_startup(
        SERVICE_VERSION,
        &sizing.formula_version,
        &config.calibration_source(),
    );

    health_registry
        .calibration_loaded(sizing.formula_version.clone())
        .await;

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics,
        logger.clone(),
        sizing,
    ));

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = api_handle => {
            result
                .context("API server task panicked")?
                .context("API server failed")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}

//! Meshtune Node Binary
//!
//! Runs the duty-cycle tuner once against the simulated routing stack.

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meshtune_common::{MeshtuneError, VERSION};
use meshtune_optimizer::telemetry::exporter::render;
use meshtune_optimizer::{
    Driver, FanoutTelemetry, MeshtuneConfig, PrometheusTelemetry, SimulatedRouting, TokioTimer,
    TracingTelemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting meshtune node v{}", VERSION);

    // Load configuration
    let config = MeshtuneConfig::load()?;
    config.validate()?;
    info!("Loaded configuration: {:?}", config);

    let registry = prometheus::Registry::new();
    let exporter = PrometheusTelemetry::new().context("creating prometheus metrics")?;
    exporter
        .register(&registry)
        .context("registering prometheus metrics")?;
    let telemetry = FanoutTelemetry::new()
        .with(TracingTelemetry)
        .with(exporter);

    // Ctrl-C flips the shutdown signal checked at every suspension point
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut driver = Driver::new(config, SimulatedRouting::default(), TokioTimer::new(), telemetry)
        .with_shutdown(shutdown_rx);

    let result = driver.run().await;

    if let Ok(text) = render(&registry) {
        debug!("Final metrics:\n{}", text);
    }

    match result {
        Ok(report) => {
            info!("Run summary: {}", serde_json::to_string(&report)?);
            Ok(())
        }
        Err(MeshtuneError::Cancelled(phase)) => {
            info!("Run cancelled during {}", phase);
            Ok(())
        }
        Err(e) => {
            error!("Optimization run failed: {}", e);
            Err(e.into())
        }
    }
}

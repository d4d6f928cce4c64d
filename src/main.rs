use std::time::Duration;

use tracing_subscriber::EnvFilter;

use food_delivery::config::{Config, LogFormat};
use food_delivery::engine::service::DeliveryService;
use food_delivery::error::AppError;
use food_delivery::scenarios::ScenarioRunner;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);
    match config.log_format {
        LogFormat::Compact => subscriber.compact().init(),
        LogFormat::Json => subscriber.json().init(),
    }

    let service = DeliveryService::from_config(&config)?;
    tracing::info!(
        failure_rate = config.accept_failure_rate,
        seeded = config.rng_seed.is_some(),
        "food delivery platform started"
    );

    let runner = ScenarioRunner::new(&service, Duration::from_millis(config.scenario_delay_ms));
    let reports = runner.run_all().await;

    let unexpected = reports.iter().filter(|report| !report.as_expected).count();
    tracing::info!(
        scenarios = reports.len(),
        unexpected,
        orders = service.registry().len(),
        "all scenarios finished"
    );

    let metrics = service.metrics().encode().map_err(AppError::Internal)?;
    tracing::debug!(metrics = %metrics, "final metrics");

    Ok(())
}

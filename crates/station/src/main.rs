use std::{env, error::Error, process::ExitCode};

use station::{
    sensor, shutdown, MySqlSink, PollingLoop, ReadingRecorder, ReadingSampler,
    StationConfig,
};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    tracing::info!(%path, "loading configuration");
    let config = StationConfig::load(&path)?;

    for endpoint in config.sensors() {
        tracing::info!(%endpoint, "configured sensor");
    }
    for endpoint in &config.sensors()[1..] {
        tracing::warn!(%endpoint, "only the first sensor is polled, ignoring");
    }

    let endpoint = config.primary_sensor();
    let driver = sensor::open_driver(endpoint)?;
    tracing::info!(%endpoint, "sensor ready");

    let sampler = ReadingSampler::new(driver, config.polling.max_retries)
        .with_retry_delay(config.polling.retry_delay());
    let recorder = ReadingRecorder::new(
        MySqlSink::new(&config.credentials),
        config.credentials.table.clone(),
    );
    let mut polling = PollingLoop::new(sampler, recorder, &config.polling);

    let (trigger, mut shutdown) = shutdown::channel();
    tokio::spawn(trigger.trigger_on(wait_for_signal()));

    Ok(polling.run(&mut shutdown).await.exit_code())
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

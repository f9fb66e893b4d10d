use std::env;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::broadcast;

use crate::cli::{Args, Commands};
use crate::config::PublisherConfig;
use crate::constants::{SENSOR_DELAY, TOPIC_NAME};
use crate::publisher::OrientationPublisher;
use crate::sensor::iio::IioSensorManager;
use crate::sensor::synthetic::SyntheticField;
use crate::sensor::virt::VirtualSensorManager;
use crate::sensor::SensorManager;
use crate::sync::{ReceiveTimeoutError, TimeoutReceiver};
use crate::transport::bus::MessageBus;

mod cli;
mod config;
mod constants;
mod drivers;
mod fusion;
mod iio;
mod listener;
mod publisher;
mod sensor;
mod sync;
mod transport;

/// How long to wait for a bearing before warning that sensors have stalled
const STALL_TIMEOUT: Duration = Duration::from_secs(5);
/// How often to check that the listener thread is still alive
const HEALTH_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let log_level = match env::var("LOG_LEVEL") {
        Ok(value) => value,
        Err(_) => "info".to_string(),
    };
    env::set_var("RUST_LOG", log_level);
    env_logger::init();

    let args = Args::parse();
    let cmd = args.cmd.unwrap_or(Commands::Run { config: None });

    match cmd {
        Commands::Run { config } => {
            let config = PublisherConfig::load(config.as_deref())?;
            let sensors = Arc::new(IioSensorManager::new(config));
            run(sensors, None).await
        }
        Commands::Simulate { config, duration } => {
            let config = PublisherConfig::load(config.as_deref())?;
            let sensors = Arc::new(VirtualSensorManager::new());
            let field = SyntheticField::from_config(config.simulation.as_ref());
            let simulation = tokio::spawn(field.run(sensors.clone(), SENSOR_DELAY));
            let result = run(sensors, duration.map(Duration::from_secs)).await;
            simulation.abort();
            result
        }
        cmd => cli::main_cli(cmd).await,
    }
}

/// Run the orientation publisher until CTRL+C is pressed or the optional
/// duration has passed.
async fn run(
    sensors: Arc<dyn SensorManager>,
    duration: Option<Duration>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    log::info!(
        "Starting {} v{}",
        OrientationPublisher::default_node_name(),
        VERSION
    );

    let bus = Arc::new(MessageBus::new());
    let bearings = bus.subscribe(TOPIC_NAME);
    let monitor = tokio::spawn(monitor_bearings(bearings));

    // Opening sensors can block, so keep it off the async workers
    let started = {
        let bus = bus.clone();
        tokio::task::spawn_blocking(move || {
            let mut publisher = OrientationPublisher::new(sensors, SENSOR_DELAY);
            publisher.on_start(bus.as_ref()).map(|_| publisher)
        })
        .await?
    };
    let mut publisher = match started {
        Ok(publisher) => publisher,
        Err(e) => {
            monitor.abort();
            return Err(e.into());
        }
    };
    if let Some(type_name) = bus.topic_type(TOPIC_NAME) {
        log::debug!("Topic {TOPIC_NAME} carries {type_name}");
    }

    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(deadline, ctrl_c);
    let mut health = tokio::time::interval(HEALTH_INTERVAL);
    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result?;
                break;
            }
            _ = &mut deadline => break,
            _ = health.tick() => {
                if !publisher.is_running() {
                    log::error!("Orientation listener stopped unexpectedly");
                    break;
                }
            }
        }
    }
    log::info!("Shutting down");

    // Joining the listener thread blocks, so keep it off the async workers
    tokio::task::spawn_blocking(move || publisher.on_shutdown()).await?;
    monitor.abort();

    log::info!("Orientation publisher exited");

    Ok(())
}

/// Log every bearing published on the bus
async fn monitor_bearings(mut rx: broadcast::Receiver<f32>) {
    loop {
        match rx.recv_timeout(STALL_TIMEOUT).await {
            Ok(bearing) => log::debug!("Bearing: {bearing:.1}"),
            Err(ReceiveTimeoutError::Timeout) => {
                log::warn!("No bearing published in the last {STALL_TIMEOUT:?}");
            }
            Err(ReceiveTimeoutError::Lagged(skipped)) => {
                log::debug!("Skipped {skipped} bearings");
            }
            Err(ReceiveTimeoutError::Closed) => break,
        }
    }
}

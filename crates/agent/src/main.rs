//! `pyra-vol-mon` -- IIO threshold volume monitor.
//!
//! Watches one channel of the palmas GPADC (the Pyra volume wheel),
//! keeps the driver's rising/falling threshold events armed one step
//! around the last reading, and runs EXECUTABLE with the new value
//! whenever an event fires.
//!
//! # Environment variables
//!
//! | Variable         | Default        | Description                      |
//! |------------------|----------------|----------------------------------|
//! | `VOLMON_CHANNEL` | `2`            | ADC channel to monitor           |
//! | `VOLMON_MIN`     | `0`            | Lower limit                      |
//! | `VOLMON_MAX`     | `2047`         | Upper limit                      |
//! | `VOLMON_STEP`    | `25`           | Change needed to fire again      |
//! | `VOLMON_DEVICE`  | `palmas-gpadc` | IIO device name                  |
//! | `RUST_LOG`       | --             | Overrides the log filter         |

use std::path::Path;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use volmon_agent::callback::DetachedProcess;
use volmon_agent::config::{Cli, MonitorConfig, QUIET_LOG_FILTER};
use volmon_agent::error::AgentError;
use volmon_agent::events::EventStream;
use volmon_agent::iio::{IioDevice, DEV_DIR, IIO_SYSFS_DIR};
use volmon_agent::monitor::Monitor;
use volmon_core::tracker::ThresholdTracker;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    let config = MonitorConfig::try_from(Cli::parse());
    // Configuration errors are logged too, so they get the quiet filter.
    let default_filter = match &config {
        Ok(config) => config.log_filter(),
        Err(_) => QUIET_LOG_FILTER,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match config {
        Ok(config) => config,
        Err(e) => exit_with(AgentError::from(e)),
    };

    tracing::info!(
        channel = config.channel,
        min = config.limits.min(),
        max = config.limits.max(),
        step = config.limits.step(),
        device = %config.device_name,
        executable = %config.executable.display(),
        "Starting pyra-vol-mon",
    );

    if let Err(e) = run(config).await {
        exit_with(e);
    }
}

async fn run(config: MonitorConfig) -> Result<(), AgentError> {
    let device = IioDevice::find(Path::new(IIO_SYSFS_DIR), Path::new(DEV_DIR), &config.device_name)?;
    let mut events = EventStream::new(device.open_event_fd()?)?;

    let tracker = ThresholdTracker::new(device.channel(config.channel), config.limits);

    let mut invoker = DetachedProcess::new(config.executable.clone());
    if config.pass_limits {
        invoker = invoker.with_limits(config.limits);
    }

    let mut monitor = Monitor::new(tracker, invoker, config.channel);
    monitor.run(&mut events, shutdown_signal()).await
}

fn exit_with(e: AgentError) -> ! {
    tracing::error!(error = %e, "pyra-vol-mon failed");
    std::process::exit(e.errno());
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT"),
        () = terminate => tracing::info!("Received SIGTERM"),
    }
}

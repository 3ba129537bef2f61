//! `run` and `debug` commands: host the companion in the foreground.
//!
//! OS signals stand in for service control requests:
//!
//! ```text
//! Ctrl-C   ──► Shutdown
//! SIGTERM  ──► Stop
//! SIGUSR1  ──► Interrogate (echoes the last reported status)
//! SIGHUP   ──► Other(1)
//! ```

use std::path::Path;

use anyhow::{Context, Result, bail};
use cockpit_core::Config;
use cockpit_core::constants::{SERVICE_DESCRIPTION, SERVICE_NAME};
use cockpit_hardware::SerialPortResolver;
use cockpit_journal::JournalStatusSource;
use cockpit_monitor::{
    ConnectionStateMachine, ControlRequest, HostConfig, HostExit, ServiceHost, ServiceState,
    ServiceStatus,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

/// Load the configuration and run until stopped.
pub async fn execute(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("Couldn't load {}", config_path.display()))?;
    config.validate().context("Invalid configuration")?;

    info!(
        service = SERVICE_NAME,
        version = cockpit_core::VERSION,
        device = %config.pnp_device_id,
        baud_rate = config.baud_rate,
        log_dir = %config.log_dir.display(),
        "Starting {}", SERVICE_DESCRIPTION
    );

    let machine =
        ConnectionStateMachine::new(SerialPortResolver::new(), JournalStatusSource::new(), config);
    let mut host = ServiceHost::new(machine, HostConfig::default());

    let (control_tx, control_rx) = mpsc::channel(8);
    let (status_tx, status_rx) = mpsc::channel(16);
    let (current_tx, current_rx) = watch::channel(ServiceStatus::new(ServiceState::StartPending));

    tokio::spawn(track_status(status_rx, current_tx));
    tokio::spawn(async move {
        if let Err(e) = forward_signals(control_tx, current_rx).await {
            error!("Couldn't listen for signals: {}", e);
        }
    });

    match host.run(control_rx, status_tx).await {
        HostExit::Stopped => {
            info!("{} stopped", SERVICE_DESCRIPTION);
            Ok(())
        }
        HostExit::Fatal(reason) => bail!("{} stopped: {}", SERVICE_DESCRIPTION, reason),
    }
}

/// Log status updates and remember the latest one.
async fn track_status(
    mut updates: mpsc::Receiver<ServiceStatus>,
    current: watch::Sender<ServiceStatus>,
) {
    while let Some(status) = updates.recv().await {
        debug!(
            state = %status.state,
            accepts_stop = status.accepts_stop,
            "Service status"
        );
        current.send_replace(status);
    }
}

#[cfg(unix)]
async fn forward_signals(
    control: mpsc::Sender<ControlRequest>,
    current: watch::Receiver<ServiceStatus>,
) -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut user1 = signal(SignalKind::user_defined1())?;
    let mut hangup = signal(SignalKind::hangup())?;

    loop {
        let request = tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                ControlRequest::Shutdown
            }
            _ = terminate.recv() => ControlRequest::Stop,
            _ = user1.recv() => ControlRequest::Interrogate { current: *current.borrow() },
            _ = hangup.recv() => ControlRequest::Other(1),
        };

        if control.send(request).await.is_err() {
            return Ok(());
        }
    }
}

#[cfg(not(unix))]
async fn forward_signals(
    control: mpsc::Sender<ControlRequest>,
    _current: watch::Receiver<ServiceStatus>,
) -> std::io::Result<()> {
    loop {
        tokio::signal::ctrl_c().await?;
        if control.send(ControlRequest::Shutdown).await.is_err() {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let error = execute(&path).await.unwrap_err();

        assert!(error.to_string().starts_with("Couldn't load"));
    }

    #[tokio::test]
    async fn test_invalid_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        Config::new("COM3", 9600, dir.path().join("missing"))
            .save(&path)
            .unwrap();

        let error = execute(&path).await.unwrap_err();

        assert_eq!(error.to_string(), "Invalid configuration");
    }

    #[tokio::test]
    async fn test_status_tracking_keeps_latest() {
        let (status_tx, status_rx) = mpsc::channel(4);
        let (current_tx, current_rx) = watch::channel(ServiceStatus::new(ServiceState::StartPending));
        let tracker = tokio::spawn(track_status(status_rx, current_tx));

        status_tx.send(ServiceStatus::new(ServiceState::Running)).await.unwrap();
        drop(status_tx);
        tracker.await.unwrap();

        assert_eq!(*current_rx.borrow(), ServiceStatus::new(ServiceState::Running));
    }
}

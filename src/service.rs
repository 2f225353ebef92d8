use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::KeepAliveConfig;
use crate::error::{Result, VerifierError};
use crate::local::KeyValueStore;
use crate::worker::{KeepAliveHandle, KeepAlivePinger};

/// Key holding the persisted on/off flag.
pub const USER_PREF_SERVICE_STATUS: &str = "serviceStatus";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    On,
    Off,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::On => "ON",
            ServiceStatus::Off => "OFF",
        }
    }

    pub fn is_on(&self) -> bool {
        *self == ServiceStatus::On
    }
}

impl From<bool> for ServiceStatus {
    fn from(enabled: bool) -> Self {
        if enabled {
            ServiceStatus::On
        } else {
            ServiceStatus::Off
        }
    }
}

impl FromStr for ServiceStatus {
    type Err = VerifierError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ON" => Ok(ServiceStatus::On),
            "OFF" => Ok(ServiceStatus::Off),
            other => Err(VerifierError::InvalidPayload(format!(
                "unknown service status {:?}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted on/off switch for this verifier.
///
/// Owns the keep-alive task: enabling starts (or restarts) the pinger,
/// disabling cancels it. Both are safe to call repeatedly.
pub struct ServiceController {
    store: Arc<dyn KeyValueStore>,
    keepalive: KeepAliveConfig,
    task: Mutex<Option<KeepAliveHandle>>,
}

impl ServiceController {
    pub fn new(store: Arc<dyn KeyValueStore>, keepalive: KeepAliveConfig) -> Self {
        Self {
            store,
            keepalive,
            task: Mutex::new(None),
        }
    }

    /// Bring the pinger in line with the persisted status.
    pub async fn start(&self) -> Result<ServiceStatus> {
        let mut task = self.task.lock().await;
        let status = self.status().await?;
        self.toggle_pinger(&mut task, status.is_on());
        Ok(status)
    }

    /// Persisted status, `ON` when never set.
    pub async fn status(&self) -> Result<ServiceStatus> {
        match self.store.get(USER_PREF_SERVICE_STATUS).await? {
            Some(value) => value.parse(),
            None => Ok(ServiceStatus::On),
        }
    }

    /// Persist the switch and start or stop the pinger to match.
    ///
    /// The task lock is held across both steps so concurrent toggles cannot
    /// leave the pinger out of step with the persisted status.
    pub async fn set_enabled(&self, enabled: bool) -> Result<()> {
        let mut task = self.task.lock().await;
        let status = ServiceStatus::from(enabled);
        self.store
            .put(USER_PREF_SERVICE_STATUS, status.as_str())
            .await?;
        tracing::info!(status = %status, "Verifier service toggled");
        self.toggle_pinger(&mut task, enabled);
        Ok(())
    }

    pub async fn is_pinging(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(KeepAliveHandle::is_running)
    }

    /// Probes run by the current pinger, if any.
    pub async fn probe_count(&self) -> Option<u64> {
        self.task
            .lock()
            .await
            .as_ref()
            .map(KeepAliveHandle::probe_count)
    }

    /// The current pinger, if one was started.
    pub async fn pinger(&self) -> Option<KeepAlivePinger> {
        self.task
            .lock()
            .await
            .as_ref()
            .map(|handle| handle.pinger().clone())
    }

    /// Stop the pinger without touching the persisted status.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.task.lock().await.take() {
            handle.stop().await;
        }
    }

    fn toggle_pinger(&self, task: &mut Option<KeepAliveHandle>, enable: bool) {
        if let Some(previous) = task.take() {
            previous.cancel();
        }
        if enable {
            tracing::debug!(host = %self.keepalive.host, "Start pinging server");
            *task = Some(KeepAlivePinger::new(&self.keepalive).spawn());
        } else {
            tracing::debug!("Stop pinging server");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_and_prints() {
        assert_eq!("ON".parse::<ServiceStatus>().unwrap(), ServiceStatus::On);
        assert_eq!("OFF".parse::<ServiceStatus>().unwrap(), ServiceStatus::Off);
        assert!("on".parse::<ServiceStatus>().is_err());
        assert_eq!(ServiceStatus::Off.to_string(), "OFF");
        assert_eq!(ServiceStatus::from(true), ServiceStatus::On);
    }
}

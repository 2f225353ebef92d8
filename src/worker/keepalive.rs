use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::KeepAliveConfig;

/// Periodically opens a TCP connection to a well-known host so the device's
/// network path does not drop into a low-power state.
#[derive(Debug, Clone)]
pub struct KeepAlivePinger {
    host: String,
    port: u16,
    interval: Duration,
    timeout: Duration,
    probes: Arc<AtomicU64>,
}

impl KeepAlivePinger {
    pub fn new(config: &KeepAliveConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            interval: config.interval(),
            timeout: config.timeout(),
            probes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of probes run so far.
    pub fn probe_count(&self) -> u64 {
        self.probes.load(Ordering::SeqCst)
    }

    /// Try one connection; true when the host accepted within the timeout.
    pub async fn probe(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        matches!(tokio::time::timeout(self.timeout, connect).await, Ok(Ok(_)))
    }

    /// Probe at a fixed rate, starting immediately, until `cancel` fires.
    ///
    /// A probe already in progress is allowed to finish.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            let reachable = self.probe().await;
            tracing::debug!(host = %self.host, port = self.port, reachable, "Keep-alive probe");
        }
    }

    /// Run on a background task.
    pub fn spawn(self) -> KeepAliveHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let pinger = self.clone();
        let task = tokio::spawn(async move {
            pinger.run(token).await;
        });
        KeepAliveHandle {
            pinger: self,
            cancel,
            task,
        }
    }
}

/// Owned handle to a running keep-alive task.
#[derive(Debug)]
pub struct KeepAliveHandle {
    pinger: KeepAlivePinger,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl KeepAliveHandle {
    /// Stop future probes. Does not wait for the task to exit.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }

    pub fn probe_count(&self) -> u64 {
        self.pinger.probe_count()
    }

    /// The pinger driven by this task. Clones share its probe counter.
    pub fn pinger(&self) -> &KeepAlivePinger {
        &self.pinger
    }

    /// Cancel and wait for the task to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Keep-alive task ended abnormally");
        }
    }
}

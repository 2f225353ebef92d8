use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::api::{run_api, ApiState};
use crate::config::VerifierConfig;
use crate::error::Result;
use crate::events::{EventBus, VerifierEvent};
use crate::local::{FileKeyValueStore, KeyValueStore, LogEntry, MemoryKeyValueStore, SmsLogBook};
use crate::pool::{ClaimOutcome, JobClaimer};
use crate::push::PushMessage;
use crate::service::{ServiceController, ServiceStatus};
use crate::sms::{CommandSmsSender, PendingDeliveries, SendResult, SmsSender};
use crate::store::{JobStore, MemoryJobStore, RestJobStore};
use crate::worker::{DeliveryConfirmer, DispatchOutcome, Dispatcher};

/// What happened to an inbound push event.
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    ServiceOff,
    StatusUnavailable,
    CannotSend,
    NoData,
    MissingMessageId,
    NotClaimed(ClaimOutcome),
    DispatchSkipped,
    DispatchFailed,
    Dispatched,
}

impl PushOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushOutcome::ServiceOff => "service_off",
            PushOutcome::StatusUnavailable => "status_unavailable",
            PushOutcome::CannotSend => "cannot_send",
            PushOutcome::NoData => "no_data",
            PushOutcome::MissingMessageId => "missing_message_id",
            PushOutcome::NotClaimed(_) => "not_claimed",
            PushOutcome::DispatchSkipped => "dispatch_skipped",
            PushOutcome::DispatchFailed => "dispatch_failed",
            PushOutcome::Dispatched => "dispatched",
        }
    }
}

/// A verifier device: wires push intake to claim, dispatch and confirmation,
/// and exposes the control surface used by the UI.
pub struct VerifierNode {
    pub config: VerifierConfig,
    claimer: JobClaimer,
    dispatcher: Dispatcher,
    confirmer: Arc<DeliveryConfirmer>,
    controller: ServiceController,
    log_book: Arc<SmsLogBook>,
    sms: Arc<dyn SmsSender>,
    deliveries: PendingDeliveries,
    events: EventBus,
}

impl VerifierNode {
    pub fn new(
        config: VerifierConfig,
        store: Arc<dyn JobStore>,
        local: Arc<dyn KeyValueStore>,
        sms: Arc<dyn SmsSender>,
        deliveries: PendingDeliveries,
    ) -> Self {
        let events = EventBus::new();
        let log_book = Arc::new(SmsLogBook::new(local.clone()));

        Self {
            claimer: JobClaimer::new(
                store.clone(),
                config.verifier_id.clone(),
                config.network_id.clone(),
                config.sms_length_limit,
            ),
            dispatcher: Dispatcher::new(
                sms.clone(),
                deliveries.clone(),
                log_book.clone(),
                events.clone(),
            ),
            confirmer: Arc::new(DeliveryConfirmer::new(
                store,
                config.network_id.clone(),
                events.clone(),
            )),
            controller: ServiceController::new(local, config.keepalive.clone()),
            log_book,
            sms,
            deliveries,
            events,
            config,
        }
    }

    /// Build a node with the backends named in `config`.
    ///
    /// Without a store URL the node runs against an in-process job store;
    /// without a state path local state is kept in memory only.
    pub async fn from_config(config: VerifierConfig) -> Result<Self> {
        let store: Arc<dyn JobStore> = if config.store.base_url.is_some() {
            Arc::new(RestJobStore::from_config(&config.store)?)
        } else {
            tracing::warn!("No job store URL configured, using an in-process store");
            Arc::new(MemoryJobStore::with_max_retries(config.store.max_retries))
        };

        let local: Arc<dyn KeyValueStore> = match &config.state_path {
            Some(path) => Arc::new(FileKeyValueStore::open(path).await?),
            None => Arc::new(MemoryKeyValueStore::new()),
        };

        let deliveries = PendingDeliveries::new();
        let sms = Arc::new(CommandSmsSender::new(config.sms.clone(), deliveries.clone()));

        Ok(Self::new(config, store, local, sms, deliveries))
    }

    /// Start background work according to the persisted service status.
    pub async fn start(&self) -> Result<ServiceStatus> {
        let status = self.controller.start().await?;
        tracing::info!(
            verifier_id = %self.config.verifier_id,
            network_id = %self.config.network_id,
            status = %status,
            "Verifier started"
        );
        Ok(status)
    }

    /// Run the node until `shutdown` fires.
    ///
    /// 1. Starts the keep-alive pinger if the service is enabled
    /// 2. Serves the control API (blocking)
    /// 3. Stops the pinger on the way out
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) -> Result<()> {
        self.start().await?;

        let addr = self.config.listen_addr;
        let result = run_api(addr, ApiState { node: self.clone() }, shutdown).await;

        self.shutdown().await;
        result
    }

    /// Handle one push event end to end.
    ///
    /// Never fails: every fault degrades to "job not claimed" or "not sent"
    /// and is logged.
    pub async fn handle_push(&self, push: &PushMessage) -> PushOutcome {
        tracing::debug!(from = ?push.from, "Push event received");

        match self.controller.status().await {
            Ok(ServiceStatus::On) => {}
            Ok(ServiceStatus::Off) => {
                tracing::debug!("The service has been turned off, skipping");
                return PushOutcome::ServiceOff;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not read service status, skipping");
                return PushOutcome::StatusUnavailable;
            }
        }

        if !self.sms.can_send() {
            tracing::debug!("The device cannot send SMS, skipping");
            return PushOutcome::CannotSend;
        }

        if push.data.is_none() {
            tracing::debug!("Push event contains no data payload, skipping");
            return PushOutcome::NoData;
        }

        let Some(message_id) = push.message_id() else {
            tracing::debug!("messageId missing from push payload, skipping");
            return PushOutcome::MissingMessageId;
        };

        let job = match self.claimer.claim(message_id).await {
            ClaimOutcome::Claimed(job) => job,
            other => return PushOutcome::NotClaimed(other),
        };

        match self
            .dispatcher
            .dispatch(
                job.phone_number.as_deref(),
                job.body.as_deref(),
                Some(message_id),
            )
            .await
        {
            DispatchOutcome::Pending(confirmation) => {
                let confirmer = self.confirmer.clone();
                tokio::spawn(async move {
                    let message_id = confirmation.message_id().to_string();
                    match confirmation.outcome().await {
                        Some(result) => {
                            confirmer.confirm(&message_id, result).await;
                        }
                        None => {
                            tracing::debug!(message_id = %message_id, "Send registration dropped without a result");
                        }
                    }
                });
                PushOutcome::Dispatched
            }
            DispatchOutcome::Skipped => PushOutcome::DispatchSkipped,
            DispatchOutcome::Failed(_) => PushOutcome::DispatchFailed,
        }
    }

    /// Entry point for the radio boundary to report a send outcome.
    pub async fn deliver_send_result(&self, message_id: &str, result: SendResult) -> bool {
        self.deliveries.deliver(message_id, result).await
    }

    pub async fn toggle_verifier_service(&self, enabled: bool) -> Result<()> {
        self.controller.set_enabled(enabled).await
    }

    pub async fn get_verifier_service_status(&self) -> Result<String> {
        Ok(self.controller.status().await?.as_str().to_string())
    }

    pub async fn get_sms_send_logs(&self) -> Result<Vec<LogEntry>> {
        self.log_book.entries().await
    }

    pub fn get_device_token(&self) -> Option<&str> {
        self.config.device_token.as_deref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VerifierEvent> {
        self.events.subscribe()
    }

    pub fn controller(&self) -> &ServiceController {
        &self.controller
    }

    pub async fn shutdown(&self) {
        self.controller.shutdown().await;
        tracing::info!(verifier_id = %self.config.verifier_id, "Verifier stopped");
    }
}

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::local::LogEntry;
use crate::sms::SendResult;

/// Internal notification carrying the refreshed log trail after a dispatch.
pub const EVENT_NAME_NOTIFY_SMS_LOG: &str = "smsLogNotification";

/// Event name the UI subscribes to for new send attempts.
pub const EVENT_SMS_SENT: &str = "smsSent";

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A log entry as presented to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntryView {
    #[serde(rename = "PhoneNumber")]
    pub phone_number: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "messageId")]
    pub message_id: String,
    #[serde(rename = "SMSSent")]
    pub sms_sent: bool,
}

impl From<&LogEntry> for LogEntryView {
    fn from(entry: &LogEntry) -> Self {
        Self {
            phone_number: entry.phone_number.clone(),
            date: entry.timestamp.clone(),
            message_id: entry.message_id.clone(),
            sms_sent: entry.sent,
        }
    }
}

pub fn log_views(entries: &[LogEntry]) -> Vec<LogEntryView> {
    entries.iter().map(LogEntryView::from).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum VerifierEvent {
    /// Full log trail after a send attempt was recorded.
    SmsLogNotification { logs: Vec<LogEntry> },
    /// Final radio outcome for a dispatched message.
    DeliveryResult {
        message_id: String,
        result: SendResult,
    },
}

impl VerifierEvent {
    /// Name of the event on the local bus.
    pub fn name(&self) -> &'static str {
        match self {
            VerifierEvent::SmsLogNotification { .. } => EVENT_NAME_NOTIFY_SMS_LOG,
            VerifierEvent::DeliveryResult { .. } => "smsDeliveryResult",
        }
    }

    /// Name under which the event is surfaced to the UI.
    pub fn ui_name(&self) -> &'static str {
        match self {
            VerifierEvent::SmsLogNotification { .. } => EVENT_SMS_SENT,
            VerifierEvent::DeliveryResult { .. } => "smsDeliveryResult",
        }
    }
}

/// Fan-out of verifier events to local listeners.
///
/// Publishing never blocks and never fails: with no subscribers the event is
/// simply dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<VerifierEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VerifierEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: VerifierEvent) {
        let name = event.name();
        if self.tx.send(event).is_err() {
            tracing::debug!(event = name, "No event listeners");
        }
    }
}

/// Constants exposed to the UI so it can subscribe by name.
pub fn constants() -> HashMap<&'static str, &'static str> {
    HashMap::from([(EVENT_SMS_SENT, EVENT_SMS_SENT)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_view_uses_ui_keys() {
        let entry = LogEntry {
            sent: true,
            timestamp: "now".to_string(),
            phone_number: "+15551234".to_string(),
            message_id: "m1".to_string(),
        };
        let value = serde_json::to_value(LogEntryView::from(&entry)).unwrap();
        assert_eq!(value["PhoneNumber"], "+15551234");
        assert_eq!(value["Date"], "now");
        assert_eq!(value["messageId"], "m1");
        assert_eq!(value["SMSSent"], true);
    }

    #[test]
    fn constants_mirror_event_name() {
        let constants = constants();
        assert_eq!(constants.get("smsSent"), Some(&"smsSent"));
    }

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(VerifierEvent::SmsLogNotification { logs: Vec::new() });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), EVENT_NAME_NOTIFY_SMS_LOG);
        assert_eq!(event.ui_name(), EVENT_SMS_SENT);
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.publish(VerifierEvent::DeliveryResult {
            message_id: "m1".to_string(),
            result: SendResult::Ok,
        });
    }
}

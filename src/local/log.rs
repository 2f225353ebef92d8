use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::local::KeyValueStore;

/// Key holding the JSON array of log entries.
pub const SMS_LOGS_KEY: &str = "smsLogs";

/// Human-readable timestamp, e.g. `Tue, 4 Jun 2019 14:05 PM`.
const DATE_FORMAT: &str = "%a, %-d %b %Y %H:%M %p";

/// One SMS send attempt made by this device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "smsSent")]
    pub sent: bool,
    #[serde(rename = "date")]
    pub timestamp: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    #[serde(rename = "messageId")]
    pub message_id: String,
}

impl LogEntry {
    pub fn sent_now(phone_number: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            sent: true,
            timestamp: Local::now().format(DATE_FORMAT).to_string(),
            phone_number: phone_number.into(),
            message_id: message_id.into(),
        }
    }
}

/// Append-only audit trail of send attempts.
///
/// Appends are serialised so concurrent dispatches on the same device never
/// lose each other's entries. The trail is never rotated.
pub struct SmsLogBook {
    store: Arc<dyn KeyValueStore>,
    append_lock: Mutex<()>,
}

impl SmsLogBook {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            append_lock: Mutex::new(()),
        }
    }

    /// All entries in append order.
    pub async fn entries(&self) -> Result<Vec<LogEntry>> {
        match self.store.get(SMS_LOGS_KEY).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Append an entry and return the full updated trail.
    pub async fn append(&self, entry: LogEntry) -> Result<Vec<LogEntry>> {
        let _guard = self.append_lock.lock().await;
        let mut entries = self.entries().await?;
        entries.push(entry);
        let json = serde_json::to_string_pretty(&entries)?;
        self.store.put(SMS_LOGS_KEY, &json).await?;
        Ok(entries)
    }
}

//! Device-local persistence.
//!
//! Everything here is owned by a single device and never synchronised with
//! the shared job store: the service on/off flag and the audit trail of SMS
//! send attempts. Both live in one flat key/value store.

pub mod kv;
pub mod log;

pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use log::{LogEntry, SmsLogBook, SMS_LOGS_KEY};

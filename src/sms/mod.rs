//! Boundary to the device's SMS radio.
//!
//! Sending is split in two: [`SmsSender::send`] only hands the message to the
//! radio, and the final outcome arrives later through
//! [`PendingDeliveries::deliver`], keyed by the message id that was
//! registered when the send was attempted.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

pub mod command;
pub mod pending;

pub use command::CommandSmsSender;
pub use pending::{PendingConfirmation, PendingDeliveries};

/// Final radio outcome of a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SendResult {
    Ok,
    GenericFailure,
    RadioOff,
    NullPdu,
    NoService,
    Other(i32),
}

impl SendResult {
    /// Map a platform result code. `-1` is success, `1..=4` are the radio
    /// failure codes.
    pub fn from_code(code: i32) -> Self {
        match code {
            -1 => SendResult::Ok,
            1 => SendResult::GenericFailure,
            2 => SendResult::RadioOff,
            3 => SendResult::NullPdu,
            4 => SendResult::NoService,
            other => SendResult::Other(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            SendResult::Ok => -1,
            SendResult::GenericFailure => 1,
            SendResult::RadioOff => 2,
            SendResult::NullPdu => 3,
            SendResult::NoService => 4,
            SendResult::Other(code) => *code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SendResult::Ok)
    }
}

impl std::fmt::Display for SendResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendResult::Ok => write!(f, "ok"),
            SendResult::GenericFailure => write!(f, "generic failure"),
            SendResult::RadioOff => write!(f, "radio off"),
            SendResult::NullPdu => write!(f, "null pdu"),
            SendResult::NoService => write!(f, "no service"),
            SendResult::Other(code) => write!(f, "result code {}", code),
        }
    }
}

#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Whether this device is currently able to send SMS at all.
    fn can_send(&self) -> bool {
        true
    }

    /// Hand a message to the radio. Returning `Ok` means the attempt was
    /// accepted; delivery is reported separately.
    async fn send(&self, phone_number: &str, body: &str, message_id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_codes_map_both_ways() {
        for code in [-1, 1, 2, 3, 4, 0, 99] {
            assert_eq!(SendResult::from_code(code).code(), code);
        }
        assert!(SendResult::from_code(-1).is_success());
        assert_eq!(SendResult::from_code(4), SendResult::NoService);
        assert!(!SendResult::from_code(0).is_success());
    }
}

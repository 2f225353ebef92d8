use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Data key carrying the job's message id.
pub const MESSAGE_ID_KEY: &str = "messageId";

/// Inbound push event announcing a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub data: Option<HashMap<String, String>>,
}

impl PushMessage {
    pub fn for_message(message_id: impl Into<String>) -> Self {
        Self {
            from: None,
            data: Some(HashMap::from([(
                MESSAGE_ID_KEY.to_string(),
                message_id.into(),
            )])),
        }
    }

    pub fn message_id(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.get(MESSAGE_ID_KEY))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_from_payload() {
        let push: PushMessage =
            serde_json::from_str(r#"{"from":"pool","data":{"messageId":"m1"}}"#).unwrap();
        assert_eq!(push.from.as_deref(), Some("pool"));
        assert_eq!(push.message_id(), Some("m1"));
    }

    #[test]
    fn missing_data_or_id() {
        let empty: PushMessage = serde_json::from_str("{}").unwrap();
        assert!(empty.data.is_none());
        assert!(empty.message_id().is_none());

        let other: PushMessage = serde_json::from_str(r#"{"data":{"kind":"x"}}"#).unwrap();
        assert!(other.message_id().is_none());
    }
}

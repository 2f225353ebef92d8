use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle of a job in the shared store.
///
/// Stored remotely as its ordinal so documents written by the pool API
/// round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MessageState {
    Dispatching,
    Assigned,
    Sent,
}

impl TryFrom<u8> for MessageState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageState::Dispatching),
            1 => Ok(MessageState::Assigned),
            2 => Ok(MessageState::Sent),
            other => Err(format!("unknown message state {}", other)),
        }
    }
}

impl From<MessageState> for u8 {
    fn from(state: MessageState) -> Self {
        match state {
            MessageState::Dispatching => 0,
            MessageState::Assigned => 1,
            MessageState::Sent => 2,
        }
    }
}

impl std::fmt::Display for MessageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageState::Dispatching => write!(f, "dispatching"),
            MessageState::Assigned => write!(f, "assigned"),
            MessageState::Sent => write!(f, "sent"),
        }
    }
}

/// A unit of SMS delivery work, keyed remotely by its message id.
///
/// Fields the pool owns but this node never interprets (`address`,
/// `verifierCandidates`, ...) are kept in `extra` so a claim writes them back
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "phoneNum", default)]
    pub phone_number: Option<String>,
    #[serde(rename = "message", default)]
    pub body: Option<String>,
    #[serde(rename = "messageState")]
    pub state: MessageState,
    #[serde(
        rename = "verifierId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_verifier_id: Option<String>,
    #[serde(
        rename = "startTime",
        default,
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "finishTime",
        default,
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Job {
    pub fn new(phone_number: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            phone_number: Some(phone_number.into()),
            body: Some(body.into()),
            state: MessageState::Dispatching,
            assigned_verifier_id: None,
            created_at: Some(Utc::now()),
            finished_at: None,
            extra: Map::new(),
        }
    }

    /// True when the body can never be delivered as a single SMS.
    ///
    /// Length is measured in UTF-16 code units, as the SMS layer counts it.
    pub fn exceeds_length_limit(&self, limit: usize) -> bool {
        self.body
            .as_deref()
            .is_some_and(|body| body.encode_utf16().count() >= limit)
    }

    /// True when some verifier already holds the job.
    pub fn has_assignee(&self) -> bool {
        self.assigned_verifier_id
            .as_deref()
            .is_some_and(|id| !id.is_empty())
    }

    pub fn is_assigned_to(&self, verifier_id: &str) -> bool {
        self.state == MessageState::Assigned
            && self.assigned_verifier_id.as_deref() == Some(verifier_id)
    }
}

/// Field-level update applied by the assignee once delivery is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobUpdate {
    #[serde(rename = "messageState")]
    pub state: MessageState,
    #[serde(rename = "finishTime", with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,
}

impl JobUpdate {
    pub fn sent_at(finished_at: DateTime<Utc>) -> Self {
        Self {
            state: MessageState::Sent,
            finished_at,
        }
    }
}

/// Remote path of a job: `<network-id>/messages/<message-id>`.
pub fn job_path(network_id: &str, message_id: &str) -> String {
    format!("{}/messages/{}", network_id, message_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_job_is_dispatching_and_unassigned() {
        let job = Job::new("+15551234", "hi");
        assert_eq!(job.state, MessageState::Dispatching);
        assert!(!job.has_assignee());
        assert!(job.created_at.is_some());
        assert!(job.finished_at.is_none());
    }

    #[test]
    fn state_is_stored_as_ordinal() {
        let job = Job::new("+15551234", "hi");
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["messageState"], 0);
        assert_eq!(value["phoneNum"], "+15551234");
        assert_eq!(value["message"], "hi");
        assert!(value.get("verifierId").is_none());
    }

    #[test]
    fn unknown_state_is_rejected() {
        let result: Result<Job, _> = serde_json::from_value(json!({
            "phoneNum": "+1",
            "message": "x",
            "messageState": 7,
        }));
        assert!(result.is_err());
    }

    #[test]
    fn pool_fields_survive_round_trip() {
        let doc = json!({
            "phoneNum": "+15551234",
            "message": "code 1234",
            "verifierId": null,
            "verifierCandidates": ["a", "b"],
            "address": "0xabc",
            "startTime": 1_560_000_000_000i64,
            "finishTime": null,
            "messageState": 0,
        });
        let job: Job = serde_json::from_value(doc).unwrap();
        assert!(job.assigned_verifier_id.is_none());
        assert_eq!(job.created_at.unwrap().timestamp_millis(), 1_560_000_000_000);

        let back = serde_json::to_value(&job).unwrap();
        assert_eq!(back["verifierCandidates"], json!(["a", "b"]));
        assert_eq!(back["address"], "0xabc");
    }

    #[test]
    fn length_limit_is_inclusive() {
        let limit = 160;
        assert!(!Job::new("+1", "a".repeat(limit - 1)).exceeds_length_limit(limit));
        assert!(Job::new("+1", "a".repeat(limit)).exceeds_length_limit(limit));

        let mut no_body = Job::new("+1", "");
        no_body.body = None;
        assert!(!no_body.exceeds_length_limit(limit));
    }

    #[test]
    fn length_counts_utf16_code_units() {
        // Each emoji is two UTF-16 code units.
        let job = Job::new("+1", "\u{1F600}".repeat(80));
        assert_eq!(job.body.as_deref().map(|b| b.chars().count()), Some(80));
        assert!(job.exceeds_length_limit(160));
        assert!(!Job::new("+1", "\u{1F600}".repeat(79)).exceeds_length_limit(160));
    }

    #[test]
    fn empty_verifier_id_is_not_an_assignee() {
        let mut job = Job::new("+1", "hi");
        job.assigned_verifier_id = Some(String::new());
        assert!(!job.has_assignee());
        job.assigned_verifier_id = Some("v1".to_string());
        assert!(job.has_assignee());
    }

    #[test]
    fn is_assigned_to_requires_state_and_id() {
        let mut job = Job::new("+1", "hi");
        job.assigned_verifier_id = Some("v1".to_string());
        assert!(!job.is_assigned_to("v1"));
        job.state = MessageState::Assigned;
        assert!(job.is_assigned_to("v1"));
        assert!(!job.is_assigned_to("v2"));
    }

    #[test]
    fn sent_update_serializes_state_and_finish_time() {
        let at = DateTime::from_timestamp_millis(1_600_000_000_000).unwrap();
        let value = serde_json::to_value(JobUpdate::sent_at(at)).unwrap();
        assert_eq!(value, json!({"messageState": 2, "finishTime": 1_600_000_000_000i64}));
    }

    #[test]
    fn job_path_convention() {
        assert_eq!(job_path("alfajores", "m1"), "alfajores/messages/m1");
    }
}

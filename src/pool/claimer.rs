use std::sync::Arc;

use crate::pool::{job_path, Job, MessageState};
use crate::store::{JobStore, TxDecision};

/// Result of a claim attempt, as seen after the transaction settled.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    /// The job is now assigned to this verifier.
    Claimed(Job),
    /// Another verifier holds the job, it is terminal, or it failed validation.
    NotCommitted,
    /// The transaction committed on an empty location; nothing to do yet.
    Absent,
    /// The store reported a commit that does not assign the job to us.
    Inconsistent,
    /// The store could not run the transaction.
    Failed(String),
}

/// Decide what a claim transaction does with the value it observed.
///
/// - absent value: commit it unchanged so the store can re-run with fresh data
/// - body at or over the length limit: abort, the job is never deliverable
/// - not dispatching, or already holding a verifier: abort
/// - otherwise: assign to `verifier_id`
pub fn claim_decision(current: Option<Job>, verifier_id: &str, sms_length_limit: usize) -> TxDecision {
    let Some(mut job) = current else {
        tracing::debug!("Job value not available yet, committing unchanged");
        return TxDecision::Commit(None);
    };

    if job.exceeds_length_limit(sms_length_limit) {
        tracing::debug!(limit = sms_length_limit, "Job body exceeds SMS length limit");
        return TxDecision::Abort;
    }

    if job.state != MessageState::Dispatching || job.has_assignee() {
        tracing::debug!(state = %job.state, "Job already assigned or sent");
        return TxDecision::Abort;
    }

    job.state = MessageState::Assigned;
    job.assigned_verifier_id = Some(verifier_id.to_string());
    TxDecision::Commit(Some(job))
}

/// Claims jobs for the local verifier identity.
///
/// The read-check-write runs inside a store transaction, so among any number
/// of verifiers racing for the same job at most one commits an assignment.
/// Transient store faults are not retried here; redelivery of the push event
/// is the retry path.
pub struct JobClaimer {
    store: Arc<dyn JobStore>,
    verifier_id: String,
    network_id: String,
    sms_length_limit: usize,
}

impl JobClaimer {
    pub fn new(
        store: Arc<dyn JobStore>,
        verifier_id: impl Into<String>,
        network_id: impl Into<String>,
        sms_length_limit: usize,
    ) -> Self {
        Self {
            store,
            verifier_id: verifier_id.into(),
            network_id: network_id.into(),
            sms_length_limit,
        }
    }

    pub fn verifier_id(&self) -> &str {
        &self.verifier_id
    }

    /// Attempt to assign the job identified by `message_id` to this verifier.
    pub async fn claim(&self, message_id: &str) -> ClaimOutcome {
        let path = job_path(&self.network_id, message_id);
        tracing::debug!(message_id, path = %path, "Running claim transaction");

        let verifier_id = self.verifier_id.as_str();
        let limit = self.sms_length_limit;
        let outcome = match self
            .store
            .transact(&path, &|current| claim_decision(current, verifier_id, limit))
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(message_id, error = %e, "Claim transaction failed");
                return ClaimOutcome::Failed(e.to_string());
            }
        };

        if !outcome.committed {
            tracing::debug!(message_id, "Claim not committed, not sending SMS");
            return ClaimOutcome::NotCommitted;
        }

        let Some(job) = outcome.snapshot else {
            tracing::warn!(message_id, "Claim committed on an empty job, not sending SMS");
            return ClaimOutcome::Absent;
        };

        if !job.is_assigned_to(&self.verifier_id) {
            tracing::error!(
                message_id,
                verifier_id = %self.verifier_id,
                state = %job.state,
                "Claim committed but job is not assigned to this verifier"
            );
            return ClaimOutcome::Inconsistent;
        }

        tracing::info!(message_id, verifier_id = %self.verifier_id, "Job claimed");
        ClaimOutcome::Claimed(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatching() -> Job {
        Job::new("+15551234", "hi")
    }

    #[test]
    fn absent_value_commits_unchanged() {
        assert_eq!(claim_decision(None, "v1", 160), TxDecision::Commit(None));
    }

    #[test]
    fn unassigned_job_is_assigned() {
        let TxDecision::Commit(Some(job)) = claim_decision(Some(dispatching()), "v1", 160) else {
            panic!("expected commit");
        };
        assert_eq!(job.state, MessageState::Assigned);
        assert_eq!(job.assigned_verifier_id.as_deref(), Some("v1"));
        assert_eq!(job.phone_number.as_deref(), Some("+15551234"));
    }

    #[test]
    fn oversized_body_aborts() {
        let job = Job::new("+1", "x".repeat(160));
        assert_eq!(claim_decision(Some(job), "v1", 160), TxDecision::Abort);
    }

    #[test]
    fn assigned_or_sent_job_aborts() {
        let mut assigned = dispatching();
        assigned.state = MessageState::Assigned;
        assigned.assigned_verifier_id = Some("v2".to_string());
        assert_eq!(claim_decision(Some(assigned), "v1", 160), TxDecision::Abort);

        let mut sent = dispatching();
        sent.state = MessageState::Sent;
        assert_eq!(claim_decision(Some(sent), "v1", 160), TxDecision::Abort);
    }

    #[test]
    fn dispatching_job_with_verifier_aborts() {
        let mut job = dispatching();
        job.assigned_verifier_id = Some("v2".to_string());
        assert_eq!(claim_decision(Some(job), "v1", 160), TxDecision::Abort);
    }

    #[test]
    fn dispatching_job_with_empty_verifier_is_claimable() {
        let mut job = dispatching();
        job.assigned_verifier_id = Some(String::new());
        assert!(matches!(
            claim_decision(Some(job), "v1", 160),
            TxDecision::Commit(Some(_))
        ));
    }
}

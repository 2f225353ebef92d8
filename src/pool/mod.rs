//! Shared job model and the claim protocol.
//!
//! - [`job`]: the remote job document and its lifecycle states
//! - [`claimer`]: the optimistic transaction that assigns a job to this verifier

pub mod claimer;
pub mod job;

pub use claimer::{claim_decision, ClaimOutcome, JobClaimer};
pub use job::{job_path, Job, JobUpdate, MessageState};

//! Remote job store abstraction.
//!
//! The shared store is the single source of truth for job state across the
//! verifier pool. Every cross-device mutation goes through one of two paths:
//!
//! - [`JobStore::transact`]: optimistic read-check-write. The store calls the
//!   update function with the latest value it knows and commits the returned
//!   value only if nobody wrote in between; otherwise it calls the function
//!   again with fresh data.
//! - [`JobStore::update`]: field-level write, used only for fields the
//!   current assignee alone is allowed to touch.
//!
//! # Backends
//!
//! - [`MemoryJobStore`]: in-process map with per-key versions
//! - [`RestJobStore`]: realtime-database REST dialect using ETag preconditions

use async_trait::async_trait;

use crate::error::Result;
use crate::pool::{Job, JobUpdate};

pub mod memory;
pub mod rest;

pub use memory::MemoryJobStore;
pub use rest::RestJobStore;

/// What a transaction update function wants done with the value it saw.
#[derive(Debug, Clone, PartialEq)]
pub enum TxDecision {
    /// Write this value. `None` leaves the location empty.
    Commit(Option<Job>),
    /// Leave the stored value untouched and stop retrying.
    Abort,
}

/// Final result of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TxOutcome {
    pub committed: bool,
    /// Value at the location once the transaction settled.
    pub snapshot: Option<Job>,
}

/// Update function run inside a transaction. It may be invoked several times.
pub type TxFn<'a> = &'a (dyn Fn(Option<Job>) -> TxDecision + Send + Sync);

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Read the job stored at `path`.
    async fn get(&self, path: &str) -> Result<Option<Job>>;

    /// Run an optimistic compare-and-set transaction on `path`.
    async fn transact(&self, path: &str, update: TxFn<'_>) -> Result<TxOutcome>;

    /// Apply a field-level update to an existing job.
    async fn update(&self, path: &str, update: &JobUpdate) -> Result<()>;
}

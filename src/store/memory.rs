use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, VerifierError};
use crate::pool::{job_path, Job, JobUpdate};
use crate::store::{JobStore, TxDecision, TxFn, TxOutcome};

const DEFAULT_MAX_RETRIES: u32 = 25;

#[derive(Debug, Default)]
struct Entry {
    version: u64,
    job: Option<Job>,
}

/// In-process job store with per-key versioning.
///
/// Transactions read a snapshot, run the update function without holding the
/// lock, and commit only if the key's version did not move in the meantime.
/// Versions are never reset, so a delete followed by a re-insert still
/// invalidates an in-flight transaction.
#[derive(Debug)]
pub struct MemoryJobStore {
    entries: RwLock<HashMap<String, Entry>>,
    max_retries: u32,
    unavailable: AtomicBool,
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::with_max_retries(DEFAULT_MAX_RETRIES)
    }

    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_retries: max_retries.max(1),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Store a job at an explicit path, replacing whatever was there.
    pub async fn insert(&self, path: &str, job: Job) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(path.to_string()).or_default();
        entry.version += 1;
        entry.job = Some(job);
    }

    /// Publish a job under `<network-id>/messages/<generated-id>` and return the id.
    pub async fn push(&self, network_id: &str, job: Job) -> String {
        let message_id = Uuid::new_v4().to_string();
        self.insert(&job_path(network_id, &message_id), job).await;
        message_id
    }

    /// Simulate the store becoming unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(VerifierError::Store("store unreachable".to_string()));
        }
        Ok(())
    }

    async fn read(&self, path: &str) -> (Option<Job>, u64) {
        let entries = self.entries.read().await;
        entries
            .get(path)
            .map(|e| (e.job.clone(), e.version))
            .unwrap_or((None, 0))
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get(&self, path: &str) -> Result<Option<Job>> {
        self.check_available()?;
        Ok(self.read(path).await.0)
    }

    async fn transact(&self, path: &str, update: TxFn<'_>) -> Result<TxOutcome> {
        for attempt in 1..=self.max_retries {
            self.check_available()?;
            let (current, seen_version) = self.read(path).await;

            let decision = update(current.clone());
            // Let concurrent transactions on the same key interleave here.
            tokio::task::yield_now().await;

            let value = match decision {
                TxDecision::Abort => {
                    return Ok(TxOutcome {
                        committed: false,
                        snapshot: current,
                    })
                }
                TxDecision::Commit(value) => value,
            };

            let mut entries = self.entries.write().await;
            let entry = entries.entry(path.to_string()).or_default();
            if entry.version != seen_version {
                tracing::debug!(path, attempt, "Transaction conflict, retrying with fresh data");
                continue;
            }
            if entry.job.is_some() || value.is_some() {
                entry.version += 1;
                entry.job = value.clone();
            }
            return Ok(TxOutcome {
                committed: true,
                snapshot: value,
            });
        }

        Err(VerifierError::Conflict(path.to_string(), self.max_retries))
    }

    async fn update(&self, path: &str, update: &JobUpdate) -> Result<()> {
        self.check_available()?;
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(path)
            .filter(|e| e.job.is_some())
            .ok_or_else(|| VerifierError::Store(format!("no job at {}", path)))?;
        entry.version += 1;
        if let Some(job) = entry.job.as_mut() {
            job.state = update.state;
            job.finished_at = Some(update.finished_at);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::MessageState;
    use chrono::Utc;

    #[tokio::test]
    async fn absent_key_commits_nothing() {
        let store = MemoryJobStore::new();
        let outcome = store
            .transact("net/messages/none", &|current| TxDecision::Commit(current))
            .await
            .unwrap();
        assert!(outcome.committed);
        assert!(outcome.snapshot.is_none());
        assert!(store.get("net/messages/none").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn abort_returns_current_value() {
        let store = MemoryJobStore::new();
        store.insert("p", Job::new("+1", "hi")).await;
        let outcome = store.transact("p", &|_| TxDecision::Abort).await.unwrap();
        assert!(!outcome.committed);
        assert_eq!(outcome.snapshot.unwrap().body.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn commit_replaces_value() {
        let store = MemoryJobStore::new();
        store.insert("p", Job::new("+1", "hi")).await;
        let outcome = store
            .transact("p", &|current| {
                let mut job = current.unwrap();
                job.state = MessageState::Assigned;
                TxDecision::Commit(Some(job))
            })
            .await
            .unwrap();
        assert!(outcome.committed);
        let stored = store.get("p").await.unwrap().unwrap();
        assert_eq!(stored.state, MessageState::Assigned);
    }

    #[tokio::test]
    async fn update_on_missing_job_fails() {
        let store = MemoryJobStore::new();
        let result = store.update("p", &JobUpdate::sent_at(Utc::now())).await;
        assert!(matches!(result, Err(VerifierError::Store(_))));
    }

    #[tokio::test]
    async fn unavailable_store_rejects_operations() {
        let store = MemoryJobStore::new();
        store.set_unavailable(true);
        assert!(store.get("p").await.is_err());
        assert!(store.transact("p", &|_| TxDecision::Abort).await.is_err());
        store.set_unavailable(false);
        assert!(store.get("p").await.is_ok());
    }

    #[tokio::test]
    async fn push_generates_distinct_ids() {
        let store = MemoryJobStore::new();
        let a = store.push("net", Job::new("+1", "a")).await;
        let b = store.push("net", Job::new("+1", "b")).await;
        assert_ne!(a, b);
        assert!(store.get(&job_path("net", &a)).await.unwrap().is_some());
    }
}

//! Job storage.
//!
//! [`JobStore`] owns job records and the idempotency index. The only
//! implementation is [`InMemoryJobStore`]: records live for the process
//! lifetime and are gone after a restart.

use std::time::Duration;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::types::PreprocessJob;

/// Outcome of [`JobStore::insert`].
#[derive(Debug, Clone, PartialEq)]
pub enum Insertion {
    /// The job was stored.
    Created,
    /// The idempotency hash already points at a live job; nothing was
    /// stored.
    Existing(PreprocessJob),
}

/// Storage for preprocess jobs.
pub trait JobStore: Send + Sync {
    /// Store a new job, optionally bound to an idempotency hash.
    ///
    /// When the hash already maps to a job that is still stored, that job
    /// is returned instead and `job` is discarded. Check and insert are
    /// atomic with respect to other inserts of the same hash.
    fn insert(&self, job: PreprocessJob, idempotency_hash: Option<String>) -> Insertion;

    /// Look up a job by id.
    fn get(&self, job_id: &Uuid) -> Option<PreprocessJob>;

    /// Apply `mutate` to a non-terminal job and bump `updated_at`.
    ///
    /// Returns `false` when the job is missing or already terminal.
    fn update(&self, job_id: &Uuid, mutate: &mut dyn FnMut(&mut PreprocessJob)) -> bool;

    /// Number of stored jobs.
    fn len(&self) -> usize;

    /// Whether the store holds no jobs.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove terminal jobs last updated more than `age` ago, along with
    /// idempotency entries that pointed at them. Returns the number of
    /// jobs removed.
    fn sweep_terminal_older_than(&self, age: Duration) -> usize;
}

/// DashMap-backed job store.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: DashMap<Uuid, PreprocessJob>,
    idempotency: DashMap<String, Uuid>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for InMemoryJobStore {
    fn insert(&self, job: PreprocessJob, idempotency_hash: Option<String>) -> Insertion {
        let Some(hash) = idempotency_hash else {
            self.jobs.insert(job.job_id, job);
            return Insertion::Created;
        };

        match self.idempotency.entry(hash) {
            Entry::Occupied(mut entry) => {
                if let Some(existing) = self.jobs.get(entry.get()) {
                    return Insertion::Existing(existing.clone());
                }
                entry.insert(job.job_id);
                self.jobs.insert(job.job_id, job);
                Insertion::Created
            }
            Entry::Vacant(entry) => {
                entry.insert(job.job_id);
                self.jobs.insert(job.job_id, job);
                Insertion::Created
            }
        }
    }

    fn get(&self, job_id: &Uuid) -> Option<PreprocessJob> {
        self.jobs.get(job_id).map(|job| job.clone())
    }

    fn update(&self, job_id: &Uuid, mutate: &mut dyn FnMut(&mut PreprocessJob)) -> bool {
        match self.jobs.get_mut(job_id) {
            Some(mut job) if !job.status.is_terminal() => {
                mutate(job.value_mut());
                job.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }

    fn len(&self) -> usize {
        self.jobs.len()
    }

    fn sweep_terminal_older_than(&self, age: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return 0;
        };

        let before = self.jobs.len();
        self.jobs
            .retain(|_, job| !(job.status.is_terminal() && job.updated_at < cutoff));
        let removed = before.saturating_sub(self.jobs.len());

        if removed > 0 {
            self.idempotency
                .retain(|_, job_id| self.jobs.contains_key(job_id));
            debug!(removed = removed, "Swept terminal jobs");
        }
        removed
    }
}

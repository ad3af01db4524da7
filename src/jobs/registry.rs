//! In-memory job table.

use super::broadcast::{ProgressBroadcaster, ProgressSubscription};
use crate::error::{Error, Result};
use crate::types::{Job, JobId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

struct JobRecord {
    job: Job,
    cancel: CancellationToken,
}

/// Registry of every job created in this process
///
/// A single lock guards the table; readers always get owned snapshots. Jobs are
/// never evicted.
#[derive(Clone)]
pub struct JobRegistry {
    jobs: Arc<Mutex<HashMap<JobId, JobRecord>>>,
    broadcaster: ProgressBroadcaster,
}

impl JobRegistry {
    /// Empty registry publishing through `broadcaster`
    pub fn new(broadcaster: ProgressBroadcaster) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            broadcaster,
        }
    }

    /// Insert a new job in the `created` phase
    pub fn create_job(&self, id: JobId, cancel: CancellationToken) -> Job {
        let job = Job::new(id.clone());
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.insert(
            id,
            JobRecord {
                job: job.clone(),
                cancel,
            },
        );
        job
    }

    /// Apply `mutate` to a job and broadcast the result
    ///
    /// Unknown ids and finished jobs are left untouched and nothing is published.
    /// Returns the new snapshot when the update was applied.
    pub fn update_job<F>(&self, id: &JobId, mutate: F) -> Option<Job>
    where
        F: FnOnce(&mut Job),
    {
        let snapshot = {
            let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
            let record = jobs.get_mut(id)?;
            if record.job.done {
                tracing::trace!(job_id = %id, "Ignoring update to finished job");
                return None;
            }

            mutate(&mut record.job);
            if record.job.phase.is_terminal() {
                let phase = record.job.phase;
                record.job.finish(phase);
            }
            record.job.revision += 1;
            record.job.clone()
        };

        self.broadcaster.publish(&snapshot);
        Some(snapshot)
    }

    /// Snapshot of one job
    pub fn get_job(&self, id: &JobId) -> Result<Job> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.get(id)
            .map(|r| r.job.clone())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Snapshots of every job, in no particular order
    pub fn list_jobs(&self) -> Vec<Job> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.values().map(|r| r.job.clone()).collect()
    }

    /// Cancellation handle of a job
    pub fn cancel_token(&self, id: &JobId) -> Result<CancellationToken> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.get(id)
            .map(|r| r.cancel.clone())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Subscribe to a job's snapshots
    ///
    /// The registry lock is held while the subscriber is registered, so no update
    /// can land between the seed snapshot and registration.
    pub fn subscribe(&self, id: &JobId) -> Result<ProgressSubscription> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let record = jobs
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        Ok(self.broadcaster.subscribe(record.job.clone()))
    }
}

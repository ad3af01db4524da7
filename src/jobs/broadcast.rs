//! Fan-out of job snapshots to any number of subscribers.

use crate::types::{Job, JobId, SubscriptionId};
use futures::Stream;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

struct Subscriber {
    id: SubscriptionId,
    tx: mpsc::Sender<Job>,
    /// Revision of the newest snapshot queued for this subscriber
    last_revision: u64,
}

#[derive(Default)]
struct BroadcastState {
    next_id: u64,
    subscribers: HashMap<JobId, Vec<Subscriber>>,
}

/// Non-blocking per-job snapshot broadcaster
///
/// Each subscriber owns a bounded channel. Publishing never waits: a full
/// channel loses that update for that subscriber only, and snapshots older than
/// the last one queued for a subscriber are skipped.
#[derive(Clone)]
pub struct ProgressBroadcaster {
    state: Arc<Mutex<BroadcastState>>,
    buffer: usize,
}

impl ProgressBroadcaster {
    /// Broadcaster whose subscriber channels hold `buffer` snapshots
    pub fn new(buffer: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(BroadcastState::default())),
            buffer: buffer.max(1),
        }
    }

    /// Register a subscriber seeded with `snapshot`
    ///
    /// A subscriber to an already finished job gets the snapshot and then the
    /// end of the stream; it is never registered.
    pub fn subscribe(&self, snapshot: Job) -> ProgressSubscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        let job_id = snapshot.id.clone();
        let revision = snapshot.revision;
        let done = snapshot.done;

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.next_id += 1;
        let id = SubscriptionId(state.next_id);

        // The channel is fresh, so the seed always fits.
        let _ = tx.try_send(snapshot);
        if !done {
            state
                .subscribers
                .entry(job_id.clone())
                .or_default()
                .push(Subscriber {
                    id,
                    tx,
                    last_revision: revision,
                });
        }
        drop(state);

        tracing::debug!(job_id = %job_id, subscription = id.0, "Progress subscriber registered");

        ProgressSubscription {
            job_id,
            id,
            rx,
            broadcaster: self.clone(),
            finished: false,
        }
    }

    /// Remove a subscriber and close its channel; repeated calls are no-ops
    pub fn unsubscribe(&self, job_id: &JobId, id: SubscriptionId) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(subs) = state.subscribers.get_mut(job_id) {
            subs.retain(|s| s.id != id);
            if subs.is_empty() {
                state.subscribers.remove(job_id);
            }
        }
    }

    /// Offer a snapshot to every subscriber of its job
    ///
    /// Terminal snapshots also release all of the job's subscribers, so their
    /// streams end once the buffered snapshots are read.
    pub fn publish(&self, snapshot: &Job) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(subs) = state.subscribers.get_mut(&snapshot.id) else {
            return;
        };

        subs.retain_mut(|sub| {
            if snapshot.revision <= sub.last_revision {
                return true;
            }
            match sub.tx.try_send(snapshot.clone()) {
                Ok(()) => {
                    sub.last_revision = snapshot.revision;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    tracing::trace!(
                        job_id = %snapshot.id,
                        subscription = sub.id.0,
                        revision = snapshot.revision,
                        "Subscriber buffer full, dropping update"
                    );
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            }
        });

        if snapshot.done || subs.is_empty() {
            state.subscribers.remove(&snapshot.id);
        }
    }

    /// Number of live subscribers for a job
    pub fn subscriber_count(&self, job_id: &JobId) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.subscribers.get(job_id).map_or(0, Vec::len)
    }
}

/// One observer's stream of snapshots for one job
///
/// The first snapshot is the job state at subscribe time. The stream ends after
/// the first snapshot with `done == true`, or when the broadcaster releases it.
/// Dropping the subscription unsubscribes it.
pub struct ProgressSubscription {
    job_id: JobId,
    id: SubscriptionId,
    rx: mpsc::Receiver<Job>,
    broadcaster: ProgressBroadcaster,
    finished: bool,
}

impl ProgressSubscription {
    /// Job being observed
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Subscription identifier
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next snapshot, or `None` once the stream has ended
    pub async fn next(&mut self) -> Option<Job> {
        if self.finished {
            return None;
        }
        let job = self.rx.recv().await;
        match &job {
            Some(j) if j.done => self.finished = true,
            None => self.finished = true,
            _ => {}
        }
        job
    }

    /// Adapt into a [`Stream`]
    pub fn into_stream(self) -> impl Stream<Item = Job> + Send + 'static {
        futures::stream::unfold(self, |mut sub| async move {
            let job = sub.next().await?;
            Some((job, sub))
        })
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.broadcaster.unsubscribe(&self.job_id, self.id);
    }
}

impl std::fmt::Debug for ProgressSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSubscription")
            .field("job_id", &self.job_id)
            .field("id", &self.id)
            .field("finished", &self.finished)
            .finish()
    }
}

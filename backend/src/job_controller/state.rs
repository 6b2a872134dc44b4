//! Tracks report jobs while their pipelines run on blocking workers.
//!
//! - `JobsState`: clonable shared state, injected into the Actix app in `main.rs`.
//! - `JobUpdate`: a status change sent by a running job.
//! - `start_job_updater`: the single task that applies `JobUpdate`s to `JobsState`.
//!
//! A job moves `Pending` -> `InProgress(stage)`... -> `Completed` or `Failed`.

use common::jobs::JobStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// Shared status of every report job, keyed by job id.
#[derive(Clone)]
pub struct JobsState {
    /// Read by `GET /api/reports/status/{job_id}`, written by `start_job_updater`
    /// and by the submit handler when it registers a new job.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Running jobs push their progress here instead of locking `jobs` themselves.
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    /// Builds the state together with the receiver `start_job_updater` drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(capacity);
        let state = JobsState {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    pub async fn register(&self, job_id: &str) {
        self.jobs
            .write()
            .await
            .insert(job_id.to_string(), JobStatus::Pending);
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

/// Applies every received `JobUpdate` to `state`. Runs until all senders are dropped.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        jobs.insert(update.job_id, update.status);
    }
}

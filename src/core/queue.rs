use crate::core::{Job, JobId, JobRecord, JobStatus, MashupRequest};
use crate::utils::error::{MashupError, Result};
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

#[derive(Default)]
struct RegistryInner {
    records: HashMap<JobId, JobRecord>,
    // insertion order, oldest first
    order: VecDeque<JobId>,
}

/// Status table shared by the web handlers and the worker.
#[derive(Clone)]
pub struct JobRegistry {
    inner: Arc<RwLock<RegistryInner>>,
    max_tracked: usize,
}

impl JobRegistry {
    pub fn new(max_tracked: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner::default())),
            max_tracked: max_tracked.max(1),
        }
    }

    pub async fn insert(&self, record: JobRecord) {
        let mut inner = self.inner.write().await;
        inner.order.push_back(record.id);
        inner.records.insert(record.id, record);

        // 超過上限時淘汰最舊的已完成工作
        while inner.records.len() > self.max_tracked {
            let position = inner.order.iter().position(|id| {
                inner
                    .records
                    .get(id)
                    .map(|r| r.status.is_finished())
                    .unwrap_or(true)
            });
            match position {
                Some(index) => {
                    if let Some(id) = inner.order.remove(index) {
                        inner.records.remove(&id);
                    }
                }
                None => break,
            }
        }
    }

    pub async fn remove(&self, id: JobId) {
        let mut inner = self.inner.write().await;
        inner.records.remove(&id);
        inner.order.retain(|other| *other != id);
    }

    pub async fn get(&self, id: JobId) -> Option<JobRecord> {
        self.inner.read().await.records.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn count_with_status(&self, status: JobStatus) -> usize {
        self.inner
            .read()
            .await
            .records
            .values()
            .filter(|r| r.status == status)
            .count()
    }

    pub async fn mark_running(&self, id: JobId) {
        self.update(id, |record| {
            record.status = JobStatus::Running;
            record.started_at = Some(Utc::now());
        })
        .await;
    }

    pub async fn mark_completed(&self, id: JobId, detail: String) {
        self.update(id, |record| {
            record.status = JobStatus::Completed;
            record.detail = Some(detail);
            record.finished_at = Some(Utc::now());
        })
        .await;
    }

    pub async fn mark_failed(&self, id: JobId, error: String) {
        self.update(id, |record| {
            record.status = JobStatus::Failed;
            record.error = Some(error);
            record.finished_at = Some(Utc::now());
        })
        .await;
    }

    async fn update<F: FnOnce(&mut JobRecord)>(&self, id: JobId, apply: F) {
        let mut inner = self.inner.write().await;
        match inner.records.get_mut(&id) {
            Some(record) => apply(record),
            None => tracing::debug!("Job {} is no longer tracked", id),
        }
    }
}

/// Producer side of the job queue. Cheap to clone.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<Job>,
    registry: JobRegistry,
    capacity: usize,
}

/// Consumer side, owned by the worker.
pub struct JobReceiver {
    pub(crate) receiver: mpsc::Receiver<Job>,
    pub(crate) registry: JobRegistry,
}

impl JobReceiver {
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub async fn recv(&mut self) -> Option<Job> {
        self.receiver.recv().await
    }
}

impl JobQueue {
    pub fn new(capacity: usize, max_tracked: usize) -> (Self, JobReceiver) {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let registry = JobRegistry::new(max_tracked);
        (
            Self {
                sender,
                registry: registry.clone(),
                capacity,
            },
            JobReceiver { receiver, registry },
        )
    }

    /// Registers the job as queued, then hands it to the worker.
    pub async fn submit(&self, request: MashupRequest) -> Result<JobId> {
        let id = JobId::new();
        self.registry.insert(JobRecord::queued(id, &request)).await;

        match self.sender.try_send(Job { id, request }) {
            Ok(()) => {
                tracing::info!("📝 Job {} queued", id);
                Ok(id)
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.registry.remove(id).await;
                tracing::warn!("⚠️ Queue full, rejected job {}", id);
                Err(MashupError::QueueFull {
                    capacity: self.capacity,
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.registry.remove(id).await;
                Err(MashupError::QueueClosed)
            }
        }
    }

    pub async fn status(&self, id: JobId) -> Option<JobRecord> {
        self.registry.get(id).await
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }
}

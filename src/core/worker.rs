use crate::core::queue::{JobReceiver, JobRegistry};
use crate::core::{Job, JobRunner};
use crate::utils::error::MashupError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

pub const ABORTED_JOB_MESSAGE: &str = "The mashup stopped unexpectedly. Please try again.";

/// Pulls jobs off the queue and runs them with bounded parallelism and a per-job timeout.
pub struct Worker<R: JobRunner> {
    jobs: JobReceiver,
    runner: Arc<R>,
    concurrency: usize,
    job_timeout: Duration,
}

impl<R: JobRunner> Worker<R> {
    pub fn new(jobs: JobReceiver, runner: Arc<R>, concurrency: usize, job_timeout: Duration) -> Self {
        Self {
            jobs,
            runner,
            concurrency: concurrency.max(1),
            job_timeout,
        }
    }

    /// Returns once the queue is closed and every in-flight job has finished.
    pub async fn run(mut self) {
        tracing::info!(
            "👷 Worker started (concurrency {}, timeout {:?})",
            self.concurrency,
            self.job_timeout
        );
        let slots = Arc::new(Semaphore::new(self.concurrency));

        while let Some(job) = self.jobs.recv().await {
            let permit = match Arc::clone(&slots).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let runner = Arc::clone(&self.runner);
            let registry = self.jobs.registry().clone();
            let timeout = self.job_timeout;
            let id = job.id;

            tokio::spawn(async move {
                let task = tokio::spawn({
                    let registry = registry.clone();
                    async move { process_job(runner.as_ref(), &registry, job, timeout).await }
                });
                // A panicking runner must not leave the record stuck in `running`.
                if let Err(e) = task.await {
                    tracing::error!("Mashup Error: job {} aborted: {}", id, e);
                    registry
                        .mark_failed(id, ABORTED_JOB_MESSAGE.to_string())
                        .await;
                }
                drop(permit);
            });
        }

        // 等待進行中的工作結束
        let _ = slots.acquire_many(self.concurrency as u32).await;
        tracing::info!("👷 Worker stopped");
    }
}

pub async fn process_job<R: JobRunner + ?Sized>(
    runner: &R,
    registry: &JobRegistry,
    job: Job,
    timeout: Duration,
) {
    let Job { id, request } = job;
    registry.mark_running(id).await;
    tracing::info!(
        "▶️ Job {} started: '{}' N={} Y={}",
        id,
        request.singer,
        request.video_count,
        request.clip_seconds
    );
    let started = Instant::now();

    match tokio::time::timeout(timeout, runner.run(&request)).await {
        Ok(Ok(receipt)) => {
            tracing::info!("✅ Job {} completed in {:?}: {}", id, started.elapsed(), receipt);
            registry.mark_completed(id, receipt).await;
        }
        Ok(Err(e)) => {
            tracing::error!(
                "Mashup Error: {} (job {}, category {:?}, severity {:?}, retryable {})",
                e,
                id,
                e.category(),
                e.severity(),
                e.is_retryable()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            registry.mark_failed(id, e.user_friendly_message()).await;
        }
        Err(_) => {
            let e = MashupError::JobTimeout {
                seconds: timeout.as_secs(),
            };
            tracing::error!("Mashup Error: {} (job {})", e, id);
            registry.mark_failed(id, e.user_friendly_message()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::queue::JobQueue;
    use crate::core::{JobStatus, MashupRequest};
    use crate::utils::error::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedRunner {
        delay: Duration,
        fail_for: Option<String>,
        panic_for: Option<String>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ScriptedRunner {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                fail_for: None,
                panic_for: None,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl JobRunner for ScriptedRunner {
        async fn run(&self, request: &MashupRequest) -> Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.panic_for.as_deref() == Some(request.singer.as_str()) {
                panic!("runner crashed");
            }
            if self.fail_for.as_deref() == Some(request.singer.as_str()) {
                return Err(MashupError::NoAudioDownloaded);
            }
            Ok(format!("emailed to {}", request.email))
        }
    }

    fn request(singer: &str) -> MashupRequest {
        MashupRequest::new(singer, 11, 25, "fan@example.com")
    }

    #[tokio::test]
    async fn test_worker_completes_and_fails_jobs() {
        let (queue, receiver) = JobQueue::new(10, 100);
        let mut runner = ScriptedRunner::new(Duration::from_millis(5));
        runner.fail_for = Some("Nobody".to_string());
        let worker = Worker::new(receiver, Arc::new(runner), 1, Duration::from_secs(5));

        let ok = queue.submit(request("Adele")).await.unwrap();
        let bad = queue.submit(request("Nobody")).await.unwrap();
        let registry = queue.registry().clone();
        drop(queue);

        worker.run().await;

        let ok = registry.get(ok).await.unwrap();
        assert_eq!(ok.status, JobStatus::Completed);
        assert_eq!(ok.detail.as_deref(), Some("emailed to fan@example.com"));

        let bad = registry.get(bad).await.unwrap();
        assert_eq!(bad.status, JobStatus::Failed);
        assert_eq!(
            bad.error.as_deref(),
            Some("No audio files downloaded. Try a different singer name.")
        );
    }

    #[tokio::test]
    async fn test_worker_enforces_timeout() {
        let (queue, receiver) = JobQueue::new(10, 100);
        let runner = ScriptedRunner::new(Duration::from_secs(30));
        let worker = Worker::new(receiver, Arc::new(runner), 1, Duration::from_secs(1));

        let id = queue.submit(request("Adele")).await.unwrap();
        let registry = queue.registry().clone();
        drop(queue);

        worker.run().await;

        let record = registry.get(id).await.unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(
            record.error.as_deref(),
            Some("The mashup took longer than 1 seconds and was stopped.")
        );
    }

    #[tokio::test]
    async fn test_single_worker_runs_jobs_one_at_a_time() {
        let (queue, receiver) = JobQueue::new(10, 100);
        let runner = Arc::new(ScriptedRunner::new(Duration::from_millis(20)));
        let worker = Worker::new(receiver, Arc::clone(&runner), 1, Duration::from_secs(5));

        for singer in ["A", "B", "C"] {
            queue.submit(request(singer)).await.unwrap();
        }
        drop(queue);
        worker.run().await;

        assert_eq!(runner.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_parallel_worker_overlaps_jobs() {
        let (queue, receiver) = JobQueue::new(10, 100);
        let runner = Arc::new(ScriptedRunner::new(Duration::from_millis(100)));
        let worker = Worker::new(receiver, Arc::clone(&runner), 3, Duration::from_secs(5));

        for singer in ["A", "B", "C"] {
            queue.submit(request(singer)).await.unwrap();
        }
        let registry = queue.registry().clone();
        drop(queue);
        worker.run().await;

        assert!(runner.peak.load(Ordering::SeqCst) > 1);
        assert_eq!(registry.count_with_status(JobStatus::Completed).await, 3);
    }

    #[tokio::test]
    async fn test_panicking_job_is_marked_failed() {
        let (queue, receiver) = JobQueue::new(10, 100);
        let mut runner = ScriptedRunner::new(Duration::from_millis(5));
        runner.panic_for = Some("Crash".to_string());
        let worker = Worker::new(receiver, Arc::new(runner), 1, Duration::from_secs(5));

        let crashed = queue.submit(request("Crash")).await.unwrap();
        let next = queue.submit(request("Adele")).await.unwrap();
        let registry = queue.registry().clone();
        drop(queue);

        worker.run().await;

        let crashed = registry.get(crashed).await.unwrap();
        assert_eq!(crashed.status, JobStatus::Failed);
        assert_eq!(crashed.error.as_deref(), Some(ABORTED_JOB_MESSAGE));
        assert!(crashed.finished_at.is_some());

        let next = registry.get(next).await.unwrap();
        assert_eq!(next.status, JobStatus::Completed);
    }
}

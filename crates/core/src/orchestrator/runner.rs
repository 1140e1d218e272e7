//! Job orchestrator implementation.
//!
//! Every transition happens under the job lock and is published to the sink
//! before the lock is released, so observers see transitions in the order
//! they occur. Background work never holds the lock.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::engine::{TranscodeEngine, TranscodeInvoker, ENGINE_SUCCESS};
use crate::ingest::{remove_partial, IngestError, SourceHandle, SourceIngestor, StagedFile};
use crate::metrics::{
    BYTES_RECLAIMED, BYTES_STAGED, ENGINE_RUNS, JOB_TRANSITIONS, SUBMISSIONS_REJECTED,
    TRANSCODE_DURATION,
};
use crate::status::{StatusDetail, StatusEvent, StatusSink};
use crate::storage::{StorageDirs, StorageError, StorageGate};

use super::config::JobConfig;
use super::types::{JobFailure, JobSnapshot, JobState, SubmitError};

/// The single job record. Only touched under `Inner::job`.
struct Job {
    id: String,
    run: u64,
    state: JobState,
    source: Option<String>,
    staged: Option<StagedFile>,
    output_path: Option<PathBuf>,
    sequence: u64,
    last_output_stamp: i64,
    updated_at: DateTime<Utc>,
}

impl Job {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            run: 0,
            state: JobState::Idle,
            source: None,
            staged: None,
            output_path: None,
            sequence: 0,
            last_output_stamp: 0,
            updated_at: Utc::now(),
        }
    }

    fn snapshot(&self) -> JobSnapshot {
        let last_error = match &self.state {
            JobState::Failed { reason } => Some(reason.clone()),
            _ => None,
        };
        JobSnapshot {
            job_id: self.id.clone(),
            run: self.run,
            state: self.state.clone(),
            source: self.source.clone(),
            staged_path: self.staged.as_ref().map(|s| s.path.clone()),
            staged_size_bytes: self.staged.as_ref().map(|s| s.size_bytes),
            output_path: self.output_path.clone(),
            last_error,
            sequence: self.sequence,
            updated_at: self.updated_at,
        }
    }

    /// Picks an output path whose timestamp is strictly greater than any
    /// previous run's and that does not already exist on disk.
    fn next_output_path(&mut self, config: &JobConfig, output_dir: &Path) -> PathBuf {
        let mut stamp = Utc::now()
            .timestamp_millis()
            .max(self.last_output_stamp + 1);
        let mut path = config.output_path(output_dir, stamp);
        while path.exists() {
            stamp += 1;
            path = config.output_path(output_dir, stamp);
        }
        self.last_output_stamp = stamp;
        path
    }
}

struct Inner {
    config: JobConfig,
    gate: Arc<dyn StorageGate>,
    ingestor: SourceIngestor,
    invoker: TranscodeInvoker,
    sink: Arc<dyn StatusSink>,
    runtime: Handle,
    job: Mutex<Job>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Job> {
        // Transitions are single assignments, so a poisoned record is still consistent.
        self.job.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves the job to `state` and publishes the transition.
    fn transition(&self, job: &mut Job, state: JobState, detail: StatusDetail) {
        debug!(
            "Job {} transition: {} -> {}",
            job.id,
            job.state.name(),
            state.name()
        );
        job.sequence += 1;
        job.state = state;
        job.updated_at = Utc::now();
        JOB_TRANSITIONS
            .with_label_values(&[job.state.name()])
            .inc();

        self.sink.publish(StatusEvent {
            job_id: job.id.clone(),
            run: job.run,
            sequence: job.sequence,
            at: job.updated_at,
            state: job.state.clone(),
            detail,
        });
    }

    fn reject(&self, err: SubmitError) -> SubmitError {
        warn!("Submission rejected: {}", err);
        SUBMISSIONS_REJECTED.with_label_values(&[err.kind()]).inc();
        err
    }

    async fn run_ingest(self: Arc<Self>, handle: Arc<dyn SourceHandle>, staged_path: PathBuf) {
        let source_desc = handle.describe();
        let result = self.ingest_contained(handle, &staged_path).await;

        let mut job = self.lock();
        match result {
            Ok(staged) => {
                BYTES_STAGED.inc_by(staged.size_bytes);
                let detail = StatusDetail::Staged {
                    path: staged.path.clone(),
                    size_bytes: staged.size_bytes,
                };
                job.staged = Some(staged);
                self.transition(&mut job, JobState::Staged, detail);
            }
            Err(e) => {
                warn!("Ingest of {} failed: {}", source_desc, e);
                let reason = JobFailure::from(&e);
                self.transition(
                    &mut job,
                    JobState::Failed { reason },
                    StatusDetail::Failure {
                        message: e.to_string(),
                        reclaimed_bytes: None,
                    },
                );
            }
        }
    }

    /// Runs the copy in its own task. A source that panics fails the run as
    /// unreadable instead of leaving the job in `Ingesting`.
    async fn ingest_contained(
        &self,
        handle: Arc<dyn SourceHandle>,
        staged_path: &Path,
    ) -> Result<StagedFile, IngestError> {
        let source_desc = handle.describe();
        let ingestor = self.ingestor.clone();
        let destination = staged_path.to_path_buf();
        let task = self
            .runtime
            .spawn(async move { ingestor.ingest(handle.as_ref(), &destination).await });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!("Ingest of {} aborted: {}", source_desc, e);
                remove_partial(staged_path).await;
                Err(IngestError::unreadable(
                    source_desc,
                    std::io::Error::other(format!("source aborted: {}", e)),
                ))
            }
        }
    }

    async fn run_transcode(self: Arc<Self>, staged: StagedFile, output_path: PathBuf) {
        let started = Instant::now();
        let code = self.invoker.invoke(&staged.path, &output_path).await;
        TRANSCODE_DURATION.observe(started.elapsed().as_secs_f64());

        // The staged file goes away whatever the outcome, before anyone
        // can observe a terminal state.
        let reclaimed_bytes = remove_staged(&staged).await;

        let output_size = if code == ENGINE_SUCCESS {
            match tokio::fs::metadata(&output_path).await {
                Ok(meta) if meta.len() > 0 => Some(meta.len()),
                Ok(_) => {
                    warn!("Engine output {:?} is empty", output_path);
                    None
                }
                Err(e) => {
                    warn!("Engine output {:?} is missing: {}", output_path, e);
                    None
                }
            }
        } else {
            None
        };

        let mut job = self.lock();
        job.staged = None;

        match output_size {
            Some(output_size_bytes) => {
                ENGINE_RUNS.with_label_values(&["success"]).inc();
                info!(
                    "Transcode finished: {:?} ({} bytes), reclaimed {} bytes",
                    output_path, output_size_bytes, reclaimed_bytes
                );
                self.transition(
                    &mut job,
                    JobState::Succeeded,
                    StatusDetail::Completed {
                        output_path,
                        output_size_bytes,
                        reclaimed_bytes,
                    },
                );
            }
            None => {
                ENGINE_RUNS.with_label_values(&["failure"]).inc();
                let reason = JobFailure::TranscodeError { code };
                self.transition(
                    &mut job,
                    JobState::Failed {
                        reason: reason.clone(),
                    },
                    StatusDetail::Failure {
                        message: reason.to_string(),
                        reclaimed_bytes: Some(reclaimed_bytes),
                    },
                );
            }
        }
    }
}

/// Deletes the staged file, returning the bytes freed.
async fn remove_staged(staged: &StagedFile) -> u64 {
    match tokio::fs::remove_file(&staged.path).await {
        Ok(()) => {
            BYTES_RECLAIMED.inc_by(staged.size_bytes);
            info!(
                "Removed staged file {:?}, reclaimed {} bytes",
                staged.path, staged.size_bytes
            );
            staged.size_bytes
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Staged file {:?} already gone", staged.path);
            0
        }
        Err(e) => {
            error!("Failed to remove staged file {:?}: {}", staged.path, e);
            0
        }
    }
}

/// Drives a single job through ingest, transcode and cleanup.
///
/// Cheap to clone; clones share the same job.
#[derive(Clone)]
pub struct JobOrchestrator {
    inner: Arc<Inner>,
}

impl JobOrchestrator {
    /// Create a new orchestrator with an `Idle` job.
    ///
    /// Background work is spawned on the current Tokio runtime, so this must
    /// be called from within one (see [`with_runtime`](Self::with_runtime)
    /// otherwise).
    pub fn new(
        config: JobConfig,
        gate: Arc<dyn StorageGate>,
        engine: Arc<dyn TranscodeEngine>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self::with_runtime(config, gate, engine, sink, Handle::current())
    }

    /// Create a new orchestrator spawning its work on `runtime`.
    pub fn with_runtime(
        config: JobConfig,
        gate: Arc<dyn StorageGate>,
        engine: Arc<dyn TranscodeEngine>,
        sink: Arc<dyn StatusSink>,
        runtime: Handle,
    ) -> Self {
        let ingestor = SourceIngestor::new(config.chunk_size);
        let invoker = TranscodeInvoker::new(engine);
        let job = Job::new();
        info!(
            "Created job {} (engine: {})",
            job.id,
            invoker.engine_name()
        );

        Self {
            inner: Arc::new(Inner {
                config,
                gate,
                ingestor,
                invoker,
                sink,
                runtime,
                job: Mutex::new(job),
            }),
        }
    }

    pub fn job_id(&self) -> String {
        self.inner.lock().id.clone()
    }

    pub fn engine_name(&self) -> &str {
        self.inner.invoker.engine_name()
    }

    pub async fn engine_version(&self) -> Option<String> {
        self.inner.invoker.engine_version().await
    }

    /// Resolve the working directories without touching the job.
    ///
    /// Lets the embedding process surface storage problems at startup; the
    /// same check runs again on every selection.
    pub fn verify_storage(&self) -> Result<StorageDirs, StorageError> {
        self.inner.gate.resolve_directories()
    }

    /// Consistent copy of the current job.
    pub fn snapshot(&self) -> JobSnapshot {
        self.inner.lock().snapshot()
    }

    /// Accept a selection and start staging it in the background.
    ///
    /// Only accepted from `Idle`, `Succeeded` or `Failed`. The job is re-armed
    /// in place: a fresh output path is chosen and the state moves to
    /// `Ingesting` before this returns.
    ///
    /// Resolves storage and checks the output directory synchronously; call
    /// it from a blocking context when the gate touches a slow filesystem.
    pub fn submit_selection(
        &self,
        handle: Arc<dyn SourceHandle>,
    ) -> Result<JobSnapshot, SubmitError> {
        let mut job = self.inner.lock();

        if !job.state.accepts_selection() {
            return Err(self.inner.reject(SubmitError::AlreadyBusy {
                state: job.state.name(),
            }));
        }

        let dirs = self
            .inner
            .gate
            .resolve_directories()
            .map_err(|e| self.inner.reject(SubmitError::StorageUnavailable(e)))?;

        let staged_path = self.inner.config.staged_path(&dirs.temp_dir);
        let output_path = job.next_output_path(&self.inner.config, &dirs.output_dir);
        let source = handle.describe();

        job.run += 1;
        job.source = Some(source.clone());
        job.staged = None;
        job.output_path = Some(output_path.clone());
        info!(
            "Job {} run {}: ingesting {} -> {:?}",
            job.id, job.run, source, staged_path
        );
        self.inner.transition(
            &mut job,
            JobState::Ingesting,
            StatusDetail::Selection {
                source,
                output_path,
            },
        );
        let snapshot = job.snapshot();
        drop(job);

        let inner = Arc::clone(&self.inner);
        self.inner
            .runtime
            .spawn(inner.run_ingest(handle, staged_path));

        Ok(snapshot)
    }

    /// Start transcoding the staged file in the background.
    ///
    /// Only accepted from `Staged`.
    pub fn submit_transcode(&self) -> Result<JobSnapshot, SubmitError> {
        let mut job = self.inner.lock();

        if job.state.is_busy() {
            return Err(self.inner.reject(SubmitError::AlreadyBusy {
                state: job.state.name(),
            }));
        }

        let (staged, output_path) = match (&job.state, &job.staged, &job.output_path) {
            (JobState::Staged, Some(staged), Some(output)) => (staged.clone(), output.clone()),
            _ => {
                return Err(self.inner.reject(SubmitError::NotStaged {
                    state: job.state.name(),
                }))
            }
        };

        info!(
            "Job {} run {}: transcoding {:?} -> {:?}",
            job.id, job.run, staged.path, output_path
        );
        self.inner.transition(
            &mut job,
            JobState::Transcoding,
            StatusDetail::Transcoding {
                input_path: staged.path.clone(),
                output_path: output_path.clone(),
            },
        );
        let snapshot = job.snapshot();
        drop(job);

        let inner = Arc::clone(&self.inner);
        self.inner
            .runtime
            .spawn(inner.run_transcode(staged, output_path));

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ChannelSink;
    use crate::storage::{FsStorageGate, StorageConfig};
    use crate::testing::{MockEngine, MockSource};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Harness {
        orchestrator: JobOrchestrator,
        events: UnboundedReceiver<StatusEvent>,
        engine: MockEngine,
        gate: Arc<FsStorageGate>,
        root: TempDir,
    }

    fn harness() -> Harness {
        let root = TempDir::new().unwrap();
        let gate = Arc::new(FsStorageGate::new(StorageConfig::with_dirs(
            root.path().join("tmp"),
            root.path().join("out"),
        )));
        let engine = MockEngine::new();
        let (sink, events) = ChannelSink::channel();
        let orchestrator = JobOrchestrator::new(
            JobConfig::default(),
            Arc::clone(&gate) as Arc<dyn StorageGate>,
            Arc::new(engine.clone()),
            Arc::new(sink),
        );
        Harness {
            orchestrator,
            events,
            engine,
            gate,
            root,
        }
    }

    async fn next_event(rx: &mut UnboundedReceiver<StatusEvent>) -> StatusEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for status event")
            .expect("status feed closed")
    }

    #[tokio::test]
    async fn test_new_job_is_idle() {
        let h = harness();
        let snapshot = h.orchestrator.snapshot();
        assert_eq!(snapshot.state, JobState::Idle);
        assert_eq!(snapshot.run, 0);
        assert_eq!(snapshot.sequence, 0);
        assert!(snapshot.staged_path.is_none());
        assert_eq!(snapshot.job_id, h.orchestrator.job_id());
        assert_eq!(h.orchestrator.engine_name(), "mock");
        assert_eq!(
            h.orchestrator.engine_version().await.as_deref(),
            Some("mock-1.0")
        );
    }

    #[tokio::test]
    async fn test_full_run_publishes_ordered_events() {
        let mut h = harness();

        let snapshot = h
            .orchestrator
            .submit_selection(Arc::new(MockSource::from_bytes(vec![1u8; 4096])))
            .unwrap();
        assert_eq!(snapshot.state, JobState::Ingesting);

        let ingesting = next_event(&mut h.events).await;
        assert_eq!(ingesting.state, JobState::Ingesting);
        assert_eq!(ingesting.sequence, 1);

        let staged = next_event(&mut h.events).await;
        assert_eq!(staged.state, JobState::Staged);
        assert_eq!(staged.sequence, 2);
        let staged_path = match staged.detail {
            StatusDetail::Staged { path, size_bytes } => {
                assert_eq!(size_bytes, 4096);
                path
            }
            other => panic!("unexpected detail: {:?}", other),
        };
        assert!(staged_path.exists());

        h.orchestrator.submit_transcode().unwrap();
        assert_eq!(next_event(&mut h.events).await.state, JobState::Transcoding);

        let done = next_event(&mut h.events).await;
        assert_eq!(done.state, JobState::Succeeded);
        assert_eq!(done.sequence, 4);
        assert!(!staged_path.exists());
        match done.detail {
            StatusDetail::Completed {
                output_path,
                reclaimed_bytes,
                ..
            } => {
                assert!(output_path.exists());
                assert_eq!(reclaimed_bytes, 4096);
            }
            other => panic!("unexpected detail: {:?}", other),
        }

        let snapshot = h.orchestrator.snapshot();
        assert_eq!(snapshot.state, JobState::Succeeded);
        assert!(snapshot.staged_path.is_none());
        assert!(snapshot.last_error.is_none());
    }

    #[tokio::test]
    async fn test_selection_rejected_while_staged() {
        let mut h = harness();
        h.orchestrator
            .submit_selection(Arc::new(MockSource::from_bytes(vec![1u8; 10])))
            .unwrap();
        next_event(&mut h.events).await;
        next_event(&mut h.events).await;

        let err = h
            .orchestrator
            .submit_selection(Arc::new(MockSource::from_bytes(vec![1u8; 10])))
            .unwrap_err();
        assert!(matches!(err, SubmitError::AlreadyBusy { state: "staged" }));
        assert_eq!(h.orchestrator.snapshot().run, 1);
    }

    #[tokio::test]
    async fn test_verify_storage_creates_dirs_only() {
        let h = harness();
        let dirs = h.orchestrator.verify_storage().unwrap();
        assert!(dirs.temp_dir.is_dir());
        assert!(dirs.output_dir.is_dir());
        assert_eq!(h.orchestrator.snapshot().sequence, 0);

        h.gate.access().set(false);
        assert!(matches!(
            h.orchestrator.verify_storage(),
            Err(StorageError::AccessDenied)
        ));
    }

    #[tokio::test]
    async fn test_transcode_rejected_when_idle() {
        let h = harness();
        let err = h.orchestrator.submit_transcode().unwrap_err();
        assert!(matches!(err, SubmitError::NotStaged { state: "idle" }));
        assert_eq!(h.orchestrator.snapshot().sequence, 0);
    }

    #[tokio::test]
    async fn test_storage_unavailable_leaves_job_untouched() {
        let h = harness();
        h.gate.access().set(false);

        let err = h
            .orchestrator
            .submit_selection(Arc::new(MockSource::from_bytes(vec![1u8; 10])))
            .unwrap_err();
        assert!(matches!(err, SubmitError::StorageUnavailable(_)));

        let snapshot = h.orchestrator.snapshot();
        assert_eq!(snapshot.state, JobState::Idle);
        assert_eq!(snapshot.run, 0);
        assert!(!h.root.path().join("tmp").exists());
    }

    #[tokio::test]
    async fn test_engine_success_without_output_fails() {
        let mut h = harness();
        h.engine.set_write_output(false);

        h.orchestrator
            .submit_selection(Arc::new(MockSource::from_bytes(vec![1u8; 10])))
            .unwrap();
        next_event(&mut h.events).await;
        next_event(&mut h.events).await;
        h.orchestrator.submit_transcode().unwrap();
        next_event(&mut h.events).await;

        let done = next_event(&mut h.events).await;
        assert_eq!(
            done.state,
            JobState::Failed {
                reason: JobFailure::TranscodeError { code: 0 }
            }
        );
        assert_eq!(
            h.orchestrator.snapshot().last_error,
            Some(JobFailure::TranscodeError { code: 0 })
        );
    }

    #[tokio::test]
    async fn test_output_paths_never_repeat() {
        let root = TempDir::new().unwrap();
        let config = JobConfig::default();
        let mut job = Job::new();

        let first = job.next_output_path(&config, root.path());
        let second = job.next_output_path(&config, root.path());
        assert_ne!(first, second);

        // an existing file with the next stamp is skipped
        let taken = config.output_path(root.path(), job.last_output_stamp + 1);
        std::fs::write(&taken, b"x").unwrap();
        let third = job.next_output_path(&config, root.path());
        assert_ne!(third, taken);
        assert!(!third.exists());
    }
}

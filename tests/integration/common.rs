//! Common test doubles: an in-memory queue implementing the queue trait and
//! recording transports for both handlers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use courier::handlers::{CancelAppointmentHandler, SmsHandler};
use courier::models::{BackoffPolicy, CancelAppointmentPayload, Job, SmsPayload};
use courier::queue::{JobQueue, QueueError, QueueSettings};
use courier::transport::{AppointmentApi, SmsSender, TransportError};
use courier::worker::{shutdown_channel, Dispatcher, QueueUnavailable, RunnerConfig, Worker};

/// A job parked in the delayed set, with its eligible-execution time.
#[derive(Debug, Clone)]
pub struct DelayedJob {
    pub due_at: DateTime<Utc>,
    pub job: Job,
}

#[derive(Default)]
struct State {
    ready: VecDeque<Job>,
    delayed: Vec<DelayedJob>,
}

/// In-memory queue implementing the same trait as the Redis backend.
///
/// Beyond the trait it exposes instrumentation the tests assert on: call
/// counters for `retry` and the sweep, injectable pop faults, and direct
/// visibility into the ready/delayed sets.
pub struct MemoryQueue {
    state: Mutex<State>,
    notify: Notify,
    settings: QueueSettings,
    backoff: BackoffPolicy,
    pub available: AtomicBool,
    pub retry_calls: AtomicU32,
    pub sweep_calls: AtomicU32,
    /// Number of upcoming `pop` calls that should fail with a queue error.
    pub fail_pops: AtomicU32,
}

impl MemoryQueue {
    pub fn new(settings: QueueSettings) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::default()),
            notify: Notify::new(),
            settings,
            backoff: BackoffPolicy::new(settings.retry_delay),
            available: AtomicBool::new(true),
            retry_calls: AtomicU32::new(0),
            sweep_calls: AtomicU32::new(0),
            fail_pops: AtomicU32::new(0),
        })
    }

    pub fn push(&self, job: Job) {
        self.state.lock().expect("queue lock").ready.push_back(job);
        self.notify.notify_one();
    }

    pub fn push_delayed(&self, job: Job, due_at: DateTime<Utc>) {
        self.state
            .lock()
            .expect("queue lock")
            .delayed
            .push(DelayedJob { due_at, job });
    }

    pub fn ready_len(&self) -> usize {
        self.state.lock().expect("queue lock").ready.len()
    }

    pub fn delayed_jobs(&self) -> Vec<DelayedJob> {
        self.state.lock().expect("queue lock").delayed.clone()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<Job>, QueueError> {
        if self
            .fail_pops
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(QueueError::Backend("injected pop failure".to_string()));
        }

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(job) = self.state.lock().expect("queue lock").ready.pop_front() {
                return Ok(Some(job));
            }
            if tokio::time::timeout_at(deadline, self.notify.notified())
                .await
                .is_err()
            {
                return Ok(None);
            }
        }
    }

    async fn retry(&self, job: &Job) -> Result<bool, QueueError> {
        self.retry_calls.fetch_add(1, Ordering::SeqCst);

        let ceiling = job.effective_max_retries(self.settings.max_retries);
        let next = job.retry_count + 1;
        if next >= ceiling {
            return Ok(false);
        }

        let mut retried = job.clone();
        retried.retry_count = next;
        let delay = self.backoff.delay_for_attempt(next);
        let due_at = Utc::now()
            + chrono::Duration::from_std(delay).expect("delay fits in chrono duration");
        self.push_delayed(retried, due_at);
        Ok(true)
    }

    async fn process_delayed_jobs(&self) -> Result<u64, QueueError> {
        self.sweep_calls.fetch_add(1, Ordering::SeqCst);

        let now = Utc::now();
        let mut state = self.state.lock().expect("queue lock");
        let mut moved = 0u64;
        let mut remaining = Vec::with_capacity(state.delayed.len());
        let drained: Vec<_> = state.delayed.drain(..).collect();
        for entry in drained {
            if entry.due_at <= now {
                state.ready.push_back(entry.job);
                moved += 1;
            } else {
                remaining.push(entry);
            }
        }
        state.delayed = remaining;
        drop(state);

        if moved > 0 {
            self.notify.notify_one();
        }
        Ok(moved)
    }

    fn max_retries(&self) -> u32 {
        self.settings.max_retries
    }

    fn retry_delay(&self) -> Duration {
        self.settings.retry_delay
    }
}

/// SMS transport double that records every payload it receives.
#[derive(Default)]
pub struct RecordingSms {
    pub calls: Mutex<Vec<SmsPayload>>,
    pub fail: AtomicBool,
}

impl RecordingSms {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let sender = Self::default();
        sender.fail.store(true, Ordering::SeqCst);
        Arc::new(sender)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

#[async_trait]
impl SmsSender for RecordingSms {
    async fn send(&self, sms: &SmsPayload) -> Result<(), TransportError> {
        self.calls.lock().expect("calls lock").push(sms.clone());
        if self.fail.load(Ordering::SeqCst) {
            Err(TransportError::Status {
                status: 502,
                body: "gateway down".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Appointments transport double that records every cancellation request.
#[derive(Default)]
pub struct RecordingAppointments {
    pub calls: Mutex<Vec<CancelAppointmentPayload>>,
    pub fail: AtomicBool,
}

impl RecordingAppointments {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

#[async_trait]
impl AppointmentApi for RecordingAppointments {
    async fn cancel(&self, request: &CancelAppointmentPayload) -> Result<(), TransportError> {
        self.calls.lock().expect("calls lock").push(request.clone());
        if self.fail.load(Ordering::SeqCst) {
            Err(TransportError::Status {
                status: 503,
                body: "maintenance".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Queue settings small enough for tests that chain retries.
pub fn test_settings() -> QueueSettings {
    QueueSettings {
        max_retries: 3,
        retry_delay: Duration::ZERO,
    }
}

/// Loop timing shrunk so tests finish in milliseconds.
pub fn test_config() -> RunnerConfig {
    RunnerConfig {
        sweep_interval: Duration::from_millis(100),
        pop_timeout: Duration::from_millis(20),
        fault_pause: Duration::from_millis(10),
    }
}

/// Builds a worker wired to the given doubles.
pub fn worker_with(
    queue: &Arc<MemoryQueue>,
    sms: &Arc<RecordingSms>,
    appointments: &Arc<RecordingAppointments>,
    config: RunnerConfig,
) -> Worker<MemoryQueue> {
    let dispatcher = Dispatcher::new(
        SmsHandler::new(Arc::clone(sms) as Arc<dyn SmsSender>),
        CancelAppointmentHandler::new(Arc::clone(appointments) as Arc<dyn AppointmentApi>),
        Duration::from_secs(5),
    );
    Worker::new(Arc::clone(queue), dispatcher, config)
}

/// Spawns the worker loop; stop it with [`stop_worker`].
pub fn spawn_worker(
    worker: Worker<MemoryQueue>,
) -> (
    JoinHandle<Result<(), QueueUnavailable>>,
    watch::Sender<bool>,
) {
    let (tx, rx) = shutdown_channel();
    let handle = tokio::spawn(async move { worker.run(rx).await });
    (handle, tx)
}

/// Signals shutdown and waits for a clean exit.
pub async fn stop_worker(
    handle: JoinHandle<Result<(), QueueUnavailable>>,
    tx: watch::Sender<bool>,
) {
    let _ = tx.send(true);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker did not stop after shutdown")
        .expect("worker task panicked")
        .expect("worker failed to start");
}

/// Runs the worker for `duration`, then shuts it down cleanly.
pub async fn run_worker_for(worker: Worker<MemoryQueue>, duration: Duration) {
    let (handle, tx) = spawn_worker(worker);
    tokio::time::sleep(duration).await;
    stop_worker(handle, tx).await;
}

/// A valid `send_sms` job matching the documented end-to-end scenario.
pub fn sms_job(id: &str) -> Job {
    Job {
        id: id.to_string(),
        job_type: courier::SEND_SMS.to_string(),
        data: serde_json::json!({"message": "Hi", "phone": "+1555", "token": "abc"}),
        retry_count: 0,
        max_retries: None,
    }
}

//! Asynchronous audit event log
//!
//! Request handlers record audit events ("user 7 created post 42") without
//! waiting on disk I/O. Events go into a bounded queue that a single
//! background consumer drains into an append-only [`EventSink`].
//!
//! # Lifecycle
//!
//! 1. [`EventLog::open`] (or [`EventLog::new`] with a custom sink)
//! 2. [`EventLog::start`] spawns the consumer task, exactly once
//! 3. handlers call [`EventLog::log_event`], which never blocks
//! 4. [`EventLog::stop`] closes the intake and waits for the queue to drain
//!
//! Each line is written as `[YYYY-MM-DD HH:MM:SS] <event>\n` using the local
//! wall clock at write time.
//!
//! # Example
//!
//! ```rust,ignore
//! use blog_server::events::{EventLog, EventLogConfig};
//!
//! let events = EventLog::open(EventLogConfig::default()).await?;
//! events.start()?;
//! events.log_event("user 1 created post 1");
//! events.stop().await;
//! ```

pub mod sink;

pub use sink::{EventSink, FileSink, MemorySink};

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Default event log file.
pub const DEFAULT_EVENT_LOG_PATH: &str = "logs.txt";

/// Default number of events buffered between producers and the consumer.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 100;

/// Default pause before each write.
pub const DEFAULT_EVENT_LOG_WRITE_DELAY: Duration = Duration::from_secs(1);

/// Timestamp layout of a written line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Event log errors
#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("Failed to open event log at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Event log consumer is already running")]
    AlreadyStarted,

    #[error("Event log has been stopped")]
    Stopped,
}

/// Event log settings
#[derive(Debug, Clone)]
pub struct EventLogConfig {
    pub path: PathBuf,
    pub capacity: usize,
    /// Throttle applied by the consumer before each write.
    pub write_delay: Duration,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_EVENT_LOG_PATH),
            capacity: DEFAULT_EVENT_LOG_CAPACITY,
            write_delay: DEFAULT_EVENT_LOG_WRITE_DELAY,
        }
    }
}

/// Snapshot of the event log counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventLogStats {
    /// Events that made it into the queue.
    pub accepted: u64,
    /// Events discarded because the queue was full.
    pub dropped: u64,
    /// Events refused because the log was stopped.
    pub rejected: u64,
    /// Lines successfully appended to the sink.
    pub written: u64,
    /// Lines the sink failed to append.
    pub write_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    accepted: AtomicU64,
    dropped: AtomicU64,
    rejected: AtomicU64,
    written: AtomicU64,
    write_failures: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> EventLogStats {
        EventLogStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}

/// Receiver and sink waiting for [`EventLog::start`].
struct Pending {
    receiver: mpsc::Receiver<String>,
    sink: Box<dyn EventSink>,
}

/// Bounded, fire-and-forget audit event log with a single consumer.
pub struct EventLog {
    intake: RwLock<Option<mpsc::Sender<String>>>,
    pending: Mutex<Option<Pending>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    /// Held for the whole of [`EventLog::stop`], so concurrent callers all
    /// wait for the drain.
    stopping: tokio::sync::Mutex<()>,
    counters: Arc<Counters>,
    capacity: usize,
    write_delay: Duration,
}

impl EventLog {
    /// Create an event log writing to `sink`. Nothing is written until
    /// [`start`](Self::start) is called; events logged before that are queued.
    pub fn new(sink: impl EventSink + 'static, config: EventLogConfig) -> Self {
        let capacity = config.capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);

        Self {
            intake: RwLock::new(Some(sender)),
            pending: Mutex::new(Some(Pending {
                receiver,
                sink: Box::new(sink),
            })),
            worker: Mutex::new(None),
            stopping: tokio::sync::Mutex::new(()),
            counters: Arc::new(Counters::default()),
            capacity,
            write_delay: config.write_delay,
        }
    }

    /// Open the file at `config.path` in append mode and build an event log on it.
    pub async fn open(config: EventLogConfig) -> Result<Self, EventLogError> {
        let sink = FileSink::open(&config.path)
            .await
            .map_err(|source| EventLogError::Open {
                path: config.path.clone(),
                source,
            })?;

        info!(path = %config.path.display(), "Event log file opened");

        Ok(Self::new(sink, config))
    }

    /// Spawn the background consumer.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`EventLogError::AlreadyStarted`] on a second call
    /// - [`EventLogError::Stopped`] if [`stop`](Self::stop) already ran
    pub fn start(&self) -> Result<(), EventLogError> {
        // The worker slot stays locked until the handle is stored, so stop()
        // sees either the pending queue or the running consumer.
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if worker.is_some() {
            return Err(EventLogError::AlreadyStarted);
        }

        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(Pending { receiver, sink }) = pending else {
            return Err(EventLogError::Stopped);
        };

        *worker = Some(tokio::spawn(consume(
            receiver,
            sink,
            self.write_delay,
            Arc::clone(&self.counters),
        )));
        drop(worker);

        info!(
            capacity = self.capacity,
            write_delay_ms = self.write_delay.as_millis() as u64,
            "Event log consumer started"
        );

        Ok(())
    }

    /// Queue an event for writing. Never blocks and never fails.
    ///
    /// A full queue drops the event; a stopped log rejects it. Both cases
    /// are logged and counted in [`stats`](Self::stats).
    pub fn log_event(&self, event: impl Into<String>) {
        let event = event.into();
        let intake = self.intake.read().unwrap_or_else(PoisonError::into_inner);

        let Some(sender) = intake.as_ref() else {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            warn!(event = %event, "Event log is stopped, event rejected");
            return;
        };

        match sender.try_send(event) {
            Ok(()) => {
                self.counters.accepted.fetch_add(1, Ordering::Relaxed);
            },
            Err(TrySendError::Full(event)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    event = %event,
                    capacity = self.capacity,
                    "Event queue full, event dropped"
                );
            },
            Err(TrySendError::Closed(event)) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                error!(event = %event, "Event log consumer has exited, event rejected");
            },
        }
    }

    /// Close the intake and wait for every accepted event to be written.
    ///
    /// Safe to call more than once and from several tasks at once; every
    /// call returns only after the queue has been drained. If the consumer
    /// was never started, the queued events are written here instead.
    pub async fn stop(&self) {
        let _stopping = self.stopping.lock().await;

        let sender = self
            .intake
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if sender.is_none() {
            debug!("Event log already stopped");
            return;
        }
        drop(sender);

        info!("Event log intake closed, draining queue");

        let (worker, pending) = {
            let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
            match worker.take() {
                Some(handle) => (Some(handle), None),
                None => (
                    None,
                    self.pending
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .take(),
                ),
            }
        };

        if let Some(handle) = worker {
            if let Err(e) = handle.await {
                error!("Event log consumer terminated abnormally: {}", e);
            }
        } else if let Some(Pending { receiver, sink }) = pending {
            warn!("Event log stopped before it was started, writing queued events");
            consume(
                receiver,
                sink,
                self.write_delay,
                Arc::clone(&self.counters),
            )
            .await;
        }

        let stats = self.stats();
        info!(
            written = stats.written,
            dropped = stats.dropped,
            rejected = stats.rejected,
            write_failures = stats.write_failures,
            "Event log stopped"
        );
    }

    /// Current counter values.
    pub fn stats(&self) -> EventLogStats {
        self.counters.snapshot()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("capacity", &self.capacity)
            .field("write_delay", &self.write_delay)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Render one event as a sink line.
pub fn format_line(timestamp: DateTime<Local>, event: &str) -> String {
    format!("[{}] {}\n", timestamp.format(TIMESTAMP_FORMAT), event)
}

async fn consume(
    mut receiver: mpsc::Receiver<String>,
    mut sink: Box<dyn EventSink>,
    write_delay: Duration,
    counters: Arc<Counters>,
) {
    while let Some(event) = receiver.recv().await {
        if !write_delay.is_zero() {
            tokio::time::sleep(write_delay).await;
        }

        let line = format_line(Local::now(), &event);
        match sink.append(&line).await {
            Ok(()) => {
                counters.written.fetch_add(1, Ordering::Relaxed);
            },
            Err(e) => {
                counters.write_failures.fetch_add(1, Ordering::Relaxed);
                error!(event = %event, "Failed to write event: {}", e);
            },
        }
    }

    if let Err(e) = sink.close().await {
        error!("Failed to close event log sink: {}", e);
    }

    debug!("Event log consumer finished");
}

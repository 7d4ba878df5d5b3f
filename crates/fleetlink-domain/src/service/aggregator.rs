//! Outcome aggregator: runs keyed per-item operations and joins them
//!
//! The join is counted against exactly the submitted operation set. In
//! concurrent mode a fixed pool of worker threads pulls operations off a
//! shared index and reports each terminal result over a channel. The caller
//! blocks until every result has arrived or the deadline passes. Past the
//! deadline no further operation starts, but the workers are still joined,
//! so nothing outlives the call and every operation that ran is reported
//! with its real result.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use fleetlink_types::{DispatchMode, FailureKind, OutcomeKind, ReconciliationReport};
use tracing::{debug, error, warn};

/// Terminal state of one operation
pub type ItemResult<T> = Result<T, FailureKind>;

/// A single per-item unit of work
pub type Operation<T> = Box<dyn FnOnce() -> ItemResult<T> + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    pub dispatch: DispatchMode,
    /// Worker threads in concurrent mode (at least one is always used)
    pub workers: usize,
    /// Upper bound for one whole join
    pub timeout: Option<Duration>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchMode::Concurrent,
            workers: 4,
            timeout: None,
        }
    }
}

impl AggregatorConfig {
    pub fn sequential() -> Self {
        Self {
            dispatch: DispatchMode::Sequential,
            ..Default::default()
        }
    }

    pub fn concurrent(workers: usize) -> Self {
        Self {
            dispatch: DispatchMode::Concurrent,
            workers,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutcomeAggregator {
    config: AggregatorConfig,
}

impl OutcomeAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Deadline for a join starting now, if a timeout is configured
    pub fn deadline_from_now(&self) -> Option<Instant> {
        self.config.timeout.map(|t| Instant::now() + t)
    }

    /// Run every operation and build a report from their outcomes
    pub fn aggregate(&self, operations: Vec<(String, Operation<OutcomeKind>)>) -> ReconciliationReport {
        let mut report = ReconciliationReport::default();
        for (key, result) in self.join(operations) {
            match result {
                Ok(outcome) => report.record_success(key, outcome),
                Err(kind) => report.record_failure(key, kind),
            }
        }
        report
    }

    /// Run every operation and return its key with its terminal result
    pub fn join<T: Send + 'static>(
        &self,
        operations: Vec<(String, Operation<T>)>,
    ) -> Vec<(String, ItemResult<T>)> {
        self.join_until(operations, self.deadline_from_now())
    }

    /// Like [`join`](Self::join) but bounded by an explicit deadline.
    ///
    /// Operations that have not started when the deadline passes are never
    /// started and are reported as [`FailureKind::Timeout`]. Operations already
    /// running are awaited and keep their own result.
    pub fn join_until<T: Send + 'static>(
        &self,
        operations: Vec<(String, Operation<T>)>,
        deadline: Option<Instant>,
    ) -> Vec<(String, ItemResult<T>)> {
        if operations.is_empty() {
            return Vec::new();
        }
        let (keys, ops): (Vec<String>, Vec<Operation<T>>) = operations.into_iter().unzip();

        let results = match self.config.dispatch {
            DispatchMode::Sequential => run_sequential(ops, deadline),
            DispatchMode::Concurrent => run_concurrent(ops, self.config.workers, deadline),
        };

        keys.into_iter()
            .zip(results)
            .map(|(key, result)| {
                let result = result.unwrap_or(Err(FailureKind::Timeout));
                debug!(key = %key, ok = result.is_ok(), "operation finished");
                (key, result)
            })
            .collect()
    }
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

/// Run an operation, turning a panic into a failed item
fn run_guarded<T>(op: Operation<T>) -> ItemResult<T> {
    panic::catch_unwind(AssertUnwindSafe(op)).unwrap_or_else(|_| {
        error!("per-item operation panicked");
        Err(FailureKind::StoreUnavailable)
    })
}

fn run_sequential<T>(ops: Vec<Operation<T>>, deadline: Option<Instant>) -> Vec<Option<ItemResult<T>>> {
    let mut results = Vec::with_capacity(ops.len());
    for op in ops {
        if expired(deadline) {
            results.push(None);
            continue;
        }
        results.push(Some(run_guarded(op)));
    }
    let skipped = results.iter().filter(|r| r.is_none()).count();
    if skipped > 0 {
        warn!(skipped, "deadline passed before all operations ran");
    }
    results
}

fn run_concurrent<T: Send + 'static>(
    ops: Vec<Operation<T>>,
    workers: usize,
    deadline: Option<Instant>,
) -> Vec<Option<ItemResult<T>>> {
    let total = ops.len();
    let slots: Arc<Vec<Mutex<Option<Operation<T>>>>> =
        Arc::new(ops.into_iter().map(|op| Mutex::new(Some(op))).collect());
    let next_index = Arc::new(AtomicUsize::new(0));
    let cancelled = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel::<(usize, ItemResult<T>)>();

    let mut handles = Vec::new();
    for _ in 0..workers.clamp(1, total) {
        let slots = Arc::clone(&slots);
        let next_index = Arc::clone(&next_index);
        let cancelled = Arc::clone(&cancelled);
        let tx = tx.clone();

        let handle = thread::spawn(move || loop {
            if cancelled.load(Ordering::SeqCst) {
                break;
            }
            let idx = next_index.fetch_add(1, Ordering::SeqCst);
            if idx >= slots.len() {
                break;
            }
            let op = slots[idx].lock().ok().and_then(|mut slot| slot.take());
            let Some(op) = op else {
                continue;
            };
            if tx.send((idx, run_guarded(op))).is_err() {
                break;
            }
        });
        handles.push(handle);
    }
    drop(tx);

    let mut results: Vec<Option<ItemResult<T>>> = (0..total).map(|_| None).collect();
    let mut received = 0;
    while received < total {
        let message = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                rx.recv_timeout(deadline - now)
            }
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match message {
            Ok((idx, result)) => {
                results[idx] = Some(result);
                received += 1;
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if received < total {
        // Stop workers from picking up anything new
        cancelled.store(true, Ordering::SeqCst);
    }

    // Operations already running are awaited so their effect is reported
    for handle in handles {
        let _ = handle.join();
    }
    for (idx, result) in rx.try_iter() {
        results[idx] = Some(result);
        received += 1;
    }

    if received < total {
        warn!(
            never_started = total - received,
            "deadline passed before all operations started"
        );
    }

    results
}

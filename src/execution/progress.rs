//! Progress tracking for filter runs.
//!
//! Band workers report completed rows concurrently; the tracker sums them
//! atomically and forwards a monotonic per-iteration percentage to an
//! optional callback.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

/// A progress update event.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    /// A run has started.
    Started {
        iterations: usize,
        total_rows: u64,
        bands: usize,
    },
    /// An iteration has started; the row count is reset.
    IterationStarted {
        iteration: usize,
        iterations: usize,
    },
    /// Rows completed within the current iteration.
    Progress {
        iteration: usize,
        iterations: usize,
        completed_rows: u64,
        total_rows: u64,
        percent: f32,
    },
    /// All bands of an iteration have finished.
    IterationCompleted {
        iteration: usize,
        iterations: usize,
        duration_ms: u64,
    },
    /// The run has completed.
    Completed {
        iterations: usize,
        total_duration_ms: u64,
    },
}

/// Callback type for progress updates.
pub type ProgressCallback = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Tracks completed rows across concurrent band workers.
pub struct ProgressTracker {
    /// Rows per iteration (the image height).
    total_rows: u64,
    /// Rows completed in the current iteration.
    completed_rows: AtomicU64,
    /// Highest row count already forwarded to the callback.
    reported_rows: Mutex<u64>,
    /// Zero-based index of the current iteration.
    iteration: AtomicUsize,
    /// Number of iterations in the run.
    iterations: AtomicUsize,
    /// Run start time.
    start_time: Option<Instant>,
    /// Progress callback.
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    /// Create a new tracker for an image of `total_rows` rows.
    pub fn new(total_rows: u64) -> Self {
        Self {
            total_rows,
            completed_rows: AtomicU64::new(0),
            reported_rows: Mutex::new(0),
            iteration: AtomicUsize::new(0),
            iterations: AtomicUsize::new(0),
            start_time: None,
            callback: None,
        }
    }

    /// Set a callback for progress updates.
    pub fn with_callback(mut self, callback: ProgressCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Start tracking a run.
    pub fn start(&mut self, iterations: usize, bands: usize) {
        self.start_time = Some(Instant::now());
        self.iterations.store(iterations, Ordering::Relaxed);
        self.send_update(ProgressUpdate::Started {
            iterations,
            total_rows: self.total_rows,
            bands,
        });
    }

    /// Begin iteration `iteration`, resetting the row count to zero.
    pub fn begin_iteration(&self, iteration: usize) {
        self.iteration.store(iteration, Ordering::Relaxed);
        self.completed_rows.store(0, Ordering::SeqCst);
        *self.reported_rows.lock() = 0;

        self.send_update(ProgressUpdate::IterationStarted {
            iteration,
            iterations: self.iterations.load(Ordering::Relaxed),
        });
    }

    /// Record `rows` newly completed rows. Safe to call from any worker.
    pub fn rows_completed(&self, rows: u64) {
        if rows == 0 {
            return;
        }
        let completed = self.completed_rows.fetch_add(rows, Ordering::SeqCst) + rows;

        // Serialize reporting so observers never see the count go backwards.
        let mut reported = self.reported_rows.lock();
        if completed > *reported {
            *reported = completed;
            self.send_update(ProgressUpdate::Progress {
                iteration: self.iteration.load(Ordering::Relaxed),
                iterations: self.iterations.load(Ordering::Relaxed),
                completed_rows: completed,
                total_rows: self.total_rows,
                percent: percent_of(completed, self.total_rows),
            });
        }
    }

    /// Report that the current iteration has passed its barrier.
    pub fn end_iteration(&self, duration_ms: u64) {
        self.send_update(ProgressUpdate::IterationCompleted {
            iteration: self.iteration.load(Ordering::Relaxed),
            iterations: self.iterations.load(Ordering::Relaxed),
            duration_ms,
        });
    }

    /// Complete tracking.
    pub fn complete(&self) {
        let duration = self
            .start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);

        self.send_update(ProgressUpdate::Completed {
            iterations: self.iterations.load(Ordering::Relaxed),
            total_duration_ms: duration,
        });
    }

    /// Rows completed in the current iteration.
    pub fn completed_rows(&self) -> u64 {
        self.completed_rows.load(Ordering::SeqCst)
    }

    /// Get current iteration progress percentage.
    pub fn progress_percent(&self) -> f32 {
        percent_of(self.completed_rows(), self.total_rows)
    }

    fn send_update(&self, update: ProgressUpdate) {
        if let Some(ref callback) = self.callback {
            callback(update);
        }
    }
}

fn percent_of(completed: u64, total: u64) -> f32 {
    if total == 0 {
        return 100.0;
    }
    (completed as f32 / total as f32) * 100.0
}

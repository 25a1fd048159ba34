use std::ops::AddAssign;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Running totals for a sanitizer, shared across calls and threads.
#[derive(Debug, Default)]
pub struct SanitizeMetrics {
    /// Number of sanitize calls that completed
    pub documents_sanitized: AtomicUsize,
    /// Number of calls that failed before producing output
    pub failures: AtomicUsize,
    /// Number of denied elements removed (each with its subtree)
    pub tags_removed: AtomicUsize,
    /// Number of attributes stripped
    pub attributes_stripped: AtomicUsize,
    /// Number of live handler bindings cleared
    pub handlers_cleared: AtomicUsize,
}

impl SanitizeMetrics {
    /// Create new sanitizer metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one call's report to the totals.
    pub fn record(&self, report: &SanitizeReport) {
        self.documents_sanitized.fetch_add(1, Ordering::Relaxed);
        self.tags_removed.fetch_add(report.tags_removed, Ordering::Relaxed);
        self.attributes_stripped
            .fetch_add(report.attributes_stripped, Ordering::Relaxed);
        self.handlers_cleared
            .fetch_add(report.handlers_cleared, Ordering::Relaxed);
    }

    /// Increment the failure counter
    pub fn increment_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of the totals as a report.
    pub fn totals(&self) -> SanitizeReport {
        SanitizeReport {
            tags_removed: self.tags_removed.load(Ordering::Relaxed),
            attributes_stripped: self.attributes_stripped.load(Ordering::Relaxed),
            handlers_cleared: self.handlers_cleared.load(Ordering::Relaxed),
        }
    }

    pub fn documents_sanitized(&self) -> usize {
        self.documents_sanitized.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.documents_sanitized.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.tags_removed.store(0, Ordering::Relaxed);
        self.attributes_stripped.store(0, Ordering::Relaxed);
        self.handlers_cleared.store(0, Ordering::Relaxed);
    }
}

/// What one sanitize call removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    pub tags_removed: usize,
    pub attributes_stripped: usize,
    pub handlers_cleared: usize,
}

impl SanitizeReport {
    /// True if the input came through untouched.
    pub fn is_clean(&self) -> bool {
        *self == SanitizeReport::default()
    }
}

impl AddAssign for SanitizeReport {
    fn add_assign(&mut self, other: Self) {
        self.tags_removed += other.tags_removed;
        self.attributes_stripped += other.attributes_stripped;
        self.handlers_cleared += other.handlers_cleared;
    }
}

/// Timer for measuring parse and sanitize operations
#[derive(Debug)]
pub struct ParseTimer {
    start: Instant,
}

impl ParseTimer {
    /// Create a new parse timer
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed time in microseconds
    pub fn elapsed_us(&self) -> u128 {
        self.start.elapsed().as_micros()
    }
}

impl Default for ParseTimer {
    fn default() -> Self {
        Self::new()
    }
}

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct Metrics {
    // Requests
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,
    total_request_time_us: AtomicU64,

    // Pipeline
    documents_classified: AtomicUsize,
    documents_extracted: AtomicUsize,
    documents_stored: AtomicUsize,
    classification_failures: AtomicUsize,
    extraction_failures: AtomicUsize,
    storage_failures: AtomicUsize,
    total_classify_time_us: AtomicU64,
    total_extract_time_us: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_request(&self, success: bool, duration: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_request_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_classify(&self, duration: Duration, success: bool) {
        self.total_classify_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        let counter = if success { &self.documents_classified } else { &self.classification_failures };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_extract(&self, duration: Duration, success: bool) {
        self.total_extract_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        let counter = if success { &self.documents_extracted } else { &self.extraction_failures };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store(&self, success: bool) {
        let counter = if success { &self.documents_stored } else { &self.storage_failures };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Request counters, as served at `/metrics`.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        MetricsSnapshot {
            total_requests,
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            avg_request_time_ms: avg_time_ms(&self.total_request_time_us, total_requests),
        }
    }

    /// Per-step counters of a batch run.
    pub fn pipeline_snapshot(&self) -> PipelineSnapshot {
        let classify_attempts = self.documents_classified.load(Ordering::Relaxed)
            + self.classification_failures.load(Ordering::Relaxed);
        let extract_attempts = self.documents_extracted.load(Ordering::Relaxed)
            + self.extraction_failures.load(Ordering::Relaxed);

        PipelineSnapshot {
            documents_classified: self.documents_classified.load(Ordering::Relaxed),
            documents_extracted: self.documents_extracted.load(Ordering::Relaxed),
            documents_stored: self.documents_stored.load(Ordering::Relaxed),
            classification_failures: self.classification_failures.load(Ordering::Relaxed),
            extraction_failures: self.extraction_failures.load(Ordering::Relaxed),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
            avg_classify_time_ms: avg_time_ms(&self.total_classify_time_us, classify_attempts),
            avg_extract_time_ms: avg_time_ms(&self.total_extract_time_us, extract_attempts),
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total_us.load(Ordering::Relaxed) as f64 / count as f64 / 1000.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub avg_request_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSnapshot {
    pub documents_classified: usize,
    pub documents_extracted: usize,
    pub documents_stored: usize,
    pub classification_failures: usize,
    pub extraction_failures: usize,
    pub storage_failures: usize,
    pub avg_classify_time_ms: f64,
    pub avg_extract_time_ms: f64,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

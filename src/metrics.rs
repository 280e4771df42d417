use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing request activity since startup.
#[derive(Default)]
pub struct ServiceMetrics {
    plans_generated: AtomicU64,
    reference_texts_used: AtomicU64,
    documents_indexed: AtomicU64,
    files_extracted: AtomicU64,
}

impl ServiceMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a persisted plan and the number of reference texts that shaped it.
    pub fn record_plan(&self, reference_count: u64) {
        self.plans_generated.fetch_add(1, Ordering::Relaxed);
        self.reference_texts_used
            .fetch_add(reference_count, Ordering::Relaxed);
    }

    /// Record a document upserted into the vector index.
    pub fn record_indexed_document(&self) {
        self.documents_indexed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a file relayed through the extraction service.
    pub fn record_extraction(&self) {
        self.files_extracted.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            plans_generated: self.plans_generated.load(Ordering::Relaxed),
            reference_texts_used: self.reference_texts_used.load(Ordering::Relaxed),
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            files_extracted: self.files_extracted.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of request counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Plans generated and persisted since startup.
    pub plans_generated: u64,
    /// Reference texts folded into generation prompts.
    pub reference_texts_used: u64,
    /// Documents upserted into the vector index.
    pub documents_indexed: u64,
    /// Files relayed to the extraction service.
    pub files_extracted: u64,
}

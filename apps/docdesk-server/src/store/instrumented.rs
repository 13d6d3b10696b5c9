//! Store wrapper that counts and traces every operation

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::types::{Partition, StoreResult, StoredRecord};
use super::DocumentStore;

/// Operation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub processing_reads: usize,
    pub finished_reads: usize,
    pub deletes: usize,
    pub failures: usize,
}

impl StoreStats {
    pub fn reads(&self) -> usize {
        self.processing_reads + self.finished_reads
    }

    /// Reads plus deletes
    pub fn calls(&self) -> usize {
        self.reads() + self.deletes
    }
}

#[derive(Default)]
struct Counters {
    processing_reads: AtomicUsize,
    finished_reads: AtomicUsize,
    deletes: AtomicUsize,
    failures: AtomicUsize,
}

/// Instrumented pass-through over any [`DocumentStore`]
pub struct InstrumentedStore {
    inner: Arc<dyn DocumentStore>,
    counters: Counters,
}

impl InstrumentedStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            counters: Counters::default(),
        }
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            processing_reads: self.counters.processing_reads.load(Ordering::Relaxed),
            finished_reads: self.counters.finished_reads.load(Ordering::Relaxed),
            deletes: self.counters.deletes.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    fn record_outcome<T>(&self, result: &StoreResult<T>) {
        if result.is_err() {
            self.counters.failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[async_trait]
impl DocumentStore for InstrumentedStore {
    fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    async fn get(&self, partition: Partition, id: &str) -> StoreResult<Option<StoredRecord>> {
        match partition {
            Partition::Processing => &self.counters.processing_reads,
            Partition::Finished => &self.counters.finished_reads,
        }
        .fetch_add(1, Ordering::Relaxed);

        let result = self.inner.get(partition, id).await;
        self.record_outcome(&result);

        match &result {
            Ok(found) => tracing::debug!(
                "store get {}/{}: {}",
                partition,
                id,
                if found.is_some() { "hit" } else { "miss" }
            ),
            Err(e) => tracing::warn!("store get {}/{} failed: {}", partition, id, e),
        }
        result
    }

    async fn delete(&self, partition: Partition, id: &str) -> StoreResult<()> {
        self.counters.deletes.fetch_add(1, Ordering::Relaxed);

        let result = self.inner.delete(partition, id).await;
        self.record_outcome(&result);

        match &result {
            Ok(()) => tracing::info!("store delete {}/{}", partition, id),
            Err(e) => tracing::warn!("store delete {}/{} failed: {}", partition, id, e),
        }
        result
    }
}

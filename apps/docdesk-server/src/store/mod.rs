//! Backing store adapters
//!
//! The document database is an external key-value collection service. Each
//! lifecycle partition (`processing`, `finished`) is a separate collection
//! keyed by document id. This module defines the [`DocumentStore`] seam and
//! the adapters that speak to real backends.
//!
//! - [`MemoryStore`]: in-process collections (seeding, tests, demos)
//! - [`SqliteStore`]: a single `documents` table via sqlx
//! - [`S3Store`]: one JSON object per record on an S3-compatible bucket
//!
//! Every operation is an independent point read or delete. No adapter takes
//! locks across calls or offers multi-document transactions.

mod instrumented;
mod memory;
mod s3;
mod sqlite;
mod types;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StoreBackend, StoreConfig};

pub use instrumented::{InstrumentedStore, StoreStats};
pub use memory::{MemoryStore, SeedFile};
pub use s3::S3Store;
pub use sqlite::SqliteStore;
pub use types::{Partition, StoreError, StoreResult, StoredRecord};

/// Key-value access to the two document collections
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Point read of `id` in `partition`; `Ok(None)` when absent
    async fn get(&self, partition: Partition, id: &str) -> StoreResult<Option<StoredRecord>>;

    /// Delete `id` from `partition`
    ///
    /// Deleting an absent key is not an error for any adapter.
    async fn delete(&self, partition: Partition, id: &str) -> StoreResult<()>;
}

/// Build the configured store adapter
pub async fn connect(config: &StoreConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match config.backend {
        StoreBackend::Memory => {
            let store = MemoryStore::new();
            if let Some(seed) = config.seed_file.as_deref() {
                let loaded = store.load_seed_file(Path::new(seed))?;
                tracing::info!("Seeded memory store with {} records from {}", loaded, seed);
            }
            Arc::new(store)
        }
        StoreBackend::Sqlite => {
            let store = SqliteStore::connect(&config.database_url).await?;
            if let Some(seed) = config.seed_file.as_deref() {
                let mut loaded = 0;
                for (partition, id, record) in SeedFile::read(Path::new(seed))?.into_records() {
                    store.insert(partition, &id, &record).await?;
                    loaded += 1;
                }
                tracing::info!("Seeded sqlite store with {} records from {}", loaded, seed);
            }
            Arc::new(store)
        }
        StoreBackend::S3 => {
            let store = S3Store::new(&config.s3).await?;
            if let Some(seed) = config.seed_file.as_deref() {
                let mut loaded = 0;
                for (partition, id, record) in SeedFile::read(Path::new(seed))?.into_records() {
                    store.put(partition, &id, &record).await?;
                    loaded += 1;
                }
                tracing::info!("Seeded S3 store with {} records from {}", loaded, seed);
            }
            Arc::new(store)
        }
    };

    tracing::info!("Document store backend: {}", store.backend());
    Ok(store)
}

//! Collection resolution and document fetching
//!
//! Resolution probes the partitions in [`Partition::RESOLUTION_ORDER`] and
//! stops at the first hit. Fetching is a second, independent point read
//! against the winning partition; a record may legitimately vanish between
//! the two, which callers must treat as not found.

use crate::document::DocumentRecord;
use crate::store::{DocumentStore, Partition, StoreResult};

/// Which partition currently holds an id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Found(Partition),
    NotFound,
}

/// Outcome of a point read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Found(DocumentRecord),
    NotFound,
}

/// Determine the partition holding `id`
pub async fn resolve(store: &dyn DocumentStore, id: &str) -> StoreResult<Resolution> {
    for partition in Partition::RESOLUTION_ORDER {
        if store.get(partition, id).await?.is_some() {
            tracing::debug!("Resolved {} to {}", id, partition);
            return Ok(Resolution::Found(partition));
        }
    }

    tracing::debug!("No document {} in any partition", id);
    Ok(Resolution::NotFound)
}

/// Read `id` from `partition`
pub async fn fetch(
    store: &dyn DocumentStore,
    id: &str,
    partition: Partition,
) -> StoreResult<Fetched> {
    match store.get(partition, id).await? {
        Some(stored) => Ok(Fetched::Found(DocumentRecord::from_stored(id, partition, stored))),
        None => {
            tracing::info!("Document {} left {} between resolve and fetch", id, partition);
            Ok(Fetched::NotFound)
        }
    }
}

//! In-process document collections

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use uuid::Uuid;

use super::types::{Partition, StoreResult, StoredRecord};
use super::DocumentStore;

/// Seed file layout: `{"processing": {id: record}, "finished": {id: record}}`
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub processing: HashMap<String, StoredRecord>,
    #[serde(default)]
    pub finished: HashMap<String, StoredRecord>,
}

impl SeedFile {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn len(&self) -> usize {
        self.processing.len() + self.finished.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every record with its partition
    pub fn into_records(self) -> impl Iterator<Item = (Partition, String, StoredRecord)> {
        let processing = self
            .processing
            .into_iter()
            .map(|(id, record)| (Partition::Processing, id, record));
        let finished = self
            .finished
            .into_iter()
            .map(|(id, record)| (Partition::Finished, id, record));
        processing.chain(finished)
    }
}

#[derive(Default)]
struct Collections {
    processing: HashMap<String, StoredRecord>,
    finished: HashMap<String, StoredRecord>,
}

impl Collections {
    fn get(&self, partition: Partition) -> &HashMap<String, StoredRecord> {
        match partition {
            Partition::Processing => &self.processing,
            Partition::Finished => &self.finished,
        }
    }

    fn get_mut(&mut self, partition: Partition) -> &mut HashMap<String, StoredRecord> {
        match partition {
            Partition::Processing => &mut self.processing,
            Partition::Finished => &mut self.finished,
        }
    }
}

/// Memory-backed store
///
/// Both collections sit behind one lock, so [`MemoryStore::promote`] moves a
/// record between partitions atomically from a reader's point of view.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record under a caller-chosen id
    pub fn insert(&self, partition: Partition, id: impl Into<String>, record: StoredRecord) {
        self.collections
            .write()
            .get_mut(partition)
            .insert(id.into(), record);
    }

    /// Insert a record under a freshly assigned id
    pub fn create(&self, partition: Partition, record: StoredRecord) -> String {
        let id = Uuid::new_v4().simple().to_string();
        self.insert(partition, id.clone(), record);
        id
    }

    /// Move a record from `processing` to `finished`
    ///
    /// Returns false when the id is not in `processing`.
    pub fn promote(&self, id: &str) -> bool {
        let mut collections = self.collections.write();
        match collections.processing.remove(id) {
            Some(record) => {
                collections.finished.insert(id.to_string(), record);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, partition: Partition, id: &str) -> bool {
        self.collections.read().get(partition).contains_key(id)
    }

    pub fn len(&self) -> usize {
        let collections = self.collections.read();
        collections.processing.len() + collections.finished.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load records from a JSON seed file, returning how many were inserted
    pub fn load_seed_file(&self, path: &Path) -> anyhow::Result<usize> {
        Ok(self.load_seed(SeedFile::read(path)?))
    }

    pub fn load_seed(&self, seed: SeedFile) -> usize {
        let mut collections = self.collections.write();
        let count = seed.len();
        collections.processing.extend(seed.processing);
        collections.finished.extend(seed.finished);
        count
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, partition: Partition, id: &str) -> StoreResult<Option<StoredRecord>> {
        Ok(self.collections.read().get(partition).get(id).cloned())
    }

    async fn delete(&self, partition: Partition, id: &str) -> StoreResult<()> {
        self.collections.write().get_mut(partition).remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn record(name: &str) -> StoredRecord {
        StoredRecord::new(Some(name), "JVBERi0xLjc=")
    }

    #[tokio::test]
    async fn test_get_and_delete_are_partition_scoped() {
        let store = MemoryStore::new();
        store.insert(Partition::Finished, "doc123", record("Request_Form.pdf"));

        assert!(store.get(Partition::Processing, "doc123").await.unwrap().is_none());
        assert!(store.get(Partition::Finished, "doc123").await.unwrap().is_some());

        // Deleting from the other partition leaves the record alone
        store.delete(Partition::Processing, "doc123").await.unwrap();
        assert!(store.contains(Partition::Finished, "doc123"));

        store.delete(Partition::Finished, "doc123").await.unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_assigns_distinct_ids() {
        let store = MemoryStore::new();
        let a = store.create(Partition::Processing, record("a.pdf"));
        let b = store.create(Partition::Processing, record("b.pdf"));

        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_promote_moves_record() {
        let store = MemoryStore::new();
        store.insert(Partition::Processing, "req-1", record("req.pdf"));

        assert!(store.promote("req-1"));
        assert!(!store.contains(Partition::Processing, "req-1"));
        assert!(store.contains(Partition::Finished, "req-1"));
        assert!(!store.promote("req-1"));
    }

    #[test]
    fn test_load_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "processing": {{"p1": {{"fileName": "p1.pdf", "fileContent": "AA=="}}}},
                "finished": {{"f1": {{"fileContent": "AA=="}}, "f2": {{"fileContent": "AA=="}}}}
            }}"#
        )
        .unwrap();

        let store = MemoryStore::new();
        let loaded = store.load_seed_file(file.path()).unwrap();

        assert_eq!(loaded, 3);
        assert!(store.contains(Partition::Processing, "p1"));
        assert!(store.contains(Partition::Finished, "f2"));
    }

    #[test]
    fn test_load_seed_file_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let store = MemoryStore::new();
        assert!(store.load_seed_file(file.path()).is_err());
        assert!(store.is_empty());
    }
}

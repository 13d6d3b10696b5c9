//! SQLite-backed document collections
//!
//! Both partitions share one table keyed by `(partition, id)`.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use super::types::{Partition, StoreResult, StoredRecord};
use super::DocumentStore;

/// Document store over a sqlx SQLite pool
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `database_url`
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        // In-memory databases are per connection, so keep a single one
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// Create the documents table
    pub async fn init(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                partition TEXT NOT NULL,
                id TEXT NOT NULL,
                file_name TEXT,
                file_content TEXT NOT NULL,
                PRIMARY KEY (partition, id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace a record
    pub async fn insert(
        &self,
        partition: Partition,
        id: &str,
        record: &StoredRecord,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (partition, id, file_name, file_content)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(partition, id) DO UPDATE SET
                file_name = excluded.file_name,
                file_content = excluded.file_content
            "#,
        )
        .bind(partition.collection())
        .bind(id)
        .bind(&record.file_name)
        .bind(&record.file_content)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, partition: Partition, id: &str) -> StoreResult<Option<StoredRecord>> {
        let row = sqlx::query_as::<_, (Option<String>, String)>(
            "SELECT file_name, file_content FROM documents WHERE partition = ? AND id = ?",
        )
        .bind(partition.collection())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(file_name, file_content)| StoredRecord {
            file_name,
            file_content,
        }))
    }

    async fn delete(&self, partition: Partition, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE partition = ? AND id = ?")
            .bind(partition.collection())
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "sqlite delete {}/{} removed {} row(s)",
            partition,
            id,
            result.rows_affected()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_get_roundtrip() {
        let store = memory_store().await;
        let record = StoredRecord::new(Some("Request_Form.pdf"), "JVBERi0=");
        store.insert(Partition::Finished, "doc123", &record).await.unwrap();

        let found = store.get(Partition::Finished, "doc123").await.unwrap();
        assert_eq!(found, Some(record));
        assert!(store.get(Partition::Processing, "doc123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_only_touches_target_partition() {
        let store = memory_store().await;
        let record = StoredRecord::new(None, "JVBERi0=");
        store.insert(Partition::Finished, "doc1", &record).await.unwrap();
        store.insert(Partition::Processing, "doc2", &record).await.unwrap();

        store.delete(Partition::Processing, "doc1").await.unwrap();
        assert!(store.get(Partition::Finished, "doc1").await.unwrap().is_some());

        store.delete(Partition::Processing, "doc2").await.unwrap();
        assert!(store.get(Partition::Processing, "doc2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_replaces_existing() {
        let store = memory_store().await;
        store
            .insert(Partition::Processing, "doc", &StoredRecord::new(Some("a.pdf"), "AA=="))
            .await
            .unwrap();
        store
            .insert(Partition::Processing, "doc", &StoredRecord::new(Some("b.pdf"), "AQ=="))
            .await
            .unwrap();

        let found = store.get(Partition::Processing, "doc").await.unwrap().unwrap();
        assert_eq!(found.file_name.as_deref(), Some("b.pdf"));
        assert_eq!(found.file_content, "AQ==");
    }
}

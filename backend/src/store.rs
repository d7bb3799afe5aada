use anyhow::Result;
use shared::AttendanceRecord;
use tokio::sync::watch;
use uuid::Uuid;

use crate::db::DbConnection;

/// Adapter over the persistent record store: mutations plus a live feed of
/// the full record set, ordered by timestamp descending.
///
/// The feed carries everything in the store, not just today's partition;
/// consumers do their own day filtering. A fresh snapshot is published
/// after every mutation, and new subscribers see the current one
/// immediately.
pub struct AttendanceStore {
    db: DbConnection,
    feed: watch::Sender<Vec<AttendanceRecord>>,
}

impl AttendanceStore {
    pub async fn new(db: DbConnection) -> Result<Self> {
        let snapshot = db.list_all().await?;
        let (feed, _) = watch::channel(snapshot);
        Ok(Self { db, feed })
    }

    /// Subscribe to the live feed.
    pub fn subscribe(&self) -> watch::Receiver<Vec<AttendanceRecord>> {
        self.feed.subscribe()
    }

    /// Persist one record, returning it with the store-assigned id attached.
    pub async fn add(&self, mut record: AttendanceRecord) -> Result<AttendanceRecord> {
        let external_id = Uuid::new_v4().to_string();
        self.db.insert_record(&record, &external_id).await?;
        record.external_id = Some(external_id);
        self.publish().await?;
        Ok(record)
    }

    /// Delete one record by its store-assigned id. Returns false when no
    /// such record exists.
    pub async fn delete_by_id(&self, external_id: &str) -> Result<bool> {
        let deleted = self.db.delete_by_external_id(external_id).await?;
        if deleted {
            self.publish().await?;
        }
        Ok(deleted)
    }

    /// Bulk delete. Failure is reported once for the whole batch.
    pub async fn delete_all(&self, external_ids: &[String]) -> Result<u64> {
        let deleted = self.db.delete_many(external_ids).await?;
        if deleted > 0 {
            self.publish().await?;
        }
        Ok(deleted)
    }

    /// One-shot full-history fetch, newest first. Export bypasses the
    /// today partition through this.
    pub async fn query_all(&self) -> Result<Vec<AttendanceRecord>> {
        self.db.list_all().await
    }

    async fn publish(&self) -> Result<()> {
        let snapshot = self.db.list_all().await?;
        self.feed.send_replace(snapshot);
        Ok(())
    }
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use shared::AttendanceRecord;
use sqlx::{migrate::MigrateDatabase, sqlite::SqliteRow, Row, Sqlite, SqlitePool};
use tracing::warn;

const CONNECT_ATTEMPTS: u32 = 10;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// DbConnection manages the attendance table.
///
/// Timestamps are stored as fixed-width RFC 3339 UTC strings so the
/// `ORDER BY timestamp DESC` feed order is exact under string comparison.
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePool::connect(url).await?;
        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Connect, retrying with a short delay while the backend is not yet
    /// ready. Fatal only once the attempts are exhausted.
    pub async fn connect_with_retry(url: &str) -> Result<Self> {
        let mut attempt = 1;
        loop {
            match Self::new(url).await {
                Ok(db) => return Ok(db),
                Err(e) if attempt < CONNECT_ATTEMPTS => {
                    warn!("database not ready (attempt {attempt}): {e}");
                    attempt += 1;
                    tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS attendance (
                external_id TEXT PRIMARY KEY,
                local_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                date TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                display_time TEXT NOT NULL,
                period INTEGER
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Persist one record under the given store-assigned id.
    pub async fn insert_record(&self, record: &AttendanceRecord, external_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO attendance (external_id, local_id, name, date, timestamp, display_time, period)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(external_id)
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.date)
        .bind(record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
        .bind(&record.display_time)
        .bind(record.period.map(|p| p as i64))
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    /// All records, ordered by timestamp descending (newest first).
    pub async fn list_all(&self) -> Result<Vec<AttendanceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT external_id, local_id, name, date, timestamp, display_time, period
            FROM attendance
            ORDER BY timestamp DESC
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    /// Delete one record by its store-assigned id.
    /// Returns true if the record was found and deleted.
    pub async fn delete_by_external_id(&self, external_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM attendance WHERE external_id = ?")
            .bind(external_id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Bulk delete; one overall result, not per-item.
    pub async fn delete_many(&self, external_ids: &[String]) -> Result<u64> {
        if external_ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; external_ids.len()].join(", ");
        let sql = format!("DELETE FROM attendance WHERE external_id IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in external_ids {
            query = query.bind(id);
        }
        let result = query.execute(&*self.pool).await?;
        Ok(result.rows_affected())
    }
}

fn row_to_record(row: &SqliteRow) -> Result<AttendanceRecord> {
    let timestamp: String = row.get("timestamp");
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)?.with_timezone(&Utc);
    let period: Option<i64> = row.get("period");

    Ok(AttendanceRecord {
        id: row.get("local_id"),
        external_id: Some(row.get("external_id")),
        name: row.get("name"),
        date: row.get("date"),
        timestamp,
        display_time: row.get("display_time"),
        period: period.map(|p| p as u8),
    })
}

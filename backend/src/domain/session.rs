//! Session service: the display's state, server-side.
//!
//! Owns the active period filter and the cached today-set. The cache is
//! fed by the store subscription task; sign-ins check duplicates against
//! it before touching the store.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use shared::{AttendanceRecord, SessionInfo};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::periods::{filter_for, resolve_period, HourFilter};
use crate::domain::roster::{self, Roster};
use crate::domain::validator::validate_name;
use crate::error::AppError;
use crate::store::AttendanceStore;

/// Today's `YYYY-MM-DD` partition key, from local wall-clock.
pub fn today_key() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

pub struct SessionService {
    store: Arc<AttendanceStore>,
    config: Arc<Config>,
    filter: RwLock<HourFilter>,
    today: RwLock<Vec<AttendanceRecord>>,
}

impl SessionService {
    /// Create the service with the filter defaulted from the current time:
    /// the period in session, or `all` outside class hours.
    pub fn new(store: Arc<AttendanceStore>, config: Arc<Config>) -> Self {
        let filter = filter_for(&config.class_periods, Local::now().time());
        Self {
            store,
            config,
            filter: RwLock::new(filter),
            today: RwLock::new(Vec::new()),
        }
    }

    /// Consume one store feed snapshot: partition to today, dedupe, and
    /// persist the dedupe result so the store converges.
    pub async fn apply_snapshot(&self, all: &[AttendanceRecord]) -> Result<()> {
        let today = today_key();
        let set = roster::today_set(all, &today);

        if !set.dropped_duplicates.is_empty() {
            warn!(
                "removing {} duplicate record(s) from the store",
                set.dropped_duplicates.len()
            );
            self.store.delete_all(&set.dropped_duplicates).await?;
        }

        debug!("today's working set: {} record(s)", set.records.len());
        *self.today.write().await = set.records;
        Ok(())
    }

    /// Validate, reject duplicates, and persist a new sign-in.
    pub async fn sign_in(&self, raw_name: &str) -> Result<AttendanceRecord, AppError> {
        let name = validate_name(raw_name).map_err(AppError::Validation)?;

        if roster::is_signed_in(&self.today.read().await, &name) {
            return Err(AppError::AlreadySignedIn);
        }

        let now = Local::now();
        let record = AttendanceRecord {
            id: now.timestamp_millis(),
            external_id: None,
            name,
            date: now.format("%Y-%m-%d").to_string(),
            timestamp: now.with_timezone(&Utc),
            display_time: now.format("%-I:%M %p").to_string(),
            period: resolve_period(&self.config.class_periods, now.time()),
        };

        let saved = self.store.add(record).await.map_err(AppError::Store)?;
        info!("{} signed in (period {:?})", saved.name, saved.period);
        Ok(saved)
    }

    /// The display list for today under the active filter.
    pub async fn roster(&self) -> Roster {
        let today = self.today.read().await;
        let filter = *self.filter.read().await;
        roster::build_roster(&today, filter)
    }

    pub async fn current_filter(&self) -> HourFilter {
        *self.filter.read().await
    }

    pub async fn set_filter(&self, filter: HourFilter) {
        *self.filter.write().await = filter;
    }

    /// The 5-minute tick: switch to the time-derived filter whenever it
    /// differs from the active one. Purely time-driven; a manually picked
    /// filter gets overridden like any other.
    pub async fn refresh_filter(&self, now: DateTime<Local>) {
        let next = filter_for(&self.config.class_periods, now.time());
        let mut filter = self.filter.write().await;
        if next != *filter {
            info!("auto-switching filter from {} to {}", *filter, next);
            *filter = next;
        }
    }

    /// Delete a single record from today's set by its local id.
    pub async fn delete_one(&self, local_id: i64) -> Result<(), AppError> {
        let external_id = {
            let today = self.today.read().await;
            let record = today
                .iter()
                .find(|r| r.id == local_id)
                .ok_or(AppError::NotFound)?;
            record.external_id.clone()
        };

        // A record whose save never completed has nothing to delete.
        if let Some(id) = external_id {
            self.store.delete_by_id(&id).await.map_err(AppError::Store)?;
        }
        Ok(())
    }

    /// Delete every persisted record in today's set.
    pub async fn clear_all(&self) -> Result<u64, AppError> {
        let ids: Vec<String> = self
            .today
            .read()
            .await
            .iter()
            .filter_map(|r| r.external_id.clone())
            .collect();

        if ids.is_empty() {
            return Ok(0);
        }
        self.store.delete_all(&ids).await.map_err(AppError::Store)
    }

    /// Header data and the QR payload for the display page.
    pub fn session_info(&self) -> SessionInfo {
        let now = Local::now();
        let today = today_key();
        let base = self.config.public_url.trim_end_matches('/');
        SessionInfo {
            signin_url: format!("{}/?signin=true&date={}", base, today),
            qr_size: self.config.qr_size,
            date_display: now.format("%a, %b %-d").to_string(),
            today,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_periods;
    use crate::db::DbConnection;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn test_config() -> Arc<Config> {
        Arc::new(Config {
            port: 0,
            public_url: "http://localhost:8000".to_string(),
            database_url: "sqlite::memory:".to_string(),
            static_root: PathBuf::from("static"),
            qr_size: 300,
            class_periods: default_periods(),
        })
    }

    async fn setup_session() -> (Arc<AttendanceStore>, SessionService) {
        let db = DbConnection::init_test()
            .await
            .expect("Failed to create test database");
        let store = Arc::new(AttendanceStore::new(db).await.unwrap());
        let session = SessionService::new(store.clone(), test_config());
        (store, session)
    }

    /// Pull the current feed snapshot into the session cache, the way the
    /// subscription task does in production.
    async fn sync(store: &AttendanceStore, session: &SessionService) {
        let snapshot = store.subscribe().borrow().clone();
        session.apply_snapshot(&snapshot).await.unwrap();
    }

    #[tokio::test]
    async fn test_sign_in_persists_a_normalized_record() {
        let (store, session) = setup_session().await;

        let record = session.sign_in("  Jane   Doe ").await.unwrap();
        assert_eq!(record.name, "Jane Doe");
        assert!(record.external_id.is_some());
        assert_eq!(record.date, today_key());
        assert!(!record.display_time.is_empty());

        assert_eq!(store.query_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sign_in_rejects_invalid_names() {
        let (_store, session) = setup_session().await;

        let err = session.sign_in("Jane").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_duplicate_sign_in_rejected_regardless_of_case() {
        let (store, session) = setup_session().await;

        session.sign_in("Jane Doe").await.unwrap();
        sync(&store, &session).await;

        let err = session.sign_in("jane doe").await.unwrap_err();
        assert!(matches!(err, AppError::AlreadySignedIn));
        assert_eq!(store.query_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_dedupe_writes_back_to_the_store() {
        let (store, session) = setup_session().await;

        // Two case variants land in the store directly, bypassing the
        // sign-in duplicate check.
        session.sign_in("Jane Doe").await.unwrap();
        let mut dupe = store.query_all().await.unwrap()[0].clone();
        dupe.id += 1;
        dupe.name = "JANE DOE".to_string();
        dupe.timestamp = dupe.timestamp - chrono::Duration::seconds(1);
        dupe.external_id = None;
        store.add(dupe).await.unwrap();
        assert_eq!(store.query_all().await.unwrap().len(), 2);

        sync(&store, &session).await;

        let remaining = store.query_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        // The earliest-received entry (newest timestamp in the feed) wins.
        assert_eq!(remaining[0].name, "Jane Doe");
        assert_eq!(session.roster().await.header_count, 1);
    }

    #[tokio::test]
    async fn test_roster_reflects_cache_and_filter() {
        let (store, session) = setup_session().await;

        session.sign_in("Jane Doe").await.unwrap();
        session.sign_in("Liam Brown").await.unwrap();
        sync(&store, &session).await;

        session.set_filter(HourFilter::All).await;
        let roster = session.roster().await;
        assert_eq!(roster.entries.len(), 2);
        assert_eq!(roster.header_count, 2);
        assert_eq!(roster.rows_needed, 1);
    }

    #[tokio::test]
    async fn test_delete_one_by_local_id() {
        let (store, session) = setup_session().await;

        let record = session.sign_in("Jane Doe").await.unwrap();
        sync(&store, &session).await;

        session.delete_one(record.id).await.unwrap();
        assert!(store.query_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_one_unknown_id_is_not_found() {
        let (_store, session) = setup_session().await;

        let err = session.delete_one(12345).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn test_clear_all_empties_today() {
        let (store, session) = setup_session().await;

        session.sign_in("Jane Doe").await.unwrap();
        session.sign_in("Liam Brown").await.unwrap();
        sync(&store, &session).await;

        let deleted = session.clear_all().await.unwrap();
        assert_eq!(deleted, 2);
        assert!(store.query_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_with_empty_roster_is_a_noop() {
        let (_store, session) = setup_session().await;
        assert_eq!(session.clear_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_refresh_filter_follows_the_clock() {
        let (_store, session) = setup_session().await;

        session.set_filter(HourFilter::All).await;
        let in_class = Local.with_ymd_and_hms(2026, 8, 31, 8, 30, 0).unwrap();
        session.refresh_filter(in_class).await;
        assert_eq!(session.current_filter().await, HourFilter::Period(1));

        let after_school = Local.with_ymd_and_hms(2026, 8, 31, 16, 0, 0).unwrap();
        session.refresh_filter(after_school).await;
        assert_eq!(session.current_filter().await, HourFilter::All);
    }

    #[tokio::test]
    async fn test_refresh_overrides_a_manually_picked_filter() {
        let (_store, session) = setup_session().await;

        session.set_filter(HourFilter::Period(3)).await;
        let in_period_one = Local.with_ymd_and_hms(2026, 8, 31, 8, 30, 0).unwrap();
        session.refresh_filter(in_period_one).await;
        assert_eq!(session.current_filter().await, HourFilter::Period(1));
    }

    #[tokio::test]
    async fn test_session_info_carries_the_qr_payload() {
        let (_store, session) = setup_session().await;

        let info = session.session_info();
        assert_eq!(
            info.signin_url,
            format!("http://localhost:8000/?signin=true&date={}", today_key())
        );
        assert_eq!(info.qr_size, 300);
        assert_eq!(info.today, today_key());
        assert!(!info.date_display.is_empty());
    }
}

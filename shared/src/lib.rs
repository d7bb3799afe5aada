use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single sign-in, created once and only ever deleted, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Process-local id (epoch milliseconds at creation), used for lookups
    /// before the store has assigned an external id.
    pub id: i64,
    /// Id assigned by the persistent store once the record is durably saved.
    /// `None` until the save completes.
    pub external_id: Option<String>,
    /// Normalized two-word name, display case preserved. Compared
    /// case-insensitively for uniqueness.
    pub name: String,
    /// Calendar day partition key, `YYYY-MM-DD`, derived at creation time.
    pub date: String,
    /// Creation instant; the store orders by this, descending.
    pub timestamp: DateTime<Utc>,
    /// Human-readable time captured at creation (e.g. "8:05 AM"), never
    /// recomputed later.
    pub display_time: String,
    /// Class period 1-4, or `None` when the sign-in happened outside all
    /// configured period windows.
    pub period: Option<u8>,
}

impl AttendanceRecord {
    /// Last word of the name, lowercased, used as the surname sort key.
    pub fn surname_key(&self) -> String {
        self.name
            .split_whitespace()
            .last()
            .unwrap_or("")
            .to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignInRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignInResponse {
    pub record: AttendanceRecord,
}

/// The computed display list for the roster panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterResponse {
    /// Today's records under the active period filter, sorted by surname.
    pub entries: Vec<AttendanceRecord>,
    /// Count of all of today's records, independent of the period filter.
    pub header_count: usize,
    /// Grid rows required to lay the entries out in three columns.
    pub rows_needed: usize,
    /// The active filter, `"all"` or `"1"`..`"4"`.
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    pub filter: String,
}

/// Everything the display page needs to render the session header and the
/// QR code area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// QR payload: the base URL with `?signin=true&date=<today>` appended.
    pub signin_url: String,
    /// QR image edge length in pixels.
    pub qr_size: u32,
    /// Today's `YYYY-MM-DD` partition key.
    pub today: String,
    /// Pre-formatted header date, e.g. "Fri, Aug 29".
    pub date_display: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(name: &str) -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            external_id: None,
            name: name.to_string(),
            date: "2026-08-29".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 8, 29, 13, 5, 0).unwrap(),
            display_time: "8:05 AM".to_string(),
            period: Some(1),
        }
    }

    #[test]
    fn surname_key_uses_last_word_lowercased() {
        assert_eq!(record("Jane Doe").surname_key(), "doe");
        assert_eq!(record("Harper O'Brien").surname_key(), "o'brien");
    }

    #[test]
    fn record_round_trips_through_json() {
        let original = record("Jane Doe");
        let json = serde_json::to_string(&original).unwrap();
        let parsed: AttendanceRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }
}

//! The roster view model: today-partitioning, defensive dedupe, period
//! filtering, and surname sorting.
//!
//! Everything here is pure; the subscription handler owns the one side
//! effect (persisting the dedupe result back to the store).

use shared::AttendanceRecord;

use crate::domain::periods::HourFilter;

const ROSTER_COLUMNS: usize = 3;

/// Today's working set after partitioning and dedupe.
#[derive(Debug, Clone, PartialEq)]
pub struct TodaySet {
    /// Today's records in store order (timestamp descending), one per
    /// case-insensitive name.
    pub records: Vec<AttendanceRecord>,
    /// External ids of duplicates that were dropped and should be deleted
    /// from the store so it converges.
    pub dropped_duplicates: Vec<String>,
}

/// The computed display list.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    pub entries: Vec<AttendanceRecord>,
    pub header_count: usize,
    pub rows_needed: usize,
}

/// Partition the full store feed down to today's records, collapsing
/// case-insensitive name duplicates. First occurrence in received order
/// wins; later duplicates are reported for deletion.
pub fn today_set(all: &[AttendanceRecord], today: &str) -> TodaySet {
    let mut seen: Vec<String> = Vec::new();
    let mut records = Vec::new();
    let mut dropped_duplicates = Vec::new();

    for record in all.iter().filter(|r| r.date == today) {
        let normalized = record.name.to_lowercase();
        if seen.contains(&normalized) {
            if let Some(id) = &record.external_id {
                dropped_duplicates.push(id.clone());
            }
        } else {
            seen.push(normalized);
            records.push(record.clone());
        }
    }

    TodaySet {
        records,
        dropped_duplicates,
    }
}

/// Whether a name is already present in today's set, case-insensitively.
pub fn is_signed_in(today_records: &[AttendanceRecord], name: &str) -> bool {
    let normalized = name.to_lowercase();
    today_records
        .iter()
        .any(|r| r.name.to_lowercase() == normalized)
}

/// Build the display list for today's records under the active filter.
pub fn build_roster(today_records: &[AttendanceRecord], filter: HourFilter) -> Roster {
    let mut entries: Vec<AttendanceRecord> = today_records
        .iter()
        .filter(|r| filter.matches(r.period))
        .cloned()
        .collect();

    entries.sort_by_key(|r| r.surname_key());

    Roster {
        header_count: today_records.len(),
        rows_needed: rows_needed(entries.len()),
        entries,
    }
}

/// Grid rows required to show `count` entries across three columns.
fn rows_needed(count: usize) -> usize {
    if count <= ROSTER_COLUMNS {
        1
    } else {
        count.div_ceil(ROSTER_COLUMNS)
    }
}

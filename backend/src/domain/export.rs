//! CSV export of the full attendance history.
//!
//! Export ignores the today partition on purpose: the teacher downloads
//! everything the store holds, newest day first.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use shared::AttendanceRecord;

const CSV_HEADER: &str = "Name,Date,Time,Hour";

/// Serialize the full history to CSV.
///
/// Rows are sorted by date descending (string comparison is exact for the
/// zero-padded `YYYY-MM-DD` key), then by surname ascending within a day.
/// Fields are double-quoted; a missing period renders as `N/A`.
pub fn export_csv(records: &[AttendanceRecord]) -> Result<String> {
    if records.is_empty() {
        bail!("No attendance data to export");
    }

    let mut sorted: Vec<&AttendanceRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.surname_key().cmp(&b.surname_key()))
    });

    let mut out = String::from(CSV_HEADER);
    for record in sorted {
        let period = record
            .period
            .map(|p| p.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        out.push('\n');
        out.push_str(&format!(
            "\"{}\",\"{}\",\"{}\",\"{}\"",
            record.name,
            format_export_date(&record.date),
            record.display_time,
            period
        ));
    }

    Ok(out)
}

/// Download filename carrying today's partition key.
pub fn export_filename(today: &str) -> String {
    format!("attendance-all-data-{}.csv", today)
}

/// Reformat the storage key into the locale date shown in the sheet,
/// `M/D/YYYY`. An unparseable key passes through unchanged.
fn format_export_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d.format("%-m/%-d/%Y").to_string(),
        Err(_) => date.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(name: &str, date: &str, time: &str, period: Option<u8>) -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            external_id: Some("ext-1".to_string()),
            name: name.to_string(),
            date: date.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap(),
            display_time: time.to_string(),
            period,
        }
    }

    #[test]
    fn empty_history_is_an_error() {
        let err = export_csv(&[]).unwrap_err();
        assert_eq!(err.to_string(), "No attendance data to export");
    }

    #[test]
    fn newest_date_comes_first() {
        let records = vec![
            record("Jane Doe", "2024-01-01", "8:05 AM", Some(1)),
            record("Liam Brown", "2024-01-02", "9:30 AM", Some(2)),
        ];
        let csv = export_csv(&records).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Name,Date,Time,Hour");
        assert!(lines[1].contains("Liam Brown"));
        assert!(lines[2].contains("Jane Doe"));
    }

    #[test]
    fn surnames_sort_ascending_within_a_day() {
        let records = vec![
            record("Alex Smith", "2024-01-01", "8:05 AM", Some(1)),
            record("Zoe Adams", "2024-01-01", "8:10 AM", Some(1)),
        ];
        let csv = export_csv(&records).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[1].contains("Zoe Adams"));
        assert!(lines[2].contains("Alex Smith"));
    }

    #[test]
    fn rows_are_quoted_and_dates_reformatted() {
        let records = vec![record("Jane Doe", "2024-01-02", "8:05 AM", Some(3))];
        let csv = export_csv(&records).unwrap();
        assert_eq!(
            csv.lines().nth(1).unwrap(),
            "\"Jane Doe\",\"1/2/2024\",\"8:05 AM\",\"3\""
        );
    }

    #[test]
    fn missing_period_renders_as_na() {
        let records = vec![record("Jane Doe", "2024-01-02", "7:30 AM", None)];
        let csv = export_csv(&records).unwrap();
        assert!(csv.lines().nth(1).unwrap().ends_with("\"N/A\""));
    }

    #[test]
    fn filename_carries_today_key() {
        assert_eq!(
            export_filename("2026-08-29"),
            "attendance-all-data-2026-08-29.csv"
        );
    }
}

//! Activity rows and the timestamp normalization shared by merge and sort.
//!
//! Timestamps are carried as the raw text the backend sent. Ordering always
//! goes through [`normalized_instant`], which maps an absent or unparseable
//! timestamp to the Unix epoch so such rows sort last and never win a merge.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use shiptrack_protocol::ActivityRecord;
use std::cmp::Reverse;

/// Naive layouts the storage service emits for `timestamp without time zone`.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// One line of a shipment's tracking history.
///
/// The same shape is used for the synthetic current row, for ephemeral rows
/// and for persisted activities; which one a row is follows from the list it
/// sits in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRow {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub location: String,
}

impl ActivityRow {
    /// Description, falling back to status. This is what the table shows.
    pub fn label(&self) -> &str {
        if self.description.is_empty() {
            &self.status
        } else {
            &self.description
        }
    }

    pub fn instant(&self) -> DateTime<Utc> {
        normalized_instant(self.timestamp.as_deref())
    }

    pub fn key(&self) -> ActivityKey {
        ActivityKey {
            timestamp: canonical_timestamp(self.timestamp.as_deref()),
            label: self.label().to_string(),
            location: self.location.clone(),
        }
    }
}

impl From<ActivityRecord> for ActivityRow {
    fn from(record: ActivityRecord) -> Self {
        Self {
            timestamp: non_empty(record.tracking_timestamp.as_deref()).map(str::to_string),
            description: record.description.unwrap_or_default(),
            status: record.status.unwrap_or_default(),
            location: record.location.unwrap_or_default(),
        }
    }
}

/// Structured identity used to collapse duplicate rows.
///
/// Two rows are the same entry when their timestamp, label and location all
/// match. Parseable timestamps are compared as instants, so `Z` and `+00:00`
/// spellings of one moment collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivityKey {
    timestamp: String,
    label: String,
    location: String,
}

/// Parses the timestamp spellings the backend is known to produce.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Postgres text output: `2026-01-31 10:00:00.123+00`
    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Instant used for every timestamp comparison; absent or unparseable is the epoch.
pub fn normalized_instant(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(parse_timestamp)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Stable newest-first sort on normalized timestamps.
pub fn sort_newest_first(rows: &mut [ActivityRow]) {
    rows.sort_by_cached_key(|row| Reverse(row.instant()));
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}

fn canonical_timestamp(raw: Option<&str>) -> String {
    match raw {
        None => String::new(),
        Some(text) => match parse_timestamp(text) {
            Some(instant) => instant.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            None => text.to_string(),
        },
    }
}

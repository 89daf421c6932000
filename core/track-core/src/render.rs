//! Pure presentation models for the render sink.
//!
//! Nothing here touches a screen: the history list becomes an
//! [`ActivityTable`], the shipment becomes a [`ShipmentSummary`], and a
//! [`RenderSink`](crate::services::RenderSink) decides how to show them.

use chrono::{DateTime, FixedOffset, Local, TimeZone};
use serde::Serialize;
use shiptrack_protocol::ShipmentRecord;
use std::fmt::{Display, Write};

use crate::config::DisplayConfig;
use crate::timeline::{parse_timestamp, ActivityRow};

pub const ACTIVITY_COLUMNS: [&str; 3] = ["Time", "Description", "Location"];

// ═══════════════════════════════════════════════════════════════════════════════
// Timestamps
// ═══════════════════════════════════════════════════════════════════════════════

/// Formats backend timestamps for display in a fixed offset or the local zone.
#[derive(Debug, Clone)]
pub struct TimestampFormatter {
    format: String,
    offset: Option<FixedOffset>,
}

impl TimestampFormatter {
    pub fn new(display: &DisplayConfig) -> Self {
        Self {
            format: display.timestamp_format.clone(),
            offset: display
                .utc_offset_minutes
                .and_then(|minutes| FixedOffset::east_opt(minutes.saturating_mul(60))),
        }
    }

    /// Absent → empty; unparseable → shown as received.
    pub fn format(&self, raw: Option<&str>) -> String {
        let Some(raw) = raw.filter(|text| !text.trim().is_empty()) else {
            return String::new();
        };
        let Some(instant) = parse_timestamp(raw) else {
            return raw.to_string();
        };
        match self.offset {
            Some(offset) => self.render(instant.with_timezone(&offset)),
            None => self.render(instant.with_timezone(&Local)),
        }
    }

    fn render<Tz>(&self, value: DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        // A bad strftime pattern surfaces as a fmt error, not a panic.
        let mut out = String::new();
        if write!(out, "{}", value.format(&self.format)).is_err() {
            return value.to_rfc3339();
        }
        out
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// History Table
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityTableRow {
    pub time: String,
    pub description: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityTable {
    /// Single placeholder row spanning all columns.
    Empty { placeholder: String },
    Rows { rows: Vec<ActivityTableRow> },
}

impl ActivityTable {
    pub fn rows(&self) -> &[ActivityTableRow] {
        match self {
            ActivityTable::Empty { .. } => &[],
            ActivityTable::Rows { rows } => rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ActivityTable::Empty { .. })
    }
}

pub fn render_activities(rows: &[ActivityRow], display: &DisplayConfig) -> ActivityTable {
    if rows.is_empty() {
        return ActivityTable::Empty {
            placeholder: display.empty_placeholder.clone(),
        };
    }

    let formatter = TimestampFormatter::new(display);
    ActivityTable::Rows {
        rows: rows
            .iter()
            .map(|row| ActivityTableRow {
                time: formatter.format(row.timestamp.as_deref()),
                description: row.label().to_string(),
                location: row.location.clone(),
            })
            .collect(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Shipment Summary
// ═══════════════════════════════════════════════════════════════════════════════

/// Tracking result card plus the history details panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShipmentSummary {
    pub tracking_number: String,
    pub status: String,
    pub origin: String,
    pub destination: String,
    pub estimated_delivery: String,
    pub last_updated: String,
    pub created: String,
    pub notes: String,
    pub package: String,
    pub sender_name: String,
    pub sender_address: String,
    pub receiver_name: String,
    pub receiver_address: String,
}

impl ShipmentSummary {
    pub fn from_record(shipment: &ShipmentRecord, display: &DisplayConfig) -> Self {
        let formatter = TimestampFormatter::new(display);
        let text = |value: &Option<String>| value.clone().unwrap_or_default();

        Self {
            tracking_number: text(&shipment.tracking_number),
            status: text(&shipment.status),
            origin: text(&shipment.origin),
            destination: text(&shipment.destination),
            estimated_delivery: text(&shipment.estimated_delivery),
            last_updated: formatter.format(shipment.last_updated.as_deref()),
            created: formatter.format(shipment.created_at.as_deref()),
            notes: text(&shipment.notes),
            package: text(&shipment.package_description),
            sender_name: text(&shipment.sender_name),
            sender_address: text(&shipment.sender_address),
            receiver_name: text(&shipment.receiver_name),
            receiver_address: text(&shipment.receiver_address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc_display() -> DisplayConfig {
        DisplayConfig {
            utc_offset_minutes: Some(0),
            ..DisplayConfig::default()
        }
    }

    #[test]
    fn empty_rows_render_placeholder() {
        let table = render_activities(&[], &utc_display());
        assert_eq!(
            table,
            ActivityTable::Empty {
                placeholder: "No activities yet.".to_string()
            }
        );
        assert!(table.rows().is_empty());
    }

    #[test]
    fn rows_render_three_columns() {
        let rows = vec![
            ActivityRow {
                timestamp: Some("2026-02-01T09:30:00Z".to_string()),
                description: String::new(),
                status: "Delivered".to_string(),
                location: "Memphis".to_string(),
            },
            ActivityRow::default(),
        ];

        let table = render_activities(&rows, &utc_display());
        assert_eq!(
            table.rows(),
            &[
                ActivityTableRow {
                    time: "2026-02-01 09:30:00".to_string(),
                    description: "Delivered".to_string(),
                    location: "Memphis".to_string(),
                },
                ActivityTableRow {
                    time: String::new(),
                    description: String::new(),
                    location: String::new(),
                },
            ]
        );
    }

    #[test]
    fn formatter_applies_fixed_offset() {
        let display = DisplayConfig {
            utc_offset_minutes: Some(-300),
            timestamp_format: "%H:%M %:z".to_string(),
            ..DisplayConfig::default()
        };
        let formatter = TimestampFormatter::new(&display);
        assert_eq!(formatter.format(Some("2026-02-01T09:30:00Z")), "04:30 -05:00");
    }

    #[test]
    fn formatter_passes_through_unparseable_text() {
        let formatter = TimestampFormatter::new(&utc_display());
        assert_eq!(formatter.format(Some("soon")), "soon");
        assert_eq!(formatter.format(None), "");
    }

    #[test]
    fn summary_formats_timestamps_and_defaults_missing_fields() {
        let shipment = ShipmentRecord {
            tracking_number: Some("ST123".to_string()),
            status: Some("In Transit".to_string()),
            last_updated: Some("2026-02-01T08:00:00Z".to_string()),
            ..Default::default()
        };
        let summary = ShipmentSummary::from_record(&shipment, &utc_display());
        assert_eq!(summary.tracking_number, "ST123");
        assert_eq!(summary.last_updated, "2026-02-01 08:00:00");
        assert_eq!(summary.created, "");
        assert_eq!(summary.destination, "");
    }
}

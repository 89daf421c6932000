//! Prints rendered models to stdout, as text or as JSON lines.

use serde::Serialize;
use shiptrack_core::{
    ActivityTable, MapPlan, RenderSink, ShipmentSummary, Viewport, ACTIVITY_COLUMNS,
};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

#[derive(Serialize)]
struct JsonLine<'a, T> {
    kind: &'a str,
    data: &'a T,
}

pub struct TerminalSink {
    format: Format,
}

impl TerminalSink {
    pub fn new(format: Format) -> Self {
        Self { format }
    }

    fn emit<T: Serialize>(&self, kind: &str, value: &T, text: impl FnOnce() -> String) {
        match self.format {
            Format::Text => println!("{}", text()),
            Format::Json => {
                match serde_json::to_string(&JsonLine { kind, data: value }) {
                    Ok(line) => println!("{}", line),
                    Err(err) => tracing::warn!(kind = kind, error = %err, "Failed to encode output"),
                }
            }
        }
    }
}

impl RenderSink for TerminalSink {
    fn show_summary(&mut self, summary: &ShipmentSummary) {
        self.emit("summary", summary, || summary_text(summary));
    }

    fn show_map(&mut self, plan: &MapPlan) {
        self.emit("map", plan, || map_text(plan));
    }

    fn show_history(&mut self, table: &ActivityTable) {
        self.emit("history", table, || table_text(table));
    }
}

fn summary_text(summary: &ShipmentSummary) -> String {
    let fields = [
        ("Tracking Number", &summary.tracking_number),
        ("Status", &summary.status),
        ("From", &summary.origin),
        ("To", &summary.destination),
        ("Estimated Delivery", &summary.estimated_delivery),
        ("Last Updated", &summary.last_updated),
        ("Notes", &summary.notes),
        ("Package", &summary.package),
        ("Sender", &summary.sender_name),
        ("Receiver", &summary.receiver_name),
    ];
    let mut out = String::new();
    for (label, value) in fields.iter().filter(|(_, value)| !value.is_empty()) {
        let _ = writeln!(out, "{:<20}{}", format!("{}:", label), value);
    }
    out.trim_end().to_string()
}

fn map_text(plan: &MapPlan) -> String {
    let mut out = String::from("Map:");
    for marker in &plan.markers {
        let _ = write!(
            out,
            "\n  {} ({:.4}, {:.4}){}",
            marker.label,
            marker.position.lat,
            marker.position.lon,
            if marker.open { " *" } else { "" }
        );
    }
    if plan.route.is_some() {
        out.push_str("\n  route: origin -> destination");
    }
    let viewport = match &plan.viewport {
        Viewport::FitBounds {
            south_west,
            north_east,
        } => format!(
            "fit ({:.4}, {:.4}) .. ({:.4}, {:.4})",
            south_west.lat, south_west.lon, north_east.lat, north_east.lon
        ),
        Viewport::Center { center, zoom } => {
            format!("center ({:.4}, {:.4}) zoom {}", center.lat, center.lon, zoom)
        }
        Viewport::Unchanged => "unchanged".to_string(),
    };
    let _ = write!(out, "\n  view: {}", viewport);
    out
}

fn table_text(table: &ActivityTable) -> String {
    let rows = match table {
        ActivityTable::Empty { placeholder } => return placeholder.clone(),
        ActivityTable::Rows { rows } => rows,
    };

    let cells: Vec<[&str; 3]> = rows
        .iter()
        .map(|row| [row.time.as_str(), row.description.as_str(), row.location.as_str()])
        .collect();
    let mut widths = ACTIVITY_COLUMNS.map(str::len);
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for line in std::iter::once(ACTIVITY_COLUMNS).chain(cells) {
        let _ = writeln!(
            out,
            "{:<w0$}  {:<w1$}  {}",
            line[0],
            line[1],
            line[2],
            w0 = widths[0],
            w1 = widths[1]
        );
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiptrack_core::ActivityTableRow;

    #[test]
    fn empty_table_prints_placeholder() {
        let table = ActivityTable::Empty {
            placeholder: "No activities yet.".to_string(),
        };
        assert_eq!(table_text(&table), "No activities yet.");
    }

    #[test]
    fn table_columns_are_aligned() {
        let table = ActivityTable::Rows {
            rows: vec![ActivityTableRow {
                time: "2026-02-01 09:00:00".to_string(),
                description: "Arrived".to_string(),
                location: "Memphis".to_string(),
            }],
        };
        let text = table_text(&table);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Time                 Description  Location");
        assert_eq!(lines[1], "2026-02-01 09:00:00  Arrived      Memphis");
    }

    #[test]
    fn summary_skips_blank_fields() {
        let summary = ShipmentSummary {
            tracking_number: "ST123".to_string(),
            status: "In Transit".to_string(),
            ..Default::default()
        };
        let text = summary_text(&summary);
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("Tracking Number:    ST123"));
    }
}

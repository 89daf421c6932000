//! The synthetic "current state" row and its reconciliation with history.

use shiptrack_protocol::ShipmentRecord;

use crate::timeline::{non_empty, ActivityRow};

/// Builds the row that represents a shipment as it stands now.
///
/// Missing fields degrade to empty strings; only a missing shipment yields `None`.
pub fn build_snapshot(shipment: Option<&ShipmentRecord>) -> Option<ActivityRow> {
    let shipment = shipment?;
    let status = non_empty(shipment.status.as_deref()).unwrap_or_default();
    let notes = shipment
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|notes| !notes.is_empty());

    Some(ActivityRow {
        timestamp: non_empty(shipment.last_updated.as_deref())
            .or_else(|| non_empty(shipment.updated_at.as_deref()))
            .map(str::to_string),
        description: notes.unwrap_or(status).to_string(),
        status: status.to_string(),
        location: non_empty(shipment.current_location.as_deref())
            .or_else(|| non_empty(shipment.origin.as_deref()))
            .unwrap_or_default()
            .to_string(),
    })
}

/// Lets the newest persisted activity overtake a snapshot that trails it.
///
/// An activity can be written before the shipment's own timestamp is bumped,
/// so when `history[0]` is strictly newer its time, text and location win.
/// Status always stays with the shipment record.
pub fn merge_with_latest(
    snapshot: Option<ActivityRow>,
    history: &[ActivityRow],
) -> Option<ActivityRow> {
    let snapshot = snapshot?;
    let Some(latest) = history.first() else {
        return Some(snapshot);
    };

    if latest.instant() <= snapshot.instant() {
        return Some(snapshot);
    }

    let description = [&latest.description, &latest.status, &snapshot.description]
        .into_iter()
        .find(|text| !text.is_empty())
        .cloned()
        .unwrap_or_default();
    let location = if latest.location.is_empty() {
        snapshot.location.clone()
    } else {
        latest.location.clone()
    };

    Some(ActivityRow {
        timestamp: latest.timestamp.clone(),
        description,
        status: snapshot.status,
        location,
    })
}

//! In-process collaborators.
//!
//! Back the CLI's fixture replay and the integration tests. They model the
//! hosted backend closely enough to exercise the controller: lookups by
//! tracking number or id, an RPC-style history lookup by tracking number,
//! and a sink that records everything it is asked to show.

use chrono::{SecondsFormat, Utc};
use shiptrack_protocol::{ActivityRecord, NewShipment, PushEvent, ShipmentRecord};
use std::collections::HashMap;

use crate::error::ServiceError;
use crate::map::{Coordinates, MapPlan};
use crate::render::{ActivityTable, ShipmentSummary};
use crate::services::{Geocoder, HistoryStore, RenderSink, ServiceResult, ShipmentStore};

// ═══════════════════════════════════════════════════════════════════════════════
// Shipments
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct MemoryShipmentStore {
    shipments: Vec<ShipmentRecord>,
    next_id: u64,
    failure: Option<ServiceError>,
}

impl MemoryShipmentStore {
    pub fn new(shipments: Vec<ShipmentRecord>) -> Self {
        Self {
            next_id: shipments.len() as u64 + 1,
            shipments,
            failure: None,
        }
    }

    /// Makes every subsequent call fail with `error`; `None` restores service.
    pub fn set_failure(&mut self, error: Option<ServiceError>) {
        self.failure = error;
    }

    /// Replaces the stored row with the same id, or appends it.
    pub fn upsert(&mut self, shipment: ShipmentRecord) {
        match self
            .shipments
            .iter_mut()
            .find(|existing| existing.id.is_some() && existing.id == shipment.id)
        {
            Some(existing) => *existing = shipment,
            None => self.shipments.push(shipment),
        }
    }

    pub fn shipments(&self) -> &[ShipmentRecord] {
        &self.shipments
    }

    fn check(&self) -> ServiceResult<()> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl ShipmentStore for MemoryShipmentStore {
    fn find_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> ServiceResult<Option<ShipmentRecord>> {
        self.check()?;
        Ok(self
            .shipments
            .iter()
            .find(|shipment| shipment.tracking_number.as_deref() == Some(tracking_number))
            .cloned())
    }

    fn find_by_id(&self, shipment_id: &str) -> ServiceResult<Option<ShipmentRecord>> {
        self.check()?;
        Ok(self
            .shipments
            .iter()
            .find(|shipment| shipment.id.as_deref() == Some(shipment_id))
            .cloned())
    }

    fn insert(&mut self, shipment: NewShipment) -> ServiceResult<ShipmentRecord> {
        self.check()?;
        if self
            .shipments
            .iter()
            .any(|existing| existing.tracking_number.as_deref() == Some(&shipment.tracking_number))
        {
            return Err(ServiceError::Rejected(format!(
                "duplicate tracking number {}",
                shipment.tracking_number
            )));
        }

        let id = self.next_id.to_string();
        self.next_id += 1;
        let record = ShipmentRecord {
            id: Some(id),
            tracking_number: Some(shipment.tracking_number),
            status: Some(shipment.status),
            origin: Some(shipment.origin),
            destination: Some(shipment.destination),
            current_location: Some(shipment.current_location),
            notes: None,
            updated_at: Some(shipment.last_updated.clone()),
            last_updated: Some(shipment.last_updated),
            created_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            estimated_delivery: Some(shipment.estimated_delivery),
            sender_name: Some(shipment.sender_name),
            sender_email: Some(shipment.sender_email),
            sender_phone: Some(shipment.sender_phone),
            sender_address: Some(shipment.sender_address),
            receiver_name: Some(shipment.receiver_name),
            receiver_phone: Some(shipment.receiver_phone),
            receiver_address: Some(shipment.receiver_address),
            package_description: Some(shipment.package_description),
            package_weight: Some(shipment.package_weight),
            package_value: Some(shipment.package_value),
            user_id: Some(shipment.user_id),
        };
        self.shipments.push(record.clone());
        Ok(record)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// History
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    activities: Vec<ActivityRecord>,
    /// tracking number → shipment id
    links: HashMap<String, String>,
    failure: Option<ServiceError>,
}

impl MemoryHistoryStore {
    pub fn new(activities: Vec<ActivityRecord>) -> Self {
        Self {
            activities,
            links: HashMap::new(),
            failure: None,
        }
    }

    /// Makes the history lookup resolve `shipment`'s tracking number.
    pub fn link(&mut self, shipment: &ShipmentRecord) {
        if let (Some(number), Some(id)) = (&shipment.tracking_number, &shipment.id) {
            self.links.insert(number.clone(), id.clone());
        }
    }

    pub fn set_failure(&mut self, error: Option<ServiceError>) {
        self.failure = error;
    }

    pub fn insert(&mut self, activity: ActivityRecord) {
        self.activities.push(activity);
    }

    /// Mirrors an activity push into the store: `old` is removed, `new` added.
    pub fn apply(&mut self, event: &PushEvent) {
        let PushEvent::ActivityChanged { old, new, .. } = event else {
            return;
        };
        if let Some(old) = old {
            if let Some(index) = self.activities.iter().position(|row| row == old) {
                self.activities.remove(index);
            }
        }
        if let Some(new) = new {
            self.activities.push(new.clone());
        }
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn activities_for(&self, tracking_number: &str) -> ServiceResult<Vec<ActivityRecord>> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let Some(shipment_id) = self.links.get(tracking_number) else {
            return Ok(Vec::new());
        };
        Ok(self
            .activities
            .iter()
            .filter(|row| row.shipment_id.as_deref() == Some(shipment_id.as_str()))
            .cloned()
            .collect())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Geocoding
// ═══════════════════════════════════════════════════════════════════════════════

/// Exact-match gazetteer.
#[derive(Debug, Clone, Default)]
pub struct MemoryGeocoder {
    places: HashMap<String, Coordinates>,
}

impl MemoryGeocoder {
    pub fn new(places: HashMap<String, Coordinates>) -> Self {
        Self { places }
    }

    pub fn insert(&mut self, query: &str, position: Coordinates) {
        self.places.insert(query.to_string(), position);
    }
}

impl Geocoder for MemoryGeocoder {
    fn geocode(&self, query: &str) -> ServiceResult<Option<Coordinates>> {
        Ok(self.places.get(query).copied())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rendering
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Summary(ShipmentSummary),
    Map(MapPlan),
    History(ActivityTable),
}

/// Sink that keeps every model it was handed, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    rendered: Vec<Rendered>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rendered(&self) -> &[Rendered] {
        &self.rendered
    }

    pub fn history_renders(&self) -> usize {
        self.rendered
            .iter()
            .filter(|item| matches!(item, Rendered::History(_)))
            .count()
    }

    pub fn last_history(&self) -> Option<&ActivityTable> {
        self.rendered.iter().rev().find_map(|item| match item {
            Rendered::History(table) => Some(table),
            _ => None,
        })
    }

    /// Hands back everything recorded so far and starts over.
    pub fn drain(&mut self) -> Vec<Rendered> {
        std::mem::take(&mut self.rendered)
    }
}

impl RenderSink for RecordingSink {
    fn show_summary(&mut self, summary: &ShipmentSummary) {
        self.rendered.push(Rendered::Summary(summary.clone()));
    }

    fn show_map(&mut self, plan: &MapPlan) {
        self.rendered.push(Rendered::Map(plan.clone()));
    }

    fn show_history(&mut self, table: &ActivityTable) {
        self.rendered.push(Rendered::History(table.clone()));
    }
}

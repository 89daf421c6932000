//! Seams to the external collaborators.
//!
//! Storage, history, geocoding and presentation are owned by other systems.
//! The controller only sees these traits; see [`crate::memory`] for the
//! in-process implementations used by the CLI and tests.

use shiptrack_protocol::{ActivityRecord, NewShipment, ShipmentRecord};

use crate::error::ServiceError;
use crate::map::{Coordinates, MapPlan};
use crate::render::{ActivityTable, ShipmentSummary};

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Row storage for shipments.
pub trait ShipmentStore {
    fn find_by_tracking_number(&self, tracking_number: &str)
        -> ServiceResult<Option<ShipmentRecord>>;

    fn find_by_id(&self, shipment_id: &str) -> ServiceResult<Option<ShipmentRecord>>;

    fn insert(&mut self, shipment: NewShipment) -> ServiceResult<ShipmentRecord>;
}

/// Public tracking-history lookup by tracking number.
pub trait HistoryStore {
    /// Activities in any order; empty when the shipment has none.
    fn activities_for(&self, tracking_number: &str) -> ServiceResult<Vec<ActivityRecord>>;
}

pub trait Geocoder {
    fn geocode(&self, query: &str) -> ServiceResult<Option<Coordinates>>;
}

/// Presentation layer. Accepts models and shows them; holds no tracker state.
pub trait RenderSink {
    fn show_summary(&mut self, summary: &ShipmentSummary);

    fn show_map(&mut self, plan: &MapPlan);

    fn show_history(&mut self, table: &ActivityTable);
}

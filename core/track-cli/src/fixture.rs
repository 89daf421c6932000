//! Recorded backend data the CLI replays instead of talking to the service.
//!
//! ```json
//! {
//!   "shipments": [{ "id": 42, "tracking_number": "ST123", ... }],
//!   "activities": [{ "shipment_id": 42, "tracking_timestamp": "...", ... }],
//!   "pushes": [{ "table": "shipments", "event_type": "UPDATE", "new": {...} }],
//!   "places": { "Dallas": [32.78, -96.80] }
//! }
//! ```

use serde::Deserialize;
use serde_json::Value;
use shiptrack_core::{
    Coordinates, MemoryGeocoder, MemoryHistoryStore, MemoryShipmentStore, TrackError,
};
use shiptrack_protocol::{ActivityRecord, ShipmentRecord};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub shipments: Vec<ShipmentRecord>,
    pub activities: Vec<ActivityRecord>,
    /// Raw push envelopes, validated one by one during replay.
    pub pushes: Vec<Value>,
    /// Geocoder answers, `[lat, lon]` per query.
    pub places: HashMap<String, [f64; 2]>,
}

pub struct Backend {
    pub shipments: MemoryShipmentStore,
    pub history: MemoryHistoryStore,
    pub geocoder: MemoryGeocoder,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self, TrackError> {
        let content = fs_err::read_to_string(path).map_err(|source| TrackError::Io {
            context: format!("reading fixture {}", path.display()),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, TrackError> {
        serde_json::from_str(content).map_err(|source| TrackError::Json {
            context: format!("parsing fixture {}", path.display()),
            source,
        })
    }

    /// Splits the fixture into collaborators and the pushes still to replay.
    pub fn into_backend(self) -> (Backend, Vec<Value>) {
        let mut history = MemoryHistoryStore::new(self.activities);
        for shipment in &self.shipments {
            history.link(shipment);
        }
        let places = self
            .places
            .into_iter()
            .map(|(query, [lat, lon])| (query, Coordinates::new(lat, lon)))
            .collect();

        let backend = Backend {
            shipments: MemoryShipmentStore::new(self.shipments),
            history,
            geocoder: MemoryGeocoder::new(places),
        };
        (backend, self.pushes)
    }

    pub fn first_tracking_number(&self) -> Option<String> {
        self.shipments
            .iter()
            .find_map(|shipment| shipment.tracking_number.clone())
    }
}

//! State for one tracking view.
//!
//! A session is either idle or tracking exactly one shipment. It owns that
//! view's ephemeral buffer and a request counter used to drop responses that
//! were overtaken by a newer fetch. Sessions are plain values; callers that
//! share one across threads wrap it in their own `Mutex`.

use shiptrack_protocol::{PushEvent, ShipmentRecord};
use tracing::debug;

use crate::ephemeral::EphemeralBuffer;
use crate::snapshot::build_snapshot;

/// Identifies one history fetch. Only the most recently issued token may
/// apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedShipment {
    pub tracking_number: String,
    pub shipment_id: Option<String>,
    /// Latest record seen. `None` when a refetch by id came back empty.
    pub shipment: Option<ShipmentRecord>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Tracking(TrackedShipment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Idle,
    TrackingNumberMismatch,
    ShipmentIdMismatch,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreReason::Idle => "idle",
            IgnoreReason::TrackingNumberMismatch => "tracking_number_mismatch",
            IgnoreReason::ShipmentIdMismatch => "shipment_id_mismatch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushDecision {
    Accept,
    Ignore(IgnoreReason),
}

#[derive(Debug, Clone, Default)]
pub struct TrackingSession {
    state: SessionState,
    ephemeral: EphemeralBuffer,
    issued: u64,
}

impl TrackingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ephemeral_capacity(capacity: usize) -> Self {
        Self {
            state: SessionState::Idle,
            ephemeral: EphemeralBuffer::with_capacity(capacity),
            issued: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn tracked(&self) -> Option<&TrackedShipment> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Tracking(tracked) => Some(tracked),
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracked().is_some()
    }

    pub fn tracking_number(&self) -> Option<&str> {
        self.tracked().map(|tracked| tracked.tracking_number.as_str())
    }

    pub fn shipment_id(&self) -> Option<&str> {
        self.tracked().and_then(|tracked| tracked.shipment_id.as_deref())
    }

    pub fn shipment(&self) -> Option<&ShipmentRecord> {
        self.tracked().and_then(|tracked| tracked.shipment.as_ref())
    }

    pub fn ephemeral(&self) -> &EphemeralBuffer {
        &self.ephemeral
    }

    /// Starts tracking a freshly looked-up shipment.
    ///
    /// Replaces any previous view wholesale: the buffer is cleared and
    /// in-flight fetches for the old view are invalidated.
    pub fn start_tracking(&mut self, lookup: &str, shipment: ShipmentRecord) {
        let tracking_number = shipment
            .tracking_number
            .clone()
            .filter(|number| !number.is_empty())
            .unwrap_or_else(|| lookup.to_string());
        debug!(
            tracking_number = %tracking_number,
            shipment_id = ?shipment.id,
            "Tracking session started"
        );
        self.state = SessionState::Tracking(TrackedShipment {
            tracking_number,
            shipment_id: shipment.id.clone(),
            shipment: Some(shipment),
        });
        self.ephemeral.clear();
        self.invalidate_requests();
    }

    /// Replaces the held record when history is opened afresh.
    ///
    /// The tracked identity is kept; the ephemeral buffer is cleared.
    pub fn reopen(&mut self, shipment: Option<ShipmentRecord>) {
        if let SessionState::Tracking(tracked) = &mut self.state {
            tracked.shipment = shipment;
            self.ephemeral.clear();
        }
    }

    pub fn gate(&self, event: &PushEvent) -> PushDecision {
        let Some(tracked) = self.tracked() else {
            return PushDecision::Ignore(IgnoreReason::Idle);
        };

        match event {
            PushEvent::ShipmentChanged { shipment } => {
                if shipment.tracking_number.as_deref() == Some(tracked.tracking_number.as_str()) {
                    PushDecision::Accept
                } else {
                    PushDecision::Ignore(IgnoreReason::TrackingNumberMismatch)
                }
            }
            PushEvent::ActivityChanged { shipment_id, .. } => {
                if tracked.shipment_id.as_deref() == Some(shipment_id.as_str()) {
                    PushDecision::Accept
                } else {
                    PushDecision::Ignore(IgnoreReason::ShipmentIdMismatch)
                }
            }
        }
    }

    /// Applies a shipment push that passed [`gate`](Self::gate).
    ///
    /// The snapshot of the record held before the push slides into the
    /// ephemeral buffer, then the new record takes its place.
    pub fn supersede(&mut self, shipment: ShipmentRecord) {
        let SessionState::Tracking(tracked) = &mut self.state else {
            return;
        };

        if let Some(previous) = build_snapshot(tracked.shipment.as_ref()) {
            let inserted = self.ephemeral.push(previous);
            debug!(
                tracking_number = %tracked.tracking_number,
                inserted = inserted,
                buffered = self.ephemeral.len(),
                "Previous snapshot buffered"
            );
        }
        if tracked.shipment_id.is_none() {
            tracked.shipment_id = shipment.id.clone();
        }
        tracked.shipment = Some(shipment);
    }

    pub fn begin_request(&mut self) -> RequestToken {
        self.issued += 1;
        RequestToken(self.issued)
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        token.0 == self.issued
    }

    fn invalidate_requests(&mut self) {
        self.issued += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiptrack_protocol::ActivityRecord;

    fn shipment(number: &str, status: &str, updated: &str) -> ShipmentRecord {
        ShipmentRecord {
            id: Some("42".to_string()),
            tracking_number: Some(number.to_string()),
            status: Some(status.to_string()),
            current_location: Some("Dallas".to_string()),
            last_updated: Some(updated.to_string()),
            ..Default::default()
        }
    }

    fn tracking_session() -> TrackingSession {
        let mut session = TrackingSession::new();
        session.start_tracking("ST123", shipment("ST123", "In Transit", "2026-02-01T08:00:00Z"));
        session
    }

    #[test]
    fn idle_session_ignores_everything() {
        let session = TrackingSession::new();
        let push = PushEvent::ShipmentChanged {
            shipment: shipment("ST123", "Delivered", "2026-02-01T09:00:00Z"),
        };
        assert_eq!(session.gate(&push), PushDecision::Ignore(IgnoreReason::Idle));
    }

    #[test]
    fn push_for_other_tracking_number_is_ignored() {
        let session = tracking_session();
        let before = session.state().clone();
        let push = PushEvent::ShipmentChanged {
            shipment: shipment("ST999", "Delivered", "2026-02-01T09:00:00Z"),
        };

        assert_eq!(
            session.gate(&push),
            PushDecision::Ignore(IgnoreReason::TrackingNumberMismatch)
        );
        assert_eq!(session.state(), &before);
        assert!(session.ephemeral().is_empty());
    }

    #[test]
    fn activity_push_gated_on_shipment_id() {
        let session = tracking_session();
        let matching = PushEvent::ActivityChanged {
            shipment_id: "42".to_string(),
            old: None,
            new: Some(ActivityRecord::default()),
        };
        let other = PushEvent::ActivityChanged {
            shipment_id: "43".to_string(),
            old: None,
            new: None,
        };

        assert_eq!(session.gate(&matching), PushDecision::Accept);
        assert_eq!(
            session.gate(&other),
            PushDecision::Ignore(IgnoreReason::ShipmentIdMismatch)
        );
    }

    #[test]
    fn supersede_buffers_previous_snapshot() {
        let mut session = tracking_session();
        session.supersede(shipment("ST123", "Out for delivery", "2026-02-01T09:00:00Z"));

        assert_eq!(session.ephemeral().len(), 1);
        let buffered = &session.ephemeral().rows()[0];
        assert_eq!(buffered.status, "In Transit");
        assert_eq!(buffered.timestamp.as_deref(), Some("2026-02-01T08:00:00Z"));
        assert_eq!(
            session.shipment().and_then(|s| s.status.as_deref()),
            Some("Out for delivery")
        );
    }

    #[test]
    fn new_lookup_clears_buffer_and_replaces_identity() {
        let mut session = tracking_session();
        session.supersede(shipment("ST123", "Out for delivery", "2026-02-01T09:00:00Z"));
        session.start_tracking("ST555", shipment("ST555", "Registered", "2026-02-02T08:00:00Z"));

        assert!(session.ephemeral().is_empty());
        assert_eq!(session.tracking_number(), Some("ST555"));
    }

    #[test]
    fn reopen_clears_buffer_but_keeps_identity() {
        let mut session = tracking_session();
        session.supersede(shipment("ST123", "Out for delivery", "2026-02-01T09:00:00Z"));
        session.reopen(None);

        assert!(session.ephemeral().is_empty());
        assert_eq!(session.tracking_number(), Some("ST123"));
        assert_eq!(session.shipment_id(), Some("42"));
        assert!(session.shipment().is_none());
    }

    #[test]
    fn only_latest_token_is_current() {
        let mut session = tracking_session();
        let first = session.begin_request();
        let second = session.begin_request();

        assert!(!session.is_latest(first));
        assert!(session.is_latest(second));

        session.start_tracking("ST555", shipment("ST555", "Registered", "2026-02-02T08:00:00Z"));
        assert!(!session.is_latest(second));
    }
}

//! Drives one tracking view against its collaborators.
//!
//! The controller owns a [`TrackingSession`] plus the stores, geocoder and
//! render sink it talks to. Every operation fetches first and mutates the
//! session only after the collaborators answered, so a failed call leaves
//! the view exactly as it was.
//!
//! History refreshes are split in three so callers that fetch off-thread can
//! still reject responses that a newer lookup or push overtook:
//!
//! ```text
//! begin_refresh ──► fetch_history ──► complete_refresh
//!   (token)          (collaborator)     (applied only if token is latest)
//! ```

use chrono::Utc;
use shiptrack_protocol::{ActivityRecord, PushEvent, ShipmentRecord};
use tracing::{debug, info};

use crate::config::TrackerConfig;
use crate::error::{Result, TrackError};
use crate::map::{plan_map, resolve_locations};
use crate::reconcile::reconcile_with_limit;
use crate::registration::{build_new_shipment, RegistrationForm};
use crate::render::{render_activities, ActivityTable, ShipmentSummary};
use crate::services::{Geocoder, HistoryStore, RenderSink, ShipmentStore};
use crate::session::{IgnoreReason, PushDecision, RequestToken, TrackingSession};
use crate::snapshot::{build_snapshot, merge_with_latest};
use crate::timeline::{sort_newest_first, ActivityRow};

/// A history fetch in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTicket {
    pub token: RequestToken,
    pub tracking_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Gated out; nothing changed and nothing was rendered.
    Ignored(IgnoreReason),
    Refreshed(ActivityTable),
    /// Accepted, but the history response lost to a newer request.
    Stale,
}

pub struct TrackingController<S, H, G, R> {
    shipments: S,
    history: H,
    geocoder: G,
    sink: R,
    session: TrackingSession,
    config: TrackerConfig,
}

impl<S, H, G, R> TrackingController<S, H, G, R>
where
    S: ShipmentStore,
    H: HistoryStore,
    G: Geocoder,
    R: RenderSink,
{
    pub fn new(shipments: S, history: H, geocoder: G, sink: R, config: TrackerConfig) -> Self {
        Self {
            session: TrackingSession::with_ephemeral_capacity(config.history.max_ephemeral),
            shipments,
            history,
            geocoder,
            sink,
            config,
        }
    }

    pub fn session(&self) -> &TrackingSession {
        &self.session
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn sink(&self) -> &R {
        &self.sink
    }

    pub fn shipments_mut(&mut self) -> &mut S {
        &mut self.shipments
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Lookup
    // ═══════════════════════════════════════════════════════════════════════════

    /// Finds a shipment by tracking number and starts tracking it.
    ///
    /// Shows the summary and an initial map plan. Any previous view is
    /// replaced and its ephemeral rows are dropped.
    pub fn lookup(&mut self, input: &str) -> Result<ShipmentSummary> {
        let tracking_number = input.trim();
        if tracking_number.is_empty() {
            return Err(TrackError::EmptyTrackingNumber);
        }

        let shipment = self
            .shipments
            .find_by_tracking_number(tracking_number)
            .map_err(|err| TrackError::service("shipment lookup", err))?
            .ok_or_else(|| TrackError::ShipmentNotFound(tracking_number.to_string()))?;

        info!(
            tracking_number = %tracking_number,
            shipment_id = ?shipment.id,
            status = ?shipment.status,
            "Shipment found"
        );

        let summary = ShipmentSummary::from_record(&shipment, &self.config.display);
        self.sink.show_summary(&summary);
        self.show_map(&shipment, true);
        self.session.start_tracking(tracking_number, shipment);
        Ok(summary)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // History
    // ═══════════════════════════════════════════════════════════════════════════

    /// Opens the history view for the tracked shipment.
    ///
    /// Refetches the record by id, clears the ephemeral buffer and renders a
    /// fresh reconciled table.
    pub fn open_history(&mut self) -> Result<ActivityTable> {
        let tracking_number = self
            .session
            .tracking_number()
            .ok_or(TrackError::NoActiveShipment)?
            .to_string();
        let shipment_id = self
            .session
            .shipment_id()
            .ok_or_else(|| TrackError::ShipmentIdMissing(tracking_number.clone()))?
            .to_string();

        let token = self.session.begin_request();
        let shipment = self
            .shipments
            .find_by_id(&shipment_id)
            .map_err(|err| TrackError::service("shipment refetch", err))?;
        let activities = self
            .history
            .activities_for(&tracking_number)
            .map_err(|err| TrackError::service("history fetch", err))?;

        info!(
            tracking_number = %tracking_number,
            shipment_id = %shipment_id,
            activities = activities.len(),
            "History opened"
        );

        self.session.reopen(shipment);
        if let Some(shipment) = self.session.shipment() {
            let summary = ShipmentSummary::from_record(shipment, &self.config.display);
            self.sink.show_summary(&summary);
        }

        let ticket = RefreshTicket {
            token,
            tracking_number,
        };
        Ok(self
            .complete_refresh(ticket, activities)
            .unwrap_or_else(|| self.empty_table()))
    }

    /// Issues a token for a history fetch of the tracked shipment.
    pub fn begin_refresh(&mut self) -> Result<RefreshTicket> {
        let tracking_number = self
            .session
            .tracking_number()
            .ok_or(TrackError::NoActiveShipment)?
            .to_string();
        Ok(RefreshTicket {
            token: self.session.begin_request(),
            tracking_number,
        })
    }

    pub fn fetch_history(&self, ticket: &RefreshTicket) -> Result<Vec<ActivityRecord>> {
        self.history
            .activities_for(&ticket.tracking_number)
            .map_err(|err| TrackError::service("history fetch", err))
    }

    /// Reconciles and renders a fetched history, unless a newer request was
    /// issued since `ticket`.
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        activities: Vec<ActivityRecord>,
    ) -> Option<ActivityTable> {
        if !self.session.is_latest(ticket.token) {
            debug!(
                tracking_number = %ticket.tracking_number,
                token = ticket.token.value(),
                "Discarding stale history response"
            );
            return None;
        }

        let mut persisted: Vec<ActivityRow> =
            activities.into_iter().map(ActivityRow::from).collect();
        sort_newest_first(&mut persisted);
        persisted.truncate(self.config.history.fetch_limit);

        let merged = merge_with_latest(build_snapshot(self.session.shipment()), &persisted);
        let prepend: Vec<ActivityRow> = merged.into_iter().collect();
        let rows = reconcile_with_limit(
            &persisted,
            &prepend,
            self.session.ephemeral().rows(),
            self.config.history.max_rows,
        );

        debug!(
            tracking_number = %ticket.tracking_number,
            persisted = persisted.len(),
            ephemeral = self.session.ephemeral().len(),
            rows = rows.len(),
            "History reconciled"
        );

        let table = render_activities(&rows, &self.config.display);
        self.sink.show_history(&table);
        Some(table)
    }

    /// Fetches and renders in one step.
    pub fn refresh_history(&mut self) -> Result<Option<ActivityTable>> {
        let ticket = self.begin_refresh()?;
        let activities = self.fetch_history(&ticket)?;
        Ok(self.complete_refresh(ticket, activities))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Live Updates
    // ═══════════════════════════════════════════════════════════════════════════

    /// Applies a realtime push to the tracked view.
    ///
    /// Pushes for other shipments are dropped without touching state. An
    /// accepted shipment push buffers the previous snapshot, shows the new
    /// record, and both kinds refresh the history.
    pub fn handle_push(&mut self, event: &PushEvent) -> Result<PushOutcome> {
        if let PushDecision::Ignore(reason) = self.session.gate(event) {
            debug!(
                kind = event.kind(),
                reason = reason.as_str(),
                tracked = ?self.session.tracking_number(),
                "Push ignored"
            );
            return Ok(PushOutcome::Ignored(reason));
        }

        if let PushEvent::ShipmentChanged { shipment } = event {
            debug!(
                tracking_number = ?shipment.tracking_number,
                status = ?shipment.status,
                "Shipment push accepted"
            );
            self.session.supersede(shipment.clone());
            let summary = ShipmentSummary::from_record(shipment, &self.config.display);
            self.sink.show_summary(&summary);
            self.show_map(shipment, false);
        }

        Ok(match self.refresh_history()? {
            Some(table) => PushOutcome::Refreshed(table),
            None => PushOutcome::Stale,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Registration
    // ═══════════════════════════════════════════════════════════════════════════

    /// Inserts a new shipment owned by `owner_id`.
    ///
    /// `owner_id` comes from the external auth collaborator; without it
    /// nothing is written.
    pub fn register(
        &mut self,
        form: &RegistrationForm,
        owner_id: Option<&str>,
    ) -> Result<ShipmentRecord> {
        let owner_id = owner_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(TrackError::NotAuthenticated)?;

        let new_shipment = build_new_shipment(
            form,
            owner_id,
            Utc::now(),
            &self.config.registration,
            &mut rand::thread_rng(),
        )?;
        let tracking_number = new_shipment.tracking_number.clone();
        let record = self
            .shipments
            .insert(new_shipment)
            .map_err(|err| TrackError::service("shipment insert", err))?;

        info!(tracking_number = %tracking_number, owner_id = %owner_id, "Shipment registered");
        Ok(record)
    }

    fn show_map(&mut self, shipment: &ShipmentRecord, use_fallback: bool) {
        let resolved = resolve_locations(&self.geocoder, shipment);
        let plan = plan_map(shipment, &resolved, &self.config.map, use_fallback);
        self.sink.show_map(&plan);
    }

    fn empty_table(&self) -> ActivityTable {
        ActivityTable::Empty {
            placeholder: self.config.display.empty_placeholder.clone(),
        }
    }
}

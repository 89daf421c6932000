//! Error types for shiptrack-core operations.
//!
//! The reconciliation core itself never fails; these errors come from the
//! controller's collaborators, configuration, and user input.

use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════════════
// Collaborator Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Failure reported by an external service (storage, history, geocoding).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("request rejected: {0}")]
    Rejected(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tracker Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// All errors surfaced by tracker operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    // ─────────────────────────────────────────────────────────────────────
    // User Input
    // ─────────────────────────────────────────────────────────────────────
    #[error("Please enter a tracking number")]
    EmptyTrackingNumber,

    #[error("No shipment found with tracking number {0}")]
    ShipmentNotFound(String),

    #[error("No shipment is being tracked; look up a tracking number first")]
    NoActiveShipment,

    #[error("Shipment {0} has no id; its history cannot be opened")]
    ShipmentIdMissing(String),

    #[error("Please log in to register a shipment")]
    NotAuthenticated,

    #[error("Estimated delivery {days} days from now is out of range")]
    DeliveryEstimateOutOfRange { days: i64 },

    // ─────────────────────────────────────────────────────────────────────
    // Collaborators
    // ─────────────────────────────────────────────────────────────────────
    #[error("{operation} failed: {source}")]
    Service {
        operation: &'static str,
        #[source]
        source: ServiceError,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Configuration & I/O
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TrackError {
    pub fn service(operation: &'static str, source: ServiceError) -> Self {
        TrackError::Service { operation, source }
    }
}

/// Convenience type alias for Results using TrackError.
pub type Result<T> = std::result::Result<T, TrackError>;

//! Wire types and realtime push validation for shiptrack.
//!
//! This crate is shared by the tracker core and anything that talks to the
//! hosted backend, so row shapes and push envelopes cannot drift. Rows mirror
//! the storage service's columns; every column is optional because the
//! service is not under our control and missing values must degrade, not fail.

use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const SHIPMENTS_TABLE: &str = "shipments";
pub const TRACKING_TABLE: &str = "shipment_tracking";
pub const MAX_PUSH_BYTES: usize = 256 * 1024;

// ═══════════════════════════════════════════════════════════════════════════════
// Rows
// ═══════════════════════════════════════════════════════════════════════════════

/// A shipment as stored by the backend. Superseded wholesale on each update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub current_location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub estimated_delivery: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub sender_phone: Option<String>,
    #[serde(default)]
    pub sender_address: Option<String>,
    #[serde(default)]
    pub receiver_name: Option<String>,
    #[serde(default)]
    pub receiver_phone: Option<String>,
    #[serde(default)]
    pub receiver_address: Option<String>,
    #[serde(default)]
    pub package_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub package_weight: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub package_value: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
}

/// A persisted tracking activity as returned by the history service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub shipment_id: Option<String>,
    #[serde(default)]
    pub tracking_timestamp: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Insert payload for a newly registered shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewShipment {
    pub tracking_number: String,
    pub user_id: String,
    pub status: String,
    pub sender_name: String,
    pub sender_email: String,
    pub sender_phone: String,
    pub sender_address: String,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    pub package_description: String,
    pub package_weight: String,
    pub package_value: String,
    pub origin: String,
    pub destination: String,
    pub current_location: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub estimated_delivery: String,
    /// RFC3339.
    pub last_updated: String,
}

// Ids and numeric columns come back as either JSON numbers or strings
// depending on the column type, so accept both.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Realtime Push
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Change notification as delivered by the realtime channel.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PushEnvelope {
    #[serde(default)]
    pub schema: Option<String>,
    pub table: String,
    pub event_type: ChangeKind,
    #[serde(default)]
    pub new: Option<Value>,
    #[serde(default)]
    pub old: Option<Value>,
    #[serde(default)]
    pub commit_timestamp: Option<String>,
}

/// A validated push, ready for session gating.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    ShipmentChanged {
        shipment: ShipmentRecord,
    },
    ActivityChanged {
        shipment_id: String,
        old: Option<ActivityRecord>,
        new: Option<ActivityRecord>,
    },
}

impl PushEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            PushEvent::ShipmentChanged { .. } => "shipment_changed",
            PushEvent::ActivityChanged { .. } => "activity_changed",
        }
    }
}

impl PushEnvelope {
    pub fn into_event(self) -> Result<PushEvent, ErrorInfo> {
        if let Some(committed) = self.commit_timestamp.as_deref() {
            if DateTime::parse_from_rfc3339(committed).is_err() {
                return Err(ErrorInfo::new(
                    "invalid_timestamp",
                    "commit_timestamp must be RFC3339",
                ));
            }
        }

        match self.table.as_str() {
            SHIPMENTS_TABLE => {
                // Only updates supersede a displayed shipment.
                if self.event_type != ChangeKind::Update {
                    return Err(ErrorInfo::new(
                        "unsupported_event",
                        format!("{:?} is not tracked for {}", self.event_type, SHIPMENTS_TABLE),
                    ));
                }
                let shipment: ShipmentRecord = decode_row(self.new, "new")?;
                require_string(&shipment.tracking_number, "new.tracking_number")?;
                Ok(PushEvent::ShipmentChanged { shipment })
            }
            TRACKING_TABLE => {
                let new: Option<ActivityRecord> = decode_optional_row(self.new, "new")?;
                let old: Option<ActivityRecord> = decode_optional_row(self.old, "old")?;
                let shipment_id = new
                    .as_ref()
                    .and_then(|row| row.shipment_id.clone())
                    .or_else(|| old.as_ref().and_then(|row| row.shipment_id.clone()))
                    .filter(|id| !id.trim().is_empty())
                    .ok_or_else(|| {
                        ErrorInfo::new("missing_field", "shipment_id is required in new or old")
                    })?;
                Ok(PushEvent::ActivityChanged {
                    shipment_id,
                    old,
                    new,
                })
            }
            other => Err(ErrorInfo::new(
                "unknown_table",
                format!("no subscription for table {}", other),
            )),
        }
    }
}

pub fn parse_push(payload: Value) -> Result<PushEvent, ErrorInfo> {
    let envelope: PushEnvelope = serde_json::from_value(payload).map_err(|err| {
        ErrorInfo::new(
            "invalid_payload",
            format!("push payload is invalid: {}", err),
        )
    })?;
    envelope.into_event()
}

pub fn parse_push_str(raw: &str) -> Result<PushEvent, ErrorInfo> {
    if raw.len() > MAX_PUSH_BYTES {
        return Err(ErrorInfo::new(
            "payload_too_large",
            format!("push payload exceeds {} bytes", MAX_PUSH_BYTES),
        ));
    }
    let value: Value = serde_json::from_str(raw).map_err(|err| {
        ErrorInfo::new("invalid_json", format!("push payload is not JSON: {}", err))
    })?;
    parse_push(value)
}

fn decode_row<T: DeserializeOwned>(
    value: Option<Value>,
    field: &str,
) -> Result<T, ErrorInfo> {
    match decode_optional_row(value, field)? {
        Some(row) => Ok(row),
        None => Err(ErrorInfo::new(
            "missing_field",
            format!("{} is required", field),
        )),
    }
}

fn decode_optional_row<T: DeserializeOwned>(
    value: Option<Value>,
    field: &str,
) -> Result<Option<T>, ErrorInfo> {
    match value {
        None | Some(Value::Null) => Ok(None),
        // Deletes arrive with an empty `new` object.
        Some(Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some).map_err(|err| {
            ErrorInfo::new("invalid_row", format!("{} is malformed: {}", field, err))
        }),
    }
}

fn require_string(value: &Option<String>, field: &str) -> Result<(), ErrorInfo> {
    if let Some(candidate) = value {
        if !candidate.trim().is_empty() {
            return Ok(());
        }
    }
    Err(ErrorInfo::new(
        "missing_field",
        format!("{} is required", field),
    ))
}

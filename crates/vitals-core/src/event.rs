//! Target events accepted by the tracker
//!
//! A [`TargetEvent`] is constructed fresh per delivery attempt and never
//! persisted on its own; only the ledger entry recording its outcome
//! survives. The serde renames match the tracker wire format so the sink
//! can post events without a second mapping layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Destination program and sub-stage for one event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub program: String,
    pub program_stage: String,
}

impl Destination {
    pub fn new(program: impl Into<String>, program_stage: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            program_stage: program_stage.into(),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.program, self.program_stage)
    }
}

/// Event completion status.
///
/// Every event the bridge produces is a completed historical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Completed,
}

/// One `(field id, value)` pair in an event's data set.
///
/// Values are always carried as text, whatever the source type was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValue {
    #[serde(rename = "dataElement")]
    pub field_id: String,
    pub value: String,
}

/// Geographic point attached to an event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// A transformed event bound for the delivery sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetEvent {
    /// Deterministic document-derived idempotency hint for the sink.
    ///
    /// Durable event identity is assigned by the sink; this key is never
    /// load-bearing for ledger correctness.
    #[serde(rename = "event", default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    #[serde(flatten)]
    pub destination: Destination,
    pub org_unit: String,
    /// Full ISO 8601 date-time of the recorded occurrence
    pub occurred_at: String,
    pub status: EventStatus,
    #[serde(rename = "storedBy")]
    pub reported_by: String,
    pub data_values: Vec<DataValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
}

impl TargetEvent {
    /// Append a data value, keeping field ids unique within the event.
    ///
    /// The first value written for a field id wins; later writes for the
    /// same id are ignored.
    pub fn push_value(&mut self, field_id: impl Into<String>, value: impl Into<String>) {
        let field_id = field_id.into();
        if self.data_values.iter().any(|dv| dv.field_id == field_id) {
            return;
        }
        self.data_values.push(DataValue {
            field_id,
            value: value.into(),
        });
    }
}

/// Opaque delivery-outcome token returned by the sink on acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub token: String,
}

impl DeliveryReceipt {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

/// One field-level validation error from a structured sink rejection.
///
/// The bridge logs conflicts verbatim and never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub object: String,
    pub message: String,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.object, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> TargetEvent {
        TargetEvent {
            client_key: None,
            destination: Destination::new("prog", "stage"),
            org_unit: "OU1".to_string(),
            occurred_at: "2024-03-01T00:00:00.000Z".to_string(),
            status: EventStatus::Completed,
            reported_by: "reporter".to_string(),
            data_values: Vec::new(),
            coordinate: None,
        }
    }

    #[test]
    fn test_push_value_keeps_first() {
        let mut ev = event();
        ev.push_value("abc", "1");
        ev.push_value("abc", "2");
        ev.push_value("def", "3");

        assert_eq!(ev.data_values.len(), 2);
        assert_eq!(ev.data_values[0].value, "1");
        assert_eq!(ev.data_values[1].field_id, "def");
    }

    #[test]
    fn test_wire_shape() {
        let mut ev = event();
        ev.client_key = Some("vitals-doc-1".to_string());
        ev.push_value("SjKctl9bPGk", "34");

        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "vitals-doc-1");
        assert_eq!(json["program"], "prog");
        assert_eq!(json["programStage"], "stage");
        assert_eq!(json["orgUnit"], "OU1");
        assert_eq!(json["status"], "COMPLETED");
        assert_eq!(json["storedBy"], "reporter");
        assert_eq!(json["dataValues"][0]["dataElement"], "SjKctl9bPGk");
        assert_eq!(json["dataValues"][0]["value"], "34");
        // Absent optionals are omitted, not null.
        assert!(json.get("coordinate").is_none());
    }

    #[test]
    fn test_destination_display() {
        let dest = Destination::new("ahx6MVXyFZZ", "stage1");
        assert_eq!(dest.to_string(), "ahx6MVXyFZZ/stage1");
    }
}

//! Turn types as reported by the queue service.
//!
//! The wire format has drifted over time: cubicles arrive either nested
//! (`cubicle: { name }`) or flattened (`cubicleName`), and attention kind
//! arrives either as `attentionKind` or the older `tipoAtencion`. Both shapes
//! deserialize into the same [`Turn`].

use serde::{Deserialize, Serialize};

/// Server-assigned turn identifier
pub type TurnId = i64;

/// Fallback spoken when a calling turn has no cubicle attached
pub const DEFAULT_CUBICLE_NAME: &str = "uno";

/// A patient waiting for or undergoing service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// Server identifier
    pub id: TurnId,

    /// Patient display name
    pub patient_name: String,

    /// Sequential turn number, unique within a day
    pub assigned_turn: u32,

    /// Where the turn sits in the queue (derived from the list it came from)
    #[serde(default, skip_deserializing)]
    pub status: TurnStatus,

    /// Assigned cubicle, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cubicle: Option<Cubicle>,

    /// Flattened cubicle name used by older list endpoints
    #[serde(default, skip_serializing)]
    cubicle_name: Option<String>,

    /// Normal or priority attention
    #[serde(default, alias = "tipoAtencion")]
    pub attention_kind: AttentionKind,

    /// How many times this turn has been announced
    #[serde(default)]
    pub call_count: u32,

    /// Whether the turn was pushed to the back of the queue
    #[serde(default)]
    pub is_deferred: bool,
}

impl Turn {
    /// Create a turn with the given identity and defaults elsewhere
    pub fn new(id: TurnId, patient_name: impl Into<String>, assigned_turn: u32) -> Self {
        Self {
            id,
            patient_name: patient_name.into(),
            assigned_turn,
            status: TurnStatus::Waiting,
            cubicle: None,
            cubicle_name: None,
            attention_kind: AttentionKind::Normal,
            call_count: 0,
            is_deferred: false,
        }
    }

    /// Builder: attach a cubicle
    pub fn with_cubicle(mut self, name: impl Into<String>) -> Self {
        self.cubicle = Some(Cubicle { name: name.into() });
        self
    }

    /// Builder: set the status
    pub fn with_status(mut self, status: TurnStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder: set the attention kind
    pub fn with_attention(mut self, kind: AttentionKind) -> Self {
        self.attention_kind = kind;
        self
    }

    /// Fold the flattened `cubicleName` field into `cubicle`
    pub(crate) fn normalize(mut self) -> Self {
        if self.cubicle.is_none() {
            if let Some(name) = self.cubicle_name.take() {
                self.cubicle = Some(Cubicle { name });
            }
        }
        self.cubicle_name = None;
        self
    }

    /// Cubicle name to announce, falling back to [`DEFAULT_CUBICLE_NAME`]
    pub fn cubicle_label(&self) -> &str {
        self.cubicle
            .as_ref()
            .map(|c| c.name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_CUBICLE_NAME)
    }

    /// Up to two uppercase initials for compact display
    pub fn initials(&self) -> String {
        let initials: String = self
            .patient_name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect();

        if initials.is_empty() {
            "??".to_string()
        } else {
            initials
        }
    }
}

/// An attention cubicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cubicle {
    pub name: String,
}

/// Queue status of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// In the waiting room
    #[default]
    Waiting,

    /// Assigned a cubicle, not yet announced
    Calling,

    /// Announced and being attended
    Attending,
}

/// Attention kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttentionKind {
    #[default]
    #[serde(rename = "normal", alias = "General", alias = "general")]
    Normal,

    #[serde(rename = "priority", alias = "Special", alias = "special")]
    Priority,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_cubicle_parsing() {
        let json = r#"{"id":1,"patientName":"Ana Ruiz","assignedTurn":7,"cubicle":{"name":"3"}}"#;
        let turn: Turn = serde_json::from_str(json).unwrap();
        let turn = turn.normalize();

        assert_eq!(turn.id, 1);
        assert_eq!(turn.patient_name, "Ana Ruiz");
        assert_eq!(turn.assigned_turn, 7);
        assert_eq!(turn.cubicle_label(), "3");
        assert_eq!(turn.attention_kind, AttentionKind::Normal);
    }

    #[test]
    fn test_flat_cubicle_and_legacy_attention() {
        let json = r#"{
            "id": 12,
            "patientName": "Luis Vega",
            "assignedTurn": 3,
            "tipoAtencion": "Special",
            "isDeferred": true,
            "callCount": 2,
            "cubicleName": "Cubículo 5"
        }"#;
        let turn: Turn = serde_json::from_str(json).unwrap();
        let turn = turn.normalize();

        assert_eq!(turn.cubicle, Some(Cubicle { name: "Cubículo 5".to_string() }));
        assert_eq!(turn.attention_kind, AttentionKind::Priority);
        assert!(turn.is_deferred);
        assert_eq!(turn.call_count, 2);
    }

    #[test]
    fn test_cubicle_label_fallback() {
        let turn = Turn::new(1, "Ana", 1);
        assert_eq!(turn.cubicle_label(), DEFAULT_CUBICLE_NAME);

        let blank = Turn::new(1, "Ana", 1).with_cubicle("  ");
        assert_eq!(blank.cubicle_label(), DEFAULT_CUBICLE_NAME);
    }

    #[test]
    fn test_initials() {
        assert_eq!(Turn::new(1, "ana maría ruiz", 1).initials(), "AM");
        assert_eq!(Turn::new(1, "", 1).initials(), "??");
    }
}

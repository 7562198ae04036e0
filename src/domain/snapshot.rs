//! Queue snapshots.
//!
//! A snapshot is the normalized result of one poll of `GET /queue/list`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::turn::{Turn, TurnId, TurnStatus};

/// Raw body of `GET /queue/list`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueListResponse {
    #[serde(default)]
    pub pending_turns: Vec<Turn>,

    #[serde(default)]
    pub in_progress_turns: Vec<Turn>,

    #[serde(default)]
    pub in_calling_turns: Vec<Turn>,
}

/// Normalized view of the queue at one instant.
///
/// Every turn appears in exactly one of the three lists and carries the
/// status matching that list. `waiting` and `attending` are sorted by
/// assigned turn number; `calling` keeps server order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub waiting: Vec<Turn>,
    pub attending: Vec<Turn>,
    pub calling: Vec<Turn>,
    pub fetched_at: DateTime<Utc>,
}

impl QueueSnapshot {
    /// Build a snapshot from a list response.
    ///
    /// A turn reported in more than one list is kept in the most advanced
    /// one (calling, then attending, then waiting).
    pub fn from_response(response: QueueListResponse) -> Self {
        let mut seen = HashSet::new();

        let calling = Self::claim(response.in_calling_turns, TurnStatus::Calling, &mut seen);
        let mut attending =
            Self::claim(response.in_progress_turns, TurnStatus::Attending, &mut seen);
        let mut waiting = Self::claim(response.pending_turns, TurnStatus::Waiting, &mut seen);

        attending.sort_by_key(|t| t.assigned_turn);
        waiting.sort_by_key(|t| t.assigned_turn);

        Self {
            waiting,
            attending,
            calling,
            fetched_at: Utc::now(),
        }
    }

    fn claim(turns: Vec<Turn>, status: TurnStatus, seen: &mut HashSet<TurnId>) -> Vec<Turn> {
        turns
            .into_iter()
            .filter_map(|turn| {
                if !seen.insert(turn.id) {
                    warn!(turn_id = turn.id, ?status, "Turn reported in more than one list, dropping duplicate");
                    return None;
                }
                Some(turn.normalize().with_status(status))
            })
            .collect()
    }

    /// The turn to announce next: lowest assigned turn number among calling turns
    pub fn next_calling(&self) -> Option<&Turn> {
        self.calling.iter().min_by_key(|t| t.assigned_turn)
    }

    /// Whether any turn is waiting
    pub fn has_waiting(&self) -> bool {
        !self.waiting.is_empty()
    }

    /// Total number of turns across all lists
    pub fn total(&self) -> usize {
        self.waiting.len() + self.attending.len() + self.calling.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(id: i64, assigned: u32) -> Turn {
        Turn::new(id, format!("Patient {}", id), assigned)
    }

    #[test]
    fn test_sorting_and_status() {
        let snapshot = QueueSnapshot::from_response(QueueListResponse {
            pending_turns: vec![turn(1, 9), turn(2, 4), turn(3, 6)],
            in_progress_turns: vec![turn(4, 2), turn(5, 1)],
            in_calling_turns: vec![],
        });

        let order: Vec<u32> = snapshot.waiting.iter().map(|t| t.assigned_turn).collect();
        assert_eq!(order, vec![4, 6, 9]);
        assert!(snapshot.waiting.iter().all(|t| t.status == TurnStatus::Waiting));
        assert_eq!(snapshot.attending[0].id, 5);
        assert!(snapshot.attending.iter().all(|t| t.status == TurnStatus::Attending));
        assert!(snapshot.next_calling().is_none());
    }

    #[test]
    fn test_duplicate_turn_kept_in_most_advanced_list() {
        let snapshot = QueueSnapshot::from_response(QueueListResponse {
            pending_turns: vec![turn(1, 1), turn(2, 2)],
            in_progress_turns: vec![turn(2, 2)],
            in_calling_turns: vec![turn(1, 1)],
        });

        assert_eq!(snapshot.total(), 2);
        assert!(snapshot.waiting.is_empty());
        assert_eq!(snapshot.attending[0].id, 2);
        assert_eq!(snapshot.calling[0].id, 1);
        assert_eq!(snapshot.calling[0].status, TurnStatus::Calling);
    }

    #[test]
    fn test_next_calling_is_lowest_turn_number() {
        let snapshot = QueueSnapshot::from_response(QueueListResponse {
            in_calling_turns: vec![turn(8, 15), turn(3, 11), turn(5, 13)],
            ..Default::default()
        });

        assert_eq!(snapshot.next_calling().map(|t| t.id), Some(3));
    }

    #[test]
    fn test_parse_list_body() {
        let body = r#"{
            "pendingTurns": [],
            "inProgressTurns": [],
            "inCallingTurns": [{"id":1,"patientName":"Ana Ruiz","assignedTurn":7,"cubicle":{"name":"3"}}]
        }"#;
        let response: QueueListResponse = serde_json::from_str(body).unwrap();
        let snapshot = QueueSnapshot::from_response(response);

        let calling = snapshot.next_calling().unwrap();
        assert_eq!(calling.patient_name, "Ana Ruiz");
        assert_eq!(calling.cubicle_label(), "3");
    }
}

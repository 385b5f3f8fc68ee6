//! Attendance model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Attendance lifecycle: PENDING -> APPROVED | REJECTED, APPROVED -> LEFT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendance_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AttendanceStatus {
    Pending,
    Approved,
    Rejected,
    Left,
}

impl AttendanceStatus {
    /// Organizer decisions only apply to pending requests
    pub fn is_decidable(self) -> bool {
        matches!(self, AttendanceStatus::Pending)
    }

    /// An attendee can leave while pending or approved
    pub fn can_leave(self) -> bool {
        matches!(self, AttendanceStatus::Pending | AttendanceStatus::Approved)
    }

    /// Counts against the event's attendee limit
    pub fn occupies_seat(self) -> bool {
        matches!(self, AttendanceStatus::Pending | AttendanceStatus::Approved)
    }
}

/// The organizer's verdict on a join request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttendanceDecision {
    Approved,
    Rejected,
}

impl From<AttendanceDecision> for AttendanceStatus {
    fn from(decision: AttendanceDecision) -> Self {
        match decision {
            AttendanceDecision::Approved => AttendanceStatus::Approved,
            AttendanceDecision::Rejected => AttendanceStatus::Rejected,
        }
    }
}

/// Attendance entity: one user's join record for one event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: AttendanceStatus,
    pub pudding_photo: String,
    pub pudding_name: Option<String>,
    pub pudding_desc: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// Attendance joined with the attendee's public identity
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_avatar_url: Option<String>,
    pub status: AttendanceStatus,
    pub pudding_photo: String,
    pub pudding_name: Option<String>,
    pub pudding_desc: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_accounting_matches_lifecycle() {
        assert!(AttendanceStatus::Pending.occupies_seat());
        assert!(AttendanceStatus::Approved.occupies_seat());
        assert!(!AttendanceStatus::Rejected.occupies_seat());
        assert!(!AttendanceStatus::Left.occupies_seat());
    }

    #[test]
    fn decisions_only_apply_to_pending() {
        assert!(AttendanceStatus::Pending.is_decidable());
        assert!(!AttendanceStatus::Approved.is_decidable());
        assert!(!AttendanceStatus::Rejected.is_decidable());
        assert!(!AttendanceStatus::Left.is_decidable());
    }

    #[test]
    fn decision_rejects_unknown_status() {
        assert!(serde_json::from_str::<AttendanceDecision>("\"PENDING\"").is_err());
        assert!(serde_json::from_str::<AttendanceDecision>("\"LEFT\"").is_err());
        assert_eq!(
            serde_json::from_str::<AttendanceDecision>("\"APPROVED\"").unwrap(),
            AttendanceDecision::Approved
        );
    }
}

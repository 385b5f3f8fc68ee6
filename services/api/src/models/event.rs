//! Event model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Event lifecycle status
///
/// UPCOMING and ONGOING move forward with time (see the status sweeper);
/// CANCELLED is the soft-delete state reachable from either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Ended,
    Cancelled,
}

impl EventStatus {
    /// Cancellation is only legal before the event has ended
    pub fn can_cancel(self) -> bool {
        matches!(self, EventStatus::Upcoming | EventStatus::Ongoing)
    }
}

/// A point on the map, WGS84 degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Event entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub state: String,
    pub address: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub attendee_limit: i32,
    pub status: EventStatus,
    pub organizer_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event row joined with its organizer's public identity
#[derive(Debug, Clone, FromRow)]
pub struct EventWithOrganizer {
    #[sqlx(flatten)]
    pub event: Event,
    pub organizer_name: String,
    pub organizer_avatar_url: Option<String>,
}

/// Event creation payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: GeoPoint,
    pub city: String,
    pub state: String,
    pub address: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub attendee_limit: i32,
}

/// Event update payload, organizer only; absent fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<GeoPoint>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub attendee_limit: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&EventStatus::Upcoming).unwrap(),
            "\"UPCOMING\""
        );
        assert_eq!(
            serde_json::from_str::<EventStatus>("\"CANCELLED\"").unwrap(),
            EventStatus::Cancelled
        );
    }

    #[test]
    fn only_live_events_can_be_cancelled() {
        assert!(EventStatus::Upcoming.can_cancel());
        assert!(EventStatus::Ongoing.can_cancel());
        assert!(!EventStatus::Ended.can_cancel());
        assert!(!EventStatus::Cancelled.can_cancel());
    }

    #[test]
    fn create_request_accepts_camel_case() {
        let json = r#"{
            "title": "Pudding im Park",
            "location": {"lat": 52.52, "lng": 13.405},
            "city": "Berlin",
            "state": "Berlin",
            "startTime": "2030-06-01T16:00:00Z",
            "endTime": "2030-06-01T19:00:00Z",
            "attendeeLimit": 12
        }"#;

        let req: CreateEventRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.attendee_limit, 12);
        assert!(req.description.is_none());
    }
}

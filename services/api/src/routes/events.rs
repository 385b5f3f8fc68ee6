//! Event routes: discovery, detail, create, update, cancel

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    geo,
    middleware::{AuthUser, optional_user},
    models::{
        Attendance, AttendanceWithUser, CreateEventRequest, EventStatus, EventWithOrganizer,
        GeoPoint, UpdateEventRequest,
    },
    state::AppState,
    validation,
};

/// Default search radius in meters when the caller filters by location
const DEFAULT_RADIUS_M: f64 = 100_000.0;

/// Default and maximum page size for event listings
const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 100;

/// How many approved pudding photos an event card previews
const PUDDING_PREVIEW_CAP: usize = 5;

/// Query parameters for event discovery
#[derive(Debug, Default, Deserialize)]
pub struct ListEventsQuery {
    pub status: Option<EventStatus>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
    pub limit: Option<i64>,
}

/// Organizer identity embedded in event responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerInfo {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// An event as rendered in listings and detail responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: GeoPoint,
    pub city: String,
    pub state: String,
    pub address: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub attendee_limit: i32,
    pub attendee_count: i64,
    pub status: EventStatus,
    pub organizer: OrganizerInfo,
    pub pudding_previews: Vec<String>,
    /// Meters from the caller's search point; only set on geo searches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl EventView {
    fn new(
        row: EventWithOrganizer,
        attendee_count: i64,
        pudding_previews: Vec<String>,
        distance: Option<f64>,
    ) -> Self {
        let event = row.event;

        EventView {
            id: event.id,
            title: event.title,
            description: event.description,
            location: GeoPoint {
                lat: event.latitude,
                lng: event.longitude,
            },
            city: event.city,
            state: event.state,
            address: event.address,
            start_time: event.start_time,
            end_time: event.end_time,
            attendee_limit: event.attendee_limit,
            attendee_count,
            status: event.status,
            organizer: OrganizerInfo {
                id: event.organizer_id,
                name: row.organizer_name,
                avatar_url: row.organizer_avatar_url,
            },
            pudding_previews,
            distance,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub events: Vec<EventView>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub event: EventView,
}

/// Event detail with the approved attendee roster and, for logged-in
/// callers, their own attendance record
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetailResponse {
    pub event: EventView,
    pub attendees: Vec<AttendanceWithUser>,
    pub user_attendance: Option<Attendance>,
}

/// List events, optionally filtered by status and proximity
///
/// With `lat`/`lng` the whole status bucket is fetched, filtered by
/// haversine distance against `radius` (default 100 km) and annotated with
/// the distance; without them the limit is pushed into the query.
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = query.status.unwrap_or(EventStatus::Upcoming);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let geo_filter = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => Some((lat, lng, query.radius.unwrap_or(DEFAULT_RADIUS_M))),
        _ => None,
    };

    let rows = state
        .event_repository
        .list_by_status(status, geo_filter.is_none().then_some(limit))
        .await?;

    let mut selected: Vec<(EventWithOrganizer, Option<f64>)> = match geo_filter {
        Some((lat, lng, radius)) => {
            let mut nearby: Vec<(EventWithOrganizer, Option<f64>)> = rows
                .into_iter()
                .filter_map(|row| {
                    let d =
                        geo::haversine_distance_m(lat, lng, row.event.latitude, row.event.longitude);
                    (d <= radius).then_some((row, Some(d)))
                })
                .collect();
            nearby.truncate(limit as usize);
            nearby
        }
        None => rows.into_iter().map(|row| (row, None)).collect(),
    };

    let event_ids: Vec<Uuid> = selected.iter().map(|(row, _)| row.event.id).collect();
    let mut counts = state.event_repository.approved_counts(&event_ids).await?;
    let mut photos = state
        .event_repository
        .approved_photos(&event_ids, PUDDING_PREVIEW_CAP)
        .await?;

    let events: Vec<EventView> = selected
        .drain(..)
        .map(|(row, distance)| {
            let count = counts.remove(&row.event.id).unwrap_or(0);
            let previews = photos.remove(&row.event.id).unwrap_or_default();
            EventView::new(row, count, previews, distance)
        })
        .collect();

    let total = events.len();
    Ok(Json(EventListResponse { events, total }))
}

/// Event detail by id
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let row = state
        .event_repository
        .find_with_organizer(event_id)
        .await?
        .ok_or(ApiError::NotFound("Event not found"))?;

    let attendees = state
        .attendance_repository
        .list_approved_with_users(event_id)
        .await?;

    let user_attendance = match optional_user(&headers, &state.jwt_service) {
        Some(user) => {
            state
                .attendance_repository
                .find_by_user_and_event(user.id, event_id)
                .await?
        }
        None => None,
    };

    let photos = attendees
        .iter()
        .take(PUDDING_PREVIEW_CAP)
        .map(|a| a.pudding_photo.clone())
        .collect();

    let event = EventView::new(row, attendees.len() as i64, photos, None);

    Ok(Json(EventDetailResponse {
        event,
        attendees,
        user_attendance,
    }))
}

/// Create an event; the caller becomes its organizer
pub async fn create_event(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateEventRequest>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_event_title(&payload.title).map_err(ApiError::Validation)?;
    if let Some(description) = &payload.description {
        validation::validate_event_description(description).map_err(ApiError::Validation)?;
    }
    validation::validate_event_location(payload.location).map_err(ApiError::Validation)?;
    validation::validate_event_times(payload.start_time, payload.end_time)
        .map_err(ApiError::Validation)?;
    validation::validate_attendee_limit(payload.attendee_limit).map_err(ApiError::Validation)?;

    let row = state.event_repository.create(auth_user.id, &payload).await?;

    info!(event_id = %row.event.id, organizer_id = %auth_user.id, "event created");

    Ok((
        StatusCode::CREATED,
        Json(EventResponse {
            event: EventView::new(row, 0, Vec::new(), None),
        }),
    ))
}

/// Partially update an event, organizer only
pub async fn update_event(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<UpdateEventRequest>,
) -> ApiResult<impl IntoResponse> {
    let event = state
        .event_repository
        .find_by_id(event_id)
        .await?
        .ok_or(ApiError::NotFound("Event not found"))?;

    if event.organizer_id != auth_user.id {
        return Err(ApiError::Forbidden("Only the organizer can edit this event"));
    }

    if let Some(title) = &payload.title {
        validation::validate_event_title(title).map_err(ApiError::Validation)?;
    }
    if let Some(description) = &payload.description {
        validation::validate_event_description(description).map_err(ApiError::Validation)?;
    }
    if let Some(location) = payload.location {
        validation::validate_event_location(location).map_err(ApiError::Validation)?;
    }
    if let Some(limit) = payload.attendee_limit {
        validation::validate_attendee_limit(limit).map_err(ApiError::Validation)?;
    }

    // Rescheduling revalidates the effective pair; leaving both times alone
    // must not trip the lead-time rule on an already running event.
    if payload.start_time.is_some() || payload.end_time.is_some() {
        let start = payload.start_time.unwrap_or(event.start_time);
        let end = payload.end_time.unwrap_or(event.end_time);
        validation::validate_event_times(start, end).map_err(ApiError::Validation)?;
    }

    let row = state.event_repository.update(event_id, &payload).await?;
    let counts = state.event_repository.approved_counts(&[event_id]).await?;
    let photos = state
        .event_repository
        .approved_photos(&[event_id], PUDDING_PREVIEW_CAP)
        .await?;

    let count = counts.get(&event_id).copied().unwrap_or(0);
    let previews = photos.get(&event_id).cloned().unwrap_or_default();

    Ok(Json(EventResponse {
        event: EventView::new(row, count, previews, None),
    }))
}

/// Cancel an event (soft delete), organizer or admin
pub async fn cancel_event(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let event = state
        .event_repository
        .find_by_id(event_id)
        .await?
        .ok_or(ApiError::NotFound("Event not found"))?;

    if event.organizer_id != auth_user.id && !auth_user.role.is_admin() {
        return Err(ApiError::Forbidden(
            "Only the organizer can delete this event",
        ));
    }

    if !event.status.can_cancel() {
        return Err(ApiError::Validation(
            "Event has already ended or been cancelled".to_string(),
        ));
    }

    state
        .event_repository
        .set_status(event_id, EventStatus::Cancelled)
        .await?;

    info!(%event_id, user_id = %auth_user.id, "event cancelled");

    Ok(Json(serde_json::json!({
        "message": "Event cancelled successfully"
    })))
}

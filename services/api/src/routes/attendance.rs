//! Attendance routes: join with pudding, review requests, leave

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{Attendance, AttendanceDecision, AttendanceStatus, AttendanceWithUser},
    repositories::JoinOutcome,
    state::AppState,
};

/// The multipart form fields of a join request
#[derive(Debug, Default)]
struct JoinForm {
    photo: Option<(String, Vec<u8>)>,
    pudding_name: Option<String>,
    pudding_desc: Option<String>,
}

impl JoinForm {
    async fn from_multipart(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = JoinForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Validation(e.to_string()))?
        {
            match field.name() {
                Some("puddingPhoto") => {
                    let content_type = field
                        .content_type()
                        .ok_or_else(|| {
                            ApiError::Validation("Pudding photo must declare a content type".into())
                        })?
                        .to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::Validation(e.to_string()))?;
                    form.photo = Some((content_type, bytes.to_vec()));
                }
                Some("puddingName") => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::Validation(e.to_string()))?;
                    if !text.trim().is_empty() {
                        form.pudding_name = Some(text);
                    }
                }
                Some("puddingDesc") => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::Validation(e.to_string()))?;
                    if !text.trim().is_empty() {
                        form.pudding_desc = Some(text);
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

#[derive(Debug, Serialize)]
pub struct AttendanceResponse {
    pub attendance: Attendance,
}

/// Attendances of an event bucketed by status, for the organizer's review
/// screen. LEFT attendances are not shown.
#[derive(Debug, Serialize)]
pub struct GroupedAttendances {
    pub pending: Vec<AttendanceWithUser>,
    pub approved: Vec<AttendanceWithUser>,
    pub rejected: Vec<AttendanceWithUser>,
}

/// Organizer decision payload
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub status: AttendanceDecision,
}

/// Request to join an event, bringing a pudding
///
/// Multipart form: `puddingPhoto` (required image), `puddingName` and
/// `puddingDesc` (optional text).
pub async fn join_event(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(event_id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = JoinForm::from_multipart(multipart).await?;

    let Some((content_type, bytes)) = form.photo else {
        return Err(ApiError::Validation("Pudding photo is required".to_string()));
    };

    let photo_path = state.uploads.store_photo(&content_type, &bytes).await?;

    let outcome = state
        .attendance_repository
        .join(
            auth_user.id,
            event_id,
            &photo_path,
            form.pudding_name.as_deref(),
            form.pudding_desc.as_deref(),
        )
        .await;

    // a rejected join must not leave the photo behind on disk
    let error = match outcome {
        Ok(JoinOutcome::Joined(attendance)) => {
            info!(user_id = %auth_user.id, %event_id, "join request submitted");
            return Ok((
                StatusCode::CREATED,
                Json(AttendanceResponse {
                    attendance: *attendance,
                }),
            ));
        }
        Ok(JoinOutcome::EventNotFound) => ApiError::NotFound("Event not found"),
        Ok(JoinOutcome::EventFull) => ApiError::Validation("Event is full".to_string()),
        Ok(JoinOutcome::AlreadyJoined) => ApiError::Conflict("Already joined this event"),
        Err(e) => e.into(),
    };

    state.uploads.remove(&photo_path).await;
    Err(error)
}

/// All join requests of an event, organizer only
pub async fn list_attendances(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let event = state
        .event_repository
        .find_by_id(event_id)
        .await?
        .ok_or(ApiError::NotFound("Event not found"))?;

    if event.organizer_id != auth_user.id {
        return Err(ApiError::Forbidden(
            "Only the organizer can view join requests",
        ));
    }

    let mut grouped = GroupedAttendances {
        pending: Vec::new(),
        approved: Vec::new(),
        rejected: Vec::new(),
    };

    for attendance in state.attendance_repository.list_with_users(event_id).await? {
        match attendance.status {
            AttendanceStatus::Pending => grouped.pending.push(attendance),
            AttendanceStatus::Approved => grouped.approved.push(attendance),
            AttendanceStatus::Rejected => grouped.rejected.push(attendance),
            AttendanceStatus::Left => {}
        }
    }

    Ok(Json(grouped))
}

/// Approve or reject a pending join request, organizer only
pub async fn update_attendance(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((event_id, attendance_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<DecisionRequest>,
) -> ApiResult<impl IntoResponse> {
    let event = state
        .event_repository
        .find_by_id(event_id)
        .await?
        .ok_or(ApiError::NotFound("Event not found"))?;

    if event.organizer_id != auth_user.id {
        return Err(ApiError::Forbidden(
            "Only the organizer can decide join requests",
        ));
    }

    let attendance = state
        .attendance_repository
        .find_by_id(attendance_id)
        .await?
        .filter(|a| a.event_id == event_id)
        .ok_or(ApiError::NotFound("Attendance not found"))?;

    if !attendance.status.is_decidable() {
        return Err(ApiError::Validation(
            "Join request has already been decided".to_string(),
        ));
    }

    let attendance = state
        .attendance_repository
        .decide(attendance_id, payload.status.into())
        .await?;

    info!(%attendance_id, %event_id, status = ?attendance.status, "join request decided");

    Ok(Json(AttendanceResponse { attendance }))
}

/// Leave an event
///
/// Transitions the caller's PENDING or APPROVED attendance to LEFT. The
/// response does not reveal whether such an attendance existed.
pub async fn leave_event(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let left = state
        .attendance_repository
        .mark_left(auth_user.id, event_id)
        .await?;

    if left > 0 {
        info!(user_id = %auth_user.id, %event_id, "attendee left event");
    }

    Ok(Json(serde_json::json!({
        "message": "You have left the event"
    })))
}

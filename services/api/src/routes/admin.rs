//! Admin routes, reachable only through the admin middleware stack

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{EventStatus, PublicUser, UserRole},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<PublicUser>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
pub struct UpdateRoleResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

/// List all users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users = state.user_repository.list_all().await?;
    Ok(Json(UserListResponse { users }))
}

/// Change a user's role
///
/// Promotion to super_admin is reserved for super admins, and a super admin
/// cannot demote themselves.
pub async fn update_user_role(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .user_repository
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    if payload.role == UserRole::SuperAdmin && admin.role != UserRole::SuperAdmin {
        return Err(ApiError::Forbidden(
            "Only super admins can grant the super_admin role",
        ));
    }

    if user_id == admin.id
        && admin.role == UserRole::SuperAdmin
        && payload.role != UserRole::SuperAdmin
    {
        return Err(ApiError::Forbidden("Super admins cannot demote themselves"));
    }

    let user = state.user_repository.update_role(user_id, payload.role).await?;

    warn!(admin_id = %admin.id, %user_id, role = ?payload.role, "user role changed");

    Ok(Json(UpdateRoleResponse {
        message: "User role updated",
        user,
    }))
}

/// Force-cancel any event, regardless of who organized it
pub async fn force_cancel_event(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let event = state
        .event_repository
        .find_by_id(event_id)
        .await?
        .ok_or(ApiError::NotFound("Event not found"))?;

    if !event.status.can_cancel() {
        return Err(ApiError::Validation(
            "Event has already ended or been cancelled".to_string(),
        ));
    }

    state
        .event_repository
        .set_status(event_id, EventStatus::Cancelled)
        .await?;

    info!(admin_id = %admin.id, %event_id, "event cancelled by admin");

    Ok(Json(serde_json::json!({
        "message": "Event cancelled successfully"
    })))
}

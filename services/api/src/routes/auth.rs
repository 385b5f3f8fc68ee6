//! Auth routes: register, login, current user

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{PublicUser, UserRole},
    password, validation,
    state::AppState,
};

/// Registration payload
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Login payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration and login both answer with the user and a bearer token
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
}

/// Current-user response with activity counts
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub events_created: i64,
    pub events_joined: i64,
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = payload.email.trim().to_lowercase();

    validation::validate_email(&email).map_err(ApiError::Validation)?;
    validation::validate_password(&payload.password).map_err(ApiError::Validation)?;
    validation::validate_name(&payload.name).map_err(ApiError::Validation)?;

    if state.user_repository.find_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered"));
    }

    let password_hash = password::hash_password(&payload.password)?;
    let user = state
        .user_repository
        .create(&email, payload.name.trim(), &password_hash)
        .await?;

    info!(user_id = %user.id, "user registered");

    let token = state.jwt_service.generate_token(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

/// Log an existing user in
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = payload.email.trim().to_lowercase();
    validation::validate_email(&email).map_err(ApiError::Validation)?;

    let user = state
        .user_repository
        .find_by_email(&email)
        .await?
        .ok_or(ApiError::Unauthorized("Invalid credentials"))?;

    if !password::verify_password(&payload.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let token = state.jwt_service.generate_token(&user)?;

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

/// The authenticated user's profile and activity counts
pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_id(auth_user.id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    let (events_created, events_joined) =
        state.user_repository.event_counts(auth_user.id).await?;

    Ok(Json(MeResponse {
        id: user.id,
        email: user.email,
        name: user.name,
        avatar_url: user.avatar_url,
        role: user.role,
        events_created,
        events_joined,
    }))
}

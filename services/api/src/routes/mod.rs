//! HTTP routing
//!
//! Three route groups: public (discovery, auth entry points, the WebSocket
//! upgrade, which does its own token check), authenticated (everything that
//! acts on behalf of a user), and admin (authenticated plus a role gate).

pub mod admin;
pub mod attendance;
pub mod auth;
pub mod events;
pub mod messages;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    handler::Handler,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, patch, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use crate::{
    middleware::{auth_middleware, require_admin},
    state::AppState,
    uploads::MAX_PHOTO_BYTES,
    ws,
};

/// Liveness probe
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}

/// Assemble the full application router
pub fn create_router(state: AppState) -> Router {
    let auth_layer = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/events/:id/join", post(attendance::join_event))
        .route(
            "/api/events/:id/attendances",
            get(attendance::list_attendances),
        )
        .route(
            "/api/events/:id/attendances/:attendance_id",
            patch(attendance::update_attendance),
        )
        .route("/api/events/:id/attendance", delete(attendance::leave_event))
        .route(
            "/api/events/:id/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route_layer(auth_layer.clone());

    // require_admin is layered first so that auth_middleware ends up
    // outermost and has populated the caller before the role check runs
    let admin_routes = Router::new()
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/:id/role", patch(admin::update_user_role))
        .route("/api/admin/events/:id", delete(admin::force_cancel_event))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(auth_layer.clone());

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        // GET is public while the writes need a caller, so the auth layer
        // wraps the individual handlers here rather than the route
        .route(
            "/api/events",
            get(events::list_events).post(events::create_event.layer(auth_layer.clone())),
        )
        .route(
            "/api/events/:id",
            get(events::get_event)
                .patch(events::update_event.layer(auth_layer.clone()))
                .delete(events::cancel_event.layer(auth_layer)),
        )
        .route("/ws", get(ws::ws_handler))
        .merge(protected)
        .merge(admin_routes)
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
        .layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES + 64 * 1024))
        .layer(cors_layer())
        .with_state(state)
}

/// CORS policy from `CORS_ORIGIN`; permissive when unset
fn cors_layer() -> CorsLayer {
    let origin = std::env::var("CORS_ORIGIN")
        .ok()
        .and_then(|o| o.parse::<HeaderValue>().ok());

    match origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

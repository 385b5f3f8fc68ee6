//! Application state shared across handlers

use sqlx::PgPool;

use crate::{
    jwt::JwtService,
    repositories::{AttendanceRepository, EventRepository, MessageRepository, UserRepository},
    uploads::UploadStore,
    ws::EventRooms,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: JwtService,
    pub user_repository: UserRepository,
    pub event_repository: EventRepository,
    pub attendance_repository: AttendanceRepository,
    pub message_repository: MessageRepository,
    pub rooms: EventRooms,
    pub uploads: UploadStore,
}

impl AppState {
    pub fn new(pool: PgPool, jwt_service: JwtService, uploads: UploadStore) -> Self {
        AppState {
            user_repository: UserRepository::new(pool.clone()),
            event_repository: EventRepository::new(pool.clone()),
            attendance_repository: AttendanceRepository::new(pool.clone()),
            message_repository: MessageRepository::new(pool.clone()),
            rooms: EventRooms::new(),
            db_pool: pool,
            jwt_service,
            uploads,
        }
    }
}

//! PmitG API models

pub mod attendance;
pub mod event;
pub mod message;
pub mod user;

// Re-export for convenience
pub use attendance::{Attendance, AttendanceDecision, AttendanceStatus, AttendanceWithUser};
pub use event::{
    CreateEventRequest, Event, EventStatus, EventWithOrganizer, GeoPoint, UpdateEventRequest,
};
pub use message::{CreateMessageRequest, MessageWithAuthor};
pub use user::{PublicUser, User, UserRole};

//! Database repositories for the PmitG API

pub mod attendance;
pub mod event;
pub mod message;
pub mod user;

// Re-export for convenience
pub use attendance::{AttendanceRepository, JoinOutcome};
pub use event::EventRepository;
pub use message::MessageRepository;
pub use user::UserRepository;

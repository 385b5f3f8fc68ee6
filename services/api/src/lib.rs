//! Pudding mit Gabel API service
//!
//! REST and WebSocket backend for community pudding potlucks: users
//! organize events on a map of Germany, bring a pudding to join, and chat
//! with the other attendees once approved.

pub mod error;
pub mod geo;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod sweeper;
pub mod uploads;
pub mod validation;
pub mod ws;

pub use state::AppState;

//! Common library for the Pudding mit Gabel backend
//!
//! This crate provides shared infrastructure used by the PmitG services:
//! PostgreSQL connection pooling, configuration from the environment, and
//! database error types.

pub mod database;
pub mod error;

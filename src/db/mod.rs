//! Persistence for users, stats snapshots and playlist records.

pub mod models;
pub mod operations;

pub use models::{NewStatsSnapshot, PlaylistRecord, StatsSnapshot, User};
pub use operations::DbOperations;

//! # minder-store
//!
//! SQLite-backed persistence for minder. All cross-sweep durability lives
//! here; every state transition the engine relies on is a single conditional
//! statement so overlapping trigger invocations cannot race each other.

pub mod store;

pub use store::{Store, TaskRow, UserRow, UserStatsRow};

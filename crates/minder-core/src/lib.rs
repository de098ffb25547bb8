//! # minder-core
//!
//! Shared types for the minder engine: configuration, errors, the
//! channel/provider seams, and the two pure functions everything else
//! leans on (local-time resolution and response classification).

pub mod classify;
pub mod config;
pub mod error;
pub mod localtime;
pub mod message;
pub mod traits;

pub use config::Config;
pub use error::MinderError;

/// Expand a leading `~/` to the user's home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return format!("{home}/{rest}");
        }
    }
    path.to_string()
}

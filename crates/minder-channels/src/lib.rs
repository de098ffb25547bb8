//! # minder-channels
//!
//! Messaging channel implementations for Minder.

pub mod telegram;

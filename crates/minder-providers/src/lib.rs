//! # minder-providers
//!
//! AI provider implementations for Minder.

pub mod openai;

//! Core traits for platform-agnostic turn control.
//!
//! This module provides trait abstractions that decouple the estimator and
//! controller from platform-specific timers.
//!
//! # Design
//!
//! - Trait definitions are pure and have no feature gates
//! - Mock implementations are always available for host testing
//! - Platform implementations live with the board support code

pub mod time;

pub use time::{MockTime, TimeSource, Timer};

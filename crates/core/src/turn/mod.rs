//! In-place turn control
//!
//! # Phases
//!
//! ```text
//! Idle --(calibrated)--> RoughTurn --(|angle| >= target - buffer)--> Brake
//!      --(pulse, stop, settle)--> Correction --(deadband | timeout)--> Done
//! ```
//!
//! The estimator is the only writer of the heading; the controller reads it
//! once per control tick and is the only writer of the motors.

pub mod controller;
pub mod types;

pub use controller::TurnController;
pub use types::{
    RejectReason, TurnConfig, TurnDirection, TurnFault, TurnOutcome, TurnPhase, TurnReport,
    TurnRequest,
};

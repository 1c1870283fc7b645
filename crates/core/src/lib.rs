//! gyro_turn_core - Pure no_std gyro turn control for two-wheeled robots
//!
//! This crate contains the platform-agnostic heading estimator and turn
//! state machine, plus the sensor and motor abstractions they drive. It is
//! tested on host with simulated time; hardware only appears behind traits.
//!
//! # Design Principles
//!
//! - **Pure no_std**: std is linked only for `cfg(test)`
//! - **Trait abstractions**: sensor, motors, clock and delay are injected
//! - **No panics in control paths**: every turn ends in a [`turn::TurnOutcome`]
//!
//! # Modules
//!
//! - [`traits`]: Time abstraction (TimeSource, Timer, MockTime)
//! - [`sensor`]: Inertial sensor trait, raw conversion, MPU-6050 driver
//! - [`motor`]: Motor actuator trait, commands, differential drive adapter
//! - [`heading`]: Bias calibration and yaw-rate integration
//! - [`turn`]: Two-phase turn state machine
//! - [`pilot`]: `calibrate()` / `turn()` facade
//! - [`logging`]: defmt / log / println logging macros

#![cfg_attr(not(test), no_std)]

pub mod logging;

pub mod heading;
pub mod motor;
pub mod pilot;
pub mod sensor;
pub mod traits;
pub mod turn;

#[cfg(test)]
mod testing;

pub use heading::{CalibrationState, EstimatorConfig, HeadingEstimator, HeadingState};
pub use motor::{MotorActuator, MotorCommand, MotorError};
pub use pilot::TurnPilot;
pub use sensor::{InertialSensor, SensorError};
pub use turn::{TurnConfig, TurnController, TurnDirection, TurnOutcome, TurnPhase, TurnReport, TurnRequest};

//! Scenario configuration.
//!
//! A scenario is one JSON document with three optional sections; anything
//! left out takes its default:
//!
//! ```json
//! {
//!   "robot": { "dps_per_power": 2.5, "gyro_noise_dps": 0.2, "seed": 7 },
//!   "estimator": { "sample_count": 20 },
//!   "turn": { "correction_speed": 30, "rough_timeout_ms": null }
//! }
//! ```

use std::fs;
use std::path::Path;

use gyro_turn_core::sensor::GyroRange;
use gyro_turn_core::{EstimatorConfig, TurnConfig};
use serde::{Deserialize, Serialize};

use crate::error::SimulatorError;

/// Injected gyro misbehaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GyroFault {
    #[default]
    None,
    /// Reports zero motion (bias and noise only) once the motors have been stopped.
    StuckAfterStop,
    /// Every read after the first `after` successful ones fails with a bus error.
    FailReads { after: u32 },
}

/// Simulated robot parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Steady-state yaw rate per unit of differential power (°/s).
    pub dps_per_power: f32,
    /// First-order response time constant in milliseconds. 0 = instant.
    pub response_time_ms: f32,
    /// Constant gyro zero-rate offset (°/s).
    pub gyro_bias_dps: f32,
    /// Gyro noise standard deviation (°/s).
    pub gyro_noise_dps: f32,
    /// Full-scale range the simulated gyro encodes with.
    pub gyro_range: GyroRange,
    /// Physics step size in microseconds.
    pub step_us: u64,
    /// RNG seed for deterministic mode. None = random.
    pub seed: Option<u64>,
    pub gyro_fault: GyroFault,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            dps_per_power: 2.0,
            response_time_ms: 60.0,
            gyro_bias_dps: 0.8,
            gyro_noise_dps: 0.2,
            gyro_range: GyroRange::Dps250,
            step_us: 1_000,
            seed: None,
            gyro_fault: GyroFault::None,
        }
    }
}

/// Full scenario: robot, estimator and controller settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub robot: RobotConfig,
    pub estimator: EstimatorConfig,
    pub turn: TurnConfig,
}

impl SimConfig {
    /// Parse and validate a JSON scenario.
    pub fn from_json_str(json: &str) -> Result<Self, SimulatorError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON scenario file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SimulatorError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        log::debug!("Loaded scenario from {}", path.display());
        Self::from_json_str(&text)
    }

    /// Reject values the simulator or controller cannot run with.
    pub fn validate(&self) -> Result<(), SimulatorError> {
        let robot = &self.robot;
        if robot.step_us == 0 {
            return Err(SimulatorError::Config("robot.step_us must be > 0".into()));
        }
        if !robot.dps_per_power.is_finite() {
            return Err(SimulatorError::Config("robot.dps_per_power must be finite".into()));
        }
        if !(robot.response_time_ms.is_finite() && robot.response_time_ms >= 0.0) {
            return Err(SimulatorError::Config(
                "robot.response_time_ms must be >= 0".into(),
            ));
        }
        if !(robot.gyro_noise_dps.is_finite() && robot.gyro_noise_dps >= 0.0) {
            return Err(SimulatorError::Config("robot.gyro_noise_dps must be >= 0".into()));
        }
        if !robot.gyro_bias_dps.is_finite() {
            return Err(SimulatorError::Config("robot.gyro_bias_dps must be finite".into()));
        }
        let sensitivity = self.estimator.sensitivity_lsb_per_dps;
        if !sensitivity.is_finite() || sensitivity <= 0.0 {
            return Err(SimulatorError::Config(
                "estimator.sensitivity_lsb_per_dps must be > 0".into(),
            ));
        }
        let turn = &self.turn;
        if turn.control_period_ms == 0 {
            return Err(SimulatorError::Config("turn.control_period_ms must be > 0".into()));
        }
        if turn.min_speed > turn.max_speed || turn.max_speed > 100 {
            return Err(SimulatorError::Config(format!(
                "turn speed range {}..={} must lie within 0..=100",
                turn.min_speed, turn.max_speed
            )));
        }
        if turn.min_speed < 1 {
            return Err(SimulatorError::Config(format!(
                "turn.min_speed {} must be at least 1",
                turn.min_speed
            )));
        }
        if turn.correction_speed == 0 || turn.correction_speed.abs() > 100 {
            return Err(SimulatorError::Config(format!(
                "turn.correction_speed {} must be non-zero and within -100..=100",
                turn.correction_speed
            )));
        }
        Ok(())
    }
}

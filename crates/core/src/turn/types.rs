//! Turn type definitions
//!
//! - `TurnDirection` / `TurnRequest`: what the caller asks for
//! - `TurnPhase`: state machine variable
//! - `TurnConfig`: fixed two-phase policy constants
//! - `TurnOutcome` / `TurnReport`: how a turn ended

use core::fmt;

use crate::motor::{MotorCommand, MotorError};
use crate::sensor::SensorError;

/// Rotation direction, seen from above
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnDirection {
    /// Counter-clockwise: left wheel reverse, right wheel forward
    Left,
    /// Clockwise: left wheel forward, right wheel reverse
    Right,
}

impl TurnDirection {
    /// Per-side wheel signs `(left, right)`
    pub const fn wheel_signs(self) -> (i32, i32) {
        match self {
            TurnDirection::Left => (-1, 1),
            TurnDirection::Right => (1, -1),
        }
    }

    /// In-place rotation command at `speed` (magnitude)
    pub const fn command(self, speed: i32) -> MotorCommand {
        let (left, right) = self.wheel_signs();
        MotorCommand::new(left * speed, right * speed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TurnDirection::Left => "left",
            TurnDirection::Right => "right",
        }
    }
}

/// One turn request. Immutable once the turn begins.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TurnRequest {
    pub direction: TurnDirection,
    /// Rotation magnitude in degrees, must be > 0
    pub target_angle_deg: f32,
    /// Requested power; sign is ignored, magnitude is clamped
    pub speed: i32,
}

impl TurnRequest {
    pub fn new(direction: TurnDirection, target_angle_deg: f32, speed: i32) -> Self {
        Self {
            direction,
            target_angle_deg,
            speed,
        }
    }

    /// A target must be finite and strictly positive
    pub fn has_valid_target(&self) -> bool {
        self.target_angle_deg.is_finite() && self.target_angle_deg > 0.0
    }
}

/// Turn state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TurnPhase {
    #[default]
    Idle,
    /// Fast rotation at the requested speed, stopping short of the target
    RoughTurn,
    /// Reverse pulse, stop and settle
    Brake,
    /// Slow bang-bang nudges into the deadband
    Correction,
    Done,
}

impl TurnPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnPhase::Idle => "Idle",
            TurnPhase::RoughTurn => "RoughTurn",
            TurnPhase::Brake => "Brake",
            TurnPhase::Correction => "Correction",
            TurnPhase::Done => "Done",
        }
    }
}

/// Turn controller configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TurnConfig {
    /// Lower clamp for the effective speed
    pub min_speed: i32,
    /// Upper clamp for the effective speed
    pub max_speed: i32,
    /// Speeds below this use the low-speed early-stop buffer
    pub low_speed_threshold: i32,
    /// Early-stop buffer at normal speed (degrees)
    pub stop_early_buffer_deg: f32,
    /// Early-stop buffer below `low_speed_threshold` (degrees)
    pub low_speed_buffer_deg: f32,
    /// Reverse pulse length (ms)
    pub brake_duration_ms: u32,
    /// Pause after stopping, before correction starts (ms)
    pub settle_ms: u32,
    /// Fixed power used during correction
    pub correction_speed: i32,
    /// Accepted error around the target (degrees)
    pub deadband_deg: f32,
    /// Hard limit on the correction phase (ms)
    pub correction_timeout_ms: u32,
    /// Pause between control ticks (ms)
    pub control_period_ms: u32,
    /// Hard limit on the rough phase (ms); `None` waits indefinitely
    pub rough_timeout_ms: Option<u32>,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            min_speed: 20,
            max_speed: 100,
            low_speed_threshold: 40,
            stop_early_buffer_deg: 15.0,
            low_speed_buffer_deg: 8.0,
            brake_duration_ms: 50,
            settle_ms: 100,
            correction_speed: 25,
            deadband_deg: 1.0,
            correction_timeout_ms: 3000,
            control_period_ms: 10,
            rough_timeout_ms: None,
        }
    }
}

impl TurnConfig {
    /// `clamp(|speed|, min_speed, max_speed)`
    ///
    /// Never panics, even for `i32::MIN` or an inverted min/max pair.
    pub fn effective_speed(&self, speed: i32) -> i32 {
        let magnitude = speed.unsigned_abs().min(self.max_speed.unsigned_abs());
        (magnitude as i32).max(self.min_speed)
    }

    /// Early-stop buffer for an effective speed. Independent of the target.
    pub fn stop_early_buffer(&self, effective_speed: i32) -> f32 {
        if effective_speed < self.low_speed_threshold {
            self.low_speed_buffer_deg
        } else {
            self.stop_early_buffer_deg
        }
    }
}

/// Why a turn was refused before any motor command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RejectReason {
    /// No successful calibration yet
    NotCalibrated,
    /// Target angle not finite or not positive
    InvalidTarget,
}

/// Collaborator failure that aborted a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TurnFault {
    Sensor(SensorError),
    Motor(MotorError),
}

impl From<SensorError> for TurnFault {
    fn from(e: SensorError) -> Self {
        TurnFault::Sensor(e)
    }
}

impl From<MotorError> for TurnFault {
    fn from(e: MotorError) -> Self {
        TurnFault::Motor(e)
    }
}

impl fmt::Display for TurnFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnFault::Sensor(e) => write!(f, "sensor: {}", e),
            TurnFault::Motor(e) => write!(f, "motor: {}", e),
        }
    }
}

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TurnOutcome {
    /// Final error within the deadband
    Converged,
    /// Correction ran out of time; motors stopped, not an error
    CorrectionTimedOut,
    /// Rough phase never reached its exit angle within `rough_timeout_ms`
    RoughTimedOut,
    /// Guard refused the request; no motor command was issued
    Rejected(RejectReason),
    /// Sensor or motor failure mid-turn; motors stopped best-effort
    Aborted(TurnFault),
}

impl TurnOutcome {
    /// The turn ran through correction (converged or timed out)
    pub fn is_completed(&self) -> bool {
        matches!(self, TurnOutcome::Converged | TurnOutcome::CorrectionTimedOut)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TurnOutcome::Converged => "converged",
            TurnOutcome::CorrectionTimedOut => "correction timed out",
            TurnOutcome::RoughTimedOut => "rough turn timed out",
            TurnOutcome::Rejected(RejectReason::NotCalibrated) => "rejected: not calibrated",
            TurnOutcome::Rejected(RejectReason::InvalidTarget) => "rejected: invalid target",
            TurnOutcome::Aborted(TurnFault::Sensor(_)) => "aborted: sensor fault",
            TurnOutcome::Aborted(TurnFault::Motor(_)) => "aborted: motor fault",
        }
    }
}

/// Summary returned by every turn call
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TurnReport {
    pub outcome: TurnOutcome,
    /// Estimated angle when the motors were finally stopped (degrees)
    pub final_angle_deg: f32,
    /// Speed after `abs` and clamping
    pub effective_speed: i32,
    /// Early-stop buffer selected for `effective_speed` (degrees)
    pub stop_early_buffer_deg: f32,
    /// Estimated angle when the rough loop exited (degrees)
    pub rough_exit_angle_deg: f32,
    /// Time spent in the correction loop (ms)
    pub correction_elapsed_ms: u32,
}

impl TurnReport {
    /// Report for a request that never started
    pub fn rejected(reason: RejectReason) -> Self {
        Self {
            outcome: TurnOutcome::Rejected(reason),
            final_angle_deg: 0.0,
            effective_speed: 0,
            stop_early_buffer_deg: 0.0,
            rough_exit_angle_deg: 0.0,
            correction_elapsed_ms: 0,
        }
    }
}

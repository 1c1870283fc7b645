//! Motor actuator abstraction
//!
//! The turn controller speaks in signed integer power per side: positive is
//! forward, negative is reverse, magnitude is speed and zero is stop. This
//! module provides:
//!
//! - [`MotorCommand`]: one left/right power pair
//! - [`MotorActuator`]: the two-sided drive interface the controller writes
//! - [`Motor`]: a single normalized DC motor (H-bridge, servo ESC, ...)
//! - [`DifferentialDrive`]: adapter mapping integer power onto two `Motor`s
//!
//! # Design
//!
//! Pure `no_std` with no feature gates. Platform-specific PWM implementations
//! of [`Motor`] belong with the board support code.

use core::fmt;

/// Largest power magnitude a [`MotorCommand`] may carry.
pub const MAX_POWER: i32 = 100;

/// Motor control error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// Power/speed value outside the accepted range
    InvalidSpeed,
    /// Hardware PWM channel unavailable or driver fault
    HardwareFault,
}

impl MotorError {
    /// Return variant name as a static string (usable with defmt on embedded)
    pub fn as_str(&self) -> &'static str {
        match self {
            MotorError::InvalidSpeed => "invalid speed",
            MotorError::HardwareFault => "hardware fault",
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::InvalidSpeed => write!(f, "motor speed out of range"),
            MotorError::HardwareFault => write!(f, "motor hardware fault"),
        }
    }
}

/// Signed left/right motor power pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorCommand {
    /// Left side power (-100..=100)
    pub left: i32,
    /// Right side power (-100..=100)
    pub right: i32,
}

impl MotorCommand {
    /// Both motors stopped
    pub const STOP: MotorCommand = MotorCommand { left: 0, right: 0 };

    pub const fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }

    /// Same magnitudes, both signs flipped (active brake / opposite rotation)
    pub const fn reversed(self) -> Self {
        Self {
            left: -self.left,
            right: -self.right,
        }
    }

    pub const fn is_stop(&self) -> bool {
        self.left == 0 && self.right == 0
    }
}

/// Two-sided drive written by the turn controller.
///
/// Writes are last-write-wins; there is no queuing.
pub trait MotorActuator {
    /// Set left/right power. Sign selects direction, magnitude selects speed.
    fn set_motors(&mut self, left: i32, right: i32) -> Result<(), MotorError>;

    /// Stop both sides.
    fn stop_all(&mut self) -> Result<(), MotorError>;

    /// Apply a [`MotorCommand`]; a zero command goes through [`Self::stop_all`].
    fn apply(&mut self, command: MotorCommand) -> Result<(), MotorError> {
        if command.is_stop() {
            self.stop_all()
        } else {
            self.set_motors(command.left, command.right)
        }
    }
}

impl<A: MotorActuator + ?Sized> MotorActuator for &mut A {
    fn set_motors(&mut self, left: i32, right: i32) -> Result<(), MotorError> {
        (**self).set_motors(left, right)
    }

    fn stop_all(&mut self) -> Result<(), MotorError> {
        (**self).stop_all()
    }
}

/// Single DC motor with normalized speed
///
/// Speed values are normalized to [-1.0, +1.0]:
/// - `+1.0` = full forward
/// - `0.0` = stopped
/// - `-1.0` = full reverse
pub trait Motor {
    /// Set motor speed and direction
    ///
    /// # Errors
    ///
    /// Returns `MotorError::InvalidSpeed` if speed is outside [-1.0, +1.0] range.
    /// Returns `MotorError::HardwareFault` if PWM hardware fails.
    fn set_speed(&mut self, speed: f32) -> Result<(), MotorError>;

    /// Stop motor (coast mode)
    fn stop(&mut self) -> Result<(), MotorError>;

    /// Brake motor (short brake - active braking)
    fn brake(&mut self) -> Result<(), MotorError>;
}

/// Differential drive built from a left and a right [`Motor`]
///
/// Integer power ±[`MAX_POWER`] maps linearly onto ±1.0 normalized speed.
pub struct DifferentialDrive<L: Motor, R: Motor> {
    left: L,
    right: R,
}

impl<L: Motor, R: Motor> DifferentialDrive<L, R> {
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }

    /// Short-brake both sides
    pub fn brake_all(&mut self) -> Result<(), MotorError> {
        self.left.brake()?;
        self.right.brake()
    }

    pub fn left(&self) -> &L {
        &self.left
    }

    pub fn right(&self) -> &R {
        &self.right
    }

    /// Split back into the two motors
    pub fn into_inner(self) -> (L, R) {
        (self.left, self.right)
    }
}

/// Normalize integer power to [-1.0, +1.0], rejecting out-of-range values.
pub fn power_to_speed(power: i32) -> Result<f32, MotorError> {
    if !(-MAX_POWER..=MAX_POWER).contains(&power) {
        return Err(MotorError::InvalidSpeed);
    }
    Ok(power as f32 / MAX_POWER as f32)
}

impl<L: Motor, R: Motor> MotorActuator for DifferentialDrive<L, R> {
    fn set_motors(&mut self, left: i32, right: i32) -> Result<(), MotorError> {
        // Validate both before touching either side
        let left_speed = power_to_speed(left)?;
        let right_speed = power_to_speed(right)?;
        self.left.set_speed(left_speed)?;
        self.right.set_speed(right_speed)
    }

    fn stop_all(&mut self) -> Result<(), MotorError> {
        // Always attempt both sides, report the first failure
        let left = self.left.stop();
        let right = self.right.stop();
        left.and(right)
    }
}

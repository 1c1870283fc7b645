//! Inertial sensor abstraction
//!
//! The heading estimator only needs one thing from the IMU: the raw yaw-rate
//! register word. This module defines the [`InertialSensor`] trait that hides
//! the bus, the raw-to-physical conversion helpers, and an I2C driver for the
//! MPU-6050 family.
//!
//! # Raw format
//!
//! The rate is a 16-bit two's-complement value stored big-endian across a
//! high/low register pair. Dividing the signed value by the range sensitivity
//! (LSB per °/s) yields degrees per second.

pub mod mpu6050;
pub mod registers;

pub use mpu6050::Mpu6050;

use core::fmt;

/// Sensor communication and data errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// I2C/SPI transaction failed
    Bus,
    /// Device did not identify itself as expected
    NotResponding,
    /// Data validation failed (e.g., impossible register contents)
    InvalidData,
}

impl SensorError {
    /// Return variant name as a static string (usable with defmt on embedded)
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorError::Bus => "bus",
            SensorError::NotResponding => "not responding",
            SensorError::InvalidData => "invalid data",
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Bus => write!(f, "sensor bus transaction failed"),
            SensorError::NotResponding => write!(f, "sensor not responding"),
            SensorError::InvalidData => write!(f, "sensor returned invalid data"),
        }
    }
}

/// Raw angular-rate source for the yaw axis.
///
/// Implementations talk to real hardware ([`Mpu6050`]) or to a simulator.
/// Reads are polled synchronously from the control loop and must return
/// quickly relative to the control period.
pub trait InertialSensor {
    /// Bring the device out of its power-down state.
    fn wake(&mut self) -> Result<(), SensorError>;

    /// Read the signed raw yaw-rate word.
    fn read_rate_raw_z(&mut self) -> Result<i16, SensorError>;
}

impl<S: InertialSensor + ?Sized> InertialSensor for &mut S {
    fn wake(&mut self) -> Result<(), SensorError> {
        (**self).wake()
    }

    fn read_rate_raw_z(&mut self) -> Result<i16, SensorError> {
        (**self).read_rate_raw_z()
    }
}

/// Gyroscope full-scale range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GyroRange {
    /// ±250 °/s
    #[default]
    Dps250,
    /// ±500 °/s
    Dps500,
    /// ±1000 °/s
    Dps1000,
    /// ±2000 °/s
    Dps2000,
}

impl GyroRange {
    /// Sensitivity in LSB per °/s
    pub fn sensitivity(&self) -> f32 {
        match self {
            GyroRange::Dps250 => registers::GYRO_SENSITIVITY_250DPS,
            GyroRange::Dps500 => registers::GYRO_SENSITIVITY_500DPS,
            GyroRange::Dps1000 => registers::GYRO_SENSITIVITY_1000DPS,
            GyroRange::Dps2000 => registers::GYRO_SENSITIVITY_2000DPS,
        }
    }

    /// Value for the GYRO_CONFIG FS_SEL field
    pub fn register_value(&self) -> u8 {
        match self {
            GyroRange::Dps250 => registers::GYRO_FS_SEL_250DPS,
            GyroRange::Dps500 => registers::GYRO_FS_SEL_500DPS,
            GyroRange::Dps1000 => registers::GYRO_FS_SEL_1000DPS,
            GyroRange::Dps2000 => registers::GYRO_FS_SEL_2000DPS,
        }
    }
}

/// Fold an unsigned 16-bit register word into its two's-complement value.
///
/// Words at or above 2^15 represent negative numbers: subtract 2^16.
#[inline]
pub fn fold_twos_complement(word: u16) -> i16 {
    let value = i32::from(word);
    let folded = if value >= 0x8000 { value - 0x1_0000 } else { value };
    folded as i16
}

/// Combine a big-endian high/low register pair into a signed raw value.
#[inline]
pub fn raw_from_be_bytes(high: u8, low: u8) -> i16 {
    fold_twos_complement((u16::from(high) << 8) | u16::from(low))
}

/// Convert a signed raw rate to degrees per second.
#[inline]
pub fn raw_to_dps(raw: i16, sensitivity_lsb_per_dps: f32) -> f32 {
    f32::from(raw) / sensitivity_lsb_per_dps
}

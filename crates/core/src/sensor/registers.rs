//! MPU-6050 register map (gyro subset)
//!
//! Only the registers needed for yaw-rate readout and power management.

/// Default I2C address (AD0 low)
pub const MPU6050_ADDR: u8 = 0x68;
/// Alternate I2C address (AD0 high)
pub const MPU6050_ADDR_ALT: u8 = 0x69;

pub const GYRO_CONFIG: u8 = 0x1B;

pub const GYRO_ZOUT_H: u8 = 0x47;
pub const GYRO_ZOUT_L: u8 = 0x48;

pub const PWR_MGMT_1: u8 = 0x6B;
pub const WHO_AM_I: u8 = 0x75;

/// Expected WHO_AM_I response (bits 6:1 of the 7-bit address)
pub const MPU6050_WHO_AM_I_VALUE: u8 = 0x68;

/// PWR_MGMT_1 sleep bit
pub const PWR_MGMT_1_SLEEP: u8 = 0x40;

/// Gyroscope full scale range bits (GYRO_CONFIG[4:3])
pub const GYRO_FS_SEL_250DPS: u8 = 0x00;
pub const GYRO_FS_SEL_500DPS: u8 = 0x08;
pub const GYRO_FS_SEL_1000DPS: u8 = 0x10;
pub const GYRO_FS_SEL_2000DPS: u8 = 0x18;
pub const GYRO_FS_SEL_MASK: u8 = 0x18;

/// Gyroscope sensitivity (LSB/°/s) for each range
pub const GYRO_SENSITIVITY_250DPS: f32 = 131.0;
pub const GYRO_SENSITIVITY_500DPS: f32 = 65.5;
pub const GYRO_SENSITIVITY_1000DPS: f32 = 32.8;
pub const GYRO_SENSITIVITY_2000DPS: f32 = 16.4;

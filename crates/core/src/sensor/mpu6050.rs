//! MPU-6050 I2C gyro driver
//!
//! Blocking driver over `embedded_hal::i2c::I2c` exposing the yaw-rate word
//! as an [`InertialSensor`]. Accelerometer, temperature and FIFO registers
//! are not used.

use embedded_hal::i2c::I2c;

use super::registers;
use super::{raw_from_be_bytes, GyroRange, InertialSensor, SensorError};

/// Maximum consecutive errors before marking sensor unhealthy
const MAX_CONSECUTIVE_ERRORS: u32 = 3;

/// MPU-6050 (and register-compatible MPU-6500/9250) gyro over I2C
pub struct Mpu6050<I2C> {
    i2c: I2C,
    address: u8,
    range: GyroRange,
    error_count: u32,
    healthy: bool,
}

impl<I2C: I2c> Mpu6050<I2C> {
    /// Create a driver at the default address (0x68) and ±250 °/s range.
    ///
    /// No bus traffic happens until [`InertialSensor::wake`] is called.
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, registers::MPU6050_ADDR)
    }

    /// Create a driver at a specific address (0x68 or 0x69).
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            range: GyroRange::default(),
            error_count: 0,
            healthy: true,
        }
    }

    /// Configured full-scale range
    pub fn range(&self) -> GyroRange {
        self.range
    }

    /// Sensitivity matching the configured range (LSB per °/s)
    pub fn sensitivity(&self) -> f32 {
        self.range.sensitivity()
    }

    /// False after repeated consecutive bus failures
    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    /// Read WHO_AM_I and verify the device identity.
    pub fn who_am_i(&mut self) -> Result<u8, SensorError> {
        let id = self.read_register(registers::WHO_AM_I)?;
        if id != registers::MPU6050_WHO_AM_I_VALUE {
            crate::log_error!(
                "Unexpected gyro WHO_AM_I: {} (expected {})",
                id,
                registers::MPU6050_WHO_AM_I_VALUE
            );
            return Err(SensorError::NotResponding);
        }
        Ok(id)
    }

    /// Write the full-scale range into GYRO_CONFIG, preserving self-test bits.
    pub fn configure_range(&mut self, range: GyroRange) -> Result<(), SensorError> {
        let current = self.read_register(registers::GYRO_CONFIG)?;
        let value = (current & !registers::GYRO_FS_SEL_MASK) | range.register_value();
        self.write_register(registers::GYRO_CONFIG, value)?;
        self.range = range;
        Ok(())
    }

    /// Release the bus
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn record_error(&mut self) -> SensorError {
        self.error_count += 1;
        if self.error_count >= MAX_CONSECUTIVE_ERRORS {
            self.healthy = false;
        }
        SensorError::Bus
    }

    fn record_success(&mut self) {
        self.error_count = 0;
        self.healthy = true;
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        if self.i2c.write_read(self.address, &[reg], &mut buf).is_err() {
            return Err(self.record_error());
        }
        self.record_success();
        Ok(buf[0])
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        if self.i2c.write(self.address, &[reg, value]).is_err() {
            return Err(self.record_error());
        }
        self.record_success();
        Ok(())
    }
}

impl<I2C: I2c> InertialSensor for Mpu6050<I2C> {
    fn wake(&mut self) -> Result<(), SensorError> {
        let power = self.read_register(registers::PWR_MGMT_1)?;
        self.write_register(registers::PWR_MGMT_1, power & !registers::PWR_MGMT_1_SLEEP)?;
        crate::log_debug!("Gyro at {} awake", self.address);
        Ok(())
    }

    fn read_rate_raw_z(&mut self) -> Result<i16, SensorError> {
        let mut buf = [0u8; 2];
        if self
            .i2c
            .write_read(self.address, &[registers::GYRO_ZOUT_H], &mut buf)
            .is_err()
        {
            return Err(self.record_error());
        }
        self.record_success();
        Ok(raw_from_be_bytes(buf[0], buf[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

    /// Register-file I2C bus with auto-incrementing register pointer
    struct MockBus {
        address: u8,
        registers: [u8; 128],
        pointer: usize,
        fail: bool,
        writes: std::vec::Vec<(u8, u8)>,
    }

    impl MockBus {
        fn new() -> Self {
            let mut regs = [0u8; 128];
            regs[registers::WHO_AM_I as usize] = registers::MPU6050_WHO_AM_I_VALUE;
            // Power-on default: sleeping, clock source 0
            regs[registers::PWR_MGMT_1 as usize] = registers::PWR_MGMT_1_SLEEP;
            Self {
                address: registers::MPU6050_ADDR,
                registers: regs,
                pointer: 0,
                fail: false,
                writes: std::vec::Vec::new(),
            }
        }
    }

    impl ErrorType for MockBus {
        type Error = ErrorKind;
    }

    impl I2c for MockBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err(ErrorKind::Bus);
            }
            if address != self.address {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            for op in operations.iter_mut() {
                match op {
                    Operation::Write(bytes) => {
                        if let Some((&reg, data)) = bytes.split_first() {
                            self.pointer = reg as usize;
                            for &byte in data {
                                self.registers[self.pointer] = byte;
                                self.writes.push((self.pointer as u8, byte));
                                self.pointer += 1;
                            }
                        }
                    }
                    Operation::Read(buf) => {
                        for byte in buf.iter_mut() {
                            *byte = self.registers[self.pointer];
                            self.pointer += 1;
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn wake_clears_only_sleep_bit() {
        let mut bus = MockBus::new();
        bus.registers[registers::PWR_MGMT_1 as usize] = registers::PWR_MGMT_1_SLEEP | 0x01;
        let mut gyro = Mpu6050::new(bus);

        gyro.wake().unwrap();

        let bus = gyro.release();
        assert_eq!(bus.registers[registers::PWR_MGMT_1 as usize], 0x01);
        assert_eq!(bus.writes, std::vec![(registers::PWR_MGMT_1, 0x01)]);
    }

    #[test]
    fn reads_z_rate_high_byte_first() {
        let mut bus = MockBus::new();
        bus.registers[registers::GYRO_ZOUT_H as usize] = 0xFE;
        bus.registers[registers::GYRO_ZOUT_L as usize] = 0x7D;
        let mut gyro = Mpu6050::new(bus);

        assert_eq!(gyro.read_rate_raw_z().unwrap(), -387);
    }

    #[test]
    fn who_am_i_checks_identity() {
        let mut gyro = Mpu6050::new(MockBus::new());
        assert_eq!(gyro.who_am_i().unwrap(), 0x68);

        let mut bus = MockBus::new();
        bus.registers[registers::WHO_AM_I as usize] = 0x00;
        let mut gyro = Mpu6050::new(bus);
        assert_eq!(gyro.who_am_i(), Err(SensorError::NotResponding));
    }

    #[test]
    fn configure_range_preserves_other_bits() {
        let mut bus = MockBus::new();
        bus.registers[registers::GYRO_CONFIG as usize] = 0xE0; // self-test bits
        let mut gyro = Mpu6050::new(bus);

        gyro.configure_range(GyroRange::Dps1000).unwrap();

        assert_eq!(gyro.range(), GyroRange::Dps1000);
        assert!((gyro.sensitivity() - 32.8).abs() < 1e-6);
        let bus = gyro.release();
        assert_eq!(bus.registers[registers::GYRO_CONFIG as usize], 0xF0);
    }

    #[test]
    fn wrong_address_is_bus_error() {
        let mut gyro = Mpu6050::with_address(MockBus::new(), registers::MPU6050_ADDR_ALT);
        assert_eq!(gyro.read_rate_raw_z(), Err(SensorError::Bus));
    }

    #[test]
    fn repeated_failures_mark_unhealthy() {
        let mut bus = MockBus::new();
        bus.fail = true;
        let mut gyro = Mpu6050::new(bus);

        for _ in 0..MAX_CONSECUTIVE_ERRORS {
            assert_eq!(gyro.read_rate_raw_z(), Err(SensorError::Bus));
        }
        assert!(!gyro.is_healthy());
        assert_eq!(gyro.wake(), Err(SensorError::Bus));
    }
}

//! Host test bench
//!
//! One shared robot model behind three borrowed handles, so a turn can run
//! in simulated time with the gyro reacting to the motor commands.
//! Response is instantaneous: yaw rate is `(right - left) / 2 * dps_per_power`.

use core::cell::{Cell, RefCell};
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::motor::{MotorActuator, MotorCommand, MotorError};
use crate::sensor::{InertialSensor, SensorError};
use crate::traits::{MockTime, TimeSource};

pub(crate) const SENSITIVITY: f32 = 131.0;

pub(crate) struct Bench {
    pub time: MockTime,
    pub dps_per_power: f32,
    pub bias_raw: Cell<i16>,
    pub command: Cell<MotorCommand>,
    /// Gyro reads zero motion once the motors have been stopped
    pub stuck_after_stop: Cell<bool>,
    /// Gyro reads zero motion always
    pub stuck: Cell<bool>,
    pub stopped_once: Cell<bool>,
    /// Successful reads allowed before every read fails
    pub fail_after_reads: Cell<Option<u32>>,
    pub reads: Cell<u32>,
    pub woken: Cell<bool>,
    pub wake_fails: Cell<bool>,
    pub log: RefCell<Vec<(u64, MotorCommand)>>,
}

impl Bench {
    pub fn new(dps_per_power: f32) -> Self {
        Self {
            time: MockTime::new(),
            dps_per_power,
            bias_raw: Cell::new(0),
            command: Cell::new(MotorCommand::STOP),
            stuck_after_stop: Cell::new(false),
            stuck: Cell::new(false),
            stopped_once: Cell::new(false),
            fail_after_reads: Cell::new(None),
            reads: Cell::new(0),
            woken: Cell::new(false),
            wake_fails: Cell::new(false),
            log: RefCell::new(Vec::new()),
        }
    }

    pub fn gyro(&self) -> BenchGyro<'_> {
        BenchGyro(self)
    }

    pub fn motors(&self) -> BenchMotors<'_> {
        BenchMotors(self)
    }

    pub fn clock(&self) -> BenchClock<'_> {
        BenchClock(self)
    }

    /// True yaw rate for the current command (°/s)
    pub fn true_rate_dps(&self) -> f32 {
        let cmd = self.command.get();
        (cmd.right - cmd.left) as f32 / 2.0 * self.dps_per_power
    }

    pub fn commands(&self) -> Vec<MotorCommand> {
        self.log.borrow().iter().map(|(_, cmd)| *cmd).collect()
    }

    pub fn last_command(&self) -> Option<MotorCommand> {
        self.log.borrow().last().map(|(_, cmd)| *cmd)
    }

    fn record(&self, command: MotorCommand) {
        self.command.set(command);
        if command.is_stop() {
            self.stopped_once.set(true);
        }
        self.log.borrow_mut().push((self.time.now_us(), command));
    }
}

pub(crate) struct BenchGyro<'a>(&'a Bench);

impl InertialSensor for BenchGyro<'_> {
    fn wake(&mut self) -> Result<(), SensorError> {
        if self.0.wake_fails.get() {
            return Err(SensorError::NotResponding);
        }
        self.0.woken.set(true);
        Ok(())
    }

    fn read_rate_raw_z(&mut self) -> Result<i16, SensorError> {
        let bench = self.0;
        if let Some(limit) = bench.fail_after_reads.get() {
            if bench.reads.get() >= limit {
                return Err(SensorError::Bus);
            }
        }
        bench.reads.set(bench.reads.get() + 1);

        let frozen = bench.stuck.get() || (bench.stuck_after_stop.get() && bench.stopped_once.get());
        let rate = if frozen { 0.0 } else { bench.true_rate_dps() };
        Ok((rate * SENSITIVITY).round() as i16 + bench.bias_raw.get())
    }
}

pub(crate) struct BenchMotors<'a>(&'a Bench);

impl MotorActuator for BenchMotors<'_> {
    fn set_motors(&mut self, left: i32, right: i32) -> Result<(), MotorError> {
        self.0.record(MotorCommand::new(left, right));
        Ok(())
    }

    fn stop_all(&mut self) -> Result<(), MotorError> {
        self.0.record(MotorCommand::STOP);
        Ok(())
    }
}

pub(crate) struct BenchClock<'a>(&'a Bench);

impl TimeSource for BenchClock<'_> {
    fn now_us(&self) -> u64 {
        self.0.time.now_us()
    }
}

impl DelayNs for BenchClock<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.0.time.advance(u64::from(ns) / 1000);
    }

    fn delay_us(&mut self, us: u32) {
        self.0.time.advance(u64::from(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.time.advance(u64::from(ms) * 1000);
    }
}

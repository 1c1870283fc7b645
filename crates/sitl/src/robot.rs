//! Simulated two-wheeled robot.
//!
//! One shared state behind three handles: [`SimGyro`] (an
//! `InertialSensor`), [`SimMotors`] (a `MotorActuator`) and [`SimClock`]
//! (`TimeSource` + `DelayNs`). Time is lockstep: it only moves when the code
//! under test delays, and the physics is integrated across every delay in
//! `step_us` increments.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::delay::DelayNs;
use gyro_turn_core::motor::{power_to_speed, MotorActuator, MotorCommand, MotorError};
use gyro_turn_core::sensor::{InertialSensor, SensorError};
use gyro_turn_core::traits::TimeSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{GyroFault, RobotConfig};

/// Motor writes kept in the command log; older records are dropped.
pub const COMMAND_LOG_CAPACITY: usize = 4096;

/// One motor write as seen by the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandRecord {
    pub time_us: u64,
    pub command: MotorCommand,
}

/// Internal robot state for physics integration.
#[derive(Debug)]
struct RobotState {
    time_us: u64,
    /// True heading accumulated since start (degrees, counter-clockwise positive).
    heading_deg: f32,
    /// True yaw rate (°/s).
    rate_dps: f32,
    command: MotorCommand,
    awake: bool,
    stopped_once: bool,
    reads: u32,
    fault: GyroFault,
    rng: StdRng,
    log: VecDeque<CommandRecord>,
}

/// Simulated differential-drive robot with a yaw gyro.
///
/// Cloning shares the same robot.
#[derive(Clone)]
pub struct SimRobot {
    config: Arc<RobotConfig>,
    state: Arc<Mutex<RobotState>>,
}

impl SimRobot {
    pub fn new(config: RobotConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let state = RobotState {
            time_us: 0,
            heading_deg: 0.0,
            rate_dps: 0.0,
            command: MotorCommand::STOP,
            awake: false,
            stopped_once: false,
            reads: 0,
            fault: config.gyro_fault,
            rng,
            log: VecDeque::with_capacity(64),
        };
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RobotConfig::default())
    }

    pub fn gyro(&self) -> SimGyro {
        SimGyro {
            robot: self.clone(),
        }
    }

    pub fn motors(&self) -> SimMotors {
        SimMotors {
            robot: self.clone(),
        }
    }

    pub fn clock(&self) -> SimClock {
        SimClock {
            robot: self.clone(),
        }
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// Advance simulated time, integrating physics in `step_us` increments.
    pub fn advance(&self, us: u64) {
        let step_us = self.config.step_us.max(1);
        let mut state = self.lock();
        let mut remaining = us;
        while remaining > 0 {
            let step = remaining.min(step_us);
            self.integrate(&mut state, step as f32 / 1_000_000.0);
            state.time_us += step;
            remaining -= step;
        }
    }

    /// Replace the injected gyro fault.
    pub fn set_fault(&self, fault: GyroFault) {
        self.lock().fault = fault;
    }

    pub fn now_us(&self) -> u64 {
        self.lock().time_us
    }

    /// True heading since start (degrees, counter-clockwise positive).
    pub fn heading_deg(&self) -> f32 {
        self.lock().heading_deg
    }

    /// True yaw rate (°/s).
    pub fn rate_dps(&self) -> f32 {
        self.lock().rate_dps
    }

    pub fn command(&self) -> MotorCommand {
        self.lock().command
    }

    pub fn is_awake(&self) -> bool {
        self.lock().awake
    }

    pub fn gyro_reads(&self) -> u32 {
        self.lock().reads
    }

    /// The most recent motor writes, oldest first, at most [`COMMAND_LOG_CAPACITY`].
    pub fn command_log(&self) -> Vec<CommandRecord> {
        self.lock().log.iter().copied().collect()
    }

    pub fn clear_command_log(&self) {
        self.lock().log.clear();
    }

    fn lock(&self) -> MutexGuard<'_, RobotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Steady-state yaw rate for a command.
    fn commanded_rate_dps(&self, command: MotorCommand) -> f32 {
        (command.right - command.left) as f32 / 2.0 * self.config.dps_per_power
    }

    fn integrate(&self, state: &mut RobotState, dt: f32) {
        let target = self.commanded_rate_dps(state.command);
        let tau = self.config.response_time_ms / 1000.0;
        if tau > 0.0 {
            let alpha = 1.0 - (-dt / tau).exp();
            state.rate_dps += (target - state.rate_dps) * alpha;
        } else {
            state.rate_dps = target;
        }
        state.heading_deg += state.rate_dps * dt;
    }

    fn read_gyro(&self) -> Result<i16, SensorError> {
        let mut state = self.lock();
        if !state.awake {
            return Err(SensorError::NotResponding);
        }
        if let GyroFault::FailReads { after } = state.fault {
            if state.reads >= after {
                return Err(SensorError::Bus);
            }
        }
        state.reads += 1;

        let frozen = state.fault == GyroFault::StuckAfterStop && state.stopped_once;
        let rate = if frozen { 0.0 } else { state.rate_dps };
        let noise = gaussian_noise(&mut state.rng, self.config.gyro_noise_dps);
        let measured = rate + self.config.gyro_bias_dps + noise;
        Ok(encode_rate(measured, self.config.gyro_range.sensitivity()))
    }

    fn write_command(&self, command: MotorCommand) {
        let mut state = self.lock();
        if command.is_stop() {
            state.stopped_once = true;
        }
        state.command = command;
        let time_us = state.time_us;
        if state.log.len() == COMMAND_LOG_CAPACITY {
            state.log.pop_front();
        }
        state.log.push_back(CommandRecord { time_us, command });
    }
}

impl std::fmt::Debug for SimRobot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SimRobot")
            .field("time_us", &state.time_us)
            .field("heading_deg", &state.heading_deg)
            .field("rate_dps", &state.rate_dps)
            .field("command", &state.command)
            .finish()
    }
}

/// Scale a rate to raw LSB, rounded and saturated to the 16-bit register.
pub fn encode_rate(rate_dps: f32, sensitivity_lsb_per_dps: f32) -> i16 {
    let raw = (rate_dps * sensitivity_lsb_per_dps).round();
    raw.clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Generate Gaussian noise using Box-Muller transform.
fn gaussian_noise(rng: &mut StdRng, stddev: f32) -> f32 {
    if stddev == 0.0 {
        return 0.0;
    }
    let u1: f32 = rng.gen::<f32>().max(f32::EPSILON);
    let u2: f32 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
    z * stddev
}

/// Gyro handle.
#[derive(Debug, Clone)]
pub struct SimGyro {
    robot: SimRobot,
}

impl InertialSensor for SimGyro {
    fn wake(&mut self) -> Result<(), SensorError> {
        self.robot.lock().awake = true;
        log::debug!("Simulated gyro awake");
        Ok(())
    }

    fn read_rate_raw_z(&mut self) -> Result<i16, SensorError> {
        self.robot.read_gyro()
    }
}

/// Motor handle. Accepts the same ±100 power range as a real drive.
#[derive(Debug, Clone)]
pub struct SimMotors {
    robot: SimRobot,
}

impl MotorActuator for SimMotors {
    fn set_motors(&mut self, left: i32, right: i32) -> Result<(), MotorError> {
        power_to_speed(left)?;
        power_to_speed(right)?;
        self.robot.write_command(MotorCommand::new(left, right));
        Ok(())
    }

    fn stop_all(&mut self) -> Result<(), MotorError> {
        self.robot.write_command(MotorCommand::STOP);
        Ok(())
    }
}

/// Clock handle. Every delay steps the physics.
#[derive(Debug, Clone)]
pub struct SimClock {
    robot: SimRobot,
}

impl TimeSource for SimClock {
    fn now_us(&self) -> u64 {
        self.robot.now_us()
    }
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.robot.advance(u64::from(ns) / 1000);
    }

    fn delay_us(&mut self, us: u32) {
        self.robot.advance(u64::from(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.robot.advance(u64::from(ms) * 1000);
    }
}

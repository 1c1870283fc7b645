//! Software-in-the-loop harness for gyro_turn.
//!
//! Runs the real estimator and turn controller from `gyro_turn_core`
//! against a simulated differential-drive robot in lockstep time.

pub mod config;
pub mod error;
pub mod robot;

pub use config::{GyroFault, RobotConfig, SimConfig};
pub use error::SimulatorError;
pub use robot::{CommandRecord, SimClock, SimGyro, SimMotors, SimRobot, COMMAND_LOG_CAPACITY};

use gyro_turn_core::TurnPilot;

/// Pilot wired to a simulated robot.
pub type SimPilot = TurnPilot<SimGyro, SimMotors, SimClock>;

/// Build a robot and a pilot driving it from one scenario.
pub fn build_pilot(config: &SimConfig) -> (SimRobot, SimPilot) {
    let robot = SimRobot::new(config.robot.clone());
    let pilot = TurnPilot::new(
        robot.gyro(),
        robot.motors(),
        robot.clock(),
        config.estimator,
        config.turn,
    );
    (robot, pilot)
}

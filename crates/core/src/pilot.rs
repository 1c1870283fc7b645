//! Upward control surface
//!
//! [`TurnPilot`] bundles one estimator and one controller behind the two
//! calls an application needs: `calibrate()` once at rest, then `turn()`.

use crate::heading::{CalibrationState, EstimatorConfig, HeadingEstimator};
use crate::motor::MotorActuator;
use crate::sensor::{InertialSensor, SensorError};
use crate::traits::Timer;
use crate::turn::{TurnConfig, TurnController, TurnDirection, TurnReport, TurnRequest};

pub struct TurnPilot<S, M, T> {
    estimator: HeadingEstimator<S>,
    controller: TurnController<M, T>,
}

impl<S, M, T> TurnPilot<S, M, T>
where
    S: InertialSensor,
    M: MotorActuator,
    T: Timer,
{
    pub fn new(
        sensor: S,
        actuator: M,
        timer: T,
        estimator_config: EstimatorConfig,
        turn_config: TurnConfig,
    ) -> Self {
        Self {
            estimator: HeadingEstimator::new(sensor, estimator_config),
            controller: TurnController::new(actuator, timer, turn_config),
        }
    }

    /// Wake the gyro and establish its zero-rate bias. Robot must be at rest.
    ///
    /// Any failure, including the wake, leaves the pilot uncalibrated.
    pub fn calibrate(&mut self) -> Result<CalibrationState, SensorError> {
        if let Err(e) = self.estimator.wake() {
            crate::log_error!("Gyro wake failed: {}", e.as_str());
            self.estimator.invalidate();
            return Err(e);
        }
        self.estimator.calibrate(self.controller.timer_mut())
    }

    /// Rotate in place by `target_angle_deg`. Blocks until the motors stop.
    pub fn turn(&mut self, direction: TurnDirection, target_angle_deg: f32, speed: i32) -> TurnReport {
        let request = TurnRequest::new(direction, target_angle_deg, speed);
        self.controller.turn(&mut self.estimator, request)
    }

    pub fn is_calibrated(&self) -> bool {
        self.estimator.is_calibrated()
    }

    /// Angle accumulated during the last turn (degrees)
    pub fn angle_deg(&self) -> f32 {
        self.estimator.angle_deg()
    }

    pub fn estimator(&self) -> &HeadingEstimator<S> {
        &self.estimator
    }

    pub fn controller(&self) -> &TurnController<M, T> {
        &self.controller
    }

    pub fn into_parts(self) -> (HeadingEstimator<S>, TurnController<M, T>) {
        (self.estimator, self.controller)
    }
}

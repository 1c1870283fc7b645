//! Two-phase in-place turn controller
//!
//! Rough turn at the requested speed up to an early-stop buffer short of the
//! target, an active brake pulse, then slow bang-bang correction into a
//! deadband with a hard timeout.

use embedded_hal::delay::DelayNs;
use libm::fabsf;

use super::types::{
    RejectReason, TurnConfig, TurnFault, TurnOutcome, TurnPhase, TurnReport, TurnRequest,
};
use crate::heading::HeadingEstimator;
use crate::motor::MotorActuator;
use crate::sensor::InertialSensor;
use crate::traits::{TimeSource, Timer};

/// Turn state machine
///
/// Owns the actuator and the timer; borrows the estimator per turn. Every
/// pause goes through the timer, so the whole turn runs in simulated time
/// on host.
pub struct TurnController<M, T> {
    actuator: M,
    timer: T,
    config: TurnConfig,
    phase: TurnPhase,
}

impl<M: MotorActuator, T: Timer> TurnController<M, T> {
    pub fn new(actuator: M, timer: T, config: TurnConfig) -> Self {
        Self {
            actuator,
            timer,
            config,
            phase: TurnPhase::Idle,
        }
    }

    /// Execute one turn. Blocks until the motors are stopped again.
    ///
    /// Never panics and never returns an error: every way a turn can end is
    /// a [`TurnOutcome`]. A rejected request leaves the machine in `Idle`
    /// without touching the motors or the clock.
    pub fn turn<S: InertialSensor>(
        &mut self,
        estimator: &mut HeadingEstimator<S>,
        request: TurnRequest,
    ) -> TurnReport {
        self.reset();

        if !estimator.is_calibrated() {
            crate::log_warn!("Turn rejected: gyro not calibrated");
            return TurnReport::rejected(RejectReason::NotCalibrated);
        }
        if !request.has_valid_target() {
            crate::log_warn!("Turn rejected: invalid target {}", request.target_angle_deg);
            return TurnReport::rejected(RejectReason::InvalidTarget);
        }

        let effective_speed = self.config.effective_speed(request.speed);
        let mut report = TurnReport {
            outcome: TurnOutcome::Converged,
            final_angle_deg: 0.0,
            effective_speed,
            stop_early_buffer_deg: self.config.stop_early_buffer(effective_speed),
            rough_exit_angle_deg: 0.0,
            correction_elapsed_ms: 0,
        };

        crate::log_info!(
            "Turn {} {} deg at speed {} (buffer {} deg)",
            request.direction.as_str(),
            request.target_angle_deg,
            effective_speed,
            report.stop_early_buffer_deg
        );

        report.outcome = match self.run(estimator, &request, &mut report) {
            Ok(outcome) => outcome,
            Err(fault) => {
                // Best effort, the first fault is reported
                let _ = self.actuator.stop_all();
                crate::log_error!("Turn aborted in {}", self.phase.as_str());
                TurnOutcome::Aborted(fault)
            }
        };
        report.final_angle_deg = estimator.angle_deg();
        self.enter(TurnPhase::Done);

        crate::log_info!(
            "Turn finished: {} at {} deg",
            report.outcome.as_str(),
            report.final_angle_deg
        );
        report
    }

    fn run<S: InertialSensor>(
        &mut self,
        estimator: &mut HeadingEstimator<S>,
        request: &TurnRequest,
        report: &mut TurnReport,
    ) -> Result<TurnOutcome, TurnFault> {
        let target = request.target_angle_deg;
        let rough = request.direction.command(report.effective_speed);
        let exit_angle = target - report.stop_early_buffer_deg;

        // Rough turn
        self.enter(TurnPhase::RoughTurn);
        estimator.reset_angle(self.timer.now_us());
        self.actuator.apply(rough)?;
        let rough_start_ms = self.timer.now_ms();

        let mut angle = estimator.angle_deg();
        while fabsf(angle) < exit_angle {
            if let Some(limit) = self.config.rough_timeout_ms {
                if self.timer.now_ms().saturating_sub(rough_start_ms) >= u64::from(limit) {
                    self.actuator.stop_all()?;
                    report.rough_exit_angle_deg = angle;
                    crate::log_warn!("Rough turn timed out at {} deg after {} ms", angle, limit);
                    return Ok(TurnOutcome::RoughTimedOut);
                }
            }
            self.timer.delay_ms(self.config.control_period_ms);
            angle = estimator.tick(self.timer.now_us())?;
        }
        report.rough_exit_angle_deg = angle;
        crate::log_debug!("Rough turn exit at {} deg", angle);

        // Brake: fixed-length counter pulse, stop, settle
        self.enter(TurnPhase::Brake);
        self.actuator.apply(rough.reversed())?;
        self.timer.delay_ms(self.config.brake_duration_ms);
        self.actuator.stop_all()?;
        self.timer.delay_ms(self.config.settle_ms);

        // Correction
        self.enter(TurnPhase::Correction);
        let slow = request.direction.command(self.config.correction_speed);
        let correction_start_ms = self.timer.now_ms();

        let outcome = loop {
            let angle = estimator.tick(self.timer.now_us())?;
            let error = fabsf(angle) - target;
            let elapsed_ms = self.timer.now_ms().saturating_sub(correction_start_ms);
            report.correction_elapsed_ms = u32::try_from(elapsed_ms).unwrap_or(u32::MAX);

            if fabsf(error) <= self.config.deadband_deg {
                break TurnOutcome::Converged;
            }
            if elapsed_ms >= u64::from(self.config.correction_timeout_ms) {
                crate::log_warn!("Correction timed out at {} deg (error {} deg)", angle, error);
                break TurnOutcome::CorrectionTimedOut;
            }

            // Undershoot keeps going, overshoot backs off
            let command = if error < 0.0 { slow } else { slow.reversed() };
            self.actuator.apply(command)?;
            self.timer.delay_ms(self.config.control_period_ms);
        };

        self.actuator.stop_all()?;
        Ok(outcome)
    }

    fn enter(&mut self, phase: TurnPhase) {
        crate::log_debug!("Turn phase {} -> {}", self.phase.as_str(), phase.as_str());
        self.phase = phase;
    }

    /// Return the machine to `Idle`
    pub fn reset(&mut self) {
        self.phase = TurnPhase::Idle;
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn config(&self) -> &TurnConfig {
        &self.config
    }

    pub fn actuator(&self) -> &M {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut M {
        &mut self.actuator
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn release(self) -> (M, T) {
        (self.actuator, self.timer)
    }
}

//! Gyro heading estimator
//!
//! Dead-reckons the yaw angle accumulated since the last reset by
//! integrating the bias-corrected Z rate over elapsed time.
//!
//! # Usage
//!
//! 1. [`HeadingEstimator::calibrate`] once while the robot is at rest
//! 2. [`HeadingEstimator::reset_angle`] at the start of every turn
//! 3. [`HeadingEstimator::tick`] every control period
//!
//! Integration is first-order (rectangular): the rate read at the end of an
//! interval is applied over the whole interval. Error grows with the tick
//! spacing and with any bias residual, so callers should tick every
//! 10-20 ms. Long pauses between ticks are folded into the next `dt`.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::sensor::{raw_to_dps, registers, InertialSensor, SensorError};

/// Upper bound on calibration samples held at once
pub const MAX_CALIBRATION_SAMPLES: usize = 64;

/// Estimator configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EstimatorConfig {
    /// Rest samples averaged into the bias (clamped to 1..=64)
    pub sample_count: u16,
    /// Pause after each calibration sample (ms)
    pub sample_interval_ms: u32,
    /// Raw LSB per °/s for the configured gyro range
    pub sensitivity_lsb_per_dps: f32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            sample_count: 20,
            sample_interval_ms: 50,
            sensitivity_lsb_per_dps: registers::GYRO_SENSITIVITY_250DPS,
        }
    }
}

/// Result of a rest calibration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationState {
    /// Zero-rate offset (°/s)
    pub bias_dps: f32,
    /// Set only by a fully successful calibration
    pub calibrated: bool,
    /// Number of samples averaged
    pub samples: u16,
    /// Peak-to-peak spread of the samples (°/s)
    pub spread_dps: f32,
}

/// Running heading estimate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeadingState {
    /// Signed angle accumulated since the last reset (degrees)
    pub current_angle_deg: f32,
    /// Timestamp of the last integrated sample (µs)
    pub last_sample_us: u64,
}

/// Mean of the rest samples
///
/// Returns 0.0 for an empty slice.
pub fn estimate_bias(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().sum();
    sum / samples.len() as f32
}

/// Peak-to-peak spread of the rest samples
pub fn sample_spread(samples: &[f32]) -> f32 {
    let mut iter = samples.iter().copied();
    let Some(first) = iter.next() else {
        return 0.0;
    };
    let (min, max) = iter.fold((first, first), |(lo, hi), s| (lo.min(s), hi.max(s)));
    max - min
}

/// Single-axis yaw estimator over an [`InertialSensor`]
pub struct HeadingEstimator<S> {
    sensor: S,
    config: EstimatorConfig,
    calibration: CalibrationState,
    heading: HeadingState,
}

impl<S: InertialSensor> HeadingEstimator<S> {
    pub fn new(sensor: S, config: EstimatorConfig) -> Self {
        Self {
            sensor,
            config,
            calibration: CalibrationState::default(),
            heading: HeadingState::default(),
        }
    }

    /// Wake the underlying sensor
    pub fn wake(&mut self) -> Result<(), SensorError> {
        self.sensor.wake()
    }

    /// Average rest samples into the bias.
    ///
    /// Reads the rate `sample_count` times, pausing `sample_interval_ms`
    /// after each read. The robot must be stationary. Any sensor error
    /// aborts the run and leaves the estimator uncalibrated; the previous
    /// bias is discarded either way.
    pub fn calibrate<D: DelayNs>(&mut self, delay: &mut D) -> Result<CalibrationState, SensorError> {
        self.calibration = CalibrationState::default();

        let sensitivity = self.config.sensitivity_lsb_per_dps;
        if !sensitivity.is_finite() || sensitivity <= 0.0 {
            crate::log_error!("Gyro sensitivity must be positive");
            return Err(SensorError::InvalidData);
        }

        let count = usize::from(self.config.sample_count).clamp(1, MAX_CALIBRATION_SAMPLES);
        let mut samples: Vec<f32, MAX_CALIBRATION_SAMPLES> = Vec::new();

        for _ in 0..count {
            let rate = match self.read_rate_dps() {
                Ok(rate) => rate,
                Err(e) => {
                    crate::log_error!("Gyro calibration failed after {} samples: {}", samples.len(), e.as_str());
                    return Err(e);
                }
            };
            // count never exceeds capacity
            let _ = samples.push(rate);
            delay.delay_ms(self.config.sample_interval_ms);
        }

        self.calibration = CalibrationState {
            bias_dps: estimate_bias(&samples),
            calibrated: true,
            samples: samples.len() as u16,
            spread_dps: sample_spread(&samples),
        };

        crate::log_info!(
            "Gyro calibrated: bias {} dps, spread {} dps over {} samples",
            self.calibration.bias_dps,
            self.calibration.spread_dps,
            self.calibration.samples
        );

        Ok(self.calibration)
    }

    /// Zero the angle and restart integration from `now_us`.
    pub fn reset_angle(&mut self, now_us: u64) {
        self.heading = HeadingState {
            current_angle_deg: 0.0,
            last_sample_us: now_us,
        };
    }

    /// Integrate one rate sample and return the updated angle.
    ///
    /// A failed read leaves both the angle and the sample timestamp
    /// untouched, so the next successful tick covers the whole span.
    pub fn tick(&mut self, now_us: u64) -> Result<f32, SensorError> {
        let rate = self.read_rate_dps()? - self.calibration.bias_dps;
        let dt = now_us.saturating_sub(self.heading.last_sample_us) as f32 / 1_000_000.0;

        self.heading.last_sample_us = now_us;
        self.heading.current_angle_deg += rate * dt;

        Ok(self.heading.current_angle_deg)
    }

    /// Uncorrected rate in °/s
    pub fn read_rate_dps(&mut self) -> Result<f32, SensorError> {
        let raw = self.sensor.read_rate_raw_z()?;
        Ok(raw_to_dps(raw, self.config.sensitivity_lsb_per_dps))
    }

    pub fn angle_deg(&self) -> f32 {
        self.heading.current_angle_deg
    }

    pub fn heading(&self) -> HeadingState {
        self.heading
    }

    pub fn calibration(&self) -> CalibrationState {
        self.calibration
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.calibrated
    }

    /// Drop the current bias; turns are refused until the next successful calibration.
    pub fn invalidate(&mut self) {
        self.calibration = CalibrationState::default();
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn release(self) -> S {
        self.sensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockTime;
    use crate::traits::TimeSource;
    use std::collections::VecDeque;

    const SENSITIVITY: f32 = 131.0;

    /// Sensor replaying a scripted list of raw readings, then repeating `steady`
    struct ScriptedSensor {
        script: VecDeque<Result<i16, SensorError>>,
        steady: i16,
        reads: usize,
    }

    impl ScriptedSensor {
        fn steady(raw: i16) -> Self {
            Self {
                script: VecDeque::new(),
                steady: raw,
                reads: 0,
            }
        }

        fn scripted(script: &[Result<i16, SensorError>], steady: i16) -> Self {
            Self {
                script: script.iter().copied().collect(),
                steady,
                reads: 0,
            }
        }
    }

    impl InertialSensor for ScriptedSensor {
        fn wake(&mut self) -> Result<(), SensorError> {
            Ok(())
        }

        fn read_rate_raw_z(&mut self) -> Result<i16, SensorError> {
            self.reads += 1;
            self.script.pop_front().unwrap_or(Ok(self.steady))
        }
    }

    fn calibrated(sensor: ScriptedSensor) -> HeadingEstimator<ScriptedSensor> {
        let mut est = HeadingEstimator::new(sensor, EstimatorConfig::default());
        est.calibrate(&mut MockTime::new()).unwrap();
        est
    }

    #[test]
    fn test_default_config() {
        let config = EstimatorConfig::default();
        assert_eq!(config.sample_count, 20);
        assert_eq!(config.sample_interval_ms, 50);
        assert_eq!(config.sensitivity_lsb_per_dps, 131.0);
    }

    #[test]
    fn test_calibration_is_exact_sample_mean() {
        let raw: [i16; 20] = [
            12, -7, 30, 4, -15, 22, 9, 0, -3, 18, 27, -11, 5, 14, -20, 8, 31, -2, 6, 16,
        ];
        let script: std::vec::Vec<_> = raw.iter().map(|&r| Ok(r)).collect();
        let mut time = MockTime::new();
        let mut est =
            HeadingEstimator::new(ScriptedSensor::scripted(&script, 0), EstimatorConfig::default());

        let cal = est.calibrate(&mut time).unwrap();

        let rates: std::vec::Vec<f32> = raw.iter().map(|&r| r as f32 / SENSITIVITY).collect();
        let expected = rates.iter().sum::<f32>() / 20.0;
        assert!((cal.bias_dps - expected).abs() < 1e-6);
        assert!(cal.calibrated);
        assert_eq!(cal.samples, 20);
        assert!((cal.spread_dps - 51.0 / SENSITIVITY).abs() < 1e-5);
        // One pause after each of the 20 samples
        assert_eq!(time.now_ms(), 20 * 50);
        assert_eq!(est.sensor_mut().reads, 20);
    }

    #[test]
    fn test_calibration_failure_leaves_uncalibrated() {
        let mut est = calibrated(ScriptedSensor::steady(40));
        assert!(est.is_calibrated());

        est.sensor_mut().script = [Ok(1), Ok(2), Err(SensorError::Bus)].into_iter().collect();
        let result = est.calibrate(&mut MockTime::new());

        assert_eq!(result, Err(SensorError::Bus));
        assert!(!est.is_calibrated());
        assert_eq!(est.calibration().bias_dps, 0.0);
    }

    #[test]
    fn test_calibration_rejects_bad_sensitivity() {
        let config = EstimatorConfig {
            sensitivity_lsb_per_dps: 0.0,
            ..Default::default()
        };
        let mut est = HeadingEstimator::new(ScriptedSensor::steady(0), config);
        assert_eq!(est.calibrate(&mut MockTime::new()), Err(SensorError::InvalidData));
        assert!(!est.is_calibrated());
    }

    #[test]
    fn test_integration_independent_of_tick_schedule() {
        // Bias 0 during calibration, then a constant 20 °/s (2620 LSB)
        let rest: std::vec::Vec<_> = (0..20).map(|_| Ok(0)).collect();
        let schedules: [&[u64]; 3] = [
            &[1_000_000],
            &[100_000; 10],
            &[5_000, 250_000, 45_000, 700_000],
        ];

        for schedule in schedules {
            let mut est = calibrated(ScriptedSensor::scripted(&rest, 2620));
            est.reset_angle(0);
            let mut now = 0;
            for step in schedule {
                now += step;
                est.tick(now).unwrap();
            }
            assert!((est.angle_deg() - 20.0).abs() < 1e-3, "angle {}", est.angle_deg());
        }
    }

    #[test]
    fn test_tick_subtracts_bias() {
        // Bias of 1 °/s, sensor stuck at the bias: no motion
        let mut est = calibrated(ScriptedSensor::steady(131));
        assert!((est.calibration().bias_dps - 1.0).abs() < 1e-6);

        est.reset_angle(1_000);
        for i in 1..=100 {
            est.tick(1_000 + i * 10_000).unwrap();
        }
        assert!(est.angle_deg().abs() < 1e-4);
    }

    #[test]
    fn test_failed_tick_keeps_timestamp() {
        let rest: std::vec::Vec<_> = (0..20).map(|_| Ok(0)).collect();
        let mut est = calibrated(ScriptedSensor::scripted(&rest, -1310));
        est.reset_angle(0);

        est.tick(10_000).unwrap();
        est.sensor_mut().script.push_back(Err(SensorError::Bus));
        assert_eq!(est.tick(20_000), Err(SensorError::Bus));
        assert_eq!(est.heading().last_sample_us, 10_000);

        // Next tick integrates the full 20 ms
        let angle = est.tick(30_000).unwrap();
        assert!((angle + 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_reset_angle() {
        let mut est = calibrated(ScriptedSensor::steady(0));
        est.sensor_mut().steady = 655;
        est.reset_angle(0);
        est.tick(100_000).unwrap();
        assert!(est.angle_deg() > 0.0);

        est.reset_angle(500_000);
        assert_eq!(
            est.heading(),
            HeadingState {
                current_angle_deg: 0.0,
                last_sample_us: 500_000
            }
        );
    }

    #[test]
    fn test_bias_helpers() {
        assert_eq!(estimate_bias(&[]), 0.0);
        assert_eq!(sample_spread(&[]), 0.0);
        assert_eq!(estimate_bias(&[1.0, 2.0, 3.0, 6.0]), 3.0);
        assert_eq!(sample_spread(&[1.0, -2.0, 3.0]), 5.0);
    }
}

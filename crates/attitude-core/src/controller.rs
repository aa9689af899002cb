use crate::calibration::{CalibrationEstimator, SensorCalibration};
use crate::filter::AttitudeFilter;
use crate::types::{MotionSample, TrackerSnapshot};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Error)]
pub enum TrackerError {
    /// Tracking was requested without a prior completed calibration.
    #[error("no calibration available; run calibrate first")]
    NotCalibrated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Idle,
    Calibrating,
    Tracking,
}

/// Orchestrates calibration and tracking.
///
/// Routes each incoming sample to the calibration estimator or the
/// attitude filter depending on state, and produces an immutable
/// snapshot after every dispatch. Strictly single-threaded: one sample
/// at a time, in arrival order.
pub struct TrackingController {
    state: TrackingState,
    estimator: CalibrationEstimator,
    filter: AttitudeFilter,
    calibration: Option<SensorCalibration>,
}

impl TrackingController {
    pub fn new(calibration_samples: usize, dt: f64, alpha: f64) -> Self {
        Self {
            state: TrackingState::Idle,
            estimator: CalibrationEstimator::new(calibration_samples),
            filter: AttitudeFilter::new(dt, alpha),
            calibration: None,
        }
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn calibration(&self) -> Option<&SensorCalibration> {
        self.calibration.as_ref()
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            attitude: self.filter.attitude(),
            tracking: self.state != TrackingState::Idle,
            calibrated: self.calibration.is_some(),
        }
    }

    /// Begins (or restarts) calibration. Idempotent: calling while a
    /// window is in progress discards it and starts over. The stored
    /// attitude persists; only the biases will be refreshed.
    pub fn calibrate(&mut self) {
        if self.state == TrackingState::Calibrating {
            debug!("calibration already in progress, restarting window");
        }
        self.calibration = None;
        self.estimator.reset();
        self.state = TrackingState::Calibrating;
        info!("Calibration started");
    }

    /// Resumes tracking with previously computed biases, without a fresh
    /// calibration window.
    pub fn resume(&mut self) -> Result<(), TrackerError> {
        if self.calibration.is_none() {
            return Err(TrackerError::NotCalibrated);
        }
        if self.state == TrackingState::Tracking {
            warn!("Already tracking, resume ignored");
            return Ok(());
        }
        self.state = TrackingState::Tracking;
        info!("Tracking resumed with stored calibration");
        Ok(())
    }

    /// Halts tracking. Calibration results are kept so `resume` works
    /// without re-running the window.
    pub fn stop(&mut self) {
        if self.state == TrackingState::Idle {
            return;
        }
        self.state = TrackingState::Idle;
        info!("Tracking stopped");
    }

    /// Processes one sample and returns the resulting published state.
    pub fn dispatch(&mut self, sample: &MotionSample) -> TrackerSnapshot {
        match self.state {
            TrackingState::Idle => {
                trace!("Sample dropped while idle");
            }
            TrackingState::Calibrating => {
                if let Some(cal) = self.estimator.accumulate(sample) {
                    info!(
                        gyro_bias_x = cal.gyro.bias.x,
                        gyro_bias_y = cal.gyro.bias.y,
                        gyro_bias_z = cal.gyro.bias.z,
                        accel_bias_x = cal.accel.bias.x,
                        accel_bias_y = cal.accel.bias.y,
                        accel_bias_z = cal.accel.bias.z,
                        "Calibration complete"
                    );
                    debug!(
                        gyro_noise_x = cal.gyro.noise.x,
                        gyro_noise_y = cal.gyro.noise.y,
                        gyro_noise_z = cal.gyro.noise.z,
                        accel_noise_x = cal.accel.noise.x,
                        accel_noise_y = cal.accel.noise.y,
                        accel_noise_z = cal.accel.noise.z,
                        "Calibration noise estimates"
                    );
                    self.calibration = Some(cal);
                    self.state = TrackingState::Tracking;
                }
            }
            TrackingState::Tracking => {
                if let Some(cal) = &self.calibration {
                    self.filter.step(sample, cal);
                }
            }
        }
        self.snapshot()
    }
}

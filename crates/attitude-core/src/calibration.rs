use crate::math::{mean, variance, Vec3};
use crate::types::MotionSample;

/// Number of stationary samples collected per calibration window.
pub const CALIBRATION_LENGTH: usize = 100;

/// Per-axis bias and noise (population variance) for one sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasNoise {
    pub bias: Vec3,
    pub noise: Vec3,
}

/// Calibration result for both sensors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorCalibration {
    pub gyro: BiasNoise,
    pub accel: BiasNoise,
}

/// Collects a fixed window of raw samples and reduces it to bias/noise
/// statistics once full.
///
/// The device is assumed stationary and level for the whole window; the
/// accelerometer z-axis bias gets +1 g added to its mean to cancel the
/// gravity component expected along that axis. A violated stationarity
/// assumption silently corrupts the estimates; detecting that is the
/// caller's problem (there is no minimum-motion check here).
pub struct CalibrationEstimator {
    window: Vec<MotionSample>,
    target: usize,
}

impl CalibrationEstimator {
    pub fn new(target: usize) -> Self {
        Self {
            window: Vec::with_capacity(target),
            target,
        }
    }

    /// Adds one sample to the window. Returns the computed calibration on
    /// the call that fills the window (exactly once per window); the
    /// window is reset afterwards so a new one can begin.
    pub fn accumulate(&mut self, sample: &MotionSample) -> Option<SensorCalibration> {
        self.window.push(*sample);
        if self.window.len() < self.target {
            return None;
        }

        let result = self.reduce();
        self.window.clear();
        Some(result)
    }

    /// Discards any partial window.
    pub fn reset(&mut self) {
        self.window.clear();
    }

    /// Number of samples accumulated so far in the current window.
    pub fn fill(&self) -> usize {
        self.window.len()
    }

    fn reduce(&self) -> SensorCalibration {
        let gyro = per_axis(&self.window, |s| s.angular_rate);
        let accel = per_axis(&self.window, |s| s.acceleration);

        let gyro_bias = Vec3::new(mean(&gyro.0), mean(&gyro.1), mean(&gyro.2));
        let gyro_noise = Vec3::new(
            centered_variance(&gyro.0, gyro_bias.x),
            centered_variance(&gyro.1, gyro_bias.y),
            centered_variance(&gyro.2, gyro_bias.z),
        );

        // Stationary and level, the accelerometer reads −1 g along z, so
        // the expected value of the z mean is −1; adding 1 leaves the true
        // sensor offset as the bias.
        let accel_bias = Vec3::new(mean(&accel.0), mean(&accel.1), mean(&accel.2) + 1.0);
        let accel_noise = Vec3::new(
            centered_variance(&accel.0, accel_bias.x),
            centered_variance(&accel.1, accel_bias.y),
            centered_variance(&accel.2, accel_bias.z),
        );

        SensorCalibration {
            gyro: BiasNoise {
                bias: gyro_bias,
                noise: gyro_noise,
            },
            accel: BiasNoise {
                bias: accel_bias,
                noise: accel_noise,
            },
        }
    }
}

fn per_axis(window: &[MotionSample], f: impl Fn(&MotionSample) -> Vec3) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut x = Vec::with_capacity(window.len());
    let mut y = Vec::with_capacity(window.len());
    let mut z = Vec::with_capacity(window.len());
    for s in window {
        let v = f(s);
        x.push(v.x);
        y.push(v.y);
        z.push(v.z);
    }
    (x, y, z)
}

/// Variance of `samples - bias`. Shifting by a constant does not change
/// the variance around the mean, but the z-axis bias is offset from the
/// mean by the gravity compensation, and the original estimator measures
/// spread around the bias, so it is computed explicitly.
fn centered_variance(samples: &[f64], bias: f64) -> f64 {
    let centered: Vec<f64> = samples.iter().map(|v| v - bias).collect();
    variance(&centered)
}

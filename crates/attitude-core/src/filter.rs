use crate::calibration::SensorCalibration;
use crate::math::{Quat, Vec3, EPS};
use crate::types::MotionSample;

/// Complementary-filter gain: fraction of the accelerometer-implied tilt
/// error removed each step. Higher = snappier drift correction, more
/// accelerometer noise leaking into the attitude.
pub const ALPHA: f64 = 0.9;

/// Nominal inter-sample interval at the default 100 Hz cadence.
pub const SAMPLE_DT: f64 = 0.01;

/// Starting pose: 90° about X, the assumed orientation of a device lying
/// face-up when tracking begins.
pub const INITIAL_ATTITUDE: Quat = Quat::new(
    0.7071067811865476,
    0.7071067811865475,
    0.0,
    0.0,
);

/// Complementary attitude filter.
///
/// Integrates bias-corrected gyro rates into the orientation quaternion
/// every step, then nudges the result toward the accelerometer-implied
/// "up" direction (reference up is +Y) by `alpha` of the measured tilt
/// error. Gyro integration is accurate short-term but drifts; the
/// accelerometer is noisy but drift-free in pitch/roll. Blending the two
/// corrects drift without a full probabilistic fusion. Yaw is
/// unobservable from the accelerometer and drifts freely.
pub struct AttitudeFilter {
    attitude: Quat,
    dt: f64,
    alpha: f64,
}

impl AttitudeFilter {
    pub fn new(dt: f64, alpha: f64) -> Self {
        Self {
            attitude: INITIAL_ATTITUDE,
            dt,
            alpha,
        }
    }

    /// Advances the attitude by one sample and returns it.
    ///
    /// Degenerate inputs (zero-magnitude rate or specific force) skip the
    /// affected sub-step instead of dividing by zero; a NaN must never
    /// reach the stored attitude. The quaternion is renormalized after
    /// each multiply.
    pub fn step(&mut self, sample: &MotionSample, cal: &SensorCalibration) -> Quat {
        self.propagate_gyro(sample.angular_rate - cal.gyro.bias);
        self.correct_tilt(sample.acceleration - cal.accel.bias);
        self.attitude
    }

    /// Body-frame rotation by the integrated rate over one interval:
    /// attitude ← attitude · q(|ω|·dt, ω̂).
    fn propagate_gyro(&mut self, omega: Vec3) {
        let l = omega.norm();
        if l < EPS {
            // No measurable rotation this interval.
            return;
        }
        let increment = Quat::from_axis_angle(l * self.dt, omega);
        self.attitude = (self.attitude * increment).normalized();
    }

    /// Rotates the measured specific force into the reference frame and
    /// removes `alpha` of the angle between it and the +Y reference up.
    fn correct_tilt(&mut self, accel: Vec3) {
        let a_ref = self.attitude.rotate(accel);
        let norm = a_ref.norm();
        if norm < EPS {
            return;
        }

        // Horizontal axis perpendicular to the up/measured-gravity
        // misalignment. Degenerates when gravity is exactly along ±Y, in
        // which case the tilt error is zero (or a 180° flip the
        // accelerometer alone cannot disambiguate) and no correction
        // applies.
        let tilt_axis = Vec3::new(a_ref.z, 0.0, -a_ref.x);
        if tilt_axis.norm() < EPS {
            return;
        }

        let phi = (a_ref.y / norm).clamp(-1.0, 1.0).acos();
        let correction = Quat::from_axis_angle(-self.alpha * phi, tilt_axis);
        self.attitude = (correction * self.attitude).normalized();
    }

    pub fn attitude(&self) -> Quat {
        self.attitude
    }

    /// Axis-angle decomposition of the current attitude.
    pub fn axis_angle(&self) -> (Vec3, f64) {
        self.attitude.axis_angle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::BiasNoise;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn unbiased() -> SensorCalibration {
        SensorCalibration {
            gyro: BiasNoise {
                bias: Vec3::ZERO,
                noise: Vec3::ZERO,
            },
            accel: BiasNoise {
                bias: Vec3::ZERO,
                noise: Vec3::ZERO,
            },
        }
    }

    /// The specific force a stationary, unbiased sensor would report for
    /// the filter's current attitude: gravity −ŷ in the reference frame,
    /// rotated back into the body frame.
    fn up_reading(attitude: Quat) -> Vec3 {
        attitude.conjugate().rotate(Vec3::new(0.0, 1.0, 0.0))
    }

    #[test]
    fn stationary_input_leaves_attitude_fixed() {
        let mut filter = AttitudeFilter::new(SAMPLE_DT, ALPHA);
        let before = filter.attitude();
        let sample = MotionSample {
            acceleration: up_reading(before),
            angular_rate: Vec3::ZERO,
        };
        for _ in 0..500 {
            filter.step(&sample, &unbiased());
        }
        let after = filter.attitude();
        assert_relative_eq!(after.r, before.r, epsilon = 1e-9);
        assert_relative_eq!(after.i, before.i, epsilon = 1e-9);
        assert_relative_eq!(after.j, before.j, epsilon = 1e-9);
        assert_relative_eq!(after.k, before.k, epsilon = 1e-9);
    }

    #[test]
    fn biased_but_compensated_input_leaves_attitude_fixed() {
        let gyro_bias = Vec3::new(0.05, -0.02, 0.01);
        let accel_bias = Vec3::new(0.01, -0.03, 0.002);
        let cal = SensorCalibration {
            gyro: BiasNoise {
                bias: gyro_bias,
                noise: Vec3::ZERO,
            },
            accel: BiasNoise {
                bias: accel_bias,
                noise: Vec3::ZERO,
            },
        };

        let mut filter = AttitudeFilter::new(SAMPLE_DT, ALPHA);
        let before = filter.attitude();
        let sample = MotionSample {
            acceleration: up_reading(before) + accel_bias,
            angular_rate: gyro_bias,
        };
        for _ in 0..200 {
            filter.step(&sample, &cal);
        }
        let after = filter.attitude();
        assert_relative_eq!(after.r, before.r, epsilon = 1e-9);
        assert_relative_eq!(after.i, before.i, epsilon = 1e-9);
    }

    #[test]
    fn gyro_integration_accumulates_rotation() {
        // Pure gyro: zero specific force disables the correction term.
        // 1 rad/s about the body X axis for 1 s.
        let mut filter = AttitudeFilter::new(SAMPLE_DT, ALPHA);
        let start = filter.attitude();
        let sample = MotionSample {
            acceleration: Vec3::ZERO,
            angular_rate: Vec3::new(1.0, 0.0, 0.0),
        };
        for _ in 0..100 {
            filter.step(&sample, &unbiased());
        }
        // Net rotation relative to the start should be ~1 rad about X.
        let relative = start.conjugate() * filter.attitude();
        let (axis, angle) = relative.axis_angle();
        assert_relative_eq!(angle, 1.0, epsilon = 1e-6);
        assert_relative_eq!(axis.x.abs(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn attitude_norm_stays_unit() {
        let mut filter = AttitudeFilter::new(SAMPLE_DT, ALPHA);
        for i in 0..5000 {
            let sample = MotionSample {
                acceleration: Vec3::new(0.1, 0.8, -0.3),
                angular_rate: Vec3::new((i as f64 * 0.01).sin(), 0.4, -0.2),
            };
            filter.step(&sample, &unbiased());
            let n = filter.attitude().norm();
            assert!((n - 1.0).abs() < 1e-9, "norm drifted to {n} at step {i}");
        }
    }

    #[test]
    fn zero_rate_and_zero_accel_are_skipped() {
        let mut filter = AttitudeFilter::new(SAMPLE_DT, ALPHA);
        let before = filter.attitude();
        let sample = MotionSample {
            acceleration: Vec3::ZERO,
            angular_rate: Vec3::ZERO,
        };
        let after = filter.step(&sample, &unbiased());
        assert_eq!(after, before);
        assert!(after.r.is_finite());
    }

    /// Tilt misalignment between the filter's up estimate and the true up.
    fn tilt_error(filter: &AttitudeFilter, true_attitude: Quat) -> f64 {
        let measured = filter.attitude().rotate(up_reading(true_attitude));
        (measured.y / measured.norm()).clamp(-1.0, 1.0).acos()
    }

    #[test]
    fn accel_correction_converges_to_measured_up() {
        // True pose differs from the filter's initial guess by a 0.5 rad
        // pitch (body X), which the accelerometer can observe.
        let true_attitude =
            INITIAL_ATTITUDE * Quat::from_axis_angle(0.5, Vec3::new(1.0, 0.0, 0.0));
        let sample = MotionSample {
            acceleration: up_reading(true_attitude),
            angular_rate: Vec3::ZERO,
        };

        let mut filter = AttitudeFilter::new(SAMPLE_DT, ALPHA);
        let initial_error = tilt_error(&filter, true_attitude);
        for _ in 0..50 {
            filter.step(&sample, &unbiased());
        }
        let final_error = tilt_error(&filter, true_attitude);
        assert!(initial_error > 0.3);
        assert!(final_error < 1e-3, "tilt error still {final_error}");
    }

    #[test]
    fn higher_alpha_converges_faster() {
        let true_attitude =
            INITIAL_ATTITUDE * Quat::from_axis_angle(0.5, Vec3::new(1.0, 0.0, 0.0));
        let sample = MotionSample {
            acceleration: up_reading(true_attitude),
            angular_rate: Vec3::ZERO,
        };

        let mut error_after = |alpha: f64| {
            let mut filter = AttitudeFilter::new(SAMPLE_DT, alpha);
            for _ in 0..3 {
                filter.step(&sample, &unbiased());
            }
            tilt_error(&filter, true_attitude)
        };

        let fast = error_after(0.9);
        let slow = error_after(0.1);
        assert!(fast < slow, "alpha=0.9 ({fast}) should beat alpha=0.1 ({slow})");
    }

    #[test]
    fn gravity_along_reference_up_applies_no_correction() {
        // a' exactly +Y makes the tilt axis zero; the step must not NaN.
        let mut filter = AttitudeFilter::new(SAMPLE_DT, ALPHA);
        let sample = MotionSample {
            acceleration: up_reading(filter.attitude()),
            angular_rate: Vec3::ZERO,
        };
        let q = filter.step(&sample, &unbiased());
        assert!(q.norm().is_finite());
        assert_relative_eq!(q.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn initial_attitude_is_quarter_turn_about_x() {
        let (axis, angle) = INITIAL_ATTITUDE.axis_angle();
        assert_relative_eq!(angle, FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(axis.x, 1.0, epsilon = 1e-12);
    }
}

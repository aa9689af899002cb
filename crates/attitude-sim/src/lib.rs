//! Synthetic motion source for driving the tracker without hardware.
//!
//! Plays back a simple scripted motion: the device lies face-up and
//! stationary for a lead-in (long enough to calibrate), then rotates at
//! a constant body-frame rate. Every sample carries the configured
//! sensor biases plus uniform noise, so calibration has something real
//! to estimate.

use attitude_core::filter::INITIAL_ATTITUDE;
use attitude_core::{MotionSample, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

/// Scripted motion profile.
#[derive(Debug, Clone, Copy)]
pub struct MotionScript {
    /// True gyro bias baked into every rate sample (rad/s).
    pub gyro_bias: Vec3,
    /// True accelerometer offset baked into every sample (g).
    pub accel_bias: Vec3,
    /// Half-width of the uniform per-axis noise.
    pub noise: f64,
    /// Body-frame rotation rate after the lead-in (rad/s).
    pub rotation_rate: Vec3,
    /// Stationary lead-in, in samples.
    pub stationary_samples: usize,
}

/// Generates the sample stream for a motion script.
///
/// Tracks the true attitude alongside, so the faked accelerometer keeps
/// reading gravity in the correct body direction while rotating.
pub struct SyntheticImu {
    script: MotionScript,
    dt: f64,
    true_attitude: Quat,
    emitted: usize,
    rng: StdRng,
}

/// Gravity direction in the reference frame (reference up is +Y).
const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Initial true pose: face-up, matching the tracker's assumed start.
const FACE_UP: Quat = INITIAL_ATTITUDE;

impl SyntheticImu {
    pub fn new(script: MotionScript, sample_rate_hz: f64, seed: u64) -> Self {
        Self {
            script,
            dt: 1.0 / sample_rate_hz,
            true_attitude: FACE_UP,
            emitted: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Produces the next sample and advances the true attitude.
    pub fn next_sample(&mut self) -> MotionSample {
        let rate = if self.emitted < self.script.stationary_samples {
            Vec3::ZERO
        } else {
            self.script.rotation_rate
        };

        // Advance the ground-truth pose by this interval's rotation.
        let l = rate.norm();
        if l > 0.0 {
            self.true_attitude =
                (self.true_attitude * Quat::from_axis_angle(l * self.dt, rate)).normalized();
        }

        // Specific force a stationary accelerometer reads at this pose:
        // reference up mapped back into the body frame.
        let gravity = self.true_attitude.conjugate().rotate(UP);

        self.emitted += 1;
        MotionSample {
            acceleration: gravity + self.script.accel_bias + self.jitter(),
            angular_rate: rate + self.script.gyro_bias + self.jitter(),
        }
    }

    /// True pose of the simulated device, for comparison against the
    /// tracker's estimate.
    pub fn true_attitude(&self) -> Quat {
        self.true_attitude
    }

    fn jitter(&mut self) -> Vec3 {
        let s = self.script.noise;
        if s == 0.0 {
            return Vec3::ZERO;
        }
        Vec3::new(
            self.rng.random_range(-s..s),
            self.rng.random_range(-s..s),
            self.rng.random_range(-s..s),
        )
    }
}

/// Streams samples into `tx` at the configured cadence until the
/// receiver is dropped.
pub async fn run_source(
    script: MotionScript,
    sample_rate_hz: f64,
    seed: u64,
    tx: mpsc::Sender<MotionSample>,
) {
    let mut imu = SyntheticImu::new(script, sample_rate_hz, seed);
    let mut ticker = interval(Duration::from_secs_f64(1.0 / sample_rate_hz));
    info!(sample_rate_hz, "Synthetic motion source started");

    loop {
        ticker.tick().await;
        if tx.send(imu.next_sample()).await.is_err() {
            debug!("Sample receiver dropped, source exiting");
            break;
        }
    }
}

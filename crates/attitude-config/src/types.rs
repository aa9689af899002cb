use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tracker tuning.
    pub tracker: TrackerConfig,
    /// Synthetic motion source used by the demo binary.
    pub sim: SimConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Complementary-filter gain (0..1). Higher = accelerometer corrects
    /// drift faster but injects more of its noise.
    pub alpha: f64,
    /// Samples per calibration window.
    pub calibration_samples: usize,
    /// Nominal sample cadence in Hz; the filter integrates with dT = 1/rate.
    pub sample_rate_hz: f64,
    /// Seconds a calibration window may take before the tracker gives up.
    pub calibration_timeout_secs: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.9,
            calibration_samples: 100,
            sample_rate_hz: 100.0,
            calibration_timeout_secs: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Constant gyro bias injected into every sample (rad/s).
    pub gyro_bias: [f64; 3],
    /// Constant accelerometer offset injected into every sample (g).
    pub accel_bias: [f64; 3],
    /// Half-width of the uniform noise added per axis.
    pub noise: f64,
    /// Body-frame rotation rate played back after the stationary lead-in
    /// (rad/s).
    pub rotation_rate: [f64; 3],
    /// Seconds of stationary output before the rotation starts, long
    /// enough to cover a calibration window.
    pub stationary_secs: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gyro_bias: [0.02, -0.01, 0.005],
            accel_bias: [0.005, -0.004, 0.002],
            noise: 0.002,
            rotation_rate: [0.5, 0.0, 0.0],
            stationary_secs: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_constants() {
        let cfg = TrackerConfig::default();
        assert_eq!(cfg.alpha, 0.9);
        assert_eq!(cfg.calibration_samples, 100);
        assert_eq!(cfg.sample_rate_hz, 100.0);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let cfg = AppConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.tracker.alpha, cfg.tracker.alpha);
        assert_eq!(back.tracker.calibration_samples, cfg.tracker.calibration_samples);
        assert_eq!(back.sim.gyro_bias, cfg.sim.gyro_bias);
        assert_eq!(back.sim.stationary_secs, cfg.sim.stationary_secs);
    }
}

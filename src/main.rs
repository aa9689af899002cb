use anyhow::Result;
use attitude_config::AppConfig;
use attitude_core::{Tracker, TrackerOptions, TrackerSnapshot, Vec3};
use attitude_sim::MotionScript;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// How far the sample channel may run ahead of the processing task.
const SAMPLE_CHANNEL_DEPTH: usize = 256;

fn tracker_options(config: &AppConfig) -> TrackerOptions {
    TrackerOptions {
        calibration_samples: config.tracker.calibration_samples,
        sample_rate_hz: config.tracker.sample_rate_hz,
        alpha: config.tracker.alpha,
        calibration_timeout: Duration::from_secs_f64(config.tracker.calibration_timeout_secs),
    }
}

fn motion_script(config: &AppConfig) -> MotionScript {
    let sim = &config.sim;
    MotionScript {
        gyro_bias: Vec3::new(sim.gyro_bias[0], sim.gyro_bias[1], sim.gyro_bias[2]),
        accel_bias: Vec3::new(sim.accel_bias[0], sim.accel_bias[1], sim.accel_bias[2]),
        noise: sim.noise,
        rotation_rate: Vec3::new(
            sim.rotation_rate[0],
            sim.rotation_rate[1],
            sim.rotation_rate[2],
        ),
        stationary_samples: (sim.stationary_secs * config.tracker.sample_rate_hz) as usize,
    }
}

/// One status line per second: the attitude as axis and angle, each to
/// two decimal places.
fn status_line(snapshot: &TrackerSnapshot) -> String {
    if !snapshot.tracking {
        return "Stopped".to_string();
    }
    if !snapshot.calibrated {
        return "Calibrating".to_string();
    }
    let (axis, angle) = snapshot.axis_angle();
    format!(
        "Axis: ({:.2}, {:.2}, {:.2})  Angle: {:.2}",
        axis.x, axis.y, axis.z, angle
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "attitude_tracker=info,attitude_core=info,attitude_sim=info".into()
            }),
        )
        .init();

    info!("Attitude tracker starting");

    let config = attitude_config::load_config().unwrap_or_else(|e| {
        warn!(?e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let (sample_tx, sample_rx) = mpsc::channel(SAMPLE_CHANNEL_DEPTH);
    let source = tokio::spawn(attitude_sim::run_source(
        motion_script(&config),
        config.tracker.sample_rate_hz,
        rand::random(),
        sample_tx,
    ));

    let tracker = Tracker::spawn(tracker_options(&config), sample_rx);
    tracker.calibrate();

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                println!("{}", status_line(&tracker.snapshot()));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                tracker.stop();
                break;
            }
        }
    }

    source.abort();
    Ok(())
}

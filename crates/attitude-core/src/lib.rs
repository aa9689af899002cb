pub mod calibration;
pub mod controller;
pub mod filter;
pub mod math;
pub mod types;

pub use calibration::{BiasNoise, SensorCalibration, CALIBRATION_LENGTH};
pub use controller::{TrackerError, TrackingController, TrackingState};
pub use filter::{AttitudeFilter, ALPHA, SAMPLE_DT};
pub use math::{Quat, Vec3};
pub use types::{MotionSample, TrackerSnapshot};

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::warn;

/// Commands sent to the processing task.
enum TrackerCommand {
    Calibrate,
    Resume,
    Stop,
}

/// Tuning knobs for a tracker instance.
#[derive(Debug, Clone, Copy)]
pub struct TrackerOptions {
    /// Samples per calibration window.
    pub calibration_samples: usize,
    /// Nominal sample cadence; the integration step uses 1/rate as dT.
    pub sample_rate_hz: f64,
    /// Complementary-filter gain.
    pub alpha: f64,
    /// Wall-clock limit for a calibration window to complete. A stalled
    /// source would otherwise leave the tracker calibrating forever.
    pub calibration_timeout: Duration,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            calibration_samples: CALIBRATION_LENGTH,
            sample_rate_hz: 1.0 / SAMPLE_DT,
            alpha: ALPHA,
            calibration_timeout: Duration::from_secs(5),
        }
    }
}

/// Handle to a running attitude tracker.
///
/// Owns a processing task that drains the motion-sample channel strictly
/// in order, routes each sample through the [`TrackingController`], and
/// publishes an immutable [`TrackerSnapshot`] over a watch channel after
/// every state change. Commands are fire-and-forget; their effect shows
/// up in subsequent snapshots.
pub struct Tracker {
    snapshot_rx: watch::Receiver<TrackerSnapshot>,
    command_tx: mpsc::UnboundedSender<TrackerCommand>,
    _task: tokio::task::JoinHandle<()>,
}

impl Tracker {
    /// Starts the processing task over the given sample stream.
    pub fn spawn(options: TrackerOptions, sample_rx: mpsc::Receiver<MotionSample>) -> Self {
        let (snapshot_tx, snapshot_rx) = watch::channel(TrackerSnapshot::default());
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let controller = TrackingController::new(
            options.calibration_samples,
            1.0 / options.sample_rate_hz,
            options.alpha,
        );
        let task = tokio::spawn(process_loop(
            controller,
            options.calibration_timeout,
            sample_rx,
            command_rx,
            snapshot_tx,
        ));

        Self {
            snapshot_rx,
            command_tx,
            _task: task,
        }
    }

    /// Latest published state (non-blocking).
    pub fn snapshot(&self) -> TrackerSnapshot {
        *self.snapshot_rx.borrow()
    }

    /// A receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<TrackerSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Begin or restart calibration.
    pub fn calibrate(&self) {
        let _ = self.command_tx.send(TrackerCommand::Calibrate);
    }

    /// Resume tracking with previously stored biases.
    pub fn resume(&self) {
        let _ = self.command_tx.send(TrackerCommand::Resume);
    }

    /// Halt tracking (calibration is kept).
    pub fn stop(&self) {
        let _ = self.command_tx.send(TrackerCommand::Stop);
    }
}

/// Background task: drain samples and commands, publish snapshots.
async fn process_loop(
    mut controller: TrackingController,
    calibration_timeout: Duration,
    mut sample_rx: mpsc::Receiver<MotionSample>,
    mut command_rx: mpsc::UnboundedReceiver<TrackerCommand>,
    snapshot_tx: watch::Sender<TrackerSnapshot>,
) {
    // Armed while a calibration window is in progress.
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            sample = sample_rx.recv() => {
                match sample {
                    Some(sample) => {
                        let snap = controller.dispatch(&sample);
                        if controller.state() != TrackingState::Calibrating {
                            deadline = None;
                        }
                        let _ = snapshot_tx.send(snap);
                    }
                    None => {
                        warn!("Motion source closed, stopping tracker");
                        controller.stop();
                        let _ = snapshot_tx.send(controller.snapshot());
                        break;
                    }
                }
            }
            cmd = command_rx.recv() => {
                match cmd {
                    Some(TrackerCommand::Calibrate) => {
                        controller.calibrate();
                        deadline = Some(Instant::now() + calibration_timeout);
                    }
                    Some(TrackerCommand::Resume) => {
                        if let Err(e) = controller.resume() {
                            warn!(%e, "Resume rejected");
                        }
                    }
                    Some(TrackerCommand::Stop) => {
                        controller.stop();
                        deadline = None;
                    }
                    // All handles dropped; nobody can observe us anymore.
                    None => break,
                }
                let _ = snapshot_tx.send(controller.snapshot());
            }
            _ = sleep_until_opt(deadline) => {
                warn!(
                    timeout_s = calibration_timeout.as_secs_f64(),
                    "Calibration window did not complete in time"
                );
                controller.stop();
                deadline = None;
                let _ = snapshot_tx.send(controller.snapshot());
            }
        }
    }
}

/// Sleeps until the deadline, or forever when none is armed.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending().await,
    }
}

use crate::filter::INITIAL_ATTITUDE;
use crate::math::{Quat, Vec3};

/// One reading from the motion source.
#[derive(Debug, Clone, Copy)]
pub struct MotionSample {
    /// Specific force (device acceleration + gravity), in g.
    pub acceleration: Vec3,
    /// Angular velocity, in rad/s.
    pub angular_rate: Vec3,
}

/// Immutable published state, produced by the controller after each
/// sample and handed to readers over a watch channel.
#[derive(Debug, Clone, Copy)]
pub struct TrackerSnapshot {
    /// Current orientation as a unit quaternion.
    pub attitude: Quat,
    pub tracking: bool,
    pub calibrated: bool,
}

impl TrackerSnapshot {
    /// Axis-angle view of the attitude, for display formatting.
    pub fn axis_angle(&self) -> (Vec3, f64) {
        self.attitude.axis_angle()
    }
}

impl Default for TrackerSnapshot {
    fn default() -> Self {
        Self {
            attitude: INITIAL_ATTITUDE,
            tracking: false,
            calibrated: false,
        }
    }
}

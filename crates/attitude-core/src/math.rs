use std::ops::{Add, Mul, Sub};

/// 3D vector, f64 throughout (sensor data and quaternion math share it).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, rhs: Vec3) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Returns `None` for a (near-)zero vector instead of dividing by zero.
    pub fn normalized(self) -> Option<Vec3> {
        let n = self.norm();
        if n < EPS {
            None
        } else {
            Some(self * (1.0 / n))
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f64) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }
}

/// Threshold below which a magnitude is treated as zero (degenerate input).
pub const EPS: f64 = 1e-12;

/// Unit quaternion representing a 3D rotation. `r` is the scalar part.
///
/// Construction through `from_axis_angle` and composition through `Mul`
/// keep the norm at 1 up to floating-point error; callers that iterate
/// many multiplies renormalize via [`Quat::normalized`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub r: f64,
    pub i: f64,
    pub j: f64,
    pub k: f64,
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        r: 1.0,
        i: 0.0,
        j: 0.0,
        k: 0.0,
    };

    pub const fn new(r: f64, i: f64, j: f64, k: f64) -> Self {
        Self { r, i, j, k }
    }

    /// Rotation of `angle` radians about `axis`. The axis is normalized
    /// here, so callers may pass an unnormalized direction; a zero axis
    /// yields the identity rotation.
    pub fn from_axis_angle(angle: f64, axis: Vec3) -> Quat {
        let axis = match axis.normalized() {
            Some(a) => a,
            None => return Quat::IDENTITY,
        };
        let half = angle * 0.5;
        let s = half.sin();
        Quat {
            r: half.cos(),
            i: s * axis.x,
            j: s * axis.y,
            k: s * axis.z,
        }
    }

    pub fn conjugate(self) -> Quat {
        Quat::new(self.r, -self.i, -self.j, -self.k)
    }

    pub fn norm(self) -> f64 {
        (self.r * self.r + self.i * self.i + self.j * self.j + self.k * self.k).sqrt()
    }

    /// Rescales to unit norm. A degenerate (near-zero) quaternion falls
    /// back to the identity rather than producing NaNs.
    pub fn normalized(self) -> Quat {
        let n = self.norm();
        if n < EPS {
            return Quat::IDENTITY;
        }
        Quat::new(self.r / n, self.i / n, self.j / n, self.k / n)
    }

    pub fn vector(self) -> Vec3 {
        Vec3::new(self.i, self.j, self.k)
    }

    /// Rotates `v` by this quaternion: vector part of `q * (0, v) * q⁻¹`.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Quat::new(0.0, v.x, v.y, v.z);
        (self * p * self.conjugate()).vector()
    }

    /// Axis-angle decomposition: angle = 2·acos(r), axis = normalized
    /// vector part. The identity decomposes to a zero axis and zero angle.
    pub fn axis_angle(self) -> (Vec3, f64) {
        let angle = 2.0 * self.r.clamp(-1.0, 1.0).acos();
        match self.vector().normalized() {
            Some(axis) => (axis, angle),
            None => (Vec3::ZERO, 0.0),
        }
    }
}

impl Mul for Quat {
    type Output = Quat;

    /// Hamilton product.
    fn mul(self, q: Quat) -> Quat {
        let v1 = self.vector();
        let v2 = q.vector();
        let v = v2 * self.r + v1 * q.r + v1.cross(v2);
        Quat {
            r: self.r * q.r - v1.dot(v2),
            i: v.x,
            j: v.y,
            k: v.z,
        }
    }
}

/// Arithmetic mean. Zero for an empty slice.
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population variance (divides by N, not N−1). Zero for an empty slice.
pub fn variance(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let avg = mean(samples);
    samples.iter().map(|v| (v - avg) * (v - avg)).sum::<f64>() / samples.len() as f64
}

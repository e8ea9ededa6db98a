// quaternion.rs - Hamilton quaternions and the vector helpers the orientation code needs

use glam::DVec3;
use std::ops::Mul;

/// Vectors shorter than this cannot be normalized.
pub const NORM_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum OrientationError {
    #[error("cannot normalize a vector of length {0:e}")]
    DegenerateVector(f64),
}

/// Rotation quaternion stored as `w + xi + yj + zk`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 0.0);

    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Pure quaternion `(0, v)`.
    pub fn from_vector(v: DVec3) -> Self {
        Self::new(0.0, v.x, v.y, v.z)
    }

    pub fn vector(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn normalized(&self) -> Result<Self, OrientationError> {
        let n = self.norm();
        if !(n > NORM_EPSILON) {
            return Err(OrientationError::DegenerateVector(n));
        }
        Ok(Self::new(self.w / n, self.x / n, self.y / n, self.z / n))
    }

    /// Negates the vector part. The argument is not renormalized, which keeps
    /// this identical to `q_conjugate` in the fragment shader.
    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Components in uniform order (w, x, y, z).
    pub fn to_gpu(&self) -> [f32; 4] {
        [self.w as f32, self.x as f32, self.y as f32, self.z as f32]
    }
}

/// Hamilton product. `a * b` applies `b` in the frame already rotated by `a`.
impl Mul for Quaternion {
    type Output = Quaternion;

    fn mul(self, q2: Quaternion) -> Quaternion {
        let q1 = self;
        Quaternion::new(
            q1.w * q2.w - q1.x * q2.x - q1.y * q2.y - q1.z * q2.z,
            q1.w * q2.x + q1.x * q2.w + q1.y * q2.z - q1.z * q2.y,
            q1.w * q2.y - q1.x * q2.z + q1.y * q2.w + q1.z * q2.x,
            q1.w * q2.z + q1.x * q2.y - q1.y * q2.x + q1.z * q2.w,
        )
    }
}

pub fn quaternion_multiply(q1: Quaternion, q2: Quaternion) -> Quaternion {
    q1 * q2
}

pub fn quaternion_conjugate(q: Quaternion) -> Quaternion {
    q.conjugate()
}

/// Builds `(cos(angle/2), sin(angle/2) * axis)`; the axis is normalized first.
pub fn axis_angle_to_quaternion(axis: DVec3, angle: f64) -> Result<Quaternion, OrientationError> {
    let axis = normalize(axis)?;
    let half = angle * 0.5;
    let s = half.sin();
    Ok(Quaternion::new(half.cos(), axis.x * s, axis.y * s, axis.z * s))
}

/// Inverse of [`axis_angle_to_quaternion`] for unit quaternions. The identity
/// has no defined axis and is reported as degenerate.
pub fn quaternion_to_axis_angle(q: Quaternion) -> Result<(DVec3, f64), OrientationError> {
    let angle = q.w.clamp(-1.0, 1.0).acos() * 2.0;
    Ok((normalize(q.vector())?, angle))
}

/// Sandwich product `q * (0, v) * conjugate(q)`, with `v` normalized first.
pub fn rotate_vector_by_quaternion(q: Quaternion, v: DVec3) -> Result<DVec3, OrientationError> {
    let p = Quaternion::from_vector(normalize(v)?);
    Ok(quaternion_multiply(q * p, quaternion_conjugate(q)).vector())
}

pub fn normalize(v: DVec3) -> Result<DVec3, OrientationError> {
    let len = v.length();
    if !(len > NORM_EPSILON) {
        return Err(OrientationError::DegenerateVector(len));
    }
    Ok(v / len)
}

pub fn cross(v0: DVec3, v1: DVec3) -> DVec3 {
    v0.cross(v1)
}

pub fn dot(v0: DVec3, v1: DVec3) -> f64 {
    v0.dot(v1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-6;

    fn assert_quat_eq(a: Quaternion, b: Quaternion) {
        let d = [a.w - b.w, a.x - b.x, a.y - b.y, a.z - b.z];
        assert!(d.iter().all(|c| c.abs() < EPS), "{a:?} != {b:?}");
    }

    fn assert_vec_eq(a: DVec3, b: DVec3) {
        assert!((a - b).length() < EPS, "{a:?} != {b:?}");
    }

    fn samples() -> Vec<Quaternion> {
        let axes = [
            DVec3::X,
            DVec3::Y,
            DVec3::Z,
            DVec3::new(1.0, 2.0, 3.0),
            DVec3::new(-0.3, 0.5, -2.0),
        ];
        let angles = [0.1, 0.75, FRAC_PI_2, 2.5, -1.2];
        axes.iter()
            .zip(angles)
            .map(|(a, t)| axis_angle_to_quaternion(*a, t).unwrap())
            .collect()
    }

    #[test]
    fn identity_is_two_sided_unit() {
        for q in samples() {
            assert_quat_eq(quaternion_multiply(q, Quaternion::IDENTITY), q);
            assert_quat_eq(quaternion_multiply(Quaternion::IDENTITY, q), q);
        }
    }

    #[test]
    fn multiply_is_not_commutative() {
        let a = axis_angle_to_quaternion(DVec3::X, 0.5).unwrap();
        let b = axis_angle_to_quaternion(DVec3::Y, 0.5).unwrap();
        let ab = a * b;
        let ba = b * a;
        assert!((ab.z - ba.z).abs() > 0.01);
    }

    #[test]
    fn multiply_is_associative() {
        let qs = samples();
        for w in qs.windows(3) {
            let left = quaternion_multiply(quaternion_multiply(w[0], w[1]), w[2]);
            let right = quaternion_multiply(w[0], quaternion_multiply(w[1], w[2]));
            assert_quat_eq(left, right);
        }
    }

    #[test]
    fn rotation_keeps_its_own_axis_fixed() {
        let axes = [DVec3::X, DVec3::new(1.0, 1.0, 0.0), DVec3::new(0.2, -0.7, 0.4)];
        for axis in axes {
            let axis = normalize(axis).unwrap();
            for theta in [0.0, 0.3, 1.0, PI, 4.0] {
                let q = axis_angle_to_quaternion(axis, theta).unwrap();
                assert_vec_eq(rotate_vector_by_quaternion(q, axis).unwrap(), axis);
            }
        }
    }

    #[test]
    fn zero_angle_is_identity() {
        for axis in [DVec3::X, DVec3::new(3.0, -1.0, 2.0)] {
            assert_quat_eq(axis_angle_to_quaternion(axis, 0.0).unwrap(), Quaternion::IDENTITY);
        }
    }

    #[test]
    fn axis_angle_round_trip() {
        let axis = normalize(DVec3::new(1.0, -2.0, 0.5)).unwrap();
        for theta in [0.01, 0.5, 1.5, 3.0] {
            let q = axis_angle_to_quaternion(axis * 4.0, theta).unwrap();
            let (a, t) = quaternion_to_axis_angle(q).unwrap();
            assert_vec_eq(a, axis);
            assert!((t - theta).abs() < EPS);
        }
    }

    #[test]
    fn identity_has_no_axis() {
        assert!(quaternion_to_axis_angle(Quaternion::IDENTITY).is_err());
    }

    #[test]
    fn quarter_turn_about_y() {
        let q = axis_angle_to_quaternion(DVec3::Y, FRAC_PI_2).unwrap();
        // +X goes to -Z under a right-handed rotation about +Y
        assert_vec_eq(rotate_vector_by_quaternion(q, DVec3::X).unwrap(), -DVec3::Z);
    }

    #[test]
    fn rotate_normalizes_input() {
        let q = axis_angle_to_quaternion(DVec3::Z, 0.7).unwrap();
        let out = rotate_vector_by_quaternion(q, DVec3::new(5.0, 0.0, 0.0)).unwrap();
        assert!((out.length() - 1.0).abs() < EPS);
    }

    #[test]
    fn normalize_zero_is_an_error() {
        assert_eq!(
            normalize(DVec3::ZERO),
            Err(OrientationError::DegenerateVector(0.0))
        );
        assert!(axis_angle_to_quaternion(DVec3::ZERO, 1.0).is_err());
        assert!(rotate_vector_by_quaternion(Quaternion::IDENTITY, DVec3::ZERO).is_err());
        assert!(Quaternion::new(0.0, 0.0, 0.0, 0.0).normalized().is_err());
    }

    #[test]
    fn conjugate_does_not_renormalize() {
        let q = Quaternion::new(2.0, 1.0, -1.0, 0.5);
        assert_eq!(quaternion_conjugate(q), Quaternion::new(2.0, -1.0, 1.0, -0.5));
    }

    #[test]
    fn conjugate_inverts_unit_quaternions() {
        for q in samples() {
            assert_quat_eq(q * q.conjugate(), Quaternion::IDENTITY);
        }
    }

    #[test]
    fn cross_and_dot() {
        assert_vec_eq(cross(DVec3::X, DVec3::Y), DVec3::Z);
        assert_eq!(dot(DVec3::new(1.0, 2.0, 3.0), DVec3::new(4.0, -5.0, 6.0)), 12.0);
    }

    #[test]
    fn gpu_layout_is_wxyz() {
        let q = Quaternion::new(0.5, -0.5, 0.25, 1.0);
        assert_eq!(q.to_gpu(), [0.5, -0.5, 0.25, 1.0]);
    }
}

//! Rigid-transform helpers on top of `glam` double precision types.
//!
//! Rotations are XYZ Euler triples `(rx, ry, rz)` in radians, composed as
//! `Rx(rx) * Ry(ry) * Rz(rz)`. A homogeneous RT matrix is `[R | t; 0 0 0 1]`.

use std::f64::consts::PI;

use glam::{DMat3, DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// `cos(ry)` below this is treated as gimbal lock.
const GIMBAL_EPSILON: f64 = 1e-9;

/// Rotation matrix for an XYZ Euler triple.
#[inline]
pub fn rotation_from_euler_xyz(angles: DVec3) -> DMat3 {
    DMat3::from_rotation_x(angles.x) * DMat3::from_rotation_y(angles.y) * DMat3::from_rotation_z(angles.z)
}

/// Homogeneous matrix mapping child-frame points into the parent frame.
#[inline]
pub fn rt_matrix(translation: DVec3, rotation_euler_xyz: DVec3) -> DMat4 {
    let mut m = DMat4::from_mat3(rotation_from_euler_xyz(rotation_euler_xyz));
    m.w_axis = translation.extend(1.0);
    m
}

/// Invert a homogeneous transform.
///
/// # Panics
///
/// Panics if `|det(m)| < epsilon`. Edges carry rigid transforms, so a
/// singular matrix means the graph holds corrupt data.
#[inline]
pub fn invert(m: &DMat4, epsilon: f64) -> DMat4 {
    let det = m.determinant();
    assert!(det.abs() >= epsilon, "singular RT matrix (det = {det}): {m:?}");
    m.inverse()
}

/// Apply a homogeneous transform to a 3D point.
#[inline]
pub fn transform_point(m: &DMat4, point: DVec3) -> DVec3 {
    let h = *m * point.extend(1.0);
    h.truncate() / h.w
}

/// Wrap an angle into `(-PI, PI]`.
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI { wrapped + 2.0 * PI } else { wrapped }
}

/// Extract XYZ Euler angles from a rotation matrix, picking the
/// smallest-norm of the two equivalent solutions.
pub fn extract_angles_min(r: &DMat3) -> DVec3 {
    // glam is column-major: m(row, col) == r.col(col)[row]
    let m = |row: usize, col: usize| r.col(col)[row];

    let cos_ry = m(0, 0).hypot(m(0, 1));
    let ry = m(0, 2).atan2(cos_ry);
    if cos_ry < GIMBAL_EPSILON {
        // rz is unobservable; fold everything into rx.
        let rx = if ry > 0.0 {
            m(1, 0).atan2(m(1, 1))
        } else {
            -m(1, 0).atan2(m(1, 1))
        };
        return DVec3::new(wrap_angle(rx), ry, 0.0);
    }

    let rx = (-m(1, 2)).atan2(m(2, 2));
    let rz = (-m(0, 1)).atan2(m(0, 0));
    let first = DVec3::new(rx, ry, rz);
    let second = DVec3::new(wrap_angle(rx + PI), wrap_angle(PI - ry), wrap_angle(rz + PI));

    if second.length_squared() < first.length_squared() { second } else { first }
}

// ============================================================================
// Pose
// ============================================================================

/// A 6-DoF pose: position plus XYZ Euler orientation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub translation: DVec3,
    pub rotation: DVec3,
}

impl Pose {
    /// The frame's own origin.
    pub const ORIGIN: Self = Self { translation: DVec3::ZERO, rotation: DVec3::ZERO };

    pub fn new(translation: DVec3, rotation: DVec3) -> Self {
        Self { translation, rotation }
    }

    /// `[x, y, z, rx, ry, rz]`
    pub fn to_array(&self) -> [f64; 6] {
        let t = self.translation;
        let r = self.rotation;
        [t.x, t.y, t.z, r.x, r.y, r.z]
    }

    /// Re-express this pose through `m`, a transform from its frame into another.
    pub fn transformed_by(&self, m: &DMat4) -> Self {
        let translation = transform_point(m, self.translation);
        let rotation = DMat3::from_mat4(*m) * rotation_from_euler_xyz(self.rotation);
        Self { translation, rotation: extract_angles_min(&rotation) }
    }
}

impl TryFrom<&[f64]> for Pose {
    type Error = Error;

    fn try_from(v: &[f64]) -> Result<Self> {
        match v {
            [x, y, z, rx, ry, rz] => Ok(Self::new(DVec3::new(*x, *y, *z), DVec3::new(*rx, *ry, *rz))),
            _ => Err(Error::InvalidArgument(format!(
                "pose must have 6 elements, got {}", v.len()
            ))),
        }
    }
}

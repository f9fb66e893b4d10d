use nalgebra::{Matrix3, Vector3};

use super::Vector;

/// Standard gravity in meters per second squared
const GRAVITY: f32 = 9.81;
/// Readings with less than 10% of standard gravity are considered free fall
const FREE_FALL_GRAVITY_SQUARED: f32 = 0.01 * GRAVITY * GRAVITY;
/// Minimum magnitude of the east vector. Below this the gravity and
/// geomagnetic vectors are too close to parallel to produce a heading.
const MIN_EAST_NORM: f32 = 0.1;

/// Orientation of the device in radians
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    /// Rotation around the -z axis. 0 when facing magnetic north.
    pub azimuth: f32,
    /// Rotation around the x axis
    pub pitch: f32,
    /// Rotation around the y axis
    pub roll: f32,
}

/// Compute the rotation matrix that transforms device coordinates into world
/// coordinates (x east, y north, z up). Returns [None] if the device is in
/// free fall or the two vectors are close to parallel.
pub fn rotation_matrix(gravity: Vector, geomagnetic: Vector) -> Option<Matrix3<f32>> {
    let a = Vector3::from(gravity);
    let e = Vector3::from(geomagnetic);

    if a.norm_squared() < FREE_FALL_GRAVITY_SQUARED {
        return None;
    }

    let h = e.cross(&a);
    let norm_h = h.norm();
    if norm_h < MIN_EAST_NORM {
        return None;
    }

    let h = h / norm_h;
    let a = a / a.norm();
    let m = a.cross(&h);

    // Rows are east, north and up in device coordinates
    Some(Matrix3::new(
        h.x, h.y, h.z, //
        m.x, m.y, m.z, //
        a.x, a.y, a.z,
    ))
}

/// Extract azimuth, pitch and roll from the given rotation matrix
pub fn orientation(rotation: &Matrix3<f32>) -> Orientation {
    Orientation {
        azimuth: rotation[(0, 1)].atan2(rotation[(1, 1)]),
        pitch: (-rotation[(2, 1)]).asin(),
        roll: (-rotation[(2, 0)]).atan2(rotation[(2, 2)]),
    }
}

/// Estimates device orientation from smoothed gravity and geomagnetic
/// vectors. When the inputs are degenerate the last good rotation is reused,
/// so the estimate is only as good as the data it is given.
#[derive(Debug, Clone)]
pub struct OrientationEstimator {
    rotation: Matrix3<f32>,
}

impl Default for OrientationEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl OrientationEstimator {
    pub fn new() -> Self {
        Self {
            rotation: Matrix3::zeros(),
        }
    }

    pub fn estimate(&mut self, gravity: Vector, geomagnetic: Vector) -> Orientation {
        match rotation_matrix(gravity, geomagnetic) {
            Some(rotation) => self.rotation = rotation,
            None => log::trace!("Degenerate fusion input, reusing last rotation"),
        }
        orientation(&self.rotation)
    }
}

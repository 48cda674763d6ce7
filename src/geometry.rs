//! Geometry primitives shared across the engine
//!
//! Poses are 6-DOF (position + orientation quaternion). Only yaw matters for
//! the formation layer, so yaw helpers mirror the usual euler<->quaternion
//! conversions. Transforms map child-frame coordinates into the parent frame.

use serde::{Deserialize, Serialize};

/// 3D vector (meters, world units)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
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

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn add(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn scale(&self, k: f64) -> Vec3 {
        Vec3::new(self.x * k, self.y * k, self.z * k)
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(&self, other: &Vec3) -> f64 {
        self.sub(other).norm()
    }
}

/// Unit quaternion (w, x, y, z)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
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
    pub const IDENTITY: Quaternion = Quaternion {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Rotation of `yaw` radians about the world Z axis
    pub fn from_yaw(yaw: f64) -> Self {
        let half = yaw * 0.5;
        Self {
            w: half.cos(),
            x: 0.0,
            y: 0.0,
            z: half.sin(),
        }
    }

    /// Yaw angle (radians) extracted from the quaternion
    pub fn yaw(&self) -> f64 {
        let siny_cosp = 2.0 * (self.w * self.z + self.x * self.y);
        let cosy_cosp = 1.0 - 2.0 * (self.y * self.y + self.z * self.z);
        siny_cosp.atan2(cosy_cosp)
    }

    /// Hamilton product `self * other`
    pub fn mul(&self, other: &Quaternion) -> Quaternion {
        Quaternion {
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        }
    }

    /// Conjugate; equals the inverse for unit quaternions
    pub fn conjugate(&self) -> Quaternion {
        Quaternion {
            w: self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    /// Rotate a vector by this quaternion
    pub fn rotate(&self, v: &Vec3) -> Vec3 {
        let qv = Quaternion {
            w: 0.0,
            x: v.x,
            y: v.y,
            z: v.z,
        };
        let rotated = self.mul(&qv).mul(&self.conjugate());
        Vec3::new(rotated.x, rotated.y, rotated.z)
    }
}

/// 6-DOF pose: position + orientation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quaternion,
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn from_xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            orientation: Quaternion::IDENTITY,
        }
    }

    pub fn from_xyz_yaw(x: f64, y: f64, z: f64, yaw: f64) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            orientation: Quaternion::from_yaw(yaw),
        }
    }
}

/// Rigid transform mapping child-frame coordinates into the parent frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quaternion,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quaternion::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quaternion) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Transform whose origin sits at `pose` in the parent frame
    pub fn from_pose(pose: &Pose) -> Self {
        Self {
            translation: pose.position,
            rotation: pose.orientation,
        }
    }

    pub fn apply_point(&self, p: &Vec3) -> Vec3 {
        self.rotation.rotate(p).add(&self.translation)
    }

    pub fn apply_pose(&self, pose: &Pose) -> Pose {
        Pose {
            position: self.apply_point(&pose.position),
            orientation: self.rotation.mul(&pose.orientation),
        }
    }

    /// Composition: `(a.compose(b)).apply(x) == a.apply(b.apply(x))`
    pub fn compose(&self, other: &Transform) -> Transform {
        Transform {
            translation: self.apply_point(&other.translation),
            rotation: self.rotation.mul(&other.rotation),
        }
    }

    pub fn inverse(&self) -> Transform {
        let inv_rot = self.rotation.conjugate();
        Transform {
            translation: inv_rot.rotate(&self.translation).scale(-1.0),
            rotation: inv_rot,
        }
    }
}

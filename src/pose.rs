//! World-space poses of sources, props and glyphs.

use crate::tween::Lerp;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use specs::{Component, VecStorage};

/// Read access to an object's world transform.
///
/// The field model reads poses through this trait every time it is evaluated, so moving a
/// source never requires rebuilding any cached copy of it.
pub trait WorldTransform {
    fn world_position(&self) -> Vector3<f64>;
    fn world_orientation(&self) -> UnitQuaternion<f64>;
}

/// Position and orientation of an entity in world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Component for Pose {
    type Storage = VecStorage<Self>;
}

impl Default for Pose {
    fn default() -> Self {
        Pose {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }
}

impl Pose {
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Pose {
            position,
            orientation,
        }
    }

    /// A pose at `position` with identity orientation.
    pub fn at(position: Vector3<f64>) -> Self {
        Pose {
            position,
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Transforms a point from the local frame into world space.
    pub fn transform_point(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.position + self.orientation * local
    }

    /// Transforms a direction from the local frame into world space.
    pub fn transform_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.orientation * local
    }

    /// Expresses a world-space point in the local frame.
    pub fn inverse_transform_point(&self, world: &Vector3<f64>) -> Vector3<f64> {
        self.orientation.inverse() * (world - self.position)
    }

    /// Applies a rigid rotation about `centre` to this pose.
    pub fn rotated_about(&self, rotation: &UnitQuaternion<f64>, centre: &Vector3<f64>) -> Self {
        Pose {
            position: centre + rotation * (self.position - centre),
            orientation: rotation * self.orientation,
        }
    }
}

impl WorldTransform for Pose {
    fn world_position(&self) -> Vector3<f64> {
        self.position
    }

    fn world_orientation(&self) -> UnitQuaternion<f64> {
        self.orientation
    }
}

impl Lerp<Pose> for Pose {
    fn lerp(&self, b: &Pose, amount: f64) -> Self {
        Pose {
            position: self.position * (1.0 - amount) + b.position * amount,
            orientation: self.orientation.slerp(&b.orientation, amount),
        }
    }
}

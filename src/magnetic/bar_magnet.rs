//! Bar magnets, modelled as a pair of point poles outside a uniformly magnetised box.

use super::point_pole_pair;
use crate::error::FieldAnomaly;
use crate::pose::WorldTransform;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Length used when a magnet carries neither pole metadata nor a usable length.
const DEFAULT_LENGTH: f64 = 2.0;

/// A bar magnet aligned with its local `x` axis, north pole at `+x`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarMagnet {
    /// Pole strength, in indicative units.
    pub strength: f64,
    pub half_length: f64,
    pub half_width: f64,
    pub half_height: f64,
    /// Position of the north pole in the magnet's local frame.
    pub north_local: Option<Vector3<f64>>,
    /// Position of the south pole in the magnet's local frame.
    pub south_local: Option<Vector3<f64>>,
}

impl Default for BarMagnet {
    fn default() -> Self {
        BarMagnet::new(1.0, 2.0, 0.5, 0.5)
    }
}

impl BarMagnet {
    /// Creates a magnet with full dimensions along local `x`, `y` and `z`.
    pub fn new(strength: f64, length: f64, width: f64, height: f64) -> Self {
        let half_length = length / 2.0;
        BarMagnet {
            strength,
            half_length,
            half_width: width / 2.0,
            half_height: height / 2.0,
            north_local: Some(Vector3::new(half_length, 0.0, 0.0)),
            south_local: Some(Vector3::new(-half_length, 0.0, 0.0)),
        }
    }

    /// Local positions of the (north, south) poles.
    ///
    /// Missing pole metadata is synthesized from the magnet length.
    pub fn poles(&self) -> (Vector3<f64>, Vector3<f64>) {
        match (self.north_local, self.south_local) {
            (Some(north), Some(south)) => (north, south),
            _ => {
                let length = if self.half_length > 0.0 {
                    2.0 * self.half_length
                } else {
                    DEFAULT_LENGTH
                };
                tracing::trace!("{}", FieldAnomaly::MissingPoleMetadata { length });
                (
                    Vector3::new(length / 2.0, 0.0, 0.0),
                    Vector3::new(-length / 2.0, 0.0, 0.0),
                )
            }
        }
    }

    /// World positions of the (north, south) poles.
    pub fn world_poles<T: WorldTransform>(&self, pose: &T) -> (Vector3<f64>, Vector3<f64>) {
        let (north, south) = self.poles();
        let position = pose.world_position();
        let orientation = pose.world_orientation();
        (position + orientation * north, position + orientation * south)
    }

    /// True if a local-frame point lies inside the magnet body.
    pub fn contains_local(&self, local: &Vector3<f64>) -> bool {
        local.x.abs() < self.half_length
            && local.y.abs() < self.half_width
            && local.z.abs() < self.half_height
    }

    /// Calculates the field of the magnet at `point`.
    ///
    /// Inside the body the field is uniform along the magnet's `+x` axis with magnitude
    /// `2 * strength`. Outside, it is the field of the two poles with distances clamped.
    pub fn calculate_field<T: WorldTransform>(&self, pose: &T, point: &Vector3<f64>) -> Vector3<f64> {
        let orientation = pose.world_orientation();
        let local = orientation.inverse() * (point - pose.world_position());
        if self.contains_local(&local) {
            return orientation * Vector3::new(2.0 * self.strength, 0.0, 0.0);
        }
        let (north, south) = self.world_poles(pose);
        point_pole_pair(point, &north, &south, self.strength)
    }
}

//! Solenoids: uniform inside the winding, a pair of end poles outside.

use super::point_pole_pair;
use crate::constant::{SOLENOID_INTERIOR_GAIN, SOLENOID_POLE_GAIN};
use crate::pose::WorldTransform;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Sense of the winding current relative to the solenoid's local `+x` axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrentDirection {
    Forward,
    Reverse,
}

impl CurrentDirection {
    pub fn sign(self) -> f64 {
        match self {
            CurrentDirection::Forward => 1.0,
            CurrentDirection::Reverse => -1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            CurrentDirection::Forward => CurrentDirection::Reverse,
            CurrentDirection::Reverse => CurrentDirection::Forward,
        }
    }

    pub fn from_sign(sign: f64) -> Self {
        if sign < 0.0 {
            CurrentDirection::Reverse
        } else {
            CurrentDirection::Forward
        }
    }
}

/// A solenoid whose axis is its local `x` axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Solenoid {
    /// Number of turns in the winding, at least 1.
    turns: u32,
    /// Winding current; its sign combines with `current_direction`.
    pub current: f64,
    pub current_direction: CurrentDirection,
    pub radius: f64,
    pub length: f64,
}

impl Default for Solenoid {
    fn default() -> Self {
        Solenoid::new(10, 1.0, CurrentDirection::Forward, 0.5, 2.0)
    }
}

impl Solenoid {
    pub fn new(
        turns: u32,
        current: f64,
        current_direction: CurrentDirection,
        radius: f64,
        length: f64,
    ) -> Self {
        Solenoid {
            turns: turns.max(1),
            current,
            current_direction,
            radius,
            length,
        }
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn set_turns(&mut self, turns: u32) {
        self.turns = turns.max(1);
    }

    /// Current combined with the winding direction.
    pub fn signed_current(&self) -> f64 {
        self.current_direction.sign() * self.current
    }

    /// Strength of the equivalent end poles; positive puts north at local `+x`.
    pub fn pole_strength(&self) -> f64 {
        self.signed_current() * self.turns as f64 * SOLENOID_POLE_GAIN
    }

    /// Local position of the end from which field lines leave the solenoid.
    pub fn north_end_local(&self) -> Vector3<f64> {
        let sign = if self.signed_current() < 0.0 { -1.0 } else { 1.0 };
        Vector3::new(sign * self.length / 2.0, 0.0, 0.0)
    }

    /// True if a local-frame point lies inside the winding.
    pub fn contains_local(&self, local: &Vector3<f64>) -> bool {
        local.x.abs() < self.length / 2.0
            && (local.y * local.y + local.z * local.z).sqrt() < self.radius
    }

    /// Calculates the field of the solenoid at `point`.
    ///
    /// Inside: uniform along local `x`, magnitude `|current| * turns * 0.1`, signed by
    /// `current_direction * current`. Outside: the two ends act as point poles of strength
    /// `current_direction * current * turns * 0.02`.
    pub fn calculate_field<T: WorldTransform>(&self, pose: &T, point: &Vector3<f64>) -> Vector3<f64> {
        let orientation = pose.world_orientation();
        let position = pose.world_position();
        let local = orientation.inverse() * (point - position);
        if self.contains_local(&local) {
            let magnitude = self.signed_current() * self.turns as f64 * SOLENOID_INTERIOR_GAIN;
            return orientation * Vector3::new(magnitude, 0.0, 0.0);
        }
        let half = Vector3::new(self.length / 2.0, 0.0, 0.0);
        let north = position + orientation * half;
        let south = position - orientation * half;
        point_pole_pair(point, &north, &south, self.pole_strength())
    }
}

//! Electromagnetic induction in a coil, read out on a galvanometer.
//!
//! A magnet is dragged vertically above a coil. While it moves near the coil an EMF is induced
//! that opposes the change in flux: descending gives a positive signal. The signal is smoothed
//! into a needle deflection, and a ring of arrows around the coil shows the direction of the
//! induced current.

use crate::configuration::EmLabConfiguration;
use crate::drag::DragState;
use crate::maths::{clamp, orient_x_along};
use crate::pose::Pose;
use crate::tween::{NeedleShake, Tween};
use nalgebra::{UnitQuaternion, Vector3};
use serde::Deserialize;
use specs::prelude::*;

#[derive(Deserialize, Clone, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct InductionOptions {
    pub coil_y: f64,
    pub coil_length: f64,
    pub coil_radius: f64,
    pub turns: u32,
    /// Distance beyond the coil length over which the magnet still induces.
    pub proximity_margin: f64,
    pub magnet_start_y: f64,
    /// Radians of needle deflection per unit signal.
    pub deflection_gain: f64,
    pub max_deflection: f64,
    /// Weight of the newest induced value in the smoothed signal.
    pub smoothing: f64,
    pub idle_velocity_decay: f64,
    pub idle_signal_decay: f64,
    pub ring_arrows: usize,
}

impl Default for InductionOptions {
    fn default() -> Self {
        InductionOptions {
            coil_y: 0.5,
            coil_length: 2.0,
            coil_radius: 0.8,
            turns: 10,
            proximity_margin: 0.5,
            magnet_start_y: 5.5,
            deflection_gain: 15.0,
            max_deflection: crate::constant::PI / 5.0,
            smoothing: 0.3,
            idle_velocity_decay: 0.85,
            idle_signal_decay: 0.92,
            ring_arrows: 8,
        }
    }
}

/// The coil. Its pose is the coil centre.
#[derive(Clone, Debug)]
pub struct InductionCoil {
    pub turns: u32,
    pub length: f64,
    pub radius: f64,
}

impl Component for InductionCoil {
    type Storage = HashMapStorage<Self>;
}

/// The magnet moved through the coil.
#[derive(Clone, Debug)]
pub struct InductionMagnet {
    /// Height at the previous tick.
    pub last_y: f64,
}

impl Component for InductionMagnet {
    type Storage = HashMapStorage<Self>;
}

/// Sense of the induced current, viewed from above.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RingDirection {
    Clockwise,
    CounterClockwise,
}

/// Arrows circling the coil in the sense of the induced current.
#[derive(Clone, Debug)]
pub struct OpposingRing {
    pub direction: RingDirection,
    pub opacity: f64,
    pub arrows: Vec<(Vector3<f64>, UnitQuaternion<f64>)>,
}

impl Default for OpposingRing {
    fn default() -> Self {
        OpposingRing {
            direction: RingDirection::CounterClockwise,
            opacity: 0.0,
            arrows: Vec::new(),
        }
    }
}

impl OpposingRing {
    /// Lays out `count` arrows on a horizontal circle around `centre`.
    pub fn update(&mut self, centre: &Vector3<f64>, radius: f64, count: usize, velocity: f64, induced: f64) {
        if velocity < 0.0 {
            self.direction = RingDirection::CounterClockwise;
        } else if velocity > 0.0 {
            self.direction = RingDirection::Clockwise;
        }
        self.opacity = (3.0 * induced.abs()).min(0.9);
        let sense = match self.direction {
            RingDirection::CounterClockwise => 1.0,
            RingDirection::Clockwise => -1.0,
        };
        self.arrows = (0..count)
            .map(|i| {
                let theta = 2.0 * crate::constant::PI * i as f64 / count as f64;
                let radial = Vector3::new(theta.cos(), 0.0, -theta.sin());
                let tangent = Vector3::y().cross(&radial) * sense;
                (centre + radial * radius, orient_x_along(&tangent))
            })
            .collect();
    }
}

/// Galvanometer state, attached to the coil.
#[derive(Clone, Debug, Default)]
pub struct Galvanometer {
    /// Magnet height change over the last tick, in world units.
    pub velocity: f64,
    pub proximity: f64,
    pub induced: f64,
    /// Smoothed induced signal.
    pub signal: f64,
    /// Needle deflection, in radians.
    pub deflection: f64,
    pub ring: OpposingRing,
}

impl Component for Galvanometer {
    type Storage = HashMapStorage<Self>;
}

/// How strongly a magnet at height `y` couples to the coil, in `[0, 1]`.
///
/// `None` when the magnet is out of range.
pub fn proximity_factor(y: f64, coil_y: f64, coil_length: f64, margin: f64) -> Option<f64> {
    let range = coil_length + margin;
    let distance = (y - coil_y).abs();
    if distance >= range {
        return None;
    }
    Some(1.0 - clamp(distance / range, 0.0, 1.0))
}

/// Induced EMF for a magnet moving at `velocity`. Negative velocity gives a positive value.
pub fn induced_strength(velocity: f64, proximity: f64, turns: u32) -> f64 {
    -velocity * proximity * turns as f64 * 0.5
}

pub struct InductionSystem;

impl<'a> System<'a> for InductionSystem {
    type SystemData = (
        Entities<'a>,
        Read<'a, DragState>,
        ReadStorage<'a, Pose>,
        WriteStorage<'a, InductionMagnet>,
        ReadStorage<'a, InductionCoil>,
        WriteStorage<'a, Galvanometer>,
        ReadStorage<'a, Tween<NeedleShake>>,
        ReadExpect<'a, EmLabConfiguration>,
        Read<'a, LazyUpdate>,
    );

    fn run(
        &mut self,
        (entities, drag, poses, mut magnets, coils, mut galvanometers, shakes, config, updater): Self::SystemData,
    ) {
        let options = &config.induction;
        for (magnet_entity, magnet_pose, magnet) in (&entities, &poses, &mut magnets).join() {
            let y = magnet_pose.position.y;
            let dragged = drag.moved_this_tick() && drag.is_dragging(magnet_entity);

            for (coil_entity, coil_pose, coil, galvanometer) in
                (&entities, &poses, &coils, &mut galvanometers).join()
            {
                if dragged {
                    let velocity = y - magnet.last_y;
                    let proximity = proximity_factor(
                        y,
                        coil_pose.position.y,
                        coil.length,
                        options.proximity_margin,
                    )
                    .unwrap_or(0.0);
                    galvanometer.velocity = velocity;
                    galvanometer.proximity = proximity;
                    galvanometer.induced = induced_strength(velocity, proximity, coil.turns);
                    galvanometer.signal = (1.0 - options.smoothing) * galvanometer.signal
                        + options.smoothing * galvanometer.induced;
                } else {
                    galvanometer.velocity *= options.idle_velocity_decay;
                    galvanometer.induced = induced_strength(
                        galvanometer.velocity,
                        galvanometer.proximity,
                        coil.turns,
                    );
                    galvanometer.signal *= options.idle_signal_decay;
                }

                let raw = options.deflection_gain * galvanometer.signal;
                galvanometer.deflection =
                    clamp(raw, -options.max_deflection, options.max_deflection);
                if raw.abs() > options.max_deflection && !shakes.contains(coil_entity) {
                    updater.insert(coil_entity, NeedleShake::default());
                    updater.insert(coil_entity, NeedleShake::shake());
                }

                galvanometer.ring.update(
                    &coil_pose.position,
                    coil.radius,
                    options.ring_arrows,
                    galvanometer.velocity,
                    galvanometer.induced,
                );
            }
            magnet.last_y = y;
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_proximity_factor() {
        assert_eq!(proximity_factor(3.0, 0.5, 2.0, 0.5), None);
        assert_eq!(proximity_factor(-2.0, 0.5, 2.0, 0.5), None);
        assert_approx_eq!(proximity_factor(0.5, 0.5, 2.0, 0.5).unwrap_or(-1.0), 1.0);
        assert_approx_eq!(proximity_factor(1.0, 0.5, 2.0, 0.5).unwrap_or(-1.0), 0.8);
    }

    #[test]
    fn test_descent_induces_positive_signal() {
        assert!(induced_strength(-0.2, 0.5, 10) > 0.0);
        assert!(induced_strength(0.2, 0.5, 10) < 0.0);
        assert_eq!(induced_strength(0.0, 0.5, 10), 0.0);
    }

    #[test]
    fn test_ring_direction_follows_motion() {
        let mut ring = OpposingRing::default();
        ring.update(&Vector3::zeros(), 1.0, 4, -0.1, 0.5);
        assert_eq!(ring.direction, RingDirection::CounterClockwise);
        assert_approx_eq!(ring.opacity, 0.9);
        // at +x, counterclockwise seen from above points towards -z
        let (position, orientation) = ring.arrows[0];
        assert_approx_eq!(position.x, 1.0);
        let facing = orientation * Vector3::x();
        assert_approx_eq!(facing.z, -1.0, 1e-9);

        ring.update(&Vector3::zeros(), 1.0, 4, 0.0, 0.0);
        assert_eq!(ring.direction, RingDirection::CounterClockwise);
        ring.update(&Vector3::zeros(), 1.0, 4, 0.1, 0.1);
        assert_eq!(ring.direction, RingDirection::Clockwise);
        assert_approx_eq!(ring.opacity, 0.3, 1e-12);
    }
}

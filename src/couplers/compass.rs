//! Compass needles that turn towards the local field.
//!
//! A needle rotates about the vertical axis. Its target heading is the direction of the
//! horizontal field, measured from +z towards +x. Each tick the needle closes a fixed share of
//! the wrapped angular error, so it never takes the long way round.

use crate::configuration::EmLabConfiguration;
use crate::destructor::ExperimentOwned;
use crate::integrator::Timestep;
use crate::magnetic::MagneticFieldSampler;
use crate::maths::wrap_angle;
use crate::pose::Pose;
use nalgebra::Vector3;
use serde::Deserialize;
use specs::prelude::*;

#[derive(Deserialize, Clone, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct CompassOptions {
    /// Share of the angular error closed per second.
    pub turn_rate: f64,
    /// Height of the needles above the ground plane.
    pub height: f64,
    /// Distance of the default needles from the origin.
    pub ring_radius: f64,
}

impl Default for CompassOptions {
    fn default() -> Self {
        CompassOptions {
            turn_rate: 5.0,
            height: 0.15,
            ring_radius: 2.0,
        }
    }
}

#[derive(Clone, Component, Debug, Default)]
#[storage(HashMapStorage)]
pub struct Compass {
    /// Needle heading, in radians.
    pub angle: f64,
    /// Heading of the field at the needle.
    pub target_angle: f64,
}

/// Heading of the horizontal part of `field`.
pub fn target_angle(field: &Vector3<f64>) -> f64 {
    field.x.atan2(field.z)
}

/// Turns a needle at `angle` towards `target` for one tick.
pub fn step_needle(angle: f64, target: f64, dt: f64, turn_rate: f64) -> f64 {
    let error = wrap_angle(target - angle);
    wrap_angle(angle + error * (turn_rate * dt).min(1.0))
}

pub struct CompassSystem;

impl<'a> System<'a> for CompassSystem {
    type SystemData = (
        ReadStorage<'a, MagneticFieldSampler>,
        WriteStorage<'a, Compass>,
        ReadExpect<'a, Timestep>,
        ReadExpect<'a, EmLabConfiguration>,
    );

    fn run(&mut self, (samplers, mut compasses, timestep, config): Self::SystemData) {
        for (sampler, compass) in (&samplers, &mut compasses).join() {
            if sampler.field.x != 0.0 || sampler.field.z != 0.0 {
                compass.target_angle = target_angle(&sampler.field);
            }
            compass.angle = step_needle(
                compass.angle,
                compass.target_angle,
                timestep.delta,
                config.compass.turn_rate,
            );
        }
    }
}

/// Creates one compass per position.
pub fn create(world: &mut World, positions: &[Vector3<f64>]) -> Vec<Entity> {
    positions
        .iter()
        .map(|position| {
            world
                .create_entity()
                .with(Pose::at(*position))
                .with(Compass::default())
                .with(MagneticFieldSampler::default())
                .with(ExperimentOwned)
                .build()
        })
        .collect()
}

/// Four needles around the origin, one on each horizontal axis.
pub fn default_positions(options: &CompassOptions) -> Vec<Vector3<f64>> {
    let r = options.ring_radius;
    let h = options.height;
    vec![
        Vector3::new(r, h, 0.0),
        Vector3::new(-r, h, 0.0),
        Vector3::new(0.0, h, r),
        Vector3::new(0.0, h, -r),
    ]
}

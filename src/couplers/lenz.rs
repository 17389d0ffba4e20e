//! Lenz's law braking: a magnet falling through a conducting tube.
//!
//! Two spheres are dropped side by side. The magnetic one passes through the tube, where eddy
//! currents damp its velocity and cap its speed at a terminal value. The control sphere falls
//! freely beside it. Velocities are in world units per tick.

use crate::configuration::EmLabConfiguration;
use crate::integrator::Timestep;
use crate::pose::Pose;
use serde::Deserialize;
use specs::prelude::*;

#[derive(Deserialize, Clone, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct LenzOptions {
    pub gravity: f64,
    pub tube_damping: f64,
    pub tube_centre_y: f64,
    pub tube_half_length: f64,
    /// Height at which a sphere comes to rest.
    pub ground_y: f64,
    pub drop_height: f64,
    /// Seconds a landed sphere rests before it may be dropped again.
    pub hold_off: f64,
    /// Horizontal separation of the control sphere from the tube axis.
    pub control_offset: f64,
}

impl Default for LenzOptions {
    fn default() -> Self {
        LenzOptions {
            gravity: 0.5,
            tube_damping: 0.85,
            tube_centre_y: 2.5,
            tube_half_length: 2.5,
            ground_y: 0.15,
            drop_height: 5.5,
            hold_off: 0.5,
            control_offset: 1.5,
        }
    }
}

/// A conducting tube aligned with the vertical axis.
#[derive(Clone, Debug)]
pub struct LenzTube {
    pub centre_y: f64,
    pub half_length: f64,
    /// Per-tick velocity retention inside the tube, in `[0, 1)`.
    pub damping: f64,
}

impl Component for LenzTube {
    type Storage = HashMapStorage<Self>;
}

impl LenzTube {
    pub fn contains(&self, y: f64) -> bool {
        (y - self.centre_y).abs() < self.half_length
    }

    /// Largest speed a magnet keeps inside the tube.
    pub fn terminal_speed(&self) -> f64 {
        0.25 * (1.0 - self.damping)
    }
}

#[derive(Clone, Component, Debug, Default)]
#[storage(HashMapStorage)]
pub struct FallingBody {
    /// Vertical velocity, world units per tick.
    pub velocity: f64,
    pub magnetic: bool,
    pub dropping: bool,
    /// Seconds spent at rest since landing.
    pub resting_for: Option<f64>,
}

impl FallingBody {
    pub fn new(magnetic: bool) -> Self {
        FallingBody {
            magnetic,
            ..Default::default()
        }
    }

    /// Advances the body by one tick, updating its height `y`.
    pub fn step(&mut self, y: &mut f64, tube: Option<&LenzTube>, options: &LenzOptions, dt: f64) {
        if !self.dropping {
            return;
        }
        if let Some(rested) = self.resting_for.as_mut() {
            *rested += dt;
            if *rested >= options.hold_off {
                self.dropping = false;
                self.resting_for = None;
            }
            return;
        }

        self.velocity -= options.gravity * dt;
        let next_y = *y + self.velocity;
        if let Some(tube) =
            tube.filter(|tube| self.magnetic && (tube.contains(*y) || tube.contains(next_y)))
        {
            let terminal = tube.terminal_speed();
            if self.velocity.abs() > terminal {
                self.velocity = self.velocity.signum()
                    * (tube.damping * self.velocity.abs()).min(terminal);
            }
        }
        *y += self.velocity;

        if *y <= options.ground_y {
            *y = options.ground_y;
            self.velocity = 0.0;
            self.resting_for = Some(0.0);
        }
    }
}

pub struct LenzBrakingSystem;

impl<'a> System<'a> for LenzBrakingSystem {
    type SystemData = (
        ReadStorage<'a, LenzTube>,
        WriteStorage<'a, FallingBody>,
        WriteStorage<'a, Pose>,
        ReadExpect<'a, Timestep>,
        ReadExpect<'a, EmLabConfiguration>,
    );

    fn run(&mut self, (tubes, mut bodies, mut poses, timestep, config): Self::SystemData) {
        let tube = (&tubes).join().next();
        for (body, pose) in (&mut bodies, &mut poses).join() {
            body.step(&mut pose.position.y, tube, &config.lenz, timestep.delta);
        }
    }
}

/// Lifts every sphere back to the drop height and lets go.
pub fn release(world: &mut World) {
    let drop_height = world.read_resource::<EmLabConfiguration>().lenz.drop_height;
    let (mut bodies, mut poses): (WriteStorage<FallingBody>, WriteStorage<Pose>) =
        world.system_data();
    for (body, pose) in (&mut bodies, &mut poses).join() {
        pose.position.y = drop_height;
        body.velocity = 0.0;
        body.resting_for = None;
        body.dropping = true;
    }
}

//! Field-line artifacts: the streamline pool, flow arrows moving along pooled lines, and
//! the static grid of direction arrows.
//!
//! Flow arrows refer to their line through a [LineId]. Every rebuild replaces the whole pool
//! and bumps its generation, so ids handed out before the rebuild stop resolving. An arrow
//! whose id no longer resolves is destroyed on the next advance.

pub mod grid;
pub mod theme;

use crate::configuration::EmLabConfiguration;
use crate::constant::FLOW_STEP;
use crate::error::FieldAnomaly;
use crate::host::{SceneCommands, SceneNode};
use crate::maths::orient_x_along;
use crate::tracer::Streamline;
use nalgebra::{UnitQuaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use specs::prelude::*;
use theme::{ArrowMaterial, ArrowStyle};

/// Identifies a streamline within one generation of the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LineId {
    pub generation: u64,
    pub index: usize,
}

/// The streamlines of the most recent rebuild.
#[derive(Default)]
pub struct StreamlinePool {
    generation: u64,
    lines: Vec<Streamline>,
}

impl StreamlinePool {
    /// Replaces every line. Returns the new generation.
    pub fn replace(&mut self, lines: Vec<Streamline>) -> u64 {
        self.generation += 1;
        self.lines = lines;
        self.generation
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    pub fn get(&self, id: LineId) -> Option<&Streamline> {
        if id.generation != self.generation {
            return None;
        }
        self.lines.get(id.index)
    }

    pub fn ids(&self) -> Vec<LineId> {
        (0..self.lines.len())
            .map(|index| LineId {
                generation: self.generation,
                index,
            })
            .collect()
    }

    pub fn lines(&self) -> &[Streamline] {
        &self.lines
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowOptions {
    /// Arrows spawned on each streamline.
    pub arrows_per_line: usize,
    /// Multiplier on the per-tick advance of every arrow.
    pub speed: f64,
    /// Seed for the random phase of each line's arrows.
    pub rng_seed: u64,
}

impl Default for FlowOptions {
    fn default() -> Self {
        FlowOptions {
            arrows_per_line: 3,
            speed: 1.0,
            rng_seed: 0,
        }
    }
}

/// Random source for arrow phases.
pub struct FlowRng(pub StdRng);
impl Default for FlowRng {
    fn default() -> Self {
        FlowRng(StdRng::seed_from_u64(0))
    }
}

/// A glyph moving along a pooled streamline.
#[derive(Clone, Debug)]
pub struct FlowArrow {
    pub line: LineId,
    /// Normalized position along the line, in `[0, 1)`.
    pub t: f64,
    /// Random offset shared by all arrows of one line.
    pub phase: f64,
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Component for FlowArrow {
    type Storage = VecStorage<Self>;
}

impl FlowArrow {
    pub fn new(line: LineId, t: f64, phase: f64) -> Self {
        FlowArrow {
            line,
            t,
            phase,
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Moves the glyph onto `line` at its current `t`, facing along the local segment.
    pub fn place(&mut self, line: &Streamline) {
        let (position, tangent) = line.sample(self.t);
        self.position = position;
        self.orientation = orient_x_along(&tangent);
    }

    /// Advances `t` by one tick at the given speed multiplier, wrapping at 1.
    pub fn advance(&mut self, speed: f64) {
        self.t = (self.t + FLOW_STEP * speed).rem_euclid(1.0);
    }
}

/// Spawns `count` evenly spaced arrows on a line, offset by one random phase.
pub fn add_arrows_along(
    entities: &Entities<'_>,
    arrows: &mut WriteStorage<'_, FlowArrow>,
    styles: &mut WriteStorage<'_, ArrowStyle>,
    line_id: LineId,
    line: &Streamline,
    count: usize,
    rng: &mut StdRng,
    material: ArrowMaterial,
) -> Vec<Entity> {
    let phase: f64 = rng.gen_range(0.0..1.0);
    (0..count)
        .map(|i| {
            let t = (i as f64 / count as f64 + phase).rem_euclid(1.0);
            let mut arrow = FlowArrow::new(line_id, t, phase);
            arrow.place(line);
            entities
                .build_entity()
                .with(arrow, arrows)
                .with(ArrowStyle { material }, styles)
                .build()
        })
        .collect()
}

/// Moves every flow arrow along its line, and destroys arrows whose line is gone.
pub struct AdvanceFlowArrowsSystem;

impl<'a> System<'a> for AdvanceFlowArrowsSystem {
    type SystemData = (
        Entities<'a>,
        Read<'a, StreamlinePool>,
        ReadExpect<'a, EmLabConfiguration>,
        WriteStorage<'a, FlowArrow>,
        Write<'a, SceneCommands>,
    );

    fn run(&mut self, (entities, pool, config, mut arrows, mut scene): Self::SystemData) {
        let mut orphans = Vec::new();
        for (entity, arrow) in (&entities, &mut arrows).join() {
            match pool.get(arrow.line) {
                Some(line) => {
                    arrow.advance(config.flow.speed);
                    arrow.place(line);
                }
                None => orphans.push(entity),
            }
        }
        for entity in orphans {
            tracing::trace!("{}", FieldAnomaly::OrphanGlyph { entity });
            arrows.remove(entity);
            if entities.delete(entity).is_ok() {
                scene.remove(SceneNode::FlowArrow(entity));
            }
        }
    }
}

pub fn register_components(world: &mut World) {
    world.register::<FlowArrow>();
    world.register::<ArrowStyle>();
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::maths::distance_to_segment;
    use crate::tracer::Termination;
    use assert_approx_eq::assert_approx_eq;

    fn square_line(origin: Entity) -> Streamline {
        Streamline {
            points: vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
                Vector3::new(0.0, 0.0, 0.0),
            ],
            source: origin,
            termination: Termination::Closed,
        }
    }

    fn test_world() -> World {
        let mut world = World::new();
        crate::simulation::register_components(&mut world);
        crate::simulation::register_resources(&mut world);
        world
    }

    fn spawn_arrows(world: &mut World, count: usize) -> Vec<Entity> {
        let origin = world.create_entity().build();
        let line_id = {
            let mut pool = world.write_resource::<StreamlinePool>();
            pool.replace(vec![square_line(origin)]);
            pool.ids()[0]
        };
        let pool = world.read_resource::<StreamlinePool>();
        let (entities, mut arrows, mut styles, mut rng): (
            Entities,
            WriteStorage<FlowArrow>,
            WriteStorage<ArrowStyle>,
            Write<FlowRng>,
        ) = world.system_data();
        let line = pool.get(line_id).expect("line just inserted");
        add_arrows_along(
            &entities,
            &mut arrows,
            &mut styles,
            line_id,
            line,
            count,
            &mut rng.0,
            ArrowMaterial::FlowDark,
        )
    }

    #[test]
    fn test_pool_generation_invalidates_ids() {
        let mut world = test_world();
        let origin = world.create_entity().build();
        let mut pool = StreamlinePool::default();
        pool.replace(vec![square_line(origin)]);
        let id = pool.ids()[0];
        assert!(pool.get(id).is_some());
        pool.replace(vec![square_line(origin)]);
        assert!(pool.get(id).is_none());
        assert!(pool.get(pool.ids()[0]).is_some());
    }

    #[test]
    fn test_arrows_evenly_spaced() {
        let mut world = test_world();
        let spawned = spawn_arrows(&mut world, 4);
        world.maintain();
        let arrows = world.read_storage::<FlowArrow>();
        let mut ts: Vec<f64> = spawned
            .iter()
            .map(|e| arrows.get(*e).expect("arrow").t)
            .collect();
        ts.sort_by(|a, b| a.partial_cmp(b).expect("finite"));
        for pair in ts.windows(2) {
            assert_approx_eq!(pair[1] - pair[0], 0.25, 1e-12);
        }
    }

    #[test]
    fn test_arrows_stay_on_line() {
        let mut world = test_world();
        spawn_arrows(&mut world, 3);
        world.maintain();
        let origin = world.create_entity().build();
        let line = square_line(origin);

        for _ in 0..500 {
            AdvanceFlowArrowsSystem.run_now(&world);
            world.maintain();
            let arrows = world.read_storage::<FlowArrow>();
            for arrow in arrows.join() {
                assert!(arrow.t >= 0.0 && arrow.t < 1.0);
                let nearest = line
                    .points
                    .windows(2)
                    .map(|w| distance_to_segment(&arrow.position, &w[0], &w[1]))
                    .fold(f64::INFINITY, f64::min);
                assert!(nearest < 1e-9, "arrow left its line by {}", nearest);
            }
        }
    }

    #[test]
    fn test_arrows_wrap_after_full_cycle() {
        let mut arrow = FlowArrow::new(
            LineId {
                generation: 1,
                index: 0,
            },
            0.3,
            0.0,
        );
        for _ in 0..200 {
            arrow.advance(1.0);
        }
        assert_approx_eq!(arrow.t, 0.3, 1e-9);
    }

    #[test]
    fn test_orphan_arrows_destroyed() {
        let mut world = test_world();
        let spawned = spawn_arrows(&mut world, 2);
        world.maintain();
        world.write_resource::<StreamlinePool>().clear();

        AdvanceFlowArrowsSystem.run_now(&world);
        world.maintain();

        for entity in spawned {
            assert!(!world.is_alive(entity));
        }
        assert_eq!(world.read_resource::<SceneCommands>().len(), 2);
    }
}

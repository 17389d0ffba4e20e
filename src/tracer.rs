//! Traces closed field lines of the source field.
//!
//! Lines are seeded on a small disk just outside each source's north end and integrated
//! along the unit field direction with a fixed step. Tracing is the only costly step of a
//! rebuild and runs only when the source set or its parameters change.

use crate::constant::{DEGENERATE_FIELD, SOLENOID_MIN_TRACE_CURRENT};
use crate::error::FieldAnomaly;
use crate::magnetic::calculate_field;
use crate::maths::lerp_vector;
use crate::pose::Pose;
use crate::source::{Source, SourceView};
use nalgebra::Vector3;
use serde::Deserialize;
use specs::Entity;

/// Steps that must pass before a line may close on its seed.
const MIN_STEPS_BEFORE_CLOSURE: usize = 10;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TracerOptions {
    /// Number of lines seeded per source.
    pub num_lines: usize,
    pub max_steps: usize,
    pub step_size: f64,
    /// Radius of the seed disk for bar magnets, in world units.
    pub seed_radius: f64,
    /// Distance of the seed disk beyond the north pole.
    pub pole_offset: f64,
    /// Lines further than this from their seed source are abandoned.
    pub far_distance: f64,
    /// Lines with fewer points are discarded.
    pub min_points: usize,
}

impl Default for TracerOptions {
    fn default() -> Self {
        TracerOptions {
            num_lines: 12,
            max_steps: 200,
            step_size: 0.1,
            seed_radius: 0.15,
            pole_offset: 0.05,
            far_distance: 20.0,
            min_points: 5,
        }
    }
}

/// Why the integration of a line stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The line returned within two steps of its seed; the seed was appended.
    Closed,
    /// The field vanished.
    Degenerate,
    /// The step budget ran out.
    MaxSteps,
    /// The line left the neighbourhood of its source.
    TooFar,
}

/// A polyline following the field direction.
#[derive(Clone, Debug, PartialEq)]
pub struct Streamline {
    pub points: Vec<Vector3<f64>>,
    /// The source whose seed disk started this line.
    pub source: Entity,
    pub termination: Termination,
}

impl Streamline {
    pub fn is_closed(&self) -> bool {
        self.termination == Termination::Closed
    }

    /// Arc length surrogate: the number of points.
    pub fn parametric_length(&self) -> usize {
        self.points.len()
    }

    /// Position and segment tangent at fraction `t` in `[0, 1)` along the line.
    pub fn sample(&self, t: f64) -> (Vector3<f64>, Vector3<f64>) {
        let segments = self.points.len() - 1;
        let scaled = t.max(0.0) * segments as f64;
        let index = (scaled.floor() as usize).min(segments - 1);
        let fraction = scaled - index as f64;
        let start = &self.points[index];
        let end = &self.points[index + 1];
        (lerp_vector(start, end, fraction), end - start)
    }
}

/// Seed points for one source, in world space.
pub fn seed_points(pose: &Pose, source: &Source, options: &TracerOptions) -> Vec<Vector3<f64>> {
    let (centre, radius) = match source {
        Source::BarMagnet(magnet) => {
            let (north, _) = magnet.poles();
            let outward = if north.x < 0.0 { -1.0 } else { 1.0 };
            (
                north + Vector3::new(outward * options.pole_offset, 0.0, 0.0),
                options.seed_radius,
            )
        }
        Source::Solenoid(solenoid) => {
            if solenoid.current.abs() < SOLENOID_MIN_TRACE_CURRENT {
                return Vec::new();
            }
            let north = solenoid.north_end_local();
            (
                north + Vector3::new(north.x.signum() * options.pole_offset, 0.0, 0.0),
                0.5 * solenoid.radius,
            )
        }
        Source::Transformer(_) => return Vec::new(),
    };

    (0..options.num_lines)
        .map(|i| {
            let angle = 2.0 * crate::constant::PI * i as f64 / options.num_lines as f64;
            let local = centre + Vector3::new(0.0, radius * angle.cos(), radius * angle.sin());
            pose.transform_point(&local)
        })
        .collect()
}

/// Integrates one line from `seed` through the field of `sources`.
///
/// Returns `None` if the line has fewer than `min_points` points. When several stopping
/// conditions hold on the same step, closure takes precedence over the step budget, which
/// takes precedence over the distance cap.
pub fn trace_streamline(
    seed: Vector3<f64>,
    origin: Entity,
    origin_position: &Vector3<f64>,
    sources: &[SourceView],
    options: &TracerOptions,
) -> Option<Streamline> {
    let mut points = vec![seed];
    let mut current = seed;
    let mut termination = Termination::MaxSteps;

    for step in 1..=options.max_steps {
        let field = calculate_field(&current, sources.iter().map(|v| (v.pose, v.source)));
        let magnitude = field.norm();
        if magnitude < DEGENERATE_FIELD {
            tracing::trace!("{}", FieldAnomaly::DegenerateFieldPoint { point: current });
            termination = Termination::Degenerate;
            break;
        }
        current += field * (options.step_size / magnitude);
        points.push(current);

        if step > MIN_STEPS_BEFORE_CLOSURE && (current - seed).norm() < 2.0 * options.step_size {
            points.push(seed);
            termination = Termination::Closed;
            break;
        }
        if step == options.max_steps {
            termination = Termination::MaxSteps;
            break;
        }
        if (current - origin_position).norm() > options.far_distance {
            termination = Termination::TooFar;
            break;
        }
    }

    if points.len() < options.min_points.max(2) {
        return None;
    }
    Some(Streamline {
        points,
        source: origin,
        termination,
    })
}

/// Traces the lines seeded by every source in `sources`.
pub fn trace_field_lines(sources: &[SourceView], options: &TracerOptions) -> Vec<Streamline> {
    let mut lines = Vec::new();
    for view in sources {
        for seed in seed_points(view.pose, view.source, options) {
            if let Some(line) =
                trace_streamline(seed, view.entity, &view.pose.position, sources, options)
            {
                lines.push(line);
            }
        }
    }
    lines
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::magnetic::bar_magnet::BarMagnet;
    use crate::magnetic::solenoid::{CurrentDirection, Solenoid};
    use crate::source::{spawn_source, SourceRegistry};
    use specs::{Builder, World, WorldExt};

    fn world_with(sources: Vec<(Pose, Source)>) -> World {
        let mut world = World::new();
        crate::simulation::register_components(&mut world);
        crate::simulation::register_resources(&mut world);
        for (pose, source) in sources {
            spawn_source(&mut world, pose, source);
        }
        world
    }

    fn trace(world: &World, options: &TracerOptions) -> Vec<Streamline> {
        let poses = world.read_storage::<Pose>();
        let sources = world.read_storage::<Source>();
        let registry = world.read_resource::<SourceRegistry>();
        let views = registry.views(&poses, &sources);
        trace_field_lines(&views, options)
    }

    #[test]
    fn test_single_magnet_lines_close() {
        let world = world_with(vec![(Pose::default(), Source::BarMagnet(BarMagnet::default()))]);
        let lines = trace(&world, &TracerOptions::default());
        let closed = lines.iter().filter(|line| line.is_closed()).count();
        assert!(closed >= 10, "only {} of {} lines closed", closed, lines.len());
        for line in lines.iter().filter(|line| line.is_closed()) {
            assert_eq!(line.points.first(), line.points.last());
            assert!(line.parametric_length() >= 5);
        }
    }

    #[test]
    fn test_seed_disk_sits_outside_north_pole() {
        let magnet = Source::BarMagnet(BarMagnet::default());
        let options = TracerOptions::default();
        let seeds = seed_points(&Pose::default(), &magnet, &options);
        assert_eq!(seeds.len(), 12);
        for seed in &seeds {
            assert!((seed.x - 1.05).abs() < 1e-12);
            assert!(((seed.y * seed.y + seed.z * seed.z).sqrt() - 0.15).abs() < 1e-12);
        }
    }

    #[test]
    fn test_weak_solenoid_is_not_seeded() {
        let weak = Source::Solenoid(Solenoid::new(10, 0.05, CurrentDirection::Forward, 0.5, 2.0));
        assert!(seed_points(&Pose::default(), &weak, &TracerOptions::default()).is_empty());

        let reversed = Source::Solenoid(Solenoid::new(10, 2.0, CurrentDirection::Reverse, 0.5, 2.0));
        let seeds = seed_points(&Pose::default(), &reversed, &TracerOptions::default());
        assert!(seeds.iter().all(|seed| seed.x < -1.0));
    }

    #[test]
    fn test_far_cap_is_measured_from_source() {
        let far_away = Pose::at(Vector3::new(100.0, 0.0, 0.0));
        let world = world_with(vec![(far_away, Source::BarMagnet(BarMagnet::default()))]);
        let lines = trace(&world, &TracerOptions::default());
        assert!(lines.iter().filter(|line| line.is_closed()).count() >= 10);
    }

    #[test]
    fn test_closure_wins_over_step_budget() {
        let world = world_with(vec![(Pose::default(), Source::BarMagnet(BarMagnet::default()))]);
        let full = trace(&world, &TracerOptions::default());
        let closing_steps = full[0].points.len() - 2;

        let options = TracerOptions {
            max_steps: closing_steps,
            ..TracerOptions::default()
        };
        let capped = trace(&world, &options);
        assert_eq!(capped[0].termination, Termination::Closed);
    }

    #[test]
    fn test_step_budget_and_minimum_length() {
        let world = world_with(vec![(Pose::default(), Source::BarMagnet(BarMagnet::default()))]);
        let options = TracerOptions {
            max_steps: 6,
            ..TracerOptions::default()
        };
        let lines = trace(&world, &options);
        assert_eq!(lines.len(), 12);
        assert!(lines.iter().all(|line| line.termination == Termination::MaxSteps));
        assert!(lines.iter().all(|line| line.points.len() == 7));

        let options = TracerOptions {
            max_steps: 3,
            ..TracerOptions::default()
        };
        assert!(trace(&world, &options).is_empty());
    }

    #[test]
    fn test_no_sources_no_lines() {
        let world = world_with(Vec::new());
        assert!(trace(&world, &TracerOptions::default()).is_empty());
    }

    #[test]
    fn test_sample_interpolates_between_points() {
        let line = Streamline {
            points: vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 0.0),
            ],
            source: World::new().create_entity().build(),
            termination: Termination::MaxSteps,
        };
        let (position, tangent) = line.sample(0.25);
        assert!((position - Vector3::new(0.5, 0.0, 0.0)).norm() < 1e-12);
        assert!((tangent - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
        let (position, tangent) = line.sample(0.75);
        assert!((position - Vector3::new(1.0, 0.5, 0.0)).norm() < 1e-12);
        assert!((tangent - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
    }
}

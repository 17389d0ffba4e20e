//! Animated flux loops circulating through a transformer core.

use crate::configuration::EmLabConfiguration;
use crate::integrator::Clock;
use crate::magnetic::transformer::Transformer;
use crate::pose::Pose;
use crate::source::Source;
use nalgebra::Vector3;
use serde::Deserialize;
use specs::prelude::*;

#[derive(Deserialize, Clone, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformerOptions {
    pub num_lines: usize,
    /// Lateral spacing of neighbouring loops, along local `z`.
    pub line_spacing: f64,
    /// Loops run this fraction of the way out to the core's outer edge.
    pub inset: f64,
}

impl Default for TransformerOptions {
    fn default() -> Self {
        TransformerOptions {
            num_lines: 6,
            line_spacing: 0.12,
            inset: 0.8,
        }
    }
}

/// One closed rectangular loop.
#[derive(Clone, Debug)]
pub struct FluxLoop {
    /// Closed polyline in world space, first point repeated last.
    pub points: Vec<Vector3<f64>>,
    pub phase: f64,
    pub opacity: f64,
    pub scale: f64,
}

impl FluxLoop {
    /// Opacity and scale at time `t` for a supply at `omega` rad/s.
    pub fn animate(&mut self, omega: f64, t: f64) {
        let swing = (omega * t + self.phase).sin().abs();
        self.opacity = 0.2 + swing * 0.5;
        self.scale = 0.8 + swing * 0.3;
    }
}

/// The loops of one transformer.
#[derive(Clone, Debug, Default)]
pub struct FluxLoops {
    pub loops: Vec<FluxLoop>,
}

impl Component for FluxLoops {
    type Storage = HashMapStorage<Self>;
}

impl FluxLoops {
    pub fn build(pose: &Pose, transformer: &Transformer, options: &TransformerOptions) -> Self {
        let n = options.num_lines;
        let half_width = 0.5 * transformer.core_width * options.inset;
        let half_height = 0.5 * transformer.core_height * options.inset;
        let loops = (0..n)
            .map(|i| {
                let z = (i as f64 - (n as f64 - 1.0) / 2.0) * options.line_spacing;
                let corners = [
                    Vector3::new(-half_width, -half_height, z),
                    Vector3::new(half_width, -half_height, z),
                    Vector3::new(half_width, half_height, z),
                    Vector3::new(-half_width, half_height, z),
                    Vector3::new(-half_width, -half_height, z),
                ];
                FluxLoop {
                    points: corners.iter().map(|c| pose.transform_point(c)).collect(),
                    phase: i as f64 * crate::constant::PI / n as f64,
                    opacity: 0.2,
                    scale: 0.8,
                }
            })
            .collect();
        FluxLoops { loops }
    }
}

pub struct FluxLoopSystem;

impl<'a> System<'a> for FluxLoopSystem {
    type SystemData = (
        Read<'a, Clock>,
        ReadStorage<'a, Source>,
        WriteStorage<'a, FluxLoops>,
    );

    fn run(&mut self, (clock, sources, mut flux): Self::SystemData) {
        for (source, loops) in (&sources, &mut flux).join() {
            let omega = match source {
                Source::Transformer(transformer) => transformer.angular_frequency(),
                _ => continue,
            };
            for flux_loop in loops.loops.iter_mut() {
                flux_loop.animate(omega, clock.elapsed);
            }
        }
    }
}

/// Attaches loops to a transformer source entity.
pub fn attach(world: &mut World, entity: Entity) {
    let loops = {
        let poses = world.read_storage::<Pose>();
        let sources = world.read_storage::<Source>();
        let config = world.read_resource::<EmLabConfiguration>();
        match (poses.get(entity), sources.get(entity)) {
            (Some(pose), Some(Source::Transformer(transformer))) => {
                FluxLoops::build(pose, transformer, &config.transformer)
            }
            _ => {
                tracing::debug!(?entity, "flux loops need a transformer source");
                return;
            }
        }
    };
    if let Err(err) = world.write_storage::<FluxLoops>().insert(entity, loops) {
        tracing::debug!(?entity, %err, "could not attach flux loops");
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_loops_are_closed_rectangles() {
        let loops = FluxLoops::build(
            &Pose::default(),
            &Transformer::default(),
            &TransformerOptions::default(),
        );
        assert_eq!(loops.loops.len(), 6);
        for flux_loop in loops.loops.iter() {
            assert_eq!(flux_loop.points.len(), 5);
            assert_eq!(flux_loop.points.first(), flux_loop.points.last());
        }
        let zs: Vec<f64> = loops.loops.iter().map(|l| l.points[0].z).collect();
        assert_approx_eq!(zs[0], -zs[5]);
    }

    #[test]
    fn test_opacity_and_scale_bounds() {
        let mut loops = FluxLoops::build(
            &Pose::default(),
            &Transformer::default(),
            &TransformerOptions::default(),
        );
        let omega = Transformer::default().angular_frequency();
        for step in 0..240 {
            let t = step as f64 / 60.0;
            for flux_loop in loops.loops.iter_mut() {
                flux_loop.animate(omega, t);
                assert!(flux_loop.opacity >= 0.2 - 1e-12 && flux_loop.opacity <= 0.7 + 1e-12);
                assert!(flux_loop.scale >= 0.8 - 1e-12 && flux_loop.scale <= 1.1 + 1e-12);
            }
        }
        // quarter period: sin is one for the first loop
        loops.loops[0].animate(omega, 0.25);
        assert_approx_eq!(loops.loops[0].opacity, 0.7);
        assert_approx_eq!(loops.loops[0].scale, 1.1);
    }
}

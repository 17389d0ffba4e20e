//! Magnetic fields of the active sources.
//!
//! The field model is a pure function `B(p, sources)`: the sum of each source's contribution,
//! with each kind deciding its own inside/outside rule. Poses are read fresh on every call.

use crate::error::FieldAnomaly;
use crate::pose::Pose;
use crate::source::{Source, SourceRegistry};
use nalgebra::Vector3;
use specs::{Component, Entities, Join, Read, ReadStorage, System, VecStorage, World, WorldExt, WriteStorage};
use std::fmt;

pub mod bar_magnet;
pub mod solenoid;
pub mod transformer;

/// Sums the contributions of `sources` at `point`.
pub fn calculate_field<'a, I>(point: &Vector3<f64>, sources: I) -> Vector3<f64>
where
    I: IntoIterator<Item = (&'a Pose, &'a Source)>,
{
    sources
        .into_iter()
        .fold(Vector3::zeros(), |field, (pose, source)| {
            field + source.calculate_field(pose, point)
        })
}

/// Field of a pair of opposite point poles.
///
/// `strength * r_N / |r_N|^3 - strength * r_S / |r_S|^3`, where the cubed distance uses the
/// unit direction and a squared distance clamped below at [POLE_CLAMP](crate::constant::POLE_CLAMP).
pub fn point_pole_pair(
    point: &Vector3<f64>,
    north: &Vector3<f64>,
    south: &Vector3<f64>,
    strength: f64,
) -> Vector3<f64> {
    strength * (pole_term(&(point - north)) - pole_term(&(point - south)))
}

fn pole_term(delta: &Vector3<f64>) -> Vector3<f64> {
    let distance = delta.norm();
    if distance == 0.0 {
        return Vector3::zeros();
    }
    if distance < crate::constant::POLE_CLAMP {
        tracing::trace!("{}", FieldAnomaly::SingularPole { distance });
    }
    let clamped = distance.max(crate::constant::POLE_CLAMP);
    delta / distance / (clamped * clamped)
}

/// A component that stores the magnetic field at an entity's location.
#[derive(Copy, Clone, Debug)]
pub struct MagneticFieldSampler {
    /// Vector representing the field components along x,y,z.
    pub field: Vector3<f64>,

    /// Magnitude of the field.
    pub magnitude: f64,
}

impl MagneticFieldSampler {
    pub fn new(field: Vector3<f64>) -> Self {
        let magnitude = field.norm();
        MagneticFieldSampler {
            field,
            magnitude: if magnitude.is_nan() { 0.0 } else { magnitude },
        }
    }
}

impl Component for MagneticFieldSampler {
    type Storage = VecStorage<Self>;
}

impl fmt::Display for MagneticFieldSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:?},{:?},{:?})",
            self.field[0], self.field[1], self.field[2]
        )
    }
}

impl Default for MagneticFieldSampler {
    fn default() -> Self {
        MagneticFieldSampler {
            field: Vector3::zeros(),
            magnitude: 0.0,
        }
    }
}

/// Updates every [MagneticFieldSampler] with the field of the registered sources.
///
/// A sampler attached to an entity that is itself a source ignores its own contribution.
pub struct SampleSourceFieldSystem;

impl<'a> System<'a> for SampleSourceFieldSystem {
    type SystemData = (
        Entities<'a>,
        Read<'a, SourceRegistry>,
        ReadStorage<'a, Pose>,
        ReadStorage<'a, Source>,
        WriteStorage<'a, MagneticFieldSampler>,
    );

    fn run(&mut self, (entities, registry, poses, sources, mut samplers): Self::SystemData) {
        let views = registry.views(&poses, &sources);
        for (entity, pose, sampler) in (&entities, &poses, &mut samplers).join() {
            let field = calculate_field(
                &pose.position,
                views
                    .iter()
                    .filter(|view| view.entity != entity)
                    .map(|view| (view.pose, view.source)),
            );
            *sampler = MagneticFieldSampler::new(field);
        }
    }
}

/// Registers resources required by magnetics to the ecs world.
pub fn register_components(world: &mut World) {
    world.register::<Source>();
    world.register::<MagneticFieldSampler>();
}

#[cfg(test)]
pub mod tests {
    use super::bar_magnet::BarMagnet;
    use super::solenoid::{CurrentDirection, Solenoid};
    use super::*;
    use crate::source;
    use assert_approx_eq::assert_approx_eq;
    use nalgebra::UnitQuaternion;
    use specs::{Builder, RunNow};

    fn magnet() -> Source {
        Source::BarMagnet(BarMagnet::new(1.0, 2.0, 0.5, 0.5))
    }

    #[test]
    fn test_field_is_sum_of_sources() {
        let pose_a = Pose::at(Vector3::new(0.0, 0.0, 0.0));
        let pose_b = Pose::at(Vector3::new(0.0, 3.0, 0.0));
        let a = magnet();
        let b = magnet();
        let point = Vector3::new(1.5, 1.0, 0.3);
        let total = calculate_field(&point, vec![(&pose_a, &a), (&pose_b, &b)]);
        let separate =
            a.calculate_field(&pose_a, &point) + b.calculate_field(&pose_b, &point);
        assert_approx_eq!((total - separate).norm(), 0.0, 1e-12);
    }

    #[test]
    fn test_pole_term_clamped_near_pole() {
        let clamp = crate::constant::POLE_CLAMP;
        let near = pole_term(&Vector3::new(0.01, 0.0, 0.0));
        assert_approx_eq!(near.norm(), 1.0 / (clamp * clamp), 1e-9);
        assert_approx_eq!(near.x, 1.0 / (clamp * clamp), 1e-9);

        let far = pole_term(&Vector3::new(0.0, 2.0, 0.0));
        assert_approx_eq!(far.y, 0.25, 1e-12);
        assert_eq!(pole_term(&Vector3::zeros()), Vector3::zeros());
    }

    #[test]
    fn test_field_is_equivariant_under_rotation() {
        let source = Source::Solenoid(Solenoid::new(10, 2.0, CurrentDirection::Forward, 0.5, 2.0));
        let pose = Pose::at(Vector3::new(0.5, -0.2, 0.1));
        let rotation = UnitQuaternion::from_euler_angles(0.3, -1.1, 2.0);
        let centre = pose.position;
        let rotated_pose = pose.rotated_about(&rotation, &centre);

        for point in &[
            Vector3::new(2.0, 1.0, -0.5),
            Vector3::new(0.6, -0.1, 0.2),
            Vector3::new(-3.0, 0.0, 1.0),
        ] {
            let rotated_point = centre + rotation * (point - centre);
            let expected = rotation * source.calculate_field(&pose, point);
            let actual = source.calculate_field(&rotated_pose, &rotated_point);
            assert_approx_eq!((expected - actual).norm(), 0.0, 1e-9);
        }

        let magnet = magnet();
        let point = Vector3::new(0.2, 0.9, 0.4);
        let rotated_point = centre + rotation * (point - centre);
        let expected = rotation * magnet.calculate_field(&pose, &point);
        let actual = magnet.calculate_field(&rotated_pose, &rotated_point);
        assert_approx_eq!((expected - actual).norm(), 0.0, 1e-9);
    }

    #[test]
    fn test_sampler_system_ignores_own_source() {
        let mut world = World::new();
        crate::simulation::register_components(&mut world);
        crate::simulation::register_resources(&mut world);

        let origin = source::spawn_source(&mut world, Pose::default(), magnet());
        let sample_position = Vector3::new(2.0, 0.0, 0.0);
        let own = source::spawn_source(&mut world, Pose::at(sample_position), magnet());
        world
            .write_storage::<MagneticFieldSampler>()
            .insert(own, MagneticFieldSampler::default())
            .expect("could not attach sampler");
        let sampler = world
            .create_entity()
            .with(Pose::at(sample_position))
            .with(MagneticFieldSampler::default())
            .build();

        SampleSourceFieldSystem.run_now(&world);

        let samplers = world.read_storage::<MagneticFieldSampler>();
        let poses = world.read_storage::<Pose>();
        let sources = world.read_storage::<Source>();
        let from_origin = sources
            .get(origin)
            .expect("origin source missing")
            .calculate_field(poses.get(origin).expect("origin pose missing"), &sample_position);
        let own_sample = samplers.get(own).expect("entity not found");
        assert_approx_eq!((own_sample.field - from_origin).norm(), 0.0, 1e-12);

        let field_sample = samplers.get(sampler).expect("entity not found");
        assert!((field_sample.field - from_origin).norm() > 1e-3);
        assert_approx_eq!(field_sample.magnitude, field_sample.field.norm());
    }
}

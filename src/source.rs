//! Field sources and the registry of those currently active.
//!
//! A source is an entity carrying a [Pose] and a [Source]. The [SourceRegistry] resource keeps
//! their order, which carries no physical meaning but makes iteration deterministic.

use crate::destructor::ExperimentOwned;
use crate::magnetic::bar_magnet::BarMagnet;
use crate::magnetic::solenoid::Solenoid;
use crate::magnetic::transformer::Transformer;
use crate::pose::Pose;
use crate::rebuild::{RebuildReason, RebuildRequest};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use specs::{Builder, Component, Entity, HashMapStorage, ReadStorage, World, WorldExt};

/// An active contributor to the magnetic field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Source {
    BarMagnet(BarMagnet),
    Solenoid(Solenoid),
    Transformer(Transformer),
}

impl Component for Source {
    type Storage = HashMapStorage<Self>;
}

impl Source {
    /// Contribution of this source to the field at `point`.
    pub fn calculate_field(&self, pose: &Pose, point: &Vector3<f64>) -> Vector3<f64> {
        match self {
            Source::BarMagnet(magnet) => magnet.calculate_field(pose, point),
            Source::Solenoid(solenoid) => solenoid.calculate_field(pose, point),
            Source::Transformer(_) => Vector3::zeros(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Source::BarMagnet(_) => "barMagnet",
            Source::Solenoid(_) => "solenoid",
            Source::Transformer(_) => "transformer",
        }
    }
}

/// A registered source with its pose, borrowed from the world storages.
#[derive(Clone, Copy, Debug)]
pub struct SourceView<'a> {
    pub entity: Entity,
    pub pose: &'a Pose,
    pub source: &'a Source,
}

/// The ordered set of active sources.
#[derive(Default, Debug)]
pub struct SourceRegistry {
    entities: Vec<Entity>,
}

impl SourceRegistry {
    /// Registers a source entity. Adding an entity twice has no effect.
    pub fn add(&mut self, entity: Entity) {
        if !self.entities.contains(&entity) {
            self.entities.push(entity);
        }
    }

    /// Unregisters a source entity. Returns false if it was not registered.
    pub fn remove(&mut self, entity: Entity) -> bool {
        match self.entities.iter().position(|e| *e == entity) {
            Some(index) => {
                self.entities.remove(index);
                true
            }
            None => false,
        }
    }

    /// Unregisters every source, returning the entities that were registered.
    pub fn clear(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.entities)
    }

    pub fn list(&self) -> &[Entity] {
        &self.entities
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Borrows the pose and kind of each registered source, in registry order.
    ///
    /// Entities that lost either component are skipped.
    pub fn views<'s>(
        &self,
        poses: &'s ReadStorage<'_, Pose>,
        sources: &'s ReadStorage<'_, Source>,
    ) -> Vec<SourceView<'s>> {
        self.entities
            .iter()
            .filter_map(|entity| {
                Some(SourceView {
                    entity: *entity,
                    pose: poses.get(*entity)?,
                    source: sources.get(*entity)?,
                })
            })
            .collect()
    }
}

/// Creates a source entity owned by the active experiment and registers it.
pub fn spawn_source(world: &mut World, pose: Pose, source: Source) -> Entity {
    let entity = world
        .create_entity()
        .with(pose)
        .with(source)
        .with(ExperimentOwned)
        .build();
    world.write_resource::<SourceRegistry>().add(entity);
    world
        .write_resource::<RebuildRequest>()
        .request(RebuildReason::SourcesChanged);
    entity
}

/// Unregisters and deletes a source entity. Removing a source twice does nothing.
pub fn despawn_source(world: &mut World, entity: Entity) {
    let removed = world.write_resource::<SourceRegistry>().remove(entity);
    if !removed {
        return;
    }
    if world.delete_entity(entity).is_err() {
        tracing::debug!(?entity, "source entity was already deleted");
    }
    world
        .write_resource::<RebuildRequest>()
        .request(RebuildReason::SourcesChanged);
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::magnetic::calculate_field;
    use assert_approx_eq::assert_approx_eq;

    fn test_world() -> World {
        let mut world = World::new();
        crate::simulation::register_components(&mut world);
        crate::simulation::register_resources(&mut world);
        world
    }

    #[test]
    fn test_registry_order_and_double_removal() {
        let mut world = test_world();
        let a = spawn_source(&mut world, Pose::default(), Source::BarMagnet(BarMagnet::default()));
        let b = spawn_source(
            &mut world,
            Pose::at(Vector3::new(3.0, 0.0, 0.0)),
            Source::Solenoid(Solenoid::default()),
        );
        assert_eq!(world.read_resource::<SourceRegistry>().list(), &[a, b]);

        despawn_source(&mut world, a);
        despawn_source(&mut world, a);
        world.maintain();
        assert_eq!(world.read_resource::<SourceRegistry>().list(), &[b]);
        assert!(!world.is_alive(a));
    }

    #[test]
    fn test_remove_then_readd_leaves_field_unchanged() {
        let mut world = test_world();
        let pose = Pose::at(Vector3::new(0.5, 0.0, -0.5));
        let magnet = Source::BarMagnet(BarMagnet::default());
        let first = spawn_source(&mut world, pose, magnet.clone());
        spawn_source(
            &mut world,
            Pose::at(Vector3::new(-2.0, 1.0, 0.0)),
            Source::Solenoid(Solenoid::default()),
        );
        let points = [
            Vector3::new(2.0, 0.2, 0.1),
            Vector3::new(-0.3, 1.5, 2.0),
            Vector3::new(0.0, -1.0, 0.0),
        ];
        let sample = |world: &World| -> Vec<Vector3<f64>> {
            let poses = world.read_storage::<Pose>();
            let sources = world.read_storage::<Source>();
            let registry = world.read_resource::<SourceRegistry>();
            let views = registry.views(&poses, &sources);
            points
                .iter()
                .map(|p| calculate_field(p, views.iter().map(|v| (v.pose, v.source))))
                .collect()
        };
        let before = sample(&world);

        despawn_source(&mut world, first);
        world.maintain();
        spawn_source(&mut world, pose, magnet);
        let after = sample(&world);

        for (a, b) in before.iter().zip(after.iter()) {
            assert_approx_eq!((a - b).norm(), 0.0, 1e-12);
        }
    }

    #[test]
    fn test_spawning_requests_rebuild() {
        let mut world = test_world();
        world.write_resource::<RebuildRequest>().take();
        spawn_source(&mut world, Pose::default(), Source::BarMagnet(BarMagnet::default()));
        assert!(world.read_resource::<RebuildRequest>().is_pending());
    }
}

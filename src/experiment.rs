//! Experiments. Exactly one is active at a time.
//!
//! Activating an experiment tears down everything the previous one created, then builds the
//! new experiment's sources and coupler entities. Each activation hands out a fresh
//! [ActivationToken]; replies to asynchronous requests made under an older token are stale.

use crate::arrows::grid::GridArrows;
use crate::arrows::{FlowArrow, StreamlinePool};
use crate::configuration::EmLabConfiguration;
use crate::constant::PI;
use crate::couplers::compass;
use crate::couplers::cooktop::{Cooktop, Cookware};
use crate::couplers::induction::{Galvanometer, InductionCoil, InductionMagnet};
use crate::couplers::lenz::{FallingBody, LenzTube};
use crate::couplers::transformer::{self, FluxLoops};
use crate::couplers::wireless::{ChargingPad, ChargingReceiver};
use crate::destructor::{delete_owned_entities, ExperimentOwned};
use crate::drag::{DragConstraint, DragInput, DragState, Draggable};
use crate::host::{SceneCommands, SceneNode};
use crate::integrator::{Clock, Step};
use crate::magnetic::bar_magnet::BarMagnet;
use crate::magnetic::transformer::Transformer;
use crate::pose::Pose;
use crate::rebuild::{RebuildReason, RebuildRequest};
use crate::slider::SliderInput;
use crate::source::{spawn_source, Source, SourceRegistry};
use crate::tween::CompletedTweens;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use specs::prelude::*;

/// Half side of the square a sandbox source can be dragged within.
const SANDBOX_HALF_EXTENT: f64 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Experiment {
    Sandbox,
    BarMagnet,
    Induction,
    LenzLaw,
    Transformer,
    WirelessCharging,
    InductionCooktop,
}

impl Experiment {
    pub const ALL: [Experiment; 7] = [
        Experiment::Sandbox,
        Experiment::BarMagnet,
        Experiment::Induction,
        Experiment::LenzLaw,
        Experiment::Transformer,
        Experiment::WirelessCharging,
        Experiment::InductionCooktop,
    ];

    /// Whether field artifacts follow a dragged source on every drag update, rather than
    /// only when the drag ends.
    pub fn rebuilds_continuously(self) -> bool {
        matches!(self, Experiment::Sandbox | Experiment::BarMagnet)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ActivationToken(u64);

#[derive(Default, Debug)]
pub struct ActiveExperiment {
    pub experiment: Option<Experiment>,
    pub token: ActivationToken,
}

impl ActiveExperiment {
    pub fn is_current(&self, token: ActivationToken) -> bool {
        self.experiment.is_some() && self.token == token
    }
}

/// Replies to asynchronous requests made by the active experiment.
#[derive(Default, Debug)]
pub struct ReplyInbox {
    pub messages: Vec<String>,
}

/// Discards every source, artifact and coupler entity of the active experiment.
pub fn teardown(world: &mut World) {
    {
        let (entities, flux, galvanometers, arrows, mut scene, mut pool, mut grid): (
            Entities,
            ReadStorage<FluxLoops>,
            ReadStorage<Galvanometer>,
            ReadStorage<FlowArrow>,
            Write<SceneCommands>,
            Write<StreamlinePool>,
            Write<GridArrows>,
        ) = world.system_data();
        for (entity, _) in (&entities, &flux).join() {
            scene.remove(SceneNode::FluxLoops(entity));
        }
        for (entity, _) in (&entities, &galvanometers).join() {
            scene.remove(SceneNode::OpposingRing(entity));
        }
        for (entity, _) in (&entities, &arrows).join() {
            scene.remove(SceneNode::FlowArrow(entity));
        }
        for id in pool.ids() {
            scene.remove(SceneNode::Streamline(id));
        }
        if !grid.arrows.is_empty() {
            scene.remove(SceneNode::GridArrows);
        }
        pool.clear();
        grid.clear();
    }

    world.write_resource::<SourceRegistry>().clear();
    let deleted = delete_owned_entities(world);
    world.write_resource::<DragInput>().clear();
    world.write_resource::<DragState>().reset();
    world.write_resource::<SliderInput>().clear();
    world.write_resource::<ReplyInbox>().messages.clear();
    world.write_resource::<RebuildRequest>().take();
    world.write_resource::<CompletedTweens>().entities.clear();
    *world.write_resource::<Clock>() = Clock::default();
    *world.write_resource::<Step>() = Step::default();
    world.maintain();

    let mut active = world.write_resource::<ActiveExperiment>();
    tracing::debug!(experiment = ?active.experiment, deleted, "experiment torn down");
    active.experiment = None;
}

/// Tears down the active experiment, then builds `experiment`.
pub fn activate(world: &mut World, experiment: Experiment) -> ActivationToken {
    teardown(world);
    let config = (*world.read_resource::<EmLabConfiguration>()).clone();
    match experiment {
        Experiment::Sandbox => init_sandbox(world),
        Experiment::BarMagnet => init_bar_magnet(world, &config),
        Experiment::Induction => init_induction(world, &config),
        Experiment::LenzLaw => init_lenz(world, &config),
        Experiment::Transformer => init_transformer(world),
        Experiment::WirelessCharging => init_wireless(world, &config),
        Experiment::InductionCooktop => init_cooktop(world, &config),
    }
    world
        .write_resource::<RebuildRequest>()
        .request(RebuildReason::SourcesChanged);

    let mut active = world.write_resource::<ActiveExperiment>();
    active.experiment = Some(experiment);
    active.token = ActivationToken(active.token.0 + 1);
    tracing::info!(?experiment, "experiment activated");
    active.token
}

fn attach<C: Component>(world: &mut World, entity: Entity, component: C) {
    if let Err(err) = world.write_storage::<C>().insert(entity, component) {
        tracing::warn!(?entity, %err, "could not attach component");
    }
}

/// Rotation taking a magnet's north-pointing +x axis to -y.
fn north_down() -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -PI / 2.0)
}

fn spawn_draggable_magnet(world: &mut World) -> Entity {
    let magnet = spawn_source(
        world,
        Pose::default(),
        Source::BarMagnet(BarMagnet::default()),
    );
    attach(
        world,
        magnet,
        Draggable {
            constraint: DragConstraint::horizontal(SANDBOX_HALF_EXTENT),
        },
    );
    magnet
}

fn init_sandbox(world: &mut World) {
    spawn_draggable_magnet(world);
}

fn init_bar_magnet(world: &mut World, config: &EmLabConfiguration) {
    spawn_draggable_magnet(world);
    compass::create(world, &compass::default_positions(&config.compass));
}

fn init_induction(world: &mut World, config: &EmLabConfiguration) {
    let options = &config.induction;
    let start = options.magnet_start_y;
    let magnet = spawn_source(
        world,
        Pose::new(Vector3::new(0.0, start, 0.0), north_down()),
        Source::BarMagnet(BarMagnet::default()),
    );
    attach(
        world,
        magnet,
        Draggable {
            constraint: DragConstraint::vertical(options.coil_y - options.coil_length, start),
        },
    );
    attach(world, magnet, InductionMagnet { last_y: start });

    let coil = world
        .create_entity()
        .with(Pose::at(Vector3::new(0.0, options.coil_y, 0.0)))
        .with(InductionCoil {
            turns: options.turns,
            length: options.coil_length,
            radius: options.coil_radius,
        })
        .with(Galvanometer::default())
        .with(ExperimentOwned)
        .build();
    world
        .write_resource::<SceneCommands>()
        .add(SceneNode::OpposingRing(coil));
}

fn init_lenz(world: &mut World, config: &EmLabConfiguration) {
    let options = &config.lenz;
    world
        .create_entity()
        .with(Pose::at(Vector3::new(0.0, options.tube_centre_y, 0.0)))
        .with(LenzTube {
            centre_y: options.tube_centre_y,
            half_length: options.tube_half_length,
            damping: options.tube_damping,
        })
        .with(ExperimentOwned)
        .build();

    let magnet = spawn_source(
        world,
        Pose::new(Vector3::new(0.0, options.drop_height, 0.0), north_down()),
        Source::BarMagnet(BarMagnet::new(1.0, 0.3, 0.3, 0.3)),
    );
    attach(world, magnet, FallingBody::new(true));

    world
        .create_entity()
        .with(Pose::at(Vector3::new(
            options.control_offset,
            options.drop_height,
            0.0,
        )))
        .with(FallingBody::new(false))
        .with(ExperimentOwned)
        .build();
}

fn init_transformer(world: &mut World) {
    let core = spawn_source(
        world,
        Pose::default(),
        Source::Transformer(Transformer::default()),
    );
    transformer::attach(world, core);
    world
        .write_resource::<SceneCommands>()
        .add(SceneNode::FluxLoops(core));
}

fn init_wireless(world: &mut World, config: &EmLabConfiguration) {
    world
        .create_entity()
        .with(Pose::default())
        .with(ChargingPad)
        .with(ExperimentOwned)
        .build();
    world
        .create_entity()
        .with(Pose::at(Vector3::new(
            0.0,
            config.wireless.receiver_start_height,
            0.0,
        )))
        .with(ChargingReceiver::default())
        .with(Draggable {
            constraint: DragConstraint::horizontal(3.0),
        })
        .with(ExperimentOwned)
        .build();
}

fn init_cooktop(world: &mut World, config: &EmLabConfiguration) {
    world
        .create_entity()
        .with(Pose::default())
        .with(Cooktop {
            frequency: config.cooktop.frequency,
            field: config.cooktop.field,
            energized: true,
        })
        .with(Cookware::default())
        .with(ExperimentOwned)
        .build();
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::couplers::compass::Compass;

    fn test_world() -> World {
        let mut world = World::new();
        crate::simulation::register_components(&mut world);
        crate::simulation::register_resources(&mut world);
        world
    }

    #[test]
    fn test_tokens_go_stale() {
        let mut world = test_world();
        let first = activate(&mut world, Experiment::Sandbox);
        assert!(world.read_resource::<ActiveExperiment>().is_current(first));
        let second = activate(&mut world, Experiment::BarMagnet);
        let active = world.read_resource::<ActiveExperiment>();
        assert!(!active.is_current(first));
        assert!(active.is_current(second));
        assert_eq!(active.experiment, Some(Experiment::BarMagnet));
    }

    #[test]
    fn test_switch_discards_previous_entities() {
        let mut world = test_world();
        activate(&mut world, Experiment::BarMagnet);
        assert_eq!(world.read_resource::<SourceRegistry>().len(), 1);
        assert_eq!(world.read_storage::<Compass>().join().count(), 4);

        activate(&mut world, Experiment::InductionCooktop);
        assert!(world.read_resource::<SourceRegistry>().is_empty());
        assert_eq!(world.read_storage::<Compass>().join().count(), 0);
        assert_eq!(world.read_storage::<Pose>().join().count(), 1);
    }

    #[test]
    fn test_every_experiment_activates() {
        let mut world = test_world();
        for experiment in Experiment::ALL.iter() {
            activate(&mut world, *experiment);
            assert_eq!(
                world.read_resource::<ActiveExperiment>().experiment,
                Some(*experiment)
            );
            assert!(world.read_resource::<RebuildRequest>().is_pending());
        }
        teardown(&mut world);
        assert_eq!(world.read_storage::<Pose>().join().count(), 0);
        assert_eq!(world.read_resource::<ActiveExperiment>().experiment, None);
    }
}

//! The frame orchestrator.
//!
//! [Simulation] owns the ECS world and the dispatcher. Each call to [Simulation::tick] runs,
//! in order:
//!  1. pointer drags, then pose tweens and slider changes,
//!  2. the rebuild policy and, if requested, the rebuild of field artifacts,
//!  3. field sampling, flow arrow advance and theme restyling,
//!  4. the couplers, then the readout.
//!
//! Scene commands queued during the tick are flushed to the host once it completes.

use crate::arrows::grid::GridArrows;
use crate::arrows::theme::{ApplyThemeSystem, Theme, ThemeState};
use crate::arrows::{self, AdvanceFlowArrowsSystem, FlowRng, StreamlinePool};
use crate::configuration::EmLabConfiguration;
use crate::couplers::{self, lenz};
use crate::destructor::ExperimentOwned;
use crate::drag::{self, ApplyDragSystem, DragEvent, DragInput, DragState};
use crate::error::EmLabError;
use crate::experiment::{self, ActivationToken, ActiveExperiment, Experiment, ReplyInbox};
use crate::host::{KeyValueStore, Scene, SceneCommands};
use crate::integrator::{AdvanceClockSystem, Clock, Step, Timestep};
use crate::magnetic::{self, SampleSourceFieldSystem};
use crate::pose::Pose;
use crate::readout::{Readout, UpdateReadoutSystem};
use crate::rebuild::{
    RebuildFieldArtifactsSystem, RebuildPolicySystem, RebuildReason, RebuildRequest,
};
use crate::sandbox;
use crate::slider::{ApplySliderSystem, SliderEvent, SliderInput};
use crate::source::{despawn_source, spawn_source, Source, SourceRegistry};
use crate::tween::{CompletedTweens, Highlight, NeedleShake, Tween, TweenUpdateSystem};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use specs::prelude::*;

/// Registers all components used by the modules of the program.
pub fn register_components(world: &mut World) {
    world.register::<Pose>();
    world.register::<Tween<Pose>>();
    world.register::<ExperimentOwned>();
    magnetic::register_components(world);
    arrows::register_components(world);
    drag::register_components(world);
    couplers::register_components(world);
}

/// Adds resources to the world, with the default configuration.
pub fn register_resources(world: &mut World) {
    let config = EmLabConfiguration::default();
    world.insert(FlowRng(StdRng::seed_from_u64(config.flow.rng_seed)));
    world.insert(config);
    world.insert(Timestep::default());
    world.insert(Step::default());
    world.insert(Clock::default());
    world.insert(SourceRegistry::default());
    world.insert(RebuildRequest::default());
    world.insert(StreamlinePool::default());
    world.insert(GridArrows::default());
    world.insert(ThemeState::default());
    world.insert(SceneCommands::default());
    world.insert(DragInput::default());
    world.insert(DragState::default());
    world.insert(SliderInput::default());
    world.insert(ActiveExperiment::default());
    world.insert(ReplyInbox::default());
    world.insert(CompletedTweens::default());
    world.insert(Readout::default());
}

/// Creates a `Dispatcher` that can be used to calculate each frame.
pub fn create_dispatcher() -> Dispatcher<'static, 'static> {
    let mut builder = DispatcherBuilder::new()
        .with(AdvanceClockSystem, "clock", &[])
        .with(ApplyDragSystem, "apply_drag", &["clock"])
        .with(TweenUpdateSystem::<Pose>::default(), "tween_pose", &["apply_drag"])
        .with(ApplySliderSystem, "apply_slider", &["tween_pose"])
        .with(RebuildPolicySystem, "rebuild_policy", &["apply_slider"])
        .with(RebuildFieldArtifactsSystem, "rebuild_field", &["rebuild_policy"])
        .with(SampleSourceFieldSystem, "sample_field", &["rebuild_field"])
        .with(AdvanceFlowArrowsSystem, "advance_flow_arrows", &["rebuild_field"])
        .with(ApplyThemeSystem, "apply_theme", &["advance_flow_arrows"])
        .with(
            TweenUpdateSystem::<Highlight>::default(),
            "tween_highlight",
            &["apply_theme"],
        )
        .with(
            TweenUpdateSystem::<NeedleShake>::default(),
            "tween_shake",
            &["apply_theme"],
        );
    builder = couplers::add_systems_to_dispatch(
        builder,
        &["sample_field", "tween_highlight", "tween_shake"],
    );
    builder = builder.with(UpdateReadoutSystem, "readout", &couplers::COUPLER_SYSTEMS);
    builder.build()
}

/// The visualization engine, as driven by a host application.
pub struct Simulation {
    world: World,
    dispatcher: Dispatcher<'static, 'static>,
}

impl Default for Simulation {
    fn default() -> Self {
        Simulation::new(EmLabConfiguration::default())
    }
}

impl Simulation {
    pub fn new(config: EmLabConfiguration) -> Self {
        let mut world = World::new();
        register_components(&mut world);
        register_resources(&mut world);
        world.insert(FlowRng(StdRng::seed_from_u64(config.flow.rng_seed)));
        world.insert(config);
        let mut dispatcher = create_dispatcher();
        dispatcher.setup(&mut world);
        Simulation { world, dispatcher }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Switches to `experiment`, tearing down the active one first.
    pub fn activate(&mut self, experiment: Experiment) -> ActivationToken {
        experiment::activate(&mut self.world, experiment)
    }

    pub fn teardown(&mut self) {
        experiment::teardown(&mut self.world);
    }

    pub fn active(&self) -> Option<Experiment> {
        self.world.read_resource::<ActiveExperiment>().experiment
    }

    pub fn is_current(&self, token: ActivationToken) -> bool {
        self.world.read_resource::<ActiveExperiment>().is_current(token)
    }

    /// Delivers an asynchronous reply. Returns false, and drops the reply, when the
    /// experiment that asked for it is no longer active.
    pub fn deliver_reply(&mut self, token: ActivationToken, message: String) -> bool {
        if !self.is_current(token) {
            tracing::debug!(?token, "stale reply ignored");
            return false;
        }
        self.world.write_resource::<ReplyInbox>().messages.push(message);
        true
    }

    pub fn push_drag(&mut self, event: DragEvent) {
        self.world.write_resource::<DragInput>().push(event);
    }

    pub fn push_slider(&mut self, event: SliderEvent) {
        self.world.write_resource::<SliderInput>().push(event);
    }

    pub fn request_refresh(&mut self) {
        self.world
            .write_resource::<RebuildRequest>()
            .request(RebuildReason::Refresh);
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.world.write_resource::<ThemeState>().requested = theme;
    }

    pub fn set_grid_visible(&mut self, visible: bool) {
        self.world.write_resource::<GridArrows>().set_visible(visible);
    }

    /// Adds a source to the active experiment.
    pub fn add_source(&mut self, pose: Pose, source: Source) -> Entity {
        spawn_source(&mut self.world, pose, source)
    }

    pub fn remove_source(&mut self, entity: Entity) {
        despawn_source(&mut self.world, entity);
        self.world.maintain();
    }

    /// Moves `entity` to `target` over `duration` seconds.
    pub fn snap_to(&mut self, entity: Entity, target: Pose, duration: f64) {
        let current = match self.world.read_storage::<Pose>().get(entity) {
            Some(pose) => *pose,
            None => return,
        };
        let tween = Tween::between(current, target, duration);
        if let Err(err) = self.world.write_storage::<Tween<Pose>>().insert(entity, tween) {
            tracing::warn!(?entity, %err, "could not snap entity");
        }
    }

    /// Drops the spheres of the Lenz experiment from the top.
    pub fn release_bodies(&mut self) {
        lenz::release(&mut self.world);
    }

    /// Field of every registered source at `point`.
    pub fn field_at(&self, point: &Vector3<f64>) -> Vector3<f64> {
        let registry = self.world.read_resource::<SourceRegistry>();
        let poses = self.world.read_storage::<Pose>();
        let sources = self.world.read_storage::<Source>();
        let views = registry.views(&poses, &sources);
        magnetic::calculate_field(point, views.iter().map(|v| (v.pose, v.source)))
    }

    pub fn readout(&self) -> Readout {
        (*self.world.read_resource::<Readout>()).clone()
    }

    pub fn save_sandbox(&self, store: &mut dyn KeyValueStore) -> Result<usize, EmLabError> {
        sandbox::save_sandbox(&self.world, store)
    }

    /// Restores saved sources into the sandbox, switching to it first if needed.
    pub fn load_sandbox(&mut self, store: &dyn KeyValueStore) -> Result<usize, EmLabError> {
        if self.active() != Some(Experiment::Sandbox) {
            self.activate(Experiment::Sandbox);
        }
        let restored = sandbox::load_sandbox(&mut self.world, store)?;
        self.world.maintain();
        Ok(restored)
    }

    /// Advances the engine by `dt` seconds and brings `scene` up to date.
    pub fn tick(&mut self, dt: f64, scene: &mut dyn Scene) {
        self.world.write_resource::<Timestep>().delta = dt;
        self.dispatcher.dispatch(&self.world);
        self.world.maintain();
        self.settle_tweens();
        self.flush_scene(scene);
    }

    /// Delivers queued scene commands to `scene`.
    pub fn flush_scene(&mut self, scene: &mut dyn Scene) {
        self.world.write_resource::<SceneCommands>().flush(scene);
    }

    /// A source that finished snapping has moved, so the field artifacts are stale.
    fn settle_tweens(&mut self) {
        let completed: Vec<Entity> = self
            .world
            .write_resource::<CompletedTweens>()
            .entities
            .drain(..)
            .collect();
        let registry = self.world.read_resource::<SourceRegistry>();
        if completed.iter().any(|entity| registry.contains(*entity)) {
            self.world
                .write_resource::<RebuildRequest>()
                .request(RebuildReason::SourcesChanged);
        }
    }
}

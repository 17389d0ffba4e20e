//! Rebuilding the field artifacts.
//!
//! Field lines, flow arrows and grid arrows are derived from the current set of sources.
//! They are recomputed only when a rebuild has been requested: on a source being added or
//! removed, at the end of a drag, on a parameter change, on an explicit refresh, and on every
//! drag update for experiments that rebuild continuously.

use crate::arrows::grid::{sample_grid_arrows, GridArrows};
use crate::arrows::theme::{ArrowStyle, ThemeState};
use crate::arrows::{add_arrows_along, FlowArrow, FlowRng, StreamlinePool};
use crate::configuration::EmLabConfiguration;
use crate::drag::DragState;
use crate::error::FieldAnomaly;
use crate::experiment::ActiveExperiment;
use crate::host::{SceneCommands, SceneNode};
use crate::pose::Pose;
use crate::source::{Source, SourceRegistry};
use crate::tracer::trace_field_lines;
use specs::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RebuildReason {
    SourcesChanged,
    DragEnded,
    ContinuousDrag,
    ParameterChanged,
    Refresh,
}

/// A pending request to recompute field artifacts. Requests made before the rebuild runs
/// coalesce into one.
#[derive(Default, Debug)]
pub struct RebuildRequest {
    pending: Option<RebuildReason>,
}

impl RebuildRequest {
    pub fn request(&mut self, reason: RebuildReason) {
        if self.pending.is_none() {
            self.pending = Some(reason);
        }
    }

    pub fn take(&mut self) -> Option<RebuildReason> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Requests a rebuild on each drag update when the active experiment rebuilds continuously.
pub struct RebuildPolicySystem;

impl<'a> System<'a> for RebuildPolicySystem {
    type SystemData = (
        Read<'a, DragState>,
        Read<'a, ActiveExperiment>,
        Write<'a, RebuildRequest>,
    );

    fn run(&mut self, (drag, active, mut request): Self::SystemData) {
        let continuous = active
            .experiment
            .map_or(false, |experiment| experiment.rebuilds_continuously());
        if continuous && drag.moved_this_tick() {
            request.request(RebuildReason::ContinuousDrag);
        }
    }
}

/// Discards every streamline and flow arrow, then retraces lines, respawns arrows and
/// resamples the grid from the registered sources.
pub struct RebuildFieldArtifactsSystem;

impl<'a> System<'a> for RebuildFieldArtifactsSystem {
    type SystemData = (
        Entities<'a>,
        Write<'a, RebuildRequest>,
        Read<'a, SourceRegistry>,
        ReadStorage<'a, Pose>,
        ReadStorage<'a, Source>,
        ReadExpect<'a, EmLabConfiguration>,
        Read<'a, ThemeState>,
        Write<'a, StreamlinePool>,
        Write<'a, GridArrows>,
        Write<'a, FlowRng>,
        WriteStorage<'a, FlowArrow>,
        WriteStorage<'a, ArrowStyle>,
        Write<'a, SceneCommands>,
    );

    fn run(
        &mut self,
        (
            entities,
            mut request,
            registry,
            poses,
            sources,
            config,
            theme,
            mut pool,
            mut grid,
            mut rng,
            mut arrows,
            mut styles,
            mut scene,
        ): Self::SystemData,
    ) {
        let reason = match request.take() {
            Some(reason) => reason,
            None => return,
        };

        for id in pool.ids() {
            scene.remove(SceneNode::Streamline(id));
        }
        let stale: Vec<Entity> = (&entities, &arrows).join().map(|(e, _)| e).collect();
        for entity in stale {
            arrows.remove(entity);
            if entities.delete(entity).is_ok() {
                scene.remove(SceneNode::FlowArrow(entity));
            }
        }
        if !grid.arrows.is_empty() {
            scene.remove(SceneNode::GridArrows);
        }

        let views = registry.views(&poses, &sources);
        if views.is_empty() {
            tracing::debug!("{}", FieldAnomaly::NoActiveSources);
            pool.clear();
            grid.clear();
            return;
        }

        pool.replace(trace_field_lines(&views, &config.tracer));
        let material = theme.requested.flow_material();
        let mut spawned = 0;
        for (id, line) in pool.ids().into_iter().zip(pool.lines().iter()) {
            scene.add(SceneNode::Streamline(id));
            for entity in add_arrows_along(
                &entities,
                &mut arrows,
                &mut styles,
                id,
                line,
                config.flow.arrows_per_line,
                &mut rng.0,
                material,
            ) {
                scene.add(SceneNode::FlowArrow(entity));
                spawned += 1;
            }
        }

        grid.replace(sample_grid_arrows(&views, &config.grid));
        grid.material = theme.requested.grid_material();
        if !grid.arrows.is_empty() {
            scene.add(SceneNode::GridArrows);
        }

        tracing::debug!(
            ?reason,
            sources = views.len(),
            lines = pool.len(),
            flow_arrows = spawned,
            grid_arrows = grid.arrows.len(),
            "field artifacts rebuilt"
        );
    }
}

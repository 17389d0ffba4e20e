//! Pointer drags of scene objects.
//!
//! The host resolves picking and projects the pointer onto the drag plane. The engine receives
//! the resulting world points as [DragEvent]s, applies the dragged object's constraint and
//! moves its pose.

use crate::pose::Pose;
use crate::rebuild::{RebuildReason, RebuildRequest};
use crate::tween::{Highlight, Tween};
use nalgebra::Vector3;
use specs::prelude::*;
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragEvent {
    Start { target: Entity },
    Move { point: Vector3<f64> },
    End,
}

/// Drag events received since the last tick.
#[derive(Default, Debug)]
pub struct DragInput {
    events: VecDeque<DragEvent>,
}

impl DragInput {
    pub fn push(&mut self, event: DragEvent) {
        self.events.push_back(event);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[derive(Default, Debug)]
pub struct DragState {
    target: Option<Entity>,
    moved: bool,
    ended: Option<Entity>,
}

impl DragState {
    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn is_dragging(&self, entity: Entity) -> bool {
        self.target == Some(entity)
    }

    /// True if the dragged object moved during the current tick.
    pub fn moved_this_tick(&self) -> bool {
        self.moved
    }

    /// The object released during the current tick, if any.
    pub fn ended_this_tick(&self) -> Option<Entity> {
        self.ended
    }

    pub fn reset(&mut self) {
        *self = DragState::default();
    }
}

/// Restricts where a dragged object may go.
#[derive(Clone, Debug, PartialEq)]
pub struct DragConstraint {
    /// Motion is projected onto the plane through the object with this normal.
    pub plane_normal: Vector3<f64>,
    /// Axes (x, y, z) that keep their current value.
    pub locked: [bool; 3],
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
}

impl DragConstraint {
    /// Free motion on the horizontal plane through the object.
    pub fn horizontal(half_extent: f64) -> Self {
        DragConstraint {
            plane_normal: Vector3::y(),
            locked: [false, true, false],
            min: Vector3::new(-half_extent, f64::NEG_INFINITY, -half_extent),
            max: Vector3::new(half_extent, f64::INFINITY, half_extent),
        }
    }

    /// Motion along the vertical axis only, between `min_y` and `max_y`.
    pub fn vertical(min_y: f64, max_y: f64) -> Self {
        DragConstraint {
            plane_normal: Vector3::z(),
            locked: [true, false, true],
            min: Vector3::new(f64::NEG_INFINITY, min_y, f64::NEG_INFINITY),
            max: Vector3::new(f64::INFINITY, max_y, f64::INFINITY),
        }
    }

    /// Where an object at `current` goes when the pointer is at `point`.
    pub fn apply(&self, current: &Vector3<f64>, point: &Vector3<f64>) -> Vector3<f64> {
        let normal = self.plane_normal.normalize();
        let mut projected = point - normal * (point - current).dot(&normal);
        for axis in 0..3 {
            if self.locked[axis] {
                projected[axis] = current[axis];
            }
            projected[axis] = projected[axis].max(self.min[axis]).min(self.max[axis]);
        }
        projected
    }
}

pub struct Draggable {
    pub constraint: DragConstraint,
}

impl Component for Draggable {
    type Storage = HashMapStorage<Self>;
}

/// Applies queued drag events to poses. Releasing an object requests a rebuild.
pub struct ApplyDragSystem;

impl<'a> System<'a> for ApplyDragSystem {
    type SystemData = (
        Write<'a, DragInput>,
        Write<'a, DragState>,
        ReadStorage<'a, Draggable>,
        WriteStorage<'a, Pose>,
        Write<'a, RebuildRequest>,
        Read<'a, LazyUpdate>,
    );

    fn run(
        &mut self,
        (mut input, mut state, draggables, mut poses, mut rebuild, updater): Self::SystemData,
    ) {
        state.moved = false;
        state.ended = None;

        while let Some(event) = input.events.pop_front() {
            match event {
                DragEvent::Start { target } => {
                    if draggables.contains(target) {
                        state.target = Some(target);
                        updater.insert(target, Highlight::default());
                        updater.insert(target, Highlight::pulse());
                    } else {
                        tracing::debug!(?target, "ignored drag of an object that is not draggable");
                    }
                }
                DragEvent::Move { point } => {
                    let target = match state.target {
                        Some(target) => target,
                        None => continue,
                    };
                    if let (Some(draggable), Some(pose)) =
                        (draggables.get(target), poses.get_mut(target))
                    {
                        let moved_to = draggable.constraint.apply(&pose.position, &point);
                        if moved_to != pose.position {
                            pose.position = moved_to;
                            state.moved = true;
                        }
                    }
                }
                DragEvent::End => {
                    if let Some(target) = state.target.take() {
                        state.ended = Some(target);
                        rebuild.request(RebuildReason::DragEnded);
                    }
                }
            }
        }
    }
}

pub fn register_components(world: &mut World) {
    world.register::<Draggable>();
    world.register::<Highlight>();
    world.register::<Tween<Highlight>>();
}

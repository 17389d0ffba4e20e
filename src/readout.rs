//! Observable outputs of the active experiment, gathered once per tick for the host.

use crate::arrows::grid::GridArrows;
use crate::arrows::{FlowArrow, StreamlinePool};
use crate::configuration::EmLabConfiguration;
use crate::couplers::compass::Compass;
use crate::couplers::cooktop::{Cooktop, Cookware, HeatColor};
use crate::couplers::induction::{Galvanometer, RingDirection};
use crate::couplers::lenz::FallingBody;
use crate::couplers::transformer::FluxLoops;
use crate::couplers::wireless::ChargingReceiver;
use crate::experiment::{ActiveExperiment, Experiment};
use crate::integrator::Clock;
use crate::pose::Pose;
use crate::source::Source;
use crate::tween::{Highlight, NeedleShake};
use specs::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub struct GalvanometerReadout {
    pub signal: f64,
    /// Needle deflection including any shake, in radians.
    pub deflection: f64,
    pub ring_direction: RingDirection,
    pub ring_opacity: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FallingReadout {
    pub magnetic: bool,
    pub y: f64,
    pub velocity: f64,
    pub dropping: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransformerReadout {
    pub primary_current: f64,
    pub secondary_current: f64,
    pub turns_ratio: f64,
    pub loop_opacity: Vec<f64>,
    pub loop_scale: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChargingReadout {
    pub efficiency: f64,
    pub charge: f64,
    pub charging: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CooktopReadout {
    pub temperature: f64,
    pub heat_rate: f64,
    pub eddy_opacity: f64,
    pub color: HeatColor,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Readout {
    pub experiment: Option<Experiment>,
    pub streamlines: usize,
    pub flow_arrows: usize,
    pub grid_arrows: usize,
    /// Needle headings, in radians.
    pub compass_angles: Vec<f64>,
    pub galvanometer: Option<GalvanometerReadout>,
    pub falling: Vec<FallingReadout>,
    pub transformer: Option<TransformerReadout>,
    pub charging: Option<ChargingReadout>,
    pub cooktop: Option<CooktopReadout>,
    /// Pulse intensity of objects that have been picked up, in `[0, 1]`.
    pub highlights: Vec<(Entity, f64)>,
}

pub struct UpdateReadoutSystem;

impl<'a> System<'a> for UpdateReadoutSystem {
    type SystemData = (
        Write<'a, Readout>,
        Read<'a, ActiveExperiment>,
        (Entities<'a>, ReadStorage<'a, Highlight>),
        Read<'a, StreamlinePool>,
        Read<'a, GridArrows>,
        Read<'a, Clock>,
        ReadExpect<'a, EmLabConfiguration>,
        ReadStorage<'a, FlowArrow>,
        ReadStorage<'a, Compass>,
        (ReadStorage<'a, Galvanometer>, ReadStorage<'a, NeedleShake>),
        (ReadStorage<'a, FallingBody>, ReadStorage<'a, Pose>),
        (ReadStorage<'a, Source>, ReadStorage<'a, FluxLoops>),
        ReadStorage<'a, ChargingReceiver>,
        (ReadStorage<'a, Cooktop>, ReadStorage<'a, Cookware>),
    );

    fn run(
        &mut self,
        (
            mut readout,
            active,
            (entities, highlights),
            pool,
            grid,
            clock,
            config,
            arrows,
            compasses,
            (galvanometers, shakes),
            (bodies, poses),
            (sources, flux),
            receivers,
            (cooktops, cookware),
        ): Self::SystemData,
    ) {
        readout.experiment = active.experiment;
        readout.streamlines = pool.len();
        readout.flow_arrows = (&arrows).join().count();
        readout.grid_arrows = grid.arrows.len();

        readout.highlights = (&entities, &highlights)
            .join()
            .map(|(entity, highlight)| (entity, highlight.intensity))
            .collect();

        readout.compass_angles = (&compasses).join().map(|compass| compass.angle).collect();

        readout.galvanometer = (&galvanometers, (&shakes).maybe())
            .join()
            .next()
            .map(|(galvanometer, shake)| GalvanometerReadout {
                signal: galvanometer.signal,
                deflection: galvanometer.deflection + shake.map_or(0.0, |s| s.offset),
                ring_direction: galvanometer.ring.direction,
                ring_opacity: galvanometer.ring.opacity,
            });

        readout.falling = (&bodies, &poses)
            .join()
            .map(|(body, pose)| FallingReadout {
                magnetic: body.magnetic,
                y: pose.position.y,
                velocity: body.velocity,
                dropping: body.dropping,
            })
            .collect();

        readout.transformer = (&sources, &flux).join().find_map(|(source, loops)| match source {
            Source::Transformer(transformer) => Some(TransformerReadout {
                primary_current: transformer.primary_current(clock.elapsed),
                secondary_current: transformer.secondary_current(clock.elapsed),
                turns_ratio: transformer.turns_ratio(),
                loop_opacity: loops.loops.iter().map(|l| l.opacity).collect(),
                loop_scale: loops.loops.iter().map(|l| l.scale).collect(),
            }),
            _ => None,
        });

        readout.charging = (&receivers).join().next().map(|receiver| ChargingReadout {
            efficiency: receiver.efficiency,
            charge: receiver.charge,
            charging: receiver.is_charging(&config.wireless),
        });

        readout.cooktop = (&cooktops, &cookware)
            .join()
            .next()
            .map(|(cooktop, pan)| CooktopReadout {
                temperature: pan.temperature,
                heat_rate: cooktop.heat_rate(),
                eddy_opacity: pan.eddy_opacity,
                color: pan.color,
            });
    }
}

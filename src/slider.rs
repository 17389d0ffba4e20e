//! Parameter sliders.
//!
//! Slider changes arrive from the host as [SliderEvent]s and are applied at the start of the
//! next tick. Each committed change requests a rebuild of the field artifacts.

use crate::configuration::EmLabConfiguration;
use crate::couplers::cooktop::Cooktop;
use crate::couplers::lenz::LenzTube;
use crate::couplers::wireless::{ChargingPad, ChargingReceiver};
use crate::error::EmLabError;
use crate::magnetic::solenoid::CurrentDirection;
use crate::pose::Pose;
use crate::rebuild::{RebuildReason, RebuildRequest};
use crate::source::Source;
use specs::prelude::*;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliderId {
    MagnetStrength,
    SolenoidCurrent,
    SolenoidTurns,
    /// Negative values reverse the current.
    SolenoidDirection,
    TransformerFrequency,
    TubeDamping,
    /// Receiver height above the pad.
    ReceiverHeight,
    CooktopFrequency,
    CooktopField,
    /// Values above one half switch the coil on.
    CooktopPower,
    FlowSpeed,
}

impl FromStr for SliderId {
    type Err = EmLabError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let id = match name {
            "magnetStrength" => SliderId::MagnetStrength,
            "solenoidCurrent" => SliderId::SolenoidCurrent,
            "solenoidTurns" => SliderId::SolenoidTurns,
            "solenoidDirection" => SliderId::SolenoidDirection,
            "transformerFrequency" => SliderId::TransformerFrequency,
            "tubeDamping" => SliderId::TubeDamping,
            "receiverHeight" => SliderId::ReceiverHeight,
            "cooktopFrequency" => SliderId::CooktopFrequency,
            "cooktopField" => SliderId::CooktopField,
            "cooktopPower" => SliderId::CooktopPower,
            "flowSpeed" => SliderId::FlowSpeed,
            other => return Err(EmLabError::UnknownSlider(other.to_string())),
        };
        Ok(id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliderEvent {
    pub id: SliderId,
    pub value: f64,
}

/// Slider events received since the last tick.
#[derive(Default, Debug)]
pub struct SliderInput {
    events: Vec<SliderEvent>,
}

impl SliderInput {
    pub fn push(&mut self, event: SliderEvent) {
        self.events.push(event);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

pub struct ApplySliderSystem;

impl<'a> System<'a> for ApplySliderSystem {
    type SystemData = (
        Write<'a, SliderInput>,
        WriteStorage<'a, Source>,
        WriteStorage<'a, LenzTube>,
        ReadStorage<'a, ChargingPad>,
        ReadStorage<'a, ChargingReceiver>,
        WriteStorage<'a, Pose>,
        WriteStorage<'a, Cooktop>,
        WriteExpect<'a, EmLabConfiguration>,
        Write<'a, RebuildRequest>,
    );

    fn run(
        &mut self,
        (
            mut input,
            mut sources,
            mut tubes,
            pads,
            receivers,
            mut poses,
            mut cooktops,
            mut config,
            mut rebuild,
        ): Self::SystemData,
    ) {
        for SliderEvent { id, value } in input.events.drain(..) {
            match id {
                SliderId::MagnetStrength => {
                    for source in (&mut sources).join() {
                        if let Source::BarMagnet(magnet) = source {
                            magnet.strength = value;
                        }
                    }
                }
                SliderId::SolenoidCurrent => {
                    for source in (&mut sources).join() {
                        if let Source::Solenoid(solenoid) = source {
                            solenoid.current = value;
                        }
                    }
                }
                SliderId::SolenoidTurns => {
                    for source in (&mut sources).join() {
                        if let Source::Solenoid(solenoid) = source {
                            solenoid.set_turns(value.round().max(0.0) as u32);
                        }
                    }
                }
                SliderId::SolenoidDirection => {
                    for source in (&mut sources).join() {
                        if let Source::Solenoid(solenoid) = source {
                            solenoid.current_direction = CurrentDirection::from_sign(value);
                        }
                    }
                }
                SliderId::TransformerFrequency => {
                    for source in (&mut sources).join() {
                        if let Source::Transformer(transformer) = source {
                            transformer.frequency = value.max(0.0);
                        }
                    }
                }
                SliderId::TubeDamping => {
                    for tube in (&mut tubes).join() {
                        tube.damping = value.max(0.0).min(1.0);
                    }
                }
                SliderId::ReceiverHeight => {
                    let pad_y = (&pads, &poses).join().next().map(|(_, pose)| pose.position.y);
                    if let Some(pad_y) = pad_y {
                        for (_, pose) in (&receivers, &mut poses).join() {
                            pose.position.y = pad_y + value;
                        }
                    }
                }
                SliderId::CooktopFrequency => {
                    for cooktop in (&mut cooktops).join() {
                        cooktop.frequency = value.max(0.0);
                    }
                }
                SliderId::CooktopField => {
                    for cooktop in (&mut cooktops).join() {
                        cooktop.field = value;
                    }
                }
                SliderId::CooktopPower => {
                    for cooktop in (&mut cooktops).join() {
                        cooktop.energized = value > 0.5;
                    }
                }
                SliderId::FlowSpeed => config.flow.speed = value,
            }
            tracing::trace!(?id, value, "slider applied");
            rebuild.request(RebuildReason::ParameterChanged);
        }
    }
}

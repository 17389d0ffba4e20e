//! Response couplers map the field, or the motion of sources, to observable outputs.
//!
//! Each coupler keeps its state in components on the entities created by its experiment.
//! A coupler's system does nothing when none of its components exist, so only the active
//! experiment's couplers respond.

pub mod compass;
pub mod cooktop;
pub mod induction;
pub mod lenz;
pub mod transformer;
pub mod wireless;

use crate::tween::{NeedleShake, Tween};
use specs::{DispatcherBuilder, World, WorldExt};

pub fn register_components(world: &mut World) {
    world.register::<compass::Compass>();
    world.register::<induction::InductionCoil>();
    world.register::<induction::InductionMagnet>();
    world.register::<induction::Galvanometer>();
    world.register::<NeedleShake>();
    world.register::<Tween<NeedleShake>>();
    world.register::<lenz::LenzTube>();
    world.register::<lenz::FallingBody>();
    world.register::<transformer::FluxLoops>();
    world.register::<wireless::ChargingPad>();
    world.register::<wireless::ChargingReceiver>();
    world.register::<cooktop::Cooktop>();
    world.register::<cooktop::Cookware>();
}

/// Adds the coupler systems to the dispatcher.
///
/// `deps` are the systems every coupler must run after.
pub fn add_systems_to_dispatch(
    builder: DispatcherBuilder<'static, 'static>,
    deps: &[&str],
) -> DispatcherBuilder<'static, 'static> {
    builder
        .with(compass::CompassSystem, "compass", deps)
        .with(induction::InductionSystem, "induction", deps)
        .with(lenz::LenzBrakingSystem, "lenz_braking", deps)
        .with(transformer::FluxLoopSystem, "flux_loops", deps)
        .with(wireless::WirelessChargingSystem, "wireless_charging", deps)
        .with(cooktop::CooktopSystem, "cooktop", deps)
}

/// Names of the coupler systems, for systems that must run after all of them.
pub const COUPLER_SYSTEMS: [&str; 6] = [
    "compass",
    "induction",
    "lenz_braking",
    "flux_loops",
    "wireless_charging",
    "cooktop",
];

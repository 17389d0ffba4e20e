//! Wireless charging of a receiver above a transmitter pad.
//!
//! Efficiency falls off with horizontal misalignment and with distance from the optimal
//! height. Above a threshold efficiency the receiver's battery charges.

use crate::configuration::EmLabConfiguration;
use crate::integrator::Timestep;
use crate::pose::Pose;
use serde::Deserialize;
use specs::prelude::*;

#[derive(Deserialize, Clone, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct WirelessOptions {
    /// Efficiency, in percent, of a perfectly placed receiver.
    pub eta_max: f64,
    /// Gaussian falloff rate with horizontal offset.
    pub falloff: f64,
    pub optimal_height: f64,
    /// Efficiency, in percent, below which nothing charges.
    pub charge_threshold: f64,
    /// Charge gained per second at 100% efficiency, in percent.
    pub charge_rate: f64,
    pub receiver_start_height: f64,
}

impl Default for WirelessOptions {
    fn default() -> Self {
        WirelessOptions {
            eta_max: 100.0,
            falloff: 2.5,
            optimal_height: 0.5,
            charge_threshold: 5.0,
            charge_rate: 5.0,
            receiver_start_height: 0.5,
        }
    }
}

/// Charging efficiency, in percent, for a receiver offset by `(dx, dz)` at height `h`.
pub fn charging_efficiency(dx: f64, dz: f64, h: f64, options: &WirelessOptions) -> f64 {
    let rho_squared = dx * dx + dz * dz;
    let height_factor = (1.0 - 0.5 * (h - options.optimal_height).abs()).max(0.0);
    let eta = options.eta_max * (-options.falloff * rho_squared).exp() * height_factor;
    eta.max(0.0).min(options.eta_max)
}

/// The transmitter. Its pose is the pad centre.
#[derive(Clone, Component, Debug, Default)]
#[storage(NullStorage)]
pub struct ChargingPad;

#[derive(Clone, Debug, Default)]
pub struct ChargingReceiver {
    /// Current efficiency, in percent.
    pub efficiency: f64,
    /// Battery charge, in percent.
    pub charge: f64,
}

impl Component for ChargingReceiver {
    type Storage = HashMapStorage<Self>;
}

impl ChargingReceiver {
    pub fn is_charging(&self, options: &WirelessOptions) -> bool {
        self.efficiency > options.charge_threshold && self.charge < 100.0
    }
}

pub struct WirelessChargingSystem;

impl<'a> System<'a> for WirelessChargingSystem {
    type SystemData = (
        ReadStorage<'a, Pose>,
        ReadStorage<'a, ChargingPad>,
        WriteStorage<'a, ChargingReceiver>,
        ReadExpect<'a, Timestep>,
        ReadExpect<'a, EmLabConfiguration>,
    );

    fn run(&mut self, (poses, pads, mut receivers, timestep, config): Self::SystemData) {
        let options = &config.wireless;
        let pad = match (&poses, &pads).join().next() {
            Some((pose, _)) => pose.position,
            None => return,
        };
        for (pose, receiver) in (&poses, &mut receivers).join() {
            let offset = pose.position - pad;
            receiver.efficiency = charging_efficiency(offset.x, offset.z, offset.y, options);
            if receiver.efficiency > options.charge_threshold {
                receiver.charge = (receiver.charge
                    + options.charge_rate * receiver.efficiency / 100.0 * timestep.delta)
                    .min(100.0);
            }
        }
    }
}

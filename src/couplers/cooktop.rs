//! Induction cooktop heating a pan through eddy currents.

use crate::configuration::EmLabConfiguration;
use crate::constant::{AMBIENT_TEMPERATURE, COOKTOP_REFERENCE_FREQUENCY};
use crate::integrator::Timestep;
use serde::Deserialize;
use specs::prelude::*;

#[derive(Deserialize, Clone, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct CooktopOptions {
    /// Drive frequency, Hz.
    pub frequency: f64,
    /// Field amplitude at the pan.
    pub field: f64,
    pub max_temperature: f64,
    /// Share of the heat rate that warms the pan.
    pub heating_gain: f64,
    /// Newtonian loss coefficient towards ambient, per second.
    pub loss: f64,
    /// Cooling rate with the coil off, degrees per second.
    pub cooling_rate: f64,
    pub warm_threshold: f64,
    pub hot_threshold: f64,
    /// Heat rate giving fully opaque eddy loops.
    pub eddy_saturation: f64,
}

impl Default for CooktopOptions {
    fn default() -> Self {
        CooktopOptions {
            frequency: 25_000.0,
            field: 0.5,
            max_temperature: 400.0,
            heating_gain: 0.5,
            loss: 0.01,
            cooling_rate: 2.0,
            warm_threshold: 100.0,
            hot_threshold: 200.0,
            eddy_saturation: 50.0,
        }
    }
}

/// Heat rate for drive frequency `frequency` and field amplitude `field`.
pub fn heat_rate(frequency: f64, field: f64) -> f64 {
    let f = frequency / COOKTOP_REFERENCE_FREQUENCY;
    f * f * field * field * 100.0
}

#[derive(Clone, Debug)]
pub struct Cooktop {
    pub frequency: f64,
    pub field: f64,
    pub energized: bool,
}

impl Component for Cooktop {
    type Storage = HashMapStorage<Self>;
}

impl Cooktop {
    pub fn heat_rate(&self) -> f64 {
        if self.energized {
            heat_rate(self.frequency, self.field)
        } else {
            0.0
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeatColor {
    Cool,
    Warm,
    Hot,
}

impl HeatColor {
    pub fn from_temperature(temperature: f64, options: &CooktopOptions) -> Self {
        if temperature >= options.hot_threshold {
            HeatColor::Hot
        } else if temperature >= options.warm_threshold {
            HeatColor::Warm
        } else {
            HeatColor::Cool
        }
    }
}

/// The pan on the cooktop.
#[derive(Clone, Debug)]
pub struct Cookware {
    pub temperature: f64,
    /// Opacity of the eddy loops and particles.
    pub eddy_opacity: f64,
    pub color: HeatColor,
}

impl Default for Cookware {
    fn default() -> Self {
        Cookware {
            temperature: AMBIENT_TEMPERATURE,
            eddy_opacity: 0.0,
            color: HeatColor::Cool,
        }
    }
}

impl Component for Cookware {
    type Storage = HashMapStorage<Self>;
}

impl Cookware {
    pub fn step(&mut self, cooktop: &Cooktop, options: &CooktopOptions, dt: f64) {
        if cooktop.energized {
            let heat = cooktop.heat_rate();
            let temperature = self.temperature + options.heating_gain * heat * dt
                - options.loss * (self.temperature - AMBIENT_TEMPERATURE) * dt;
            self.temperature = temperature
                .max(AMBIENT_TEMPERATURE)
                .min(options.max_temperature);
            self.eddy_opacity = (heat / options.eddy_saturation).min(1.0);
        } else {
            self.temperature = (self.temperature - options.cooling_rate * dt).max(AMBIENT_TEMPERATURE);
            self.eddy_opacity = 0.0;
        }
        self.color = HeatColor::from_temperature(self.temperature, options);
    }
}

pub struct CooktopSystem;

impl<'a> System<'a> for CooktopSystem {
    type SystemData = (
        ReadStorage<'a, Cooktop>,
        WriteStorage<'a, Cookware>,
        ReadExpect<'a, Timestep>,
        ReadExpect<'a, EmLabConfiguration>,
    );

    fn run(&mut self, (cooktops, mut cookware, timestep, config): Self::SystemData) {
        for (cooktop, pan) in (&cooktops, &mut cookware).join() {
            pan.step(cooktop, &config.cooktop, timestep.delta);
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn cooktop(energized: bool) -> Cooktop {
        Cooktop {
            frequency: 25_000.0,
            field: 0.5,
            energized,
        }
    }

    #[test]
    fn test_heat_rate() {
        assert_approx_eq!(heat_rate(25_000.0, 0.5), 6.25);
        assert_approx_eq!(heat_rate(25_000.0, 1.0), 25.0);
        assert_approx_eq!(
            heat_rate(30_000.0, 0.7) / heat_rate(10_000.0, 0.2),
            9.0 * 12.25,
            1e-9
        );
    }

    #[test]
    fn test_heating_and_cooling() {
        let options = CooktopOptions::default();
        let mut pan = Cookware::default();
        for _ in 0..600 {
            pan.step(&cooktop(true), &options, 1.0 / 60.0);
        }
        assert!(pan.temperature > AMBIENT_TEMPERATURE);
        assert_approx_eq!(pan.eddy_opacity, 6.25 / 50.0);

        let warm = pan.temperature;
        pan.step(&cooktop(false), &options, 1.0);
        assert_approx_eq!(pan.temperature, warm - 2.0);
        assert_eq!(pan.eddy_opacity, 0.0);
        for _ in 0..1000 {
            pan.step(&cooktop(false), &options, 1.0);
        }
        assert_approx_eq!(pan.temperature, AMBIENT_TEMPERATURE);
    }

    #[test]
    fn test_temperature_capped_and_colored() {
        let options = CooktopOptions::default();
        let hot = Cooktop {
            frequency: 50_000.0,
            field: 4.0,
            energized: true,
        };
        let mut pan = Cookware::default();
        let mut saw_warm = false;
        for _ in 0..2000 {
            pan.step(&hot, &options, 0.1);
            saw_warm |= pan.color == HeatColor::Warm;
        }
        assert!(saw_warm);
        assert_approx_eq!(pan.temperature, 400.0);
        assert_eq!(pan.color, HeatColor::Hot);
        assert_eq!(pan.eddy_opacity, 1.0);
    }
}

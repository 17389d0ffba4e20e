//! Transformer sources. They drive the flux-loop visualizer only and add no field.

use crate::constant::PI;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transformer {
    /// Primary winding turns, at least 1.
    primary_turns: u32,
    /// Secondary winding turns, at least 1.
    secondary_turns: u32,
    /// Peak of the sinusoidal primary current.
    pub peak_current: f64,
    /// Supply frequency, Hz.
    pub frequency: f64,
    /// Outer width of the rectangular core along local `x`.
    pub core_width: f64,
    /// Outer height of the rectangular core along local `y`.
    pub core_height: f64,
}

impl Default for Transformer {
    fn default() -> Self {
        Transformer {
            primary_turns: 100,
            secondary_turns: 50,
            peak_current: 1.0,
            frequency: 1.0,
            core_width: 3.0,
            core_height: 2.5,
        }
    }
}

impl Transformer {
    pub fn new(primary_turns: u32, secondary_turns: u32, peak_current: f64, frequency: f64) -> Self {
        Transformer {
            primary_turns: primary_turns.max(1),
            secondary_turns: secondary_turns.max(1),
            peak_current,
            frequency,
            ..Default::default()
        }
    }

    pub fn primary_turns(&self) -> u32 {
        self.primary_turns
    }

    pub fn secondary_turns(&self) -> u32 {
        self.secondary_turns
    }

    pub fn set_turns(&mut self, primary_turns: u32, secondary_turns: u32) {
        self.primary_turns = primary_turns.max(1);
        self.secondary_turns = secondary_turns.max(1);
    }

    pub fn angular_frequency(&self) -> f64 {
        2.0 * PI * self.frequency
    }

    /// Primary current at time `t` seconds.
    pub fn primary_current(&self, t: f64) -> f64 {
        self.peak_current * (self.angular_frequency() * t).sin()
    }

    /// Secondary to primary turns ratio.
    pub fn turns_ratio(&self) -> f64 {
        self.secondary_turns as f64 / self.primary_turns as f64
    }

    /// Secondary current of an ideal transformer at time `t`.
    pub fn secondary_current(&self, t: f64) -> f64 {
        self.primary_current(t) / self.turns_ratio()
    }

    /// Secondary voltage of an ideal transformer for the given primary voltage.
    pub fn secondary_voltage(&self, primary_voltage: f64) -> f64 {
        primary_voltage * self.turns_ratio()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_ideal_transformer() {
        let transformer = Transformer::default();
        assert_approx_eq!(transformer.turns_ratio(), 0.5);
        assert_approx_eq!(transformer.secondary_voltage(230.0), 115.0);
        assert_approx_eq!(transformer.primary_current(0.25), 1.0);
        assert_approx_eq!(transformer.secondary_current(0.25), 2.0);
    }

    #[test]
    fn test_turns_are_at_least_one() {
        let mut transformer = Transformer::new(0, 0, 1.0, 1.0);
        assert_eq!(transformer.primary_turns(), 1);
        assert_eq!(transformer.secondary_turns(), 1);
        assert_approx_eq!(transformer.turns_ratio(), 1.0);

        transformer.set_turns(200, 0);
        assert_eq!(transformer.primary_turns(), 200);
        assert_eq!(transformer.secondary_turns(), 1);
        assert_approx_eq!(transformer.turns_ratio(), 0.005);
    }
}

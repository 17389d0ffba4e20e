//! Simulation clock.

use specs::{ReadExpect, System, Write};

/// Tracks the number of ticks processed.
#[derive(Default, Debug)]
pub struct Step {
    pub n: u64,
}

/// Duration of the current tick, set by the host each frame.
pub struct Timestep {
    /// Duration of the tick, in seconds.
    pub delta: f64,
}
impl Default for Timestep {
    fn default() -> Self {
        Timestep { delta: 1.0 / 60.0 }
    }
}

/// Time elapsed since the active experiment started, in seconds.
#[derive(Default, Debug)]
pub struct Clock {
    pub elapsed: f64,
}

/// Advances [Step] and [Clock] at the start of each tick.
pub struct AdvanceClockSystem;
impl<'a> System<'a> for AdvanceClockSystem {
    type SystemData = (ReadExpect<'a, Timestep>, Write<'a, Step>, Write<'a, Clock>);

    fn run(&mut self, (timestep, mut step, mut clock): Self::SystemData) {
        step.n += 1;
        clock.elapsed += timestep.delta;
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use specs::{DispatcherBuilder, World, WorldExt};

    #[test]
    fn test_clock_advances() {
        let mut test_world = World::new();
        let mut dispatcher = DispatcherBuilder::new()
            .with(AdvanceClockSystem, "clock", &[])
            .build();
        dispatcher.setup(&mut test_world);
        test_world.insert(Timestep { delta: 0.1 });

        for _ in 0..10 {
            dispatcher.dispatch(&test_world);
        }
        assert_eq!(test_world.read_resource::<Step>().n, 10);
        assert_approx_eq!(test_world.read_resource::<Clock>().elapsed, 1.0);
    }
}

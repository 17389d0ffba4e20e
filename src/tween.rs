//! Keyframed tweens of component values.
//!
//! A tween is characterised by the values a component should take at different keyframes,
//! measured in seconds from the moment the tween was attached. The component is linearly
//! interpolated between these values as ticks elapse. Once the last keyframe is passed the
//! component holds the final value, the tween is removed and the entity is reported in
//! [CompletedTweens].
//!
//! To tween a component `T`, add a `Tween<T>` to the entity and make sure a
//! `TweenUpdateSystem<T>` is in the dispatcher.
//!
//! Only components which implement the `Lerp` trait can be tweened.
//! You can either explicitly implement this trait for your types, or use `#[derive(Clone, Lerp)]`.
//! The derive is crude, and assumes:
//!   * The struct implements `Clone`.
//!   * The fields can all be multiplied by an f64 and added.

use specs::prelude::*;

use crate::integrator::Timestep;
use std::marker::PhantomData;

pub use emlab_lerp_derive::Lerp;

pub trait Lerp<T> {
    /// Linearly interpolates from self to b by the given amount (in range 0 to 1).
    fn lerp(&self, b: &T, amount: f64) -> Self;
}

impl Lerp<f64> for f64 {
    fn lerp(&self, b: &f64, amount: f64) -> Self {
        self * (1.0 - amount) + b * amount
    }
}

pub struct Tween<T>
where
    T: Lerp<T> + Component + Clone,
{
    /// Paired list of times and values to have at each time.
    pub keyframes: Vec<(f64, T)>,
    /// prev keyframe in the keyframe list.
    prev: usize,
    /// Seconds since the tween was attached.
    elapsed: f64,
}

impl<T> Tween<T>
where
    T: Lerp<T> + Component + Clone,
{
    /// Creates a tween. Keyframes must be sorted by time and non-empty.
    pub fn new(keyframes: Vec<(f64, T)>) -> Self {
        Tween {
            keyframes,
            prev: 0,
            elapsed: 0.0,
        }
    }

    /// A tween from `from` to `to` over `duration` seconds.
    pub fn between(from: T, to: T, duration: f64) -> Self {
        Tween::new(vec![(0.0, from), (duration.max(0.0), to)])
    }

    pub fn get_value(&mut self, current_time: f64) -> T {
        // a large tick may step over several keyframes
        while !self.at_end() && current_time > self.keyframes[self.prev + 1].0 {
            self.prev += 1;
        }
        if self.at_end() {
            let (_, last) = &self.keyframes[self.prev];
            return last.clone();
        }

        let (t1, val_a) = &self.keyframes[self.prev];
        let (t2, val_b) = &self.keyframes[self.prev + 1];
        let span = t2 - t1;
        let amount = if span > 0.0 {
            ((current_time - t1) / span).max(0.0).min(1.0)
        } else {
            1.0
        };
        val_a.lerp(val_b, amount)
    }

    /// Advances the tween by `dt` seconds and returns the value for the new time.
    pub fn advance(&mut self, dt: f64) -> T {
        self.elapsed += dt;
        self.get_value(self.elapsed)
    }

    pub fn is_complete(&self) -> bool {
        match self.keyframes.last() {
            Some((end, _)) => self.elapsed >= *end,
            None => true,
        }
    }

    fn at_end(&self) -> bool {
        self.prev + 1 >= self.keyframes.len()
    }
}

impl<T> Component for Tween<T>
where
    T: Lerp<T> + Component + Sync + Send + Clone,
{
    type Storage = HashMapStorage<Self>;
}

/// Entities whose tween finished during the current tick.
#[derive(Default)]
pub struct CompletedTweens {
    pub entities: Vec<Entity>,
}

pub struct TweenUpdateSystem<T>
where
    T: Component,
    T: Lerp<T>,
{
    tweened: PhantomData<T>,
}

impl<T> Default for TweenUpdateSystem<T>
where
    T: Component,
    T: Lerp<T>,
{
    fn default() -> Self {
        Self {
            tweened: PhantomData,
        }
    }
}

impl<'a, T> System<'a> for TweenUpdateSystem<T>
where
    T: Lerp<T> + Component + Sync + Send + Clone,
{
    type SystemData = (
        Entities<'a>,
        WriteStorage<'a, T>,
        WriteStorage<'a, Tween<T>>,
        ReadExpect<'a, Timestep>,
        Write<'a, CompletedTweens>,
    );

    fn run(&mut self, (entities, mut comps, mut tweens, timestep, mut completed): Self::SystemData) {
        let mut finished = Vec::new();
        for (entity, tween, comp) in (&entities, &mut tweens, &mut comps).join() {
            comp.clone_from(&tween.advance(timestep.delta));
            if tween.is_complete() {
                finished.push(entity);
            }
        }
        for entity in finished {
            tweens.remove(entity);
            completed.entities.push(entity);
        }
    }
}

/// Brief emphasis applied to a picked-up source.
#[derive(Clone, Debug, Default, Lerp)]
pub struct Highlight {
    pub intensity: f64,
}
impl Component for Highlight {
    type Storage = HashMapStorage<Self>;
}
impl Highlight {
    pub fn pulse() -> Tween<Highlight> {
        Tween::new(vec![
            (0.0, Highlight { intensity: 0.0 }),
            (0.15, Highlight { intensity: 1.0 }),
            (0.3, Highlight { intensity: 0.0 }),
        ])
    }
}

/// Angular jitter added to a pegged galvanometer needle, in radians.
#[derive(Clone, Debug, Default, Lerp)]
pub struct NeedleShake {
    pub offset: f64,
}
impl Component for NeedleShake {
    type Storage = HashMapStorage<Self>;
}
impl NeedleShake {
    pub fn shake() -> Tween<NeedleShake> {
        Tween::new(vec![
            (0.0, NeedleShake { offset: 0.0 }),
            (0.05, NeedleShake { offset: 0.05 }),
            (0.1, NeedleShake { offset: -0.05 }),
            (0.15, NeedleShake { offset: 0.0 }),
        ])
    }
}

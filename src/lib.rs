#[macro_use]
extern crate specs_derive;
pub mod arrows;
pub mod configuration;
pub mod constant;
pub mod couplers;
pub mod destructor;
pub mod drag;
pub mod error;
pub mod experiment;
pub mod host;
pub mod integrator;
pub mod magnetic;
pub mod maths;
pub mod pose;
pub mod readout;
pub mod rebuild;
pub mod sandbox;
pub mod simulation;
pub mod slider;
pub mod source;
pub mod tracer;
pub mod tween;

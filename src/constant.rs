//! Numerical constants shared by the field model, tracer and couplers.
//!
//! Fields in this crate are indicative strengths rather than Tesla; only their direction
//! and monotonic magnitude carry meaning.

/// Mathematical constant pi
pub const PI: f64 = std::f64::consts::PI;

/// Lower bound applied to distances from a point pole.
pub const POLE_CLAMP: f64 = 0.1;

/// Field magnitudes below this are treated as a null point by the tracer.
pub const DEGENERATE_FIELD: f64 = 1e-4;

/// Factor applied to `|current| * turns` for the uniform field inside a solenoid.
pub const SOLENOID_INTERIOR_GAIN: f64 = 0.1;

/// Factor applied to `current * turns` for the end poles of a solenoid.
pub const SOLENOID_POLE_GAIN: f64 = 0.02;

/// Solenoids carrying less than this current are not seeded by the tracer.
pub const SOLENOID_MIN_TRACE_CURRENT: f64 = 0.1;

/// Flow arrows advance by this fraction of their line per tick, scaled by speed.
pub const FLOW_STEP: f64 = 0.005;

/// Reference frequency for the cooktop heat rate, Hz.
pub const COOKTOP_REFERENCE_FREQUENCY: f64 = 50_000.0;

/// Ambient temperature, degrees Celsius.
pub const AMBIENT_TEMPERATURE: f64 = 20.0;

/// Host persistence key for saved sandbox configurations.
pub const SANDBOX_STORAGE_KEY: &str = "emlab-configs";

//! Error types.
//!
//! `EmLabError` is returned to the host from configuration loading and sandbox persistence.
//! `FieldAnomaly` names the conditions the visualization engine recovers from locally;
//! they are logged and never propagated.

use nalgebra::Vector3;
use specs::Entity;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmLabError {
    #[error("could not read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("malformed saved configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown source type `{0}`")]
    UnknownSourceType(String),
    #[error("unknown slider `{0}`")]
    UnknownSlider(String),
}

/// Recoverable conditions met while computing field artifacts.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FieldAnomaly {
    #[error("field magnitude vanished at {point:?}, streamline terminated")]
    DegenerateFieldPoint { point: Vector3<f64> },
    #[error("point within {distance} of a pole, distance clamped")]
    SingularPole { distance: f64 },
    #[error("bar magnet without pole metadata, poles synthesized from length {length}")]
    MissingPoleMetadata { length: f64 },
    #[error("flow arrow {entity:?} lost its streamline and was destroyed")]
    OrphanGlyph { entity: Entity },
    #[error("rebuild requested with no active sources")]
    NoActiveSources,
}

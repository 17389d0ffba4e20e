//! Tunable parameters of the visualization engine.
//!
//! Every value has a default, so a configuration file only needs the keys it changes.
//!
//! ```yaml
//! tracer:
//!   numLines: 16
//! lenz:
//!   tubeDamping: 0.9
//! ```

use crate::arrows::grid::GridArrowOptions;
use crate::arrows::FlowOptions;
use crate::couplers::compass::CompassOptions;
use crate::couplers::cooktop::CooktopOptions;
use crate::couplers::induction::InductionOptions;
use crate::couplers::lenz::LenzOptions;
use crate::couplers::transformer::TransformerOptions;
use crate::couplers::wireless::WirelessOptions;
use crate::error::EmLabError;
use crate::tracer::TracerOptions;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct EmLabConfiguration {
    pub tracer: TracerOptions,
    pub grid: GridArrowOptions,
    pub flow: FlowOptions,
    pub compass: CompassOptions,
    pub induction: InductionOptions,
    pub lenz: LenzOptions,
    pub transformer: TransformerOptions,
    pub wireless: WirelessOptions,
    pub cooktop: CooktopOptions,
}

impl EmLabConfiguration {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, EmLabError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, EmLabError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = EmLabConfiguration::from_yaml_str(
            "tracer:\n  numLines: 16\nlenz:\n  tubeDamping: 0.9\n",
        )
        .expect("valid configuration");
        assert_eq!(config.tracer.num_lines, 16);
        assert_eq!(config.tracer.max_steps, 200);
        assert_approx_eq!(config.lenz.tube_damping, 0.9);
        assert_approx_eq!(config.lenz.gravity, 0.5);
        assert_approx_eq!(config.wireless.falloff, 2.5);
    }

    #[test]
    fn test_malformed_yaml() {
        let result = EmLabConfiguration::from_yaml_str("tracer: [1, 2");
        assert!(matches!(result, Err(EmLabError::Yaml(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = EmLabConfiguration::from_yaml_file("/nonexistent/emlab.yaml");
        assert!(matches!(result, Err(EmLabError::Io(_))));
    }
}

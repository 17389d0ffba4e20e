//! Saving and restoring the sandbox's sources.
//!
//! The sources are stored as a JSON array under [SANDBOX_STORAGE_KEY], one entry per source:
//!
//! ```json
//! [{"type": "barMagnet",
//!   "position": {"x": 1.0, "y": 0.0, "z": 0.0},
//!   "rotation": {"x": 0.0, "y": 0.0, "z": 0.0},
//!   "userData": {"strength": 1.0}}]
//! ```
//!
//! Rotations are Euler angles (roll, pitch, yaw) in radians.

use crate::constant::SANDBOX_STORAGE_KEY;
use crate::drag::{DragConstraint, Draggable};
use crate::error::EmLabError;
use crate::host::KeyValueStore;
use crate::magnetic::bar_magnet::BarMagnet;
use crate::magnetic::solenoid::{CurrentDirection, Solenoid};
use crate::magnetic::transformer::Transformer;
use crate::pose::Pose;
use crate::source::{despawn_source, spawn_source, Source, SourceRegistry};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use specs::prelude::*;

/// Half side of the square restored sources can be dragged within.
const DRAG_HALF_EXTENT: f64 = 8.0;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SavedVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<Vector3<f64>> for SavedVector {
    fn from(v: Vector3<f64>) -> Self {
        SavedVector {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SavedUserData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    /// Signed current, direction folded in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turns: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SavedSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub position: SavedVector,
    pub rotation: SavedVector,
    #[serde(rename = "userData", default)]
    pub user_data: SavedUserData,
}

impl SavedSource {
    pub fn encode(pose: &Pose, source: &Source) -> Self {
        let (roll, pitch, yaw) = pose.orientation.euler_angles();
        let user_data = match source {
            Source::BarMagnet(magnet) => SavedUserData {
                strength: Some(magnet.strength),
                ..Default::default()
            },
            Source::Solenoid(solenoid) => SavedUserData {
                current: Some(solenoid.signed_current()),
                turns: Some(solenoid.turns()),
                ..Default::default()
            },
            Source::Transformer(_) => SavedUserData::default(),
        };
        SavedSource {
            kind: source.kind_name().to_string(),
            position: pose.position.into(),
            rotation: SavedVector {
                x: roll,
                y: pitch,
                z: yaw,
            },
            user_data,
        }
    }

    pub fn decode(&self) -> Result<(Pose, Source), EmLabError> {
        let source = match self.kind.as_str() {
            "barMagnet" => {
                let mut magnet = BarMagnet::default();
                if let Some(strength) = self.user_data.strength {
                    magnet.strength = strength;
                }
                Source::BarMagnet(magnet)
            }
            "solenoid" => {
                let mut solenoid = Solenoid::default();
                if let Some(current) = self.user_data.current {
                    solenoid.current = current.abs();
                    solenoid.current_direction = CurrentDirection::from_sign(current);
                }
                if let Some(turns) = self.user_data.turns {
                    solenoid.set_turns(turns);
                }
                Source::Solenoid(solenoid)
            }
            "transformer" => Source::Transformer(Transformer::default()),
            other => return Err(EmLabError::UnknownSourceType(other.to_string())),
        };
        let pose = Pose::new(
            Vector3::new(self.position.x, self.position.y, self.position.z),
            UnitQuaternion::from_euler_angles(self.rotation.x, self.rotation.y, self.rotation.z),
        );
        Ok((pose, source))
    }
}

/// The registered sources, in registry order.
pub fn encode_sources(world: &World) -> Vec<SavedSource> {
    let registry = world.read_resource::<SourceRegistry>();
    let poses = world.read_storage::<Pose>();
    let sources = world.read_storage::<Source>();
    registry
        .views(&poses, &sources)
        .iter()
        .map(|view| SavedSource::encode(view.pose, view.source))
        .collect()
}

/// Writes the registered sources to `store`. Returns the number saved.
pub fn save_sandbox(world: &World, store: &mut dyn KeyValueStore) -> Result<usize, EmLabError> {
    let saved = encode_sources(world);
    store.set(SANDBOX_STORAGE_KEY, serde_json::to_string(&saved)?);
    tracing::debug!(sources = saved.len(), "sandbox saved");
    Ok(saved.len())
}

/// Replaces the registered sources with those saved in `store`. Returns the number restored.
///
/// Nothing changes when the store holds no sandbox, or when any entry fails to decode.
pub fn load_sandbox(world: &mut World, store: &dyn KeyValueStore) -> Result<usize, EmLabError> {
    let json = match store.get(SANDBOX_STORAGE_KEY) {
        Some(json) => json,
        None => return Ok(0),
    };
    let saved: Vec<SavedSource> = serde_json::from_str(&json)?;
    let decoded = saved
        .iter()
        .map(SavedSource::decode)
        .collect::<Result<Vec<_>, _>>()?;

    let existing: Vec<Entity> = world.read_resource::<SourceRegistry>().list().to_vec();
    for entity in existing {
        despawn_source(world, entity);
    }
    for (pose, source) in decoded.iter().cloned() {
        let entity = spawn_source(world, pose, source);
        if let Err(err) = world.write_storage::<Draggable>().insert(
            entity,
            Draggable {
                constraint: DragConstraint::horizontal(DRAG_HALF_EXTENT),
            },
        ) {
            tracing::warn!(?entity, %err, "restored source is not draggable");
        }
    }
    tracing::debug!(sources = decoded.len(), "sandbox loaded");
    Ok(decoded.len())
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::host::MemoryStore;

    #[test]
    fn test_entry_format() {
        let pose = Pose::at(Vector3::new(1.0, 2.0, 3.0));
        let saved = SavedSource::encode(&pose, &Source::BarMagnet(BarMagnet::default()));
        let json = serde_json::to_value(&saved).expect("serializable");
        assert_eq!(json["type"], "barMagnet");
        assert_eq!(json["position"]["y"], 2.0);
        assert_eq!(json["rotation"]["z"], 0.0);
        assert_eq!(json["userData"]["strength"], 1.0);
        assert!(json["userData"].get("turns").is_none());
    }

    #[test]
    fn test_decode_without_user_data() {
        let saved: SavedSource = serde_json::from_str(
            r#"{"type":"solenoid","position":{"x":0,"y":1,"z":0},"rotation":{"x":0,"y":0,"z":0}}"#,
        )
        .expect("valid entry");
        let (pose, source) = saved.decode().expect("known type");
        assert_eq!(pose.position, Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(source, Source::Solenoid(Solenoid::default()));
    }

    #[test]
    fn test_unknown_type_leaves_sources_untouched() {
        let mut world = World::new();
        crate::simulation::register_components(&mut world);
        crate::simulation::register_resources(&mut world);
        let magnet = spawn_source(
            &mut world,
            Pose::default(),
            Source::BarMagnet(BarMagnet::default()),
        );
        let mut store = MemoryStore::default();
        store.set(
            SANDBOX_STORAGE_KEY,
            r#"[{"type":"horseshoe","position":{"x":0,"y":0,"z":0},"rotation":{"x":0,"y":0,"z":0}}]"#
                .to_string(),
        );

        let result = load_sandbox(&mut world, &store);
        assert!(matches!(result, Err(EmLabError::UnknownSourceType(kind)) if kind == "horseshoe"));
        assert_eq!(world.read_resource::<SourceRegistry>().list(), &[magnet]);
    }

    #[test]
    fn test_empty_store() {
        let mut world = World::new();
        crate::simulation::register_components(&mut world);
        crate::simulation::register_resources(&mut world);
        assert_eq!(load_sandbox(&mut world, &MemoryStore::default()).ok(), Some(0));
    }
}

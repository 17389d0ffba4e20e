//! Capabilities the engine consumes from its host application.
//!
//! The host owns the scene graph, input dispatch and local persistence. The engine only
//! needs to add and remove visual nodes, and to read and write a few string keys.

use crate::arrows::LineId;
use specs::Entity;
use std::collections::{HashMap, HashSet};

/// A visual the engine asks the host to show or hide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneNode {
    Streamline(LineId),
    FlowArrow(Entity),
    /// The batch of static grid arrows.
    GridArrows,
    FluxLoops(Entity),
    OpposingRing(Entity),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneCommand {
    Add(SceneNode),
    Remove(SceneNode),
}

/// The host scene graph. Adding a node twice must be harmless.
pub trait Scene {
    fn add(&mut self, node: SceneNode);
    fn remove(&mut self, node: SceneNode);
}

/// Scene commands queued during a tick, flushed to the host once the tick is complete.
#[derive(Default, Debug)]
pub struct SceneCommands {
    queue: Vec<SceneCommand>,
}

impl SceneCommands {
    pub fn add(&mut self, node: SceneNode) {
        self.queue.push(SceneCommand::Add(node));
    }

    pub fn remove(&mut self, node: SceneNode) {
        self.queue.push(SceneCommand::Remove(node));
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Delivers every queued command to `scene`, in order.
    pub fn flush(&mut self, scene: &mut dyn Scene) {
        for command in self.queue.drain(..) {
            match command {
                SceneCommand::Add(node) => scene.add(node),
                SceneCommand::Remove(node) => scene.remove(node),
            }
        }
    }
}

/// A scene that only tracks which nodes are live.
#[derive(Default, Debug)]
pub struct NodeSet {
    pub live: HashSet<SceneNode>,
}

impl NodeSet {
    pub fn count_streamlines(&self) -> usize {
        self.live
            .iter()
            .filter(|node| matches!(node, SceneNode::Streamline(_)))
            .count()
    }

    pub fn count_flow_arrows(&self) -> usize {
        self.live
            .iter()
            .filter(|node| matches!(node, SceneNode::FlowArrow(_)))
            .count()
    }
}

impl Scene for NodeSet {
    fn add(&mut self, node: SceneNode) {
        self.live.insert(node);
    }

    fn remove(&mut self, node: SceneNode) {
        self.live.remove(&node);
    }
}

/// String-keyed local persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

#[derive(Default, Debug, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

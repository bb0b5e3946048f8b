// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene interface consumed by steps.
//!
//! The orchestrator does not own entities or systems. Hosts expose the few
//! operations steps need through [`Scene`]; [`InMemoryScene`] is a
//! self-contained implementation for headless runs and tests.

use crate::event::EventPayload;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use uuid::Uuid;

/// Entity ID in the host scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Spatial transform of an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position (x, y, z)
    pub position: [f32; 3],
    /// Rotation quaternion (x, y, z, w)
    pub rotation: [f32; 4],
    /// Scale (x, y, z)
    pub scale: [f32; 3],
}

impl Transform {
    /// Identity transform placed at a position
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0, 1.0, 1.0],
        }
    }
}

/// Command delivered to a named scene system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemCommand {
    /// Action name understood by the system
    pub action: String,
    /// Action argument
    pub payload: EventPayload,
}

impl SystemCommand {
    /// Create a command without a payload
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            payload: EventPayload::None,
        }
    }

    /// Attach a payload
    pub fn with_payload(mut self, payload: EventPayload) -> Self {
        self.payload = payload;
        self
    }
}

/// Host scene operations available to steps, guards and validators
pub trait Scene {
    /// Check whether a named system is available
    fn has_system(&self, system: &str) -> bool;

    /// Check whether an entity exists
    fn has_entity(&self, entity: EntityId) -> bool;

    /// Deliver a command to a named system. Returns false when the system is
    /// missing or rejects the command.
    fn invoke(&self, system: &str, command: &SystemCommand) -> bool;

    /// Enable or disable a component. Returns false when the entity or
    /// component is unknown.
    fn set_component_enabled(&self, entity: EntityId, component: &str, enabled: bool) -> bool;

    /// Read an entity transform
    fn transform(&self, entity: EntityId) -> Option<Transform>;

    /// Write an entity transform. Returns false when the entity is unknown.
    fn set_transform(&self, entity: EntityId, transform: Transform) -> bool;
}

/// Entity stored in an [`InMemoryScene`]
#[derive(Debug, Clone, Default)]
struct SceneEntity {
    transform: Transform,
    components: IndexMap<String, bool>,
}

/// Scene kept entirely in memory.
///
/// Systems record every command they receive so callers can inspect them.
#[derive(Debug, Default)]
pub struct InMemoryScene {
    systems: RefCell<IndexMap<String, Vec<SystemCommand>>>,
    entities: RefCell<HashMap<EntityId, SceneEntity>>,
}

impl InMemoryScene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named system
    pub fn add_system(&self, system: impl Into<String>) {
        self.systems.borrow_mut().entry(system.into()).or_default();
    }

    /// Commands received by a system, oldest first
    pub fn received(&self, system: &str) -> Vec<SystemCommand> {
        self.systems
            .borrow()
            .get(system)
            .cloned()
            .unwrap_or_default()
    }

    /// Spawn an entity with a transform
    pub fn spawn(&self, transform: Transform) -> EntityId {
        let id = EntityId::new();
        self.entities.borrow_mut().insert(
            id,
            SceneEntity {
                transform,
                components: IndexMap::new(),
            },
        );
        id
    }

    /// Remove an entity. Returns false when it was not present.
    pub fn despawn(&self, entity: EntityId) -> bool {
        self.entities.borrow_mut().remove(&entity).is_some()
    }

    /// Attach a component to an entity
    pub fn add_component(
        &self,
        entity: EntityId,
        component: impl Into<String>,
        enabled: bool,
    ) -> bool {
        match self.entities.borrow_mut().get_mut(&entity) {
            Some(e) => {
                e.components.insert(component.into(), enabled);
                true
            }
            None => false,
        }
    }

    /// Enabled state of a component, if present
    pub fn component_enabled(&self, entity: EntityId, component: &str) -> Option<bool> {
        self.entities
            .borrow()
            .get(&entity)
            .and_then(|e| e.components.get(component).copied())
    }

    /// Get entity count
    pub fn entity_count(&self) -> usize {
        self.entities.borrow().len()
    }
}

impl Scene for InMemoryScene {
    fn has_system(&self, system: &str) -> bool {
        self.systems.borrow().contains_key(system)
    }

    fn has_entity(&self, entity: EntityId) -> bool {
        self.entities.borrow().contains_key(&entity)
    }

    fn invoke(&self, system: &str, command: &SystemCommand) -> bool {
        match self.systems.borrow_mut().get_mut(system) {
            Some(log) => {
                log.push(command.clone());
                true
            }
            None => false,
        }
    }

    fn set_component_enabled(&self, entity: EntityId, component: &str, enabled: bool) -> bool {
        let mut entities = self.entities.borrow_mut();
        let Some(slot) = entities
            .get_mut(&entity)
            .and_then(|e| e.components.get_mut(component))
        else {
            return false;
        };
        *slot = enabled;
        true
    }

    fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.entities.borrow().get(&entity).map(|e| e.transform)
    }

    fn set_transform(&self, entity: EntityId, transform: Transform) -> bool {
        match self.entities.borrow_mut().get_mut(&entity) {
            Some(e) => {
                e.transform = transform;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_commands_are_recorded() {
        let scene = InMemoryScene::new();
        scene.add_system("audio");

        assert!(scene.invoke("audio", &SystemCommand::new("play")));
        assert!(!scene.invoke("physics", &SystemCommand::new("step")));

        let received = scene.received("audio");
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].action, "play");
        assert!(scene.received("physics").is_empty());
    }

    #[test]
    fn test_component_toggle() {
        let scene = InMemoryScene::new();
        let door = scene.spawn(Transform::default());
        scene.add_component(door, "collider", true);

        assert!(scene.set_component_enabled(door, "collider", false));
        assert_eq!(scene.component_enabled(door, "collider"), Some(false));

        // Unknown component or entity is rejected
        assert!(!scene.set_component_enabled(door, "light", true));
        assert!(!scene.set_component_enabled(EntityId::new(), "collider", true));
    }
}

//! Scene graph - scenes partition actors; entrances link scenes.
//!
//! Actors in different scenes cannot see or reach each other. An entrance
//! lives on a tile of its `from_scene` and drops the user at `spawn` in its
//! `to_scene`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::DomainError;
use crate::value_objects::GridPos;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
}

impl Scene {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::validation("scene id cannot be empty"));
        }
        let name = name.into();
        let name = if name.trim().is_empty() { id.clone() } else { name };
        Ok(Self {
            id,
            name,
            description: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A one-way link from a tile in one scene to a spawn point in another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entrance {
    pub id: String,
    pub label: String,
    pub from_scene: String,
    pub to_scene: String,
    pub position: GridPos,
    pub spawn: GridPos,
}

/// Scenes and entrances of a story.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneGraph {
    scenes: BTreeMap<String, Scene>,
    entrances: Vec<Entrance>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scene(&mut self, scene: Scene) {
        self.scenes.insert(scene.id().to_string(), scene);
    }

    /// Register an entrance. Both ends must name known scenes and the id must
    /// be unique.
    pub fn add_entrance(&mut self, entrance: Entrance) -> Result<(), DomainError> {
        if entrance.id.trim().is_empty() {
            return Err(DomainError::validation("entrance id cannot be empty"));
        }
        for scene in [&entrance.from_scene, &entrance.to_scene] {
            if !self.scenes.contains_key(scene) {
                return Err(DomainError::not_found("Scene", scene.clone()));
            }
        }
        if self.entrances.iter().any(|e| e.id == entrance.id) {
            return Err(DomainError::constraint(format!(
                "duplicate entrance id '{}'",
                entrance.id
            )));
        }
        self.entrances.push(entrance);
        Ok(())
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values()
    }

    pub fn entrances(&self) -> &[Entrance] {
        &self.entrances
    }

    pub fn entrance(&self, id: &str) -> Option<&Entrance> {
        self.entrances.iter().find(|e| e.id == id)
    }

    /// Entrances leaving `scene`.
    pub fn entrances_from<'a>(&'a self, scene: &'a str) -> impl Iterator<Item = &'a Entrance> {
        self.entrances.iter().filter(move |e| e.from_scene == scene)
    }

    /// Find an entrance leaving `scene` by id or (case-insensitive) label.
    pub fn entrance_in_scene(&self, scene: &str, key: &str) -> Option<&Entrance> {
        let key = key.trim();
        let mut leaving = self.entrances.iter().filter(|e| e.from_scene == scene);
        leaving.clone().find(|e| e.id == key).or_else(|| {
            leaving.find(|e| e.label.eq_ignore_ascii_case(key))
        })
    }
}

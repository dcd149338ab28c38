//! Scene-scoped, read-only projections of the world.
//!
//! A view only ever contains actors sharing the viewer's scene, and
//! relations whose both ends are in that scene.

use serde::{Deserialize, Serialize};

use tabletale_domain::value_objects::{GridPos, ObjectiveStatus, TurnState};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneView {
    pub viewer: Option<String>,
    /// `None` when the viewer has no scene; the view is then empty
    pub scene_id: Option<String>,
    pub scene_name: Option<String>,
    pub version: u64,
    pub time_min: u32,
    /// "HH:MM"
    pub clock: String,
    pub weather: String,
    pub location: String,
    pub tension: u8,
    pub marks: Vec<String>,
    pub objectives: Vec<ObjectiveView>,
    pub actors: Vec<ActorView>,
    pub relations: Vec<RelationView>,
    pub entrances: Vec<EntranceView>,
    /// The viewer's remaining turn resources
    pub turn: Option<TurnState>,
    /// What the viewer can reach with each weapon held and power known
    pub reach: Vec<ReachPreview>,
}

impl SceneView {
    pub fn is_empty(&self) -> bool {
        self.scene_id.is_none()
    }

    pub fn actor(&self, name: &str) -> Option<&ActorView> {
        self.actors.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveView {
    pub name: String,
    pub status: ObjectiveStatus,
    pub position: Option<GridPos>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorView {
    pub name: String,
    pub position: Option<GridPos>,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub dying_turns_left: Option<u32>,
    pub dead: bool,
    pub participant: bool,
    pub cover: String,
    pub statuses: Vec<StatusView>,
    pub protectors: Vec<String>,
    pub inventory: Vec<(String, u32)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub name: String,
    /// "system" or "control"
    pub category: String,
    /// Turns left; `None` when indefinite
    pub remaining: Option<u32>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationView {
    pub from: String,
    pub to: String,
    pub score: i32,
    pub tier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntranceView {
    pub id: String,
    pub label: String,
    pub to_scene: String,
    pub position: GridPos,
    /// Steps from the viewer, when the viewer has a position
    pub distance: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReachKind {
    Weapon,
    Power,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReachPreview {
    pub kind: ReachKind,
    pub id: String,
    pub label: String,
    pub range_steps: u32,
    /// Targets in range, nearest first, ties by name
    pub targets: Vec<TargetInReach>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInReach {
    pub name: String,
    pub distance: u32,
}

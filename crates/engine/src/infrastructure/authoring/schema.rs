//! Serde shapes of the authoring files.
//!
//! These mirror the JSON on disk (snake_case keys) and are converted into
//! domain types by the loader. Weapon and power entries reject unknown
//! keys so a typo in a rules table fails loudly.

use std::collections::BTreeMap;

use serde::Deserialize;

use tabletale_domain::value_objects::{Characteristic, ObjectiveStatus, TimeSpec};
use tabletale_domain::entities::TimelineEventSpec;
use tabletale_domain::{Cover, EndingRule, GridPos};

/// A grid point written as `[x, y]`, `{"x": .., "y": ..}` or `"x,y"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PointSpec {
    Pair([i32; 2]),
    Object { x: i32, y: i32 },
    Text(String),
}

impl PointSpec {
    pub fn to_pos(&self) -> Option<GridPos> {
        match self {
            PointSpec::Pair([x, y]) => Some(GridPos::new(*x, *y)),
            PointSpec::Object { x, y } => Some(GridPos::new(*x, *y)),
            PointSpec::Text(text) => text.parse().ok(),
        }
    }
}

// =============================================================================
// story.json
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoryFile {
    pub title: Option<String>,
    pub location: Option<String>,
    pub weather: Option<String>,
    /// Start time, minutes or "HH:MM"
    pub time: Option<TimeSpec>,
    pub tension: Option<i32>,
    pub scenes: Vec<SceneSpec>,
    pub entrances: Vec<EntranceSpec>,
    /// Starting scene, tile and cover per actor
    pub placements: BTreeMap<String, PlacementSpec>,
    /// Defaults to every placed actor
    pub participants: Option<Vec<String>>,
    pub objectives: Vec<ObjectiveSpec>,
    pub marks: Vec<String>,
    pub events: Vec<TimelineEventSpec>,
    pub endings: Vec<EndingRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntranceSpec {
    pub id: String,
    pub label: String,
    pub from_scene: String,
    pub to_scene: String,
    pub position: PointSpec,
    pub spawn: PointSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacementSpec {
    #[serde(default)]
    pub scene: Option<String>,
    pub position: PointSpec,
    #[serde(default)]
    pub cover: Option<Cover>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ObjectiveSpec {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        position: Option<PointSpec>,
        #[serde(default)]
        status: Option<ObjectiveStatus>,
    },
}

// =============================================================================
// characters.json
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CharactersFile {
    pub characters: BTreeMap<String, CharacterSpec>,
    /// Directed scores: `relations[a][b]` is how `a` regards `b`
    pub relations: BTreeMap<String, BTreeMap<String, i32>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CharacterSpec {
    pub characteristics: BTreeMap<Characteristic, i32>,
    pub skills: BTreeMap<String, i32>,
    /// Current HP; defaults to the derived maximum
    pub hp: Option<i32>,
    pub mp: Option<i32>,
    pub move_speed: Option<u32>,
    pub physical_armor: i32,
    pub arts_barrier: i32,
    pub arts_resist: Option<i32>,
    pub powers: Vec<String>,
    pub inventory: BTreeMap<String, u32>,
}

// =============================================================================
// weapons.json / powers.json
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeaponSpec {
    pub label: String,
    pub reach_steps: u32,
    pub skill: String,
    pub defense_skill: String,
    pub damage: String,
    #[serde(default)]
    pub damage_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PowerSpec {
    pub label: String,
    pub cast_skill: String,
    pub resist: String,
    #[serde(default = "default_range")]
    pub range_steps: u32,
    #[serde(default)]
    pub damage_type: Option<String>,
    #[serde(default)]
    pub mp: Option<MpSpec>,
    #[serde(default)]
    pub damage: Option<String>,
    #[serde(default)]
    pub heal: Option<String>,
    #[serde(default)]
    pub control: Option<ControlSpecFile>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_range() -> u32 {
    6
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MpSpec {
    #[serde(default)]
    pub cost: u32,
    #[serde(default)]
    pub variable: bool,
    /// 0 or absent: capped only by current MP
    #[serde(default)]
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlSpecFile {
    pub effect: String,
    #[serde(default)]
    pub duration: Option<DurationSpec>,
}

/// Control duration: a bare number or a dice-free formula.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationSpec {
    Turns(u32),
    Formula(String),
}

impl DurationSpec {
    pub fn source(&self) -> String {
        match self {
            DurationSpec::Turns(n) => n.to_string(),
            DurationSpec::Formula(text) => text.clone(),
        }
    }
}

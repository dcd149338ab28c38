//! Domain entities - static definitions loaded once per run

mod character_sheet;
mod ending;
mod power;
mod scene;
mod timeline;
mod weapon;

pub use character_sheet::{
    default_skill_value, CharacterSheet, Mitigation, DEFAULT_ARTS_RESIST, DEFAULT_DYING_TURNS,
};
pub use ending::{order_by_priority, EndingOutcome, EndingRule, EndingVerdict};
pub use power::{ControlSpec, PowerCost, PowerDef, TAG_GUARD_INTERCEPT, TAG_LINE_OF_SIGHT};
pub use scene::{Entrance, Scene, SceneGraph};
pub use timeline::{EventEffect, Timeline, TimelineEvent, TimelineEventSpec};
pub use weapon::{DamageType, WeaponDef};

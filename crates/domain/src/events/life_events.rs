//! Life-state events
//!
//! These enums communicate what happened when hit points or the dying
//! countdown changed, allowing callers to narrate and log appropriately.

use serde::{Deserialize, Serialize};

/// Outcome of applying damage to an actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum DamageOutcome {
    /// Actor was already dead, no effect
    AlreadyDead,
    /// Actor took damage and is still standing
    Wounded { damage_dealt: i32, remaining_hp: i32 },
    /// HP reached zero; the dying countdown started
    Downed { damage_dealt: i32, turns_left: u32 },
    /// Actor was hit while dying and died
    Killed { damage_dealt: i32 },
}

impl DamageOutcome {
    pub fn damage_dealt(&self) -> i32 {
        match self {
            DamageOutcome::AlreadyDead => 0,
            DamageOutcome::Wounded { damage_dealt, .. }
            | DamageOutcome::Downed { damage_dealt, .. }
            | DamageOutcome::Killed { damage_dealt } => *damage_dealt,
        }
    }

    pub fn is_killed(&self) -> bool {
        matches!(self, DamageOutcome::Killed { .. })
    }
}

/// Outcome of healing an actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum HealOutcome {
    /// Actor is dead, cannot heal
    Dead,
    /// Already at max HP and not dying
    AlreadyFull,
    /// Healing applied
    Healed { amount_healed: i32, new_hp: i32 },
    /// Healing lifted the actor out of the dying state
    Stabilized { new_hp: i32 },
}

/// Outcome of successful first aid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum FirstAidOutcome {
    Stabilized { new_hp: i32 },
    Healed { new_hp: i32 },
    /// This wound was already treated
    AlreadyTreated,
    /// Target is unhurt (or dead)
    NothingToDo,
}

/// What happened at the end of an actor's turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnEndReport {
    /// Control statuses that ran out
    pub expired: Vec<String>,
    /// Remaining dying turns, if still dying
    pub dying_turns_left: Option<u32>,
    /// The dying countdown ran out this tick
    pub died: bool,
}

//! Per-round action economy for one actor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A spendable once-per-round resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnResource {
    Action,
    Bonus,
    Reaction,
}

impl TurnResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnResource::Action => "action",
            TurnResource::Bonus => "bonus",
            TurnResource::Reaction => "reaction",
        }
    }
}

impl fmt::Display for TurnResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Budget an actor has left this round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnState {
    pub action_used: bool,
    pub bonus_used: bool,
    pub reaction_available: bool,
    pub move_left: u32,
    /// A readied action description, cleared at turn start
    pub readied: Option<String>,
}

impl TurnState {
    /// A fresh budget with `speed` steps of movement.
    pub fn fresh(speed: u32) -> Self {
        Self {
            action_used: false,
            bonus_used: false,
            reaction_available: true,
            move_left: speed,
            readied: None,
        }
    }

    pub fn is_available(&self, resource: TurnResource) -> bool {
        match resource {
            TurnResource::Action => !self.action_used,
            TurnResource::Bonus => !self.bonus_used,
            TurnResource::Reaction => self.reaction_available,
        }
    }

    /// Mark a resource spent. Returns `false` if it was already spent.
    pub fn spend(&mut self, resource: TurnResource) -> bool {
        if !self.is_available(resource) {
            return false;
        }
        match resource {
            TurnResource::Action => self.action_used = true,
            TurnResource::Bonus => self.bonus_used = true,
            TurnResource::Reaction => self.reaction_available = false,
        }
        true
    }
}

//! Status effects and the action-blocking rule table.
//!
//! System statuses (dying, dead) are owned by the engine's life-state machine.
//! Control statuses come from power effects and carry a block set consulted
//! before every mutating action.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kinds of action the blocking rules distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Move,
    Attack,
    Cast,
    Dash,
    Disengage,
    /// Any other standard action
    Action,
    FirstAid,
    Guard,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Move => "move",
            ActionKind::Attack => "attack",
            ActionKind::Cast => "cast",
            ActionKind::Dash => "dash",
            ActionKind::Disengage => "disengage",
            ActionKind::Action => "action",
            ActionKind::FirstAid => "first_aid",
            ActionKind::Guard => "guard",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a control status prevents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSet {
    Nothing,
    All,
    Only(&'static [ActionKind]),
}

impl BlockSet {
    /// An explicit entry blocks that action; an `Action` entry blocks every
    /// kind except movement.
    pub fn blocks(&self, action: ActionKind) -> bool {
        match self {
            BlockSet::Nothing => false,
            BlockSet::All => true,
            BlockSet::Only(kinds) => {
                kinds.contains(&action)
                    || (action != ActionKind::Move && kinds.contains(&ActionKind::Action))
            }
        }
    }
}

/// A control effect inflicted by a power.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ControlEffect {
    Stunned,
    Paralyzed,
    Sleep,
    Frozen,
    Silenced,
    Rooted,
    Immobilized,
    Restrained,
    /// Narrative effect with no mechanical block
    Custom(String),
}

impl ControlEffect {
    pub fn name(&self) -> &str {
        match self {
            ControlEffect::Stunned => "stunned",
            ControlEffect::Paralyzed => "paralyzed",
            ControlEffect::Sleep => "sleep",
            ControlEffect::Frozen => "frozen",
            ControlEffect::Silenced => "silenced",
            ControlEffect::Rooted => "rooted",
            ControlEffect::Immobilized => "immobilized",
            ControlEffect::Restrained => "restrained",
            ControlEffect::Custom(name) => name,
        }
    }

    pub fn block_set(&self) -> BlockSet {
        match self {
            ControlEffect::Stunned
            | ControlEffect::Paralyzed
            | ControlEffect::Sleep
            | ControlEffect::Frozen => BlockSet::All,
            ControlEffect::Silenced => BlockSet::Only(&[ActionKind::Cast]),
            ControlEffect::Rooted | ControlEffect::Immobilized => {
                BlockSet::Only(&[ActionKind::Move])
            }
            ControlEffect::Restrained => BlockSet::Only(&[ActionKind::Move, ActionKind::Attack]),
            ControlEffect::Custom(_) => BlockSet::Nothing,
        }
    }
}

impl From<String> for ControlEffect {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "stunned" => ControlEffect::Stunned,
            "paralyzed" => ControlEffect::Paralyzed,
            "sleep" => ControlEffect::Sleep,
            "frozen" => ControlEffect::Frozen,
            "silenced" => ControlEffect::Silenced,
            "rooted" => ControlEffect::Rooted,
            "immobilized" => ControlEffect::Immobilized,
            "restrained" => ControlEffect::Restrained,
            _ => ControlEffect::Custom(value.trim().to_string()),
        }
    }
}

impl From<&str> for ControlEffect {
    fn from(value: &str) -> Self {
        ControlEffect::from(value.to_string())
    }
}

impl From<ControlEffect> for String {
    fn from(value: ControlEffect) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for ControlEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Engine-managed life statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    Dying,
    Dead,
}

impl SystemStatus {
    pub fn name(&self) -> &'static str {
        match self {
            SystemStatus::Dying => "dying",
            SystemStatus::Dead => "dead",
        }
    }
}

/// Remaining lifetime of a status, counted in the bearer's own turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "turns")]
pub enum StatusDuration {
    Turns(u32),
    Indefinite,
}

impl fmt::Display for StatusDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusDuration::Turns(n) => write!(f, "{} turn(s)", n),
            StatusDuration::Indefinite => f.write_str("indefinite"),
        }
    }
}

/// Category-specific payload of a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum StatusKind {
    System { status: SystemStatus },
    Control { effect: ControlEffect },
}

/// One active status on an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub kind: StatusKind,
    pub remaining: StatusDuration,
    pub source: Option<String>,
}

impl StatusEntry {
    pub fn system(status: SystemStatus, remaining: StatusDuration) -> Self {
        Self {
            kind: StatusKind::System { status },
            remaining,
            source: None,
        }
    }

    pub fn control(effect: ControlEffect, turns: u32, source: Option<String>) -> Self {
        Self {
            kind: StatusKind::Control { effect },
            remaining: StatusDuration::Turns(turns),
            source,
        }
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            StatusKind::System { status } => status.name(),
            StatusKind::Control { effect } => effect.name(),
        }
    }

    pub fn block_set(&self) -> BlockSet {
        match &self.kind {
            StatusKind::System { .. } => BlockSet::Nothing,
            StatusKind::Control { effect } => effect.block_set(),
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self.kind, StatusKind::System { .. })
    }
}

/// All statuses on one actor, keyed by status name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTable {
    entries: BTreeMap<String, StatusEntry>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the status with the same name.
    pub fn insert(&mut self, entry: StatusEntry) {
        self.entries.insert(entry.name().to_string(), entry);
    }

    pub fn remove(&mut self, name: &str) -> Option<StatusEntry> {
        self.entries.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&StatusEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn has_system(&self, status: SystemStatus) -> bool {
        self.entries.contains_key(status.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.values()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first control status that blocks `action`.
    pub fn blocking(&self, action: ActionKind) -> Option<&StatusEntry> {
        self.entries.values().find(|e| e.block_set().blocks(action))
    }

    /// Count down timed control statuses and drop the ones that ran out.
    ///
    /// System statuses are left alone. Returns the names that expired.
    pub fn tick(&mut self) -> Vec<String> {
        let mut expired = Vec::new();
        for (name, entry) in self.entries.iter_mut() {
            if entry.is_system() {
                continue;
            }
            if let StatusDuration::Turns(n) = entry.remaining {
                let left = n.saturating_sub(1);
                entry.remaining = StatusDuration::Turns(left);
                if left == 0 {
                    expired.push(name.clone());
                }
            }
        }
        for name in &expired {
            self.entries.remove(name);
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod block_sets {
        use super::*;

        #[test]
        fn stun_blocks_everything() {
            let set = ControlEffect::Stunned.block_set();
            assert!(set.blocks(ActionKind::Move));
            assert!(set.blocks(ActionKind::Guard));
        }

        #[test]
        fn silence_only_blocks_casting() {
            let set = ControlEffect::Silenced.block_set();
            assert!(set.blocks(ActionKind::Cast));
            assert!(!set.blocks(ActionKind::Attack));
            assert!(!set.blocks(ActionKind::Move));
        }

        #[test]
        fn restrained_blocks_move_and_attack() {
            let set = ControlEffect::Restrained.block_set();
            assert!(set.blocks(ActionKind::Move));
            assert!(set.blocks(ActionKind::Attack));
            assert!(!set.blocks(ActionKind::Cast));
        }

        #[test]
        fn action_entry_spares_movement() {
            let set = BlockSet::Only(&[ActionKind::Action]);
            assert!(set.blocks(ActionKind::FirstAid));
            assert!(set.blocks(ActionKind::Cast));
            assert!(!set.blocks(ActionKind::Move));
        }

        #[test]
        fn custom_effects_block_nothing() {
            let effect = ControlEffect::from("dazzled");
            assert_eq!(effect, ControlEffect::Custom("dazzled".into()));
            assert!(!effect.block_set().blocks(ActionKind::Attack));
        }
    }

    mod table {
        use super::*;

        #[test]
        fn tick_expires_control_but_keeps_system() {
            let mut table = StatusTable::new();
            table.insert(StatusEntry::control(ControlEffect::Rooted, 1, None));
            table.insert(StatusEntry::control(ControlEffect::Silenced, 2, None));
            table.insert(StatusEntry::system(
                SystemStatus::Dying,
                StatusDuration::Turns(3),
            ));

            let expired = table.tick();

            assert_eq!(expired, vec!["rooted".to_string()]);
            assert_eq!(
                table.get("silenced").map(|e| e.remaining),
                Some(StatusDuration::Turns(1))
            );
            assert_eq!(
                table.get("dying").map(|e| e.remaining),
                Some(StatusDuration::Turns(3))
            );
        }

        #[test]
        fn blocking_finds_first_blocker() {
            let mut table = StatusTable::new();
            table.insert(StatusEntry::control(ControlEffect::Silenced, 2, Some("Mira".into())));
            assert!(table.blocking(ActionKind::Move).is_none());
            let blocker = table.blocking(ActionKind::Cast).map(|e| e.name().to_string());
            assert_eq!(blocker.as_deref(), Some("silenced"));
        }

        #[test]
        fn control_effect_serializes_as_its_name() {
            let json = serde_json::to_string(&ControlEffect::Frozen).unwrap();
            assert_eq!(json, "\"frozen\"");
        }
    }
}

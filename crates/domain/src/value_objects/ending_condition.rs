//! Ending conditions - boolean trees over world state
//!
//! Combinators (`all`, `any`, `not`) nest arbitrarily; leaves test objective
//! progress, the clock, who is alive, hostility, tension, location and marks.
//! The authoring form is externally tagged with snake_case keys, e.g.
//! `{"all": [{"objectives": {"names": ["escape"]}}, {"time_before": "10:00"}]}`.

use serde::{Deserialize, Serialize};

use crate::game_time::GameClock;
use crate::value_objects::relation::HOSTILE_THRESHOLD;

/// A condition tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndingCondition {
    // ==========================================================================
    // Combinators
    // ==========================================================================
    All(Vec<EndingCondition>),
    Any(Vec<EndingCondition>),
    Not(Box<EndingCondition>),

    // ==========================================================================
    // Leaves
    // ==========================================================================
    Objectives(ObjectiveCheck),
    TimeBefore(TimeSpec),
    TimeAtLeast(TimeSpec),
    ActorsAlive(ActorCheck),
    ActorsDead(ActorCheck),
    ParticipantsAliveAtLeast(u32),
    ParticipantsAliveAtMost(u32),
    HostilesPresent(HostileCheck),
    MarksContains(OneOrMany),
    TensionAtLeast(u8),
    TensionAtMost(u8),
    LocationIs(OneOrMany),
}

impl EndingCondition {
    /// Get a display description of this condition
    pub fn description(&self) -> String {
        match self {
            EndingCondition::All(parts) => format!("all of {} conditions", parts.len()),
            EndingCondition::Any(parts) => format!("any of {} conditions", parts.len()),
            EndingCondition::Not(inner) => format!("not ({})", inner.description()),
            EndingCondition::Objectives(check) => format!(
                "{} objective(s) {}",
                check.require.as_str(),
                check.status.as_str()
            ),
            EndingCondition::TimeBefore(t) => format!("before {}", t.clock()),
            EndingCondition::TimeAtLeast(t) => format!("at or after {}", t.clock()),
            EndingCondition::ActorsAlive(check) => format!("alive: {}", check.names.join(", ")),
            EndingCondition::ActorsDead(check) => format!("dead: {}", check.names.join(", ")),
            EndingCondition::ParticipantsAliveAtLeast(n) => {
                format!("at least {} participants alive", n)
            }
            EndingCondition::ParticipantsAliveAtMost(n) => {
                format!("at most {} participants alive", n)
            }
            EndingCondition::HostilesPresent(check) => {
                if check.expected() {
                    "hostiles present".to_string()
                } else {
                    "no hostiles remain".to_string()
                }
            }
            EndingCondition::MarksContains(marks) => format!("mark: {}", marks.joined()),
            EndingCondition::TensionAtLeast(n) => format!("tension >= {}", n),
            EndingCondition::TensionAtMost(n) => format!("tension <= {}", n),
            EndingCondition::LocationIs(places) => format!("location: {}", places.joined()),
        }
    }
}

/// How many listed names must match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Require {
    #[default]
    All,
    Any,
}

impl Require {
    pub fn as_str(&self) -> &'static str {
        match self {
            Require::All => "all",
            Require::Any => "any",
        }
    }

    /// Combine per-name results. Empty input never matches.
    pub fn combine(&self, results: impl IntoIterator<Item = bool>) -> bool {
        let results: Vec<bool> = results.into_iter().collect();
        if results.is_empty() {
            return false;
        }
        match self {
            Require::All => results.iter().all(|r| *r),
            Require::Any => results.iter().any(|r| *r),
        }
    }
}

/// Objective status an objectives leaf looks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    Done,
    Blocked,
    Any,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::Done => "done",
            StatusFilter::Blocked => "blocked",
            StatusFilter::Any => "any",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveCheck {
    /// Objectives to test; empty means every registered objective
    pub names: Vec<String>,
    pub require: Require,
    pub status: StatusFilter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorCheck {
    pub names: Vec<String>,
    #[serde(default)]
    pub require: Require,
}

/// A point in time, authored as minutes or as "HH:MM".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeSpec {
    Minutes(u32),
    Clock(String),
}

impl TimeSpec {
    /// Resolve to minutes. An unparsable clock string never matches anything.
    pub fn minutes(&self) -> Option<u32> {
        match self {
            TimeSpec::Minutes(m) => Some(*m),
            TimeSpec::Clock(text) => text.parse::<GameClock>().ok().map(|c| c.minutes()),
        }
    }

    fn clock(&self) -> String {
        self.minutes()
            .map(|m| GameClock::from_minutes(m).to_string())
            .unwrap_or_else(|| "??:??".to_string())
    }
}

/// Either a bare flag or `{value, threshold}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostileCheck {
    Flag(bool),
    Detailed {
        #[serde(default = "default_true")]
        value: bool,
        #[serde(default)]
        threshold: Option<i32>,
    },
}

fn default_true() -> bool {
    true
}

impl HostileCheck {
    pub fn expected(&self) -> bool {
        match self {
            HostileCheck::Flag(v) => *v,
            HostileCheck::Detailed { value, .. } => *value,
        }
    }

    pub fn threshold(&self) -> i32 {
        match self {
            HostileCheck::Detailed {
                threshold: Some(t), ..
            } => *t,
            _ => HOSTILE_THRESHOLD,
        }
    }
}

/// A single string or a list where any entry may match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn matches_any(&self, mut predicate: impl FnMut(&str) -> bool) -> bool {
        match self {
            OneOrMany::One(v) => predicate(v),
            OneOrMany::Many(vs) => vs.iter().any(|v| predicate(v)),
        }
    }

    fn joined(&self) -> String {
        match self {
            OneOrMany::One(v) => v.clone(),
            OneOrMany::Many(vs) => vs.join(" | "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_tree() {
        let json = r#"{"all": [
            {"objectives": {"names": ["escape"], "status": "done"}},
            {"not": {"actors_dead": {"names": ["Amiya"]}}},
            {"time_before": "10:30"}
        ]}"#;
        let condition: EndingCondition = serde_json::from_str(json).unwrap();
        match condition {
            EndingCondition::All(parts) => {
                assert_eq!(parts.len(), 3);
                assert!(matches!(parts[1], EndingCondition::Not(_)));
                match &parts[2] {
                    EndingCondition::TimeBefore(t) => assert_eq!(t.minutes(), Some(630)),
                    other => panic!("unexpected leaf {:?}", other),
                }
            }
            other => panic!("expected all, got {:?}", other),
        }
    }

    #[test]
    fn hostiles_present_accepts_flag_or_object() {
        let flag: EndingCondition = serde_json::from_str(r#"{"hostiles_present": false}"#).unwrap();
        let detailed: EndingCondition =
            serde_json::from_str(r#"{"hostiles_present": {"threshold": -40}}"#).unwrap();
        match (flag, detailed) {
            (EndingCondition::HostilesPresent(a), EndingCondition::HostilesPresent(b)) => {
                assert!(!a.expected());
                assert_eq!(a.threshold(), HOSTILE_THRESHOLD);
                assert!(b.expected());
                assert_eq!(b.threshold(), -40);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn marks_accept_string_or_list() {
        let one: EndingCondition = serde_json::from_str(r#"{"marks_contains": "bell rang"}"#).unwrap();
        let many: EndingCondition =
            serde_json::from_str(r#"{"marks_contains": ["a", "bell rang"]}"#).unwrap();
        for condition in [one, many] {
            match condition {
                EndingCondition::MarksContains(m) => assert!(m.matches_any(|v| v == "bell rang")),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn require_combines_and_rejects_empty() {
        assert!(Require::All.combine([true, true]));
        assert!(!Require::All.combine([true, false]));
        assert!(Require::Any.combine([false, true]));
        assert!(!Require::Any.combine(Vec::<bool>::new()));
    }

    #[test]
    fn unknown_leaf_is_rejected() {
        let result: Result<EndingCondition, _> = serde_json::from_str(r#"{"moon_phase": "full"}"#);
        assert!(result.is_err());
    }
}

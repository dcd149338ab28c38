//! Scheduled story events, fired when the clock passes their time.

use serde::{Deserialize, Serialize};

use super::ending::EndingOutcome;
use crate::value_objects::{GridPos, TimeSpec};

/// What a timeline event does to the world when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EventEffect {
    AddObjective {
        name: String,
        #[serde(default)]
        position: Option<GridPos>,
    },
    CompleteObjective {
        name: String,
    },
    BlockObjective {
        name: String,
    },
    /// Set the directed relation `a -> b`
    Relation {
        a: String,
        b: String,
        value: i32,
    },
    Grant {
        target: String,
        item: String,
        #[serde(default = "default_count")]
        count: u32,
    },
    Damage {
        target: String,
        amount: i32,
    },
    Heal {
        target: String,
        amount: i32,
    },
    Mark {
        text: String,
    },
    Tension {
        delta: i32,
    },
    End {
        #[serde(default)]
        ending_id: Option<String>,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        outcome: Option<EndingOutcome>,
        #[serde(default)]
        note: Option<String>,
    },
}

fn default_count() -> u32 {
    1
}

impl EventEffect {
    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EventEffect::AddObjective { .. } => "add_objective",
            EventEffect::CompleteObjective { .. } => "complete_objective",
            EventEffect::BlockObjective { .. } => "block_objective",
            EventEffect::Relation { .. } => "relation",
            EventEffect::Grant { .. } => "grant",
            EventEffect::Damage { .. } => "damage",
            EventEffect::Heal { .. } => "heal",
            EventEffect::Mark { .. } => "mark",
            EventEffect::Tension { .. } => "tension",
            EventEffect::End { .. } => "end",
        }
    }
}

/// Authoring form of a timeline event; `at` may be minutes or "HH:MM".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEventSpec {
    pub name: String,
    pub at: TimeSpec,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub effects: Vec<EventEffect>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub name: String,
    pub at_min: u32,
    pub note: Option<String>,
    pub effects: Vec<EventEffect>,
}

/// Pending events ordered by time. Events with equal times keep their
/// authored order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pending: Vec<TimelineEvent>,
}

impl Timeline {
    pub fn new(mut events: Vec<TimelineEvent>) -> Self {
        events.sort_by_key(|e| e.at_min);
        Self { pending: events }
    }

    pub fn pending(&self) -> &[TimelineEvent] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every event due at or before `now_min`.
    pub fn take_due(&mut self, now_min: u32) -> Vec<TimelineEvent> {
        let split = self.pending.partition_point(|e| e.at_min <= now_min);
        self.pending.drain(..split).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, at_min: u32) -> TimelineEvent {
        TimelineEvent {
            name: name.into(),
            at_min,
            note: None,
            effects: Vec::new(),
        }
    }

    #[test]
    fn due_events_come_out_in_time_order() {
        let mut timeline = Timeline::new(vec![event("late", 600), event("early", 500), event("mid", 540)]);
        let due = timeline.take_due(540);
        let names: Vec<&str> = due.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["early", "mid"]);
        assert_eq!(timeline.pending().len(), 1);
    }

    #[test]
    fn effects_parse_from_tagged_json() {
        let json = r#"[
            {"type": "grant", "target": "Amiya", "item": "bandage"},
            {"type": "relation", "a": "Amiya", "b": "Mephisto", "value": -50},
            {"type": "end", "ending_id": "timeout", "note": "dawn"}
        ]"#;
        let effects: Vec<EventEffect> = serde_json::from_str(json).unwrap();
        assert!(matches!(&effects[0], EventEffect::Grant { count: 1, .. }));
        assert_eq!(effects[1].kind(), "relation");
        assert!(matches!(&effects[2], EventEffect::End { ending_id: Some(id), .. } if id == "timeout"));
    }
}

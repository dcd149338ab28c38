//! Ending rules and the frozen verdict they produce.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::EndingCondition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndingOutcome {
    Success,
    Failure,
    Neutral,
}

impl EndingOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndingOutcome::Success => "success",
            EndingOutcome::Failure => "failure",
            EndingOutcome::Neutral => "neutral",
        }
    }
}

impl fmt::Display for EndingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndingOutcome {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "success" => Ok(EndingOutcome::Success),
            "failure" | "fail" => Ok(EndingOutcome::Failure),
            "neutral" => Ok(EndingOutcome::Neutral),
            other => Err(DomainError::parse(format!("Unknown ending outcome: {}", other))),
        }
    }
}

/// One authored ending. Higher priority is evaluated first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndingRule {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub outcome: Option<EndingOutcome>,
    #[serde(default)]
    pub priority: i32,
    pub when: EndingCondition,
}

impl EndingRule {
    /// Label, falling back to the id.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// Sort rules by descending priority, keeping authored order on ties.
pub fn order_by_priority(rules: &mut [EndingRule]) {
    rules.sort_by(|a, b| b.priority.cmp(&a.priority));
}

/// The permanent result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndingVerdict {
    pub ending_id: String,
    pub label: String,
    pub outcome: Option<EndingOutcome>,
    pub reasons: Vec<String>,
    pub time_min: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_stable_on_equal_priority() {
        let rule = |id: &str, priority: i32| EndingRule {
            id: id.into(),
            label: None,
            outcome: None,
            priority,
            when: EndingCondition::TensionAtLeast(5),
        };
        let mut rules = vec![rule("a", 0), rule("b", 10), rule("c", 0), rule("d", 10)];
        order_by_priority(&mut rules);
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn rule_parses_with_defaults() {
        let json = r#"{"id": "wipe", "outcome": "failure", "when": {"participants_alive_at_most": 0}}"#;
        let rule: EndingRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.priority, 0);
        assert_eq!(rule.display_label(), "wipe");
        assert_eq!(rule.outcome, Some(EndingOutcome::Failure));
    }
}

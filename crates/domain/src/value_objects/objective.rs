//! Story objective status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveStatus {
    #[default]
    Pending,
    Done,
    Blocked,
}

impl ObjectiveStatus {
    /// Done and blocked objectives no longer need attention.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, ObjectiveStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectiveStatus::Pending => "pending",
            ObjectiveStatus::Done => "done",
            ObjectiveStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for ObjectiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectiveStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "done" => Ok(Self::Done),
            "blocked" => Ok(Self::Blocked),
            other => Err(DomainError::parse(format!("Unknown objective status: {}", other))),
        }
    }
}

/// A story objective, optionally tied to a grid point actors can move to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    pub name: String,
    #[serde(default)]
    pub status: ObjectiveStatus,
    #[serde(default)]
    pub position: Option<super::GridPos>,
}

impl Objective {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ObjectiveStatus::Pending,
            position: None,
        }
    }

    pub fn at(mut self, position: super::GridPos) -> Self {
        self.position = Some(position);
        self
    }
}

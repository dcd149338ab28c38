//! Integer grid positions and cover levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// A tile on the integer grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance in steps.
    pub fn distance_to(&self, other: GridPos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Walk up to `budget` steps toward `goal`, closing the x gap first.
    ///
    /// Returns the new position and the number of steps actually taken.
    pub fn step_toward(&self, goal: GridPos, budget: u32) -> (GridPos, u32) {
        let mut pos = *self;
        let mut moved = 0;
        while moved < budget && pos.x != goal.x {
            pos.x += (goal.x - pos.x).signum();
            moved += 1;
        }
        while moved < budget && pos.y != goal.y {
            pos.y += (goal.y - pos.y).signum();
            moved += 1;
        }
        (pos, moved)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for GridPos {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl FromStr for GridPos {
    type Err = DomainError;

    /// Parses "x,y", optionally wrapped in parentheses.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('(').trim_end_matches(')');
        let (x, y) = trimmed
            .split_once(',')
            .ok_or_else(|| DomainError::parse(format!("Not a coordinate pair: {}", s)))?;
        let x = x
            .trim()
            .parse()
            .map_err(|_| DomainError::parse(format!("Bad x coordinate in '{}'", s)))?;
        let y = y
            .trim()
            .parse()
            .map_err(|_| DomainError::parse(format!("Bad y coordinate in '{}'", s)))?;
        Ok(Self { x, y })
    }
}

/// How much cover an actor currently has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cover {
    #[default]
    None,
    Half,
    ThreeQuarters,
    Total,
}

impl Cover {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cover::None => "none",
            Cover::Half => "half",
            Cover::ThreeQuarters => "three_quarters",
            Cover::Total => "total",
        }
    }
}

impl FromStr for Cover {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Cover::None),
            "half" => Ok(Cover::Half),
            "three_quarters" | "three-quarters" => Ok(Cover::ThreeQuarters),
            "total" => Ok(Cover::Total),
            other => Err(DomainError::parse(format!("Unknown cover level: {}", other))),
        }
    }
}

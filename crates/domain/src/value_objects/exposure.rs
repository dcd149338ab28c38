//! Exposure track - secondary stress with a ratcheting stage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::dice::DiceFormula;
use crate::error::DomainError;

/// Highest exposure stage.
pub const MAX_STAGE: u8 = 3;

/// Stress above this forces a stage advance.
pub const STRESS_CEILING: u32 = 100;

/// Severe flares needed to force a stage advance.
pub const SEVERE_FLARES_PER_STAGE: u32 = 2;

/// Stress floor for each stage (index = stage).
pub const STAGE_STRESS_FLOORS: [u32; 4] = [0, 20, 50, 80];

/// Resistance penalty for each stage (index = stage).
pub const STAGE_RESIST_PENALTY: [i32; 4] = [0, 10, 20, 30];

/// Severity of an exposure source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Light,
    Medium,
    Heavy,
    Disaster,
}

impl Severity {
    pub fn stress_dice(&self) -> DiceFormula {
        let (count, size, modifier) = match self {
            Severity::Light => (1, 4, 0),
            Severity::Medium => (1, 6, 1),
            Severity::Heavy => (2, 6, 0),
            Severity::Disaster => (2, 10, 0),
        };
        DiceFormula {
            dice_count: count,
            die_size: size,
            modifier,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Light => "light",
            Severity::Medium => "medium",
            Severity::Heavy => "heavy",
            Severity::Disaster => "disaster",
        }
    }
}

impl FromStr for Severity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Severity::Light),
            "medium" => Ok(Severity::Medium),
            "heavy" => Ok(Severity::Heavy),
            "disaster" => Ok(Severity::Disaster),
            other => Err(DomainError::parse(format!("Unknown severity: {}", other))),
        }
    }
}

/// Stress tier crossed by an exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressTier {
    Mild,
    Moderate,
    Severe,
}

impl StressTier {
    pub const ALL: [StressTier; 3] = [StressTier::Mild, StressTier::Moderate, StressTier::Severe];

    pub fn threshold(&self) -> u32 {
        match self {
            StressTier::Mild => 20,
            StressTier::Moderate => 50,
            StressTier::Severe => 80,
        }
    }

    /// Tiers whose threshold lies in `(before, after]`.
    pub fn crossed(before: u32, after: u32) -> Vec<StressTier> {
        Self::ALL
            .into_iter()
            .filter(|t| before < t.threshold() && after >= t.threshold())
            .collect()
    }
}

impl fmt::Display for StressTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StressTier::Mild => "mild",
            StressTier::Moderate => "moderate",
            StressTier::Severe => "severe",
        };
        f.write_str(name)
    }
}

/// Permanent penalty picked when the stage advances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageChoice {
    /// Constitution drops by 5
    #[default]
    Con,
    /// Arts resistance drops by 10
    Resist,
    /// Affinity rises by 5 and overcharge stress escalates one rung
    Affinity,
}

impl FromStr for StageChoice {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "auto" | "con" => Ok(StageChoice::Con),
            "resist" => Ok(StageChoice::Resist),
            "affinity" => Ok(StageChoice::Affinity),
            other => Err(DomainError::parse(format!("Unknown stage choice: {}", other))),
        }
    }
}

/// Per-actor exposure bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExposureTrack {
    pub stage: u8,
    pub stress: u32,
    pub severe_flares: u32,
    pub crystal_density: u32,
    pub affinity: i32,
    /// Rungs added to the overcharge stress ladder by affinity choices
    pub overcharge_step: u32,
    pub overcharge_uses: u32,
}

impl ExposureTrack {
    pub fn resist_penalty(&self) -> i32 {
        STAGE_RESIST_PENALTY[usize::from(self.stage.min(MAX_STAGE))]
    }

    pub fn stress_floor(&self) -> u32 {
        STAGE_STRESS_FLOORS[usize::from(self.stage.min(MAX_STAGE))]
    }

    /// Whether accumulated stress or flares force the next stage.
    pub fn should_escalate(&self) -> bool {
        self.stage < MAX_STAGE
            && (self.stress > STRESS_CEILING || self.severe_flares >= SEVERE_FLARES_PER_STAGE)
    }

    /// Dice for the next overcharge, one rung per earlier overcharge and per
    /// affinity step.
    pub fn overcharge_dice(&self) -> DiceFormula {
        let rungs = self.overcharge_uses + self.overcharge_step;
        (0..rungs).fold(Severity::Light.stress_dice(), |dice, _| dice.escalated())
    }
}

//! Percentile (d100 roll-under) checks and opposed contests.
//!
//! Tiers follow the roll-under convention:
//! - Extreme: roll <= max(1, target / 5)
//! - Hard: roll <= max(1, target / 2)
//! - Regular: roll <= target
//! - Fail: anything higher

use serde::{Deserialize, Serialize};
use std::fmt;

/// Roll at or above which a failed check counts as a fumble.
pub const FUMBLE_FLOOR: i32 = 96;

/// Success tier of a single percentile check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuccessLevel {
    Extreme,
    Hard,
    Regular,
    Fail,
}

impl SuccessLevel {
    /// Check if this is any form of success.
    pub fn is_success(&self) -> bool {
        !matches!(self, SuccessLevel::Fail)
    }

    /// Ordering used by contests: higher ranks beat lower ranks.
    pub fn rank(&self) -> u8 {
        match self {
            SuccessLevel::Extreme => 3,
            SuccessLevel::Hard => 2,
            SuccessLevel::Regular => 1,
            SuccessLevel::Fail => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuccessLevel::Extreme => "extreme",
            SuccessLevel::Hard => "hard",
            SuccessLevel::Regular => "regular",
            SuccessLevel::Fail => "fail",
        }
    }
}

impl fmt::Display for SuccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single resolved percentile roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRoll {
    pub roll: i32,
    /// Effective target after clamping to at least 1
    pub target: i32,
    pub level: SuccessLevel,
}

impl CheckRoll {
    /// Resolve a d100 roll against a skill or characteristic value.
    pub fn resolve(roll: i32, target: i32) -> Self {
        let target = target.max(1);
        let hard = (target / 2).max(1);
        let extreme = (target / 5).max(1);
        let level = if roll <= extreme {
            SuccessLevel::Extreme
        } else if roll <= hard {
            SuccessLevel::Hard
        } else if roll <= target {
            SuccessLevel::Regular
        } else {
            SuccessLevel::Fail
        };
        Self {
            roll,
            target,
            level,
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.level.is_success()
    }

    /// A failed roll in the top band of the die.
    pub fn is_fumble(&self) -> bool {
        self.level == SuccessLevel::Fail && self.roll >= FUMBLE_FLOOR
    }
}

impl fmt::Display for CheckRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d100={}/{} ({})", self.roll, self.target, self.level)
    }
}

/// Which side took an opposed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContestWinner {
    Attacker,
    Defender,
}

/// Decide an opposed check.
///
/// Higher tier wins; equal tiers go to the lower raw roll; an exact tie goes
/// to the defender.
pub fn resolve_contest(attacker: &CheckRoll, defender: &CheckRoll) -> ContestWinner {
    let (a, d) = (attacker.level.rank(), defender.level.rank());
    if a != d {
        return if a > d {
            ContestWinner::Attacker
        } else {
            ContestWinner::Defender
        };
    }
    if attacker.roll < defender.roll {
        ContestWinner::Attacker
    } else {
        ContestWinner::Defender
    }
}

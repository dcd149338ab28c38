//! Directed relation scores between actors.

use serde::{Deserialize, Serialize};

/// Scores are clamped to this magnitude.
pub const RELATION_LIMIT: i32 = 100;

/// At or below this score an actor counts as hostile.
pub const HOSTILE_THRESHOLD: i32 = -10;

/// Clamp a raw score into the legal range.
pub fn clamp_relation(score: i32) -> i32 {
    score.clamp(-RELATION_LIMIT, RELATION_LIMIT)
}

/// Coarse attitude bands used when rendering relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationTier {
    Devoted,
    Friendly,
    Warm,
    Neutral,
    Cold,
    Hostile,
    Sworn,
}

impl RelationTier {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 60 => RelationTier::Devoted,
            s if s >= 40 => RelationTier::Friendly,
            s if s >= 10 => RelationTier::Warm,
            s if s > -10 => RelationTier::Neutral,
            s if s > -40 => RelationTier::Cold,
            s if s > -60 => RelationTier::Hostile,
            _ => RelationTier::Sworn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationTier::Devoted => "devoted",
            RelationTier::Friendly => "friendly",
            RelationTier::Warm => "warm",
            RelationTier::Neutral => "neutral",
            RelationTier::Cold => "cold",
            RelationTier::Hostile => "hostile",
            RelationTier::Sworn => "sworn enemy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_limit() {
        assert_eq!(clamp_relation(250), 100);
        assert_eq!(clamp_relation(-101), -100);
        assert_eq!(clamp_relation(7), 7);
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(RelationTier::from_score(60), RelationTier::Devoted);
        assert_eq!(RelationTier::from_score(0), RelationTier::Neutral);
        assert_eq!(RelationTier::from_score(-10), RelationTier::Cold);
        assert_eq!(RelationTier::from_score(-60), RelationTier::Sworn);
    }
}

//! Exposure stage events

use serde::{Deserialize, Serialize};

use crate::value_objects::StageChoice;

/// Result of advancing an actor's exposure stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageAdvance {
    pub from_stage: u8,
    pub to_stage: u8,
    pub choice: StageChoice,
    /// Stress after being raised to the new floor
    pub stress: u32,
    pub crystal_density: u32,
    /// Human-readable description of the permanent penalty
    pub penalty: String,
}

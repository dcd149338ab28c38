//! Results returned for every executed action.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// =============================================================================
// Action Result
// =============================================================================

/// Outcome of one action.
///
/// `ok` is the success flag; on failure `error` carries a stable code and a
/// message. `narration` is plain text for a human or agent and `data` holds
/// structured details (rolls, damage, positions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
    #[serde(default)]
    pub narration: Vec<String>,
    #[serde(default)]
    pub data: Value,
}

impl ActionResult {
    /// A successful result with data
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            ok: true,
            error: None,
            narration: Vec::new(),
            data: serde_json::to_value(data).unwrap_or_default(),
        }
    }

    /// A successful result without data
    pub fn success_empty() -> Self {
        Self {
            ok: true,
            error: None,
            narration: Vec::new(),
            data: Value::Null,
        }
    }

    /// A failed result
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            ok: false,
            narration: vec![message.clone()],
            error: Some(ActionError { code, message }),
            data: Value::Null,
        }
    }

    /// Append a narration line
    pub fn narrate(mut self, line: impl Into<String>) -> Self {
        self.narration.push(line.into());
        self
    }

    /// Append several narration lines
    pub fn narrate_all<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.narration.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Attach structured data
    pub fn with_data<T: Serialize>(mut self, data: T) -> Self {
        self.data = serde_json::to_value(data).unwrap_or_default();
        self
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }

    /// All narration joined by newlines
    pub fn text(&self) -> String {
        self.narration.join("\n")
    }
}

/// Structured failure reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionError {
    pub code: ErrorCode,
    pub message: String,
}

// =============================================================================
// Error Codes
// =============================================================================

/// Failure classification codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // === Precondition failures ===
    /// A required field was absent
    MissingField,
    /// A field had the wrong shape or an unresolvable target
    InvalidValue,
    /// The actor or target is not a current participant
    NotParticipant,
    /// The actor is blocked by death, dying or a control status
    ActorUnable,
    /// The tool name is not recognised
    UnknownTool,
    UnknownActor,

    // === Resource failures ===
    /// Action, bonus or reaction already used this round
    ResourceSpent,
    /// Not enough MP and no overcharge path
    InsufficientResource,
    ItemMissing,

    // === Authoring references ===
    UnknownWeapon,
    UnknownPower,
    WeaponNotOwned,

    // === Reach ===
    /// Distance undefined or beyond reach
    OutOfReach,
    NoLineOfSight,
    WrongScene,
    EntranceNotFound,

    // === State ===
    /// Action had no target state to change
    NothingToDo,
    /// Exposure stage already at its maximum
    StageMax,
    /// The run already has a verdict
    RunEnded,

    /// Internal inconsistency
    InternalError,

    /// Unknown variant for forward compatibility
    #[serde(other)]
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::NotParticipant => "not_participant",
            ErrorCode::ActorUnable => "actor_unable",
            ErrorCode::UnknownTool => "unknown_tool",
            ErrorCode::UnknownActor => "unknown_actor",
            ErrorCode::ResourceSpent => "resource_spent",
            ErrorCode::InsufficientResource => "insufficient_resource",
            ErrorCode::ItemMissing => "item_missing",
            ErrorCode::UnknownWeapon => "unknown_weapon",
            ErrorCode::UnknownPower => "unknown_power",
            ErrorCode::WeaponNotOwned => "weapon_not_owned",
            ErrorCode::OutOfReach => "out_of_reach",
            ErrorCode::NoLineOfSight => "no_line_of_sight",
            ErrorCode::WrongScene => "wrong_scene",
            ErrorCode::EntranceNotFound => "entrance_not_found",
            ErrorCode::NothingToDo => "nothing_to_do",
            ErrorCode::StageMax => "stage_max",
            ErrorCode::RunEnded => "run_ended",
            ErrorCode::InternalError => "internal_error",
            ErrorCode::Unknown => "unknown",
        }
    }

    /// Whether moving closer and retrying could succeed.
    pub fn is_range_failure(&self) -> bool {
        matches!(self, ErrorCode::OutOfReach | ErrorCode::NoLineOfSight)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_carries_code_and_narration() {
        let result = ActionResult::failure(ErrorCode::OutOfReach, "too far");
        assert!(!result.ok);
        assert_eq!(result.error_code(), Some(ErrorCode::OutOfReach));
        assert_eq!(result.text(), "too far");
    }

    #[test]
    fn codes_serialize_snake_case_and_match_as_str() {
        for code in [ErrorCode::ResourceSpent, ErrorCode::NoLineOfSight, ErrorCode::StageMax] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.as_str());
        }
    }

    #[test]
    fn unknown_code_deserializes_to_unknown() {
        let code: ErrorCode = serde_json::from_str(r#""cosmic_ray""#).unwrap();
        assert_eq!(code, ErrorCode::Unknown);
    }
}

//! Rule failures and their wire codes.

use tabletale_domain::{DomainError, TurnResource};
use tabletale_shared::ErrorCode;

/// Why a rule operation refused to run.
///
/// Every variant is raised before any state changes, except `Domain`, which
/// wraps an aggregate invariant violation.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    // === Preconditions ===
    #[error("{0} is not taking part in this scene")]
    NotParticipant(String),
    /// Carries the block reason from the status engine
    #[error("{0}")]
    ActorUnable(String),
    #[error("Unknown actor: {0}")]
    UnknownActor(String),
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    // === Resources ===
    #[error("{actor} has already used their {resource} this round")]
    ResourceSpent {
        actor: String,
        resource: TurnResource,
    },
    #[error("{0}")]
    InsufficientResource(String),
    #[error("{actor} does not hold {count} x {item}")]
    ItemMissing {
        actor: String,
        item: String,
        count: u32,
    },

    // === Authoring references ===
    #[error("Unknown weapon: {0}")]
    UnknownWeapon(String),
    #[error("Unknown power: {0}")]
    UnknownPower(String),
    #[error("{actor} does not carry a {weapon}")]
    WeaponNotOwned { actor: String, weapon: String },

    // === Reach ===
    #[error("{target} is out of reach (reach {reach})")]
    OutOfReach { target: String, reach: u32 },
    #[error("{target} is behind total cover")]
    NoLineOfSight { target: String },
    #[error("Entrance '{entrance}' does not leave {scene}")]
    WrongScene { entrance: String, scene: String },
    #[error("No entrance '{0}' here")]
    EntranceNotFound(String),

    // === State ===
    #[error("{0}")]
    NothingToDo(String),
    #[error("{0} is already at the highest exposure stage")]
    StageMax(String),
    #[error("The run has already ended")]
    RunEnded,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl RuleError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RuleError::NotParticipant(_) => ErrorCode::NotParticipant,
            RuleError::ActorUnable(_) => ErrorCode::ActorUnable,
            RuleError::UnknownActor(_) => ErrorCode::UnknownActor,
            RuleError::MissingField(_) => ErrorCode::MissingField,
            RuleError::InvalidValue(_) => ErrorCode::InvalidValue,
            RuleError::ResourceSpent { .. } => ErrorCode::ResourceSpent,
            RuleError::InsufficientResource(_) => ErrorCode::InsufficientResource,
            RuleError::ItemMissing { .. } => ErrorCode::ItemMissing,
            RuleError::UnknownWeapon(_) => ErrorCode::UnknownWeapon,
            RuleError::UnknownPower(_) => ErrorCode::UnknownPower,
            RuleError::WeaponNotOwned { .. } => ErrorCode::WeaponNotOwned,
            RuleError::OutOfReach { .. } => ErrorCode::OutOfReach,
            RuleError::NoLineOfSight { .. } => ErrorCode::NoLineOfSight,
            RuleError::WrongScene { .. } => ErrorCode::WrongScene,
            RuleError::EntranceNotFound(_) => ErrorCode::EntranceNotFound,
            RuleError::NothingToDo(_) => ErrorCode::NothingToDo,
            RuleError::StageMax(_) => ErrorCode::StageMax,
            RuleError::RunEnded => ErrorCode::RunEnded,
            RuleError::Domain(DomainError::NotFound { entity_type, .. }) if *entity_type == "Actor" => {
                ErrorCode::UnknownActor
            }
            RuleError::Domain(DomainError::NotFound { .. })
            | RuleError::Domain(DomainError::Validation(_))
            | RuleError::Domain(DomainError::Parse(_))
            | RuleError::Domain(DomainError::Formula { .. }) => ErrorCode::InvalidValue,
            RuleError::Domain(DomainError::Constraint(_)) => ErrorCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_actor_maps_to_unknown_actor() {
        let err = RuleError::from(DomainError::not_found("Actor", "ghost"));
        assert_eq!(err.code(), ErrorCode::UnknownActor);
        let err = RuleError::from(DomainError::not_found("Scene", "void"));
        assert_eq!(err.code(), ErrorCode::InvalidValue);
    }

    #[test]
    fn reach_failures_are_range_codes() {
        let err = RuleError::OutOfReach {
            target: "b".into(),
            reach: 1,
        };
        assert!(err.code().is_range_failure());
        assert_eq!(err.to_string(), "b is out of reach (reach 1)");
    }
}

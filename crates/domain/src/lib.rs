//! Tabletale domain - rules vocabulary and the `World` aggregate.
//!
//! Nothing in this crate rolls dice or touches I/O. Random numbers reach it
//! through closures (`FnMut(min, max) -> i32`) supplied by the engine.

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod events;
pub mod game_time;
pub mod value_objects;

pub use aggregates::World;
pub use entities::{
    CharacterSheet, DamageType, EndingOutcome, EndingRule, EndingVerdict, Entrance, EventEffect,
    Mitigation, PowerCost, PowerDef, Scene, SceneGraph, Timeline, TimelineEvent, WeaponDef,
};
pub use error::DomainError;
pub use events::{DamageOutcome, FirstAidOutcome, HealOutcome, StageAdvance, TurnEndReport};
pub use game_time::{GameClock, TimeOfDay};
pub use value_objects::{
    ActionKind, CheckRoll, ControlEffect, Cover, DiceFormula, EndingCondition, ExposureTrack,
    Formula, GridPos, Objective, ObjectiveStatus, Severity, StageChoice, StatusEntry,
    SuccessLevel, TurnResource, TurnState,
};

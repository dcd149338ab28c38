//! Value objects - Immutable objects defined by their attributes

mod characteristics;
mod check;
mod dice;
mod ending_condition;
mod exposure;
mod formula;
mod grid;
mod objective;
mod relation;
mod status;
mod turn_state;

pub use characteristics::{Characteristic, Characteristics, DEFAULT_CHARACTERISTIC};
pub use check::{resolve_contest, CheckRoll, ContestWinner, SuccessLevel, FUMBLE_FLOOR};
pub use dice::{DiceFormula, DiceParseError, DiceRollResult};
pub use ending_condition::{
    ActorCheck, EndingCondition, HostileCheck, ObjectiveCheck, OneOrMany, Require, StatusFilter,
    TimeSpec,
};
pub use exposure::{
    ExposureTrack, Severity, StageChoice, StressTier, MAX_STAGE, SEVERE_FLARES_PER_STAGE,
    STAGE_RESIST_PENALTY, STAGE_STRESS_FLOORS, STRESS_CEILING,
};
pub use formula::{Formula, FormulaError, FormulaRoll, FormulaTerm, SignedTerm, TokenScale};
pub use grid::{Cover, GridPos};
pub use objective::{Objective, ObjectiveStatus};
pub use relation::{clamp_relation, RelationTier, HOSTILE_THRESHOLD, RELATION_LIMIT};
pub use status::{
    ActionKind, BlockSet, ControlEffect, StatusDuration, StatusEntry, StatusKind, StatusTable,
    SystemStatus,
};
pub use turn_state::{TurnResource, TurnState};

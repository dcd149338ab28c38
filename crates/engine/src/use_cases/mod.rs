//! Use cases - rule pipelines over the `World` aggregate.
//!
//! Each module covers one area of the rules. Pipelines that roll dice are
//! structs holding a `RandomPort`; deterministic operations are free
//! functions. Every operation takes `&mut World` (or `&World` for reads)
//! and returns a serializable outcome or a `RuleError`.

pub mod casting;
pub mod combat;
pub mod endings;
pub mod error;
pub mod exposure;
pub mod movement;
pub mod resolution;
pub mod scene_view;
pub mod social;
pub mod timeline;

use std::sync::Arc;

pub use casting::{CastOutcome, CastPower};
pub use combat::{Attack, AttackOutcome, CombatUseCases, FirstAid};
pub use error::RuleError;
pub use exposure::{ApplyExposure, ExposureSource};

use crate::infrastructure::ports::RandomPort;

/// Human-readable lines describing an outcome.
pub trait Narrated {
    fn narration(&self) -> Vec<String>;
}

/// The dice-rolling pipelines, wired to one random source.
pub struct RuleUseCases {
    pub combat: CombatUseCases,
    pub cast: Arc<CastPower>,
    pub exposure: Arc<ApplyExposure>,
}

impl RuleUseCases {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        let exposure = Arc::new(ApplyExposure::new(random.clone()));
        Self {
            combat: CombatUseCases::new(
                Arc::new(Attack::new(random.clone())),
                Arc::new(FirstAid::new(random.clone())),
            ),
            cast: Arc::new(CastPower::new(random, exposure.clone())),
            exposure,
        }
    }
}

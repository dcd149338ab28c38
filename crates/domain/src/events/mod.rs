//! Domain events
//!
//! Return types from `World` mutations, communicating what happened when
//! state was modified. The engine turns these into narration and logs.

pub mod exposure_events;
pub mod life_events;

pub use exposure_events::*;
pub use life_events::*;

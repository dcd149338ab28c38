//! Aggregate roots - domain objects that own their related data
//!
//! The rules engine has a single aggregate, [`World`]. It owns every map of
//! per-actor state plus the static tables, exposes behavior through methods
//! rather than public fields, and returns domain events from mutations.
//!
//! # Rustic DDD Principles
//!
//! | Pattern | Rustic Equivalent |
//! |---------|-------------------|
//! | Aggregate root guards | Ownership (one `&mut World` at a time) |
//! | Factory pattern | `::new()` + builder pattern |
//! | Domain Events | Return enums from mutations |

pub mod world;

pub use world::{World, DEFAULT_TENSION, MARKS_KEPT, MAX_TENSION};

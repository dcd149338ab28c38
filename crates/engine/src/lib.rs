//! Tabletale Engine library.
//!
//! Rule pipelines, the tool-call gate and the round loop for the tabletop
//! engine. The world model itself lives in `tabletale-domain`.
//!
//! ## Structure
//!
//! - `use_cases/` - rule pipelines over the `World` aggregate
//! - `api/` - tool-call validation and dispatch
//! - `infrastructure/` - ports, dice, configuration, story loading, policy
//! - `runner` - the round loop
//! - `app` - application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod runner;
pub mod use_cases;

/// Test fixtures shared by unit tests.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;

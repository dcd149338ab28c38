//! Infrastructure - external dependency implementations.
//!
//! - `ports` - the trait seams (randomness, decision-making)
//! - `random` - dice sources
//! - `config` - environment configuration
//! - `authoring` - JSON story loader
//! - `pause` - cooperative pause gate for the round loop
//! - `policy` - built-in heuristic decision-maker

pub mod authoring;
pub mod config;
pub mod pause;
pub mod policy;
pub mod ports;
pub mod random;

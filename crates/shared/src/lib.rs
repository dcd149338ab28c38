//! Tabletale Shared - wire types between the engine and decision-makers
//!
//! This crate contains the types that cross the decision interface:
//! - Tool calls proposed by a decision-maker ([`ToolCall`])
//! - Results returned for every executed action ([`ActionResult`], [`ErrorCode`])
//! - Scene-scoped, read-only views of the world ([`SceneView`])
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - only serde, serde_json, thiserror and the
//!    domain vocabulary
//! 2. **No business logic** - pure data types and serialization
//! 3. **Never the raw aggregate** - views are projections built by the engine

pub mod requests;
pub mod responses;
pub mod views;

pub use requests::{ToolCall, ToolCallError};
pub use responses::{ActionError, ActionResult, ErrorCode};
pub use views::{
    ActorView, EntranceView, ObjectiveView, ReachKind, ReachPreview, RelationView, SceneView,
    StatusView, TargetInReach,
};

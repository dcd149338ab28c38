//! Decision interface: tool table, validation gate and action executor.

pub mod executor;
pub mod tools;

pub use executor::ActionExecutor;
pub use tools::{gate, Action, GateError, ToolKind};

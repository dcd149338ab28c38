//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Randomness (dice must be scriptable in tests)
//! - Decision-making (a human, a scripted policy or an external agent picks actions)

use async_trait::async_trait;
use tabletale_shared::{SceneView, ToolCall};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("Decision-maker unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid proposal: {0}")]
    InvalidProposal(String),
}

// =============================================================================
// Testing Ports
// =============================================================================

pub trait RandomPort: Send + Sync {
    /// Uniform integer in `min..=max`.
    fn gen_range(&self, min: i32, max: i32) -> i32;
}

// =============================================================================
// Decision Port
// =============================================================================

/// Everything a decision-maker is shown when it is an actor's turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnPrompt {
    pub actor: String,
    pub round: u32,
    /// Scene-scoped projection; never the raw world
    pub view: SceneView,
    /// The same view rendered as plain text
    pub rendered: Vec<String>,
}

/// Proposes zero or more tool calls for the actor whose turn it is.
///
/// Long-running work happens here, outside the engine. The round loop holds
/// no engine borrow across the call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DecisionPort: Send + Sync {
    async fn decide(&self, prompt: TurnPrompt) -> Result<Vec<ToolCall>, DecisionError>;
}

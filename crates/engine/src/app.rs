//! Application composition.

use std::sync::Arc;

use crate::api::ActionExecutor;
use crate::infrastructure::authoring::{load_story_dir, AuthoringError};
use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::pause::PauseGate;
use crate::infrastructure::policy::HeuristicPolicy;
use crate::infrastructure::ports::{DecisionPort, RandomPort};
use crate::infrastructure::random::{SeededRandom, SystemRandom};
use crate::runner::{RoundRunner, RunSettings};
use crate::use_cases::RuleUseCases;

/// A loaded story wired to its dice, decision-maker and round loop.
pub struct App {
    pub title: String,
    pub runner: RoundRunner,
}

impl App {
    /// Build with the built-in heuristic policy.
    pub fn from_config(config: &EngineConfig) -> Result<Self, AuthoringError> {
        Self::with_decisions(config, Arc::new(HeuristicPolicy::new()))
    }

    pub fn with_decisions(
        config: &EngineConfig,
        decisions: Arc<dyn DecisionPort>,
    ) -> Result<Self, AuthoringError> {
        let story = load_story_dir(&config.story_dir, config.dying_turns)?;

        let random: Arc<dyn RandomPort> = match config.seed {
            Some(seed) => {
                tracing::info!(seed, "Using seeded dice");
                Arc::new(SeededRandom::new(seed))
            }
            None => Arc::new(SystemRandom::new()),
        };

        let settings = RunSettings {
            max_rounds: config.max_rounds,
            end_when_no_hostiles: config.end_when_no_hostiles,
            minutes_per_round: config.minutes_per_round,
        };
        let runner = RoundRunner::new(
            story.world,
            ActionExecutor::new(RuleUseCases::new(random)),
            decisions,
            PauseGate::new(),
            settings,
        );

        Ok(Self {
            title: story.title,
            runner,
        })
    }
}

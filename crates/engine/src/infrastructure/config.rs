//! Engine configuration read from the environment.

use std::path::PathBuf;

use tabletale_domain::entities::DEFAULT_DYING_TURNS;

const DEFAULT_STORY_DIR: &str = "demos/skirmish";
const DEFAULT_MAX_ROUNDS: u32 = 20;
const DEFAULT_MINUTES_PER_ROUND: u32 = 1;

/// Runtime settings for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Directory holding `story.json`, `characters.json`, `weapons.json`, `powers.json`
    pub story_dir: PathBuf,
    pub max_rounds: u32,
    /// Stop the round loop once no hostile pair remains. Independent of any
    /// `hostiles_present` ending rule.
    pub end_when_no_hostiles: bool,
    /// Fixed seed for reproducible dice
    pub seed: Option<u64>,
    pub dying_turns: u32,
    /// Story clock advance after each full round; 0 stops the clock
    pub minutes_per_round: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            story_dir: PathBuf::from(DEFAULT_STORY_DIR),
            max_rounds: DEFAULT_MAX_ROUNDS,
            end_when_no_hostiles: false,
            seed: None,
            dying_turns: DEFAULT_DYING_TURNS,
            minutes_per_round: DEFAULT_MINUTES_PER_ROUND,
        }
    }
}

impl EngineConfig {
    /// Read `TABLETALE_*` variables, falling back to defaults for anything
    /// unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let max_rounds = match read("TABLETALE_MAX_ROUNDS").map(|v| v.parse::<u32>()) {
            Some(Ok(n)) if n > 0 => n,
            Some(_) => {
                tracing::warn!("TABLETALE_MAX_ROUNDS is not a positive integer, using default");
                defaults.max_rounds
            }
            None => defaults.max_rounds,
        };
        let dying_turns = read("TABLETALE_DYING_TURNS")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.dying_turns);

        Self {
            story_dir: read("TABLETALE_STORY_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.story_dir),
            max_rounds,
            end_when_no_hostiles: read("TABLETALE_END_WHEN_NO_HOSTILES")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.end_when_no_hostiles),
            seed: read("TABLETALE_SEED").and_then(|v| v.parse::<u64>().ok()),
            dying_turns,
            minutes_per_round: read("TABLETALE_MINUTES_PER_ROUND")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(defaults.minutes_per_round),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

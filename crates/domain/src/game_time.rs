use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Minutes per in-game day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Sessions open at 08:00.
pub const DEFAULT_START_MINUTES: u32 = 8 * 60;

// =============================================================================
// Time of Day
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn display_name(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
            TimeOfDay::Night => "Night",
        }
    }

    /// Period containing the given hour (0-23).
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            18..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// =============================================================================
// Game Clock
// =============================================================================

/// In-game wall clock, counted in minutes since midnight of day one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameClock(u32);

impl GameClock {
    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    #[inline]
    pub fn minutes(&self) -> u32 {
        self.0
    }

    pub fn advanced(&self, minutes: u32) -> Self {
        Self(self.0.saturating_add(minutes))
    }

    /// Hour of the current day (0-23).
    pub fn hour(&self) -> u32 {
        (self.0 % MINUTES_PER_DAY) / 60
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_hour(self.hour())
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self(DEFAULT_START_MINUTES)
    }
}

impl fmt::Display for GameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day_minutes = self.0 % MINUTES_PER_DAY;
        write!(f, "{:02}:{:02}", day_minutes / 60, day_minutes % 60)
    }
}

impl FromStr for GameClock {
    type Err = DomainError;

    /// Parses "HH:MM" as a time on day one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| DomainError::parse(format!("Expected HH:MM, got '{}'", s)))?;
        let hours: u32 = h
            .trim()
            .parse()
            .map_err(|_| DomainError::parse(format!("Bad hour in '{}'", s)))?;
        let minutes: u32 = m
            .trim()
            .parse()
            .map_err(|_| DomainError::parse(format!("Bad minute in '{}'", s)))?;
        if hours > 23 || minutes > 59 {
            return Err(DomainError::parse(format!("Clock out of range: '{}'", s)));
        }
        Ok(Self(hours * 60 + minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_clock_starts_at_eight() {
        let clock = GameClock::default();
        assert_eq!(clock.to_string(), "08:00");
        assert_eq!(clock.time_of_day(), TimeOfDay::Morning);
    }

    #[test]
    fn parses_hh_mm() {
        assert_eq!("09:30".parse::<GameClock>().unwrap().minutes(), 570);
        assert!("25:00".parse::<GameClock>().is_err());
        assert!("noon".parse::<GameClock>().is_err());
    }

    #[test]
    fn display_wraps_days() {
        let clock = GameClock::from_minutes(MINUTES_PER_DAY + 75);
        assert_eq!(clock.to_string(), "01:15");
        assert_eq!(clock.time_of_day(), TimeOfDay::Night);
    }
}

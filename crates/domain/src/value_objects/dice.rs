//! Dice formulas and roll results
//!
//! Supports formulas like "1d6", "2d6+2", "d4", "1d10-1". Randomness is injected
//! by the caller as a `FnMut(min, max) -> i32` closure so the domain never owns an RNG.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error when parsing a dice formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    /// The formula string is empty
    #[error("Empty dice formula")]
    Empty,
    /// Invalid format - expected XdY or XdY+Z
    #[error("Invalid dice format: {0}")]
    InvalidFormat(String),
    /// Dice count must be at least 1
    #[error("Dice count must be at least 1")]
    InvalidDiceCount,
    /// Die size must be at least 2
    #[error("Die size must be at least 2")]
    InvalidDieSize,
}

/// A parsed dice formula like "2d6+3"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceFormula {
    /// Number of dice to roll (X in XdY)
    pub dice_count: u8,
    /// Size of each die (Y in XdY)
    pub die_size: u8,
    /// Modifier to add/subtract after rolling (+Z or -Z)
    pub modifier: i32,
}

impl DiceFormula {
    /// Create a new dice formula
    pub fn new(dice_count: u8, die_size: u8, modifier: i32) -> Result<Self, DiceParseError> {
        if dice_count == 0 {
            return Err(DiceParseError::InvalidDiceCount);
        }
        if die_size < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }
        Ok(Self {
            dice_count,
            die_size,
            modifier,
        })
    }

    /// The percentile die used by every skill check.
    pub const fn percentile() -> Self {
        Self {
            dice_count: 1,
            die_size: 100,
            modifier: 0,
        }
    }

    /// Parse a dice formula string like "1d6+1", "2d6", "d4"
    ///
    /// Supported formats:
    /// - "XdY" - Roll X dice of size Y
    /// - "XdY+Z" - Roll X dice of size Y, add Z
    /// - "XdY-Z" - Roll X dice of size Y, subtract Z
    /// - "dY" - Roll 1 die of size Y (shorthand)
    pub fn parse(input: &str) -> Result<Self, DiceParseError> {
        let input: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if input.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let d_pos = input.find('d').ok_or_else(|| {
            DiceParseError::InvalidFormat(format!("Missing 'd' separator in '{}'", input))
        })?;

        let dice_count_str = &input[..d_pos];
        let dice_count: u8 = if dice_count_str.is_empty() {
            1
        } else {
            dice_count_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid dice count: '{}'", dice_count_str))
            })?
        };
        if dice_count == 0 {
            return Err(DiceParseError::InvalidDiceCount);
        }

        let after_d = &input[d_pos + 1..];
        let (die_size_str, modifier) = if let Some(plus_pos) = after_d.find('+') {
            let mod_str = &after_d[plus_pos + 1..];
            let modifier: i32 = mod_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid modifier: '+{}'", mod_str))
            })?;
            (&after_d[..plus_pos], modifier)
        } else if let Some(minus_pos) = after_d.find('-') {
            if minus_pos == 0 {
                return Err(DiceParseError::InvalidFormat(format!(
                    "Invalid die size: '{}'",
                    after_d
                )));
            }
            let mod_str = &after_d[minus_pos + 1..];
            let modifier: i32 = mod_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid modifier: '-{}'", mod_str))
            })?;
            (&after_d[..minus_pos], -modifier)
        } else {
            (after_d, 0)
        };

        let die_size: u8 = die_size_str.parse().map_err(|_| {
            DiceParseError::InvalidFormat(format!("Invalid die size: '{}'", die_size_str))
        })?;
        if die_size < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }

        Ok(Self {
            dice_count,
            die_size,
            modifier,
        })
    }

    /// Roll the dice using the injected die roller.
    ///
    /// `roll_die(min, max)` must return a value in `min..=max`.
    pub fn roll_with(&self, roll_die: &mut impl FnMut(i32, i32) -> i32) -> DiceRollResult {
        let individual_rolls: Vec<i32> = (0..self.dice_count)
            .map(|_| roll_die(1, i32::from(self.die_size)))
            .collect();
        let dice_total: i32 = individual_rolls.iter().sum();

        DiceRollResult {
            formula: *self,
            individual_rolls,
            dice_total,
            modifier_applied: self.modifier,
            total: dice_total + self.modifier,
        }
    }

    /// The next harsher formula on the overcharge stress ladder
    /// (1d4 -> 1d6 -> 1d6+1 -> 2d6 -> 2d6+2). The top rung stays put.
    pub fn escalated(&self) -> Self {
        match (self.dice_count, self.die_size, self.modifier) {
            (1, 4, 0) => Self::escalation_rung(1, 6, 0),
            (1, 6, 0) => Self::escalation_rung(1, 6, 1),
            (1, 6, 1) | (1, 6, 2) => Self::escalation_rung(2, 6, 0),
            (2, 6, 0) => Self::escalation_rung(2, 6, 2),
            _ => *self,
        }
    }

    const fn escalation_rung(dice_count: u8, die_size: u8, modifier: i32) -> Self {
        Self {
            dice_count,
            die_size,
            modifier,
        }
    }

    /// Get the minimum possible roll
    pub fn min_roll(&self) -> i32 {
        i32::from(self.dice_count) + self.modifier
    }

    /// Get the maximum possible roll
    pub fn max_roll(&self) -> i32 {
        i32::from(self.dice_count) * i32::from(self.die_size) + self.modifier
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            0 => write!(f, "{}d{}", self.dice_count, self.die_size),
            m if m > 0 => write!(f, "{}d{}+{}", self.dice_count, self.die_size, m),
            m => write!(f, "{}d{}{}", self.dice_count, self.die_size, m),
        }
    }
}

impl std::str::FromStr for DiceFormula {
    type Err = DiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Result of rolling dice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceRollResult {
    /// The formula that was rolled
    pub formula: DiceFormula,
    /// Individual die results
    pub individual_rolls: Vec<i32>,
    /// Sum of dice before modifier
    pub dice_total: i32,
    /// Modifier that was applied
    pub modifier_applied: i32,
    /// Final total (dice_total + modifier)
    pub total: i32,
}

impl DiceRollResult {
    /// Format as a breakdown string (e.g., "2d6[3, 5] + 2 = 10")
    pub fn breakdown(&self) -> String {
        let rolls: Vec<String> = self.individual_rolls.iter().map(|r| r.to_string()).collect();
        let dice = format!(
            "{}d{}[{}]",
            self.formula.dice_count,
            self.formula.die_size,
            rolls.join(", ")
        );
        match self.modifier_applied {
            0 => format!("{} = {}", dice, self.total),
            m if m > 0 => format!("{} + {} = {}", dice, m, self.total),
            m => format!("{} - {} = {}", dice, -m, self.total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always(value: i32) -> impl FnMut(i32, i32) -> i32 {
        move |_, _| value
    }

    #[test]
    fn parse_shorthand_die() {
        let formula = DiceFormula::parse("d4").unwrap();
        assert_eq!(formula, DiceFormula::new(1, 4, 0).unwrap());
    }

    #[test]
    fn parse_with_modifiers() {
        assert_eq!(DiceFormula::parse("1d6+1").unwrap().modifier, 1);
        assert_eq!(DiceFormula::parse("1D10 - 2").unwrap().modifier, -2);
        assert_eq!(DiceFormula::parse("2d10").unwrap().dice_count, 2);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(DiceFormula::parse(""), Err(DiceParseError::Empty)));
        assert!(matches!(
            DiceFormula::parse("20"),
            Err(DiceParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            DiceFormula::parse("0d6"),
            Err(DiceParseError::InvalidDiceCount)
        ));
        assert!(matches!(
            DiceFormula::parse("1d1"),
            Err(DiceParseError::InvalidDieSize)
        ));
        assert!(DiceFormula::parse("1d6+x").is_err());
    }

    #[test]
    fn roll_sums_dice_and_modifier() {
        let formula = DiceFormula::parse("2d6+2").unwrap();
        let result = formula.roll_with(&mut always(4));
        assert_eq!(result.individual_rolls, vec![4, 4]);
        assert_eq!(result.total, 10);
        assert_eq!(result.breakdown(), "2d6[4, 4] + 2 = 10");
    }

    #[test]
    fn roll_passes_die_bounds_to_roller() {
        let formula = DiceFormula::percentile();
        let mut seen = Vec::new();
        let result = formula.roll_with(&mut |min, max| {
            seen.push((min, max));
            max
        });
        assert_eq!(seen, vec![(1, 100)]);
        assert_eq!(result.total, 100);
    }

    #[test]
    fn escalation_ladder_tops_out() {
        let mut formula = DiceFormula::parse("1d4").unwrap();
        let mut ladder = vec![formula.to_string()];
        for _ in 0..5 {
            formula = formula.escalated();
            ladder.push(formula.to_string());
        }
        assert_eq!(
            ladder,
            vec!["1d4", "1d6", "1d6+1", "2d6", "2d6+2", "2d6+2"]
        );
    }

    #[test]
    fn min_and_max_rolls() {
        let formula = DiceFormula::parse("2d6-1").unwrap();
        assert_eq!(formula.min_roll(), 1);
        assert_eq!(formula.max_roll(), 11);
    }
}

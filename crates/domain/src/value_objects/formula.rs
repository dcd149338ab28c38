//! Closed arithmetic formulas for power damage, healing and control duration.
//!
//! A formula is a signed sum of terms. Each term is a dice roll (`2d6`), an
//! integer constant, or a whitelisted characteristic token. Tokens read the
//! caster's characteristics at evaluation time:
//!
//! | Token      | Value                |
//! |------------|----------------------|
//! | `STR`      | `STR / 10`           |
//! | `STR_10`   | `STR / 10`           |
//! | `STR_5`    | `STR / 5`            |
//! | `STR_RAW`  | raw `STR`            |
//!
//! Only STR, DEX, CON, INT, SIZ, APP and EDU may appear. POW and any other
//! alphabetic token are rejected when the formula is parsed.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::characteristics::{Characteristic, Characteristics};
use super::dice::{DiceFormula, DiceParseError};

/// Why a formula was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("formula is empty")]
    Empty,
    #[error("malformed term '{0}'")]
    Malformed(String),
    #[error("token '{0}' is not allowed in formulas")]
    ForbiddenToken(String),
    #[error("unknown token '{0}'")]
    UnknownToken(String),
    #[error("dice are not allowed here")]
    DiceNotAllowed,
    #[error(transparent)]
    Dice(#[from] DiceParseError),
}

/// How a characteristic token is scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenScale {
    Raw,
    Tenths,
    Fifths,
}

impl TokenScale {
    fn apply(self, raw: i32) -> i32 {
        match self {
            TokenScale::Raw => raw,
            TokenScale::Tenths => (raw / 10).max(0),
            TokenScale::Fifths => (raw / 5).max(0),
        }
    }
}

/// A single unsigned formula term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum FormulaTerm {
    Dice { dice: DiceFormula },
    Constant { value: i32 },
    Token {
        characteristic: Characteristic,
        scale: TokenScale,
    },
}

/// A term with its sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTerm {
    pub negative: bool,
    pub term: FormulaTerm,
}

/// A validated formula, parsed once from authoring text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Formula {
    source: String,
    terms: Vec<SignedTerm>,
}

/// The outcome of evaluating a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaRoll {
    /// The formula with tokens substituted, e.g. "1d6+3"
    pub expression: String,
    pub dice_rolls: Vec<i32>,
    pub total: i32,
}

const TOKEN_WHITELIST: [Characteristic; 7] = [
    Characteristic::Str,
    Characteristic::Dex,
    Characteristic::Con,
    Characteristic::Int,
    Characteristic::Siz,
    Characteristic::App,
    Characteristic::Edu,
];

impl Formula {
    /// Parse a damage or heal formula. Dice are allowed.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        Self::parse_inner(source, true)
    }

    /// Parse a formula that must evaluate without rolling (durations).
    pub fn parse_integer(source: &str) -> Result<Self, FormulaError> {
        Self::parse_inner(source, false)
    }

    fn parse_inner(source: &str, allow_dice: bool) -> Result<Self, FormulaError> {
        let compact: String = source.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(FormulaError::Empty);
        }

        let mut terms = Vec::new();
        let mut negative = false;
        let mut current = String::new();
        for ch in compact.chars() {
            if ch == '+' || ch == '-' {
                if current.is_empty() {
                    // Leading sign or a doubled operator like "1+-2"
                    if !terms.is_empty() || negative {
                        return Err(FormulaError::Malformed(compact.clone()));
                    }
                    negative = ch == '-';
                    continue;
                }
                terms.push(SignedTerm {
                    negative,
                    term: Self::parse_term(&current, allow_dice)?,
                });
                current.clear();
                negative = ch == '-';
            } else {
                current.push(ch);
            }
        }
        if current.is_empty() {
            return Err(FormulaError::Malformed(compact));
        }
        terms.push(SignedTerm {
            negative,
            term: Self::parse_term(&current, allow_dice)?,
        });

        Ok(Self {
            source: source.trim().to_string(),
            terms,
        })
    }

    fn parse_term(raw: &str, allow_dice: bool) -> Result<FormulaTerm, FormulaError> {
        if raw.chars().all(|c| c.is_ascii_digit()) {
            let value = raw
                .parse()
                .map_err(|_| FormulaError::Malformed(raw.to_string()))?;
            return Ok(FormulaTerm::Constant { value });
        }

        let lower = raw.to_ascii_lowercase();
        if let Some((count, size)) = lower.split_once('d') {
            let is_dice = count.chars().all(|c| c.is_ascii_digit())
                && !size.is_empty()
                && size.chars().all(|c| c.is_ascii_digit());
            if is_dice {
                if !allow_dice {
                    return Err(FormulaError::DiceNotAllowed);
                }
                return Ok(FormulaTerm::Dice {
                    dice: DiceFormula::parse(&lower)?,
                });
            }
        }

        Self::parse_token(raw)
    }

    fn parse_token(raw: &str) -> Result<FormulaTerm, FormulaError> {
        let upper = raw.to_ascii_uppercase();
        let (base, scale) = if let Some(base) = upper.strip_suffix("_RAW") {
            (base, TokenScale::Raw)
        } else if let Some(base) = upper.strip_suffix("_10") {
            (base, TokenScale::Tenths)
        } else if let Some(base) = upper.strip_suffix("_5") {
            (base, TokenScale::Fifths)
        } else {
            (upper.as_str(), TokenScale::Tenths)
        };

        let characteristic = base
            .parse::<Characteristic>()
            .map_err(|_| FormulaError::UnknownToken(raw.to_string()))?;
        if !TOKEN_WHITELIST.contains(&characteristic) {
            return Err(FormulaError::ForbiddenToken(raw.to_string()));
        }
        Ok(FormulaTerm::Token {
            characteristic,
            scale,
        })
    }

    /// The authoring text this formula was parsed from.
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn terms(&self) -> &[SignedTerm] {
        &self.terms
    }

    pub fn has_dice(&self) -> bool {
        self.terms
            .iter()
            .any(|t| matches!(t.term, FormulaTerm::Dice { .. }))
    }

    /// Evaluate against a caster's characteristics, rolling any dice with `roll_die`.
    pub fn evaluate(
        &self,
        characteristics: &Characteristics,
        roll_die: &mut impl FnMut(i32, i32) -> i32,
    ) -> FormulaRoll {
        let mut expression = String::new();
        let mut dice_rolls = Vec::new();
        let mut total = 0;

        for (i, signed) in self.terms.iter().enumerate() {
            let sign = if signed.negative { -1 } else { 1 };
            if signed.negative {
                expression.push('-');
            } else if i > 0 {
                expression.push('+');
            }
            match &signed.term {
                FormulaTerm::Dice { dice } => {
                    let roll = dice.roll_with(roll_die);
                    expression.push_str(&dice.to_string());
                    dice_rolls.extend(roll.individual_rolls.iter().copied());
                    total += sign * roll.total;
                }
                FormulaTerm::Constant { value } => {
                    expression.push_str(&value.to_string());
                    total += sign * value;
                }
                FormulaTerm::Token {
                    characteristic,
                    scale,
                } => {
                    let value = scale.apply(characteristics.get(*characteristic));
                    expression.push_str(&value.to_string());
                    total += sign * value;
                }
            }
        }

        FormulaRoll {
            expression,
            dice_rolls,
            total,
        }
    }

    /// Evaluate a dice-free formula.
    pub fn evaluate_integer(&self, characteristics: &Characteristics) -> i32 {
        // Dice-free formulas never call the roller; a dice formula evaluated here
        // contributes its minimum.
        self.evaluate(characteristics, &mut |min, _| min).total
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

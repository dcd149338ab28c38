//! Percentile characteristics (STR, CON, SIZ, DEX, APP, INT, POW, EDU, LUCK)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Value assumed for any characteristic the authoring data leaves out.
pub const DEFAULT_CHARACTERISTIC: i32 = 50;

/// One of the nine percentile characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Characteristic {
    Str,
    Con,
    Siz,
    Dex,
    App,
    Int,
    Pow,
    Edu,
    Luck,
}

impl Characteristic {
    pub const ALL: [Characteristic; 9] = [
        Characteristic::Str,
        Characteristic::Con,
        Characteristic::Siz,
        Characteristic::Dex,
        Characteristic::App,
        Characteristic::Int,
        Characteristic::Pow,
        Characteristic::Edu,
        Characteristic::Luck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Characteristic::Str => "STR",
            Characteristic::Con => "CON",
            Characteristic::Siz => "SIZ",
            Characteristic::Dex => "DEX",
            Characteristic::App => "APP",
            Characteristic::Int => "INT",
            Characteristic::Pow => "POW",
            Characteristic::Edu => "EDU",
            Characteristic::Luck => "LUCK",
        }
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Characteristic {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "STR" => Ok(Self::Str),
            "CON" => Ok(Self::Con),
            "SIZ" => Ok(Self::Siz),
            "DEX" => Ok(Self::Dex),
            "APP" => Ok(Self::App),
            "INT" => Ok(Self::Int),
            "POW" => Ok(Self::Pow),
            "EDU" => Ok(Self::Edu),
            "LUCK" => Ok(Self::Luck),
            other => Err(DomainError::parse(format!("Unknown characteristic: {}", other))),
        }
    }
}

/// A characteristic block. Missing entries read as [`DEFAULT_CHARACTERISTIC`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Characteristics {
    values: BTreeMap<Characteristic, i32>,
}

impl Characteristics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, characteristic: Characteristic, value: i32) -> Self {
        self.set(characteristic, value);
        self
    }

    #[inline]
    pub fn get(&self, characteristic: Characteristic) -> i32 {
        self.values
            .get(&characteristic)
            .copied()
            .unwrap_or(DEFAULT_CHARACTERISTIC)
    }

    pub fn set(&mut self, characteristic: Characteristic, value: i32) {
        self.values.insert(characteristic, value);
    }

    /// Entries explicitly set, in characteristic order.
    pub fn iter(&self) -> impl Iterator<Item = (Characteristic, i32)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_characteristic_defaults_to_fifty() {
        let block = Characteristics::new().with(Characteristic::Str, 70);
        assert_eq!(block.get(Characteristic::Str), 70);
        assert_eq!(block.get(Characteristic::Pow), DEFAULT_CHARACTERISTIC);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("dex".parse::<Characteristic>().unwrap(), Characteristic::Dex);
        assert_eq!("Luck".parse::<Characteristic>().unwrap(), Characteristic::Luck);
        assert!("SAN".parse::<Characteristic>().is_err());
    }
}

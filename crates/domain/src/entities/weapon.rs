//! Weapon definitions, validated when the authoring table loads.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::value_objects::DiceFormula;

/// Damage category. Elemental ("arts") damage is reduced by barriers,
/// everything else by armor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    #[default]
    Physical,
    Arts,
}

impl DamageType {
    /// Anything other than "arts" is physical.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("arts") {
            DamageType::Arts
        } else {
            DamageType::Physical
        }
    }

    #[inline]
    pub fn is_elemental(&self) -> bool {
        matches!(self, DamageType::Arts)
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DamageType::Physical => f.write_str("physical"),
            DamageType::Arts => f.write_str("arts"),
        }
    }
}

/// A static weapon entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponDef {
    id: String,
    label: String,
    reach_steps: u32,
    skill: String,
    defense_skill: String,
    damage: DiceFormula,
    damage_type: DamageType,
}

impl WeaponDef {
    /// Validate and build a weapon definition.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        reach_steps: u32,
        skill: impl Into<String>,
        defense_skill: impl Into<String>,
        damage: &str,
        damage_type: DamageType,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        let label = label.into();
        let skill = skill.into();
        let defense_skill = defense_skill.into();

        if id.trim().is_empty() {
            return Err(DomainError::validation("weapon id cannot be empty"));
        }
        if label.trim().is_empty() {
            return Err(DomainError::validation(format!("weapon '{}': label is required", id)));
        }
        if reach_steps == 0 {
            return Err(DomainError::validation(format!(
                "weapon '{}': reach_steps must be positive",
                id
            )));
        }
        if skill.trim().is_empty() || defense_skill.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "weapon '{}': skill and defense_skill are required",
                id
            )));
        }
        let damage = DiceFormula::parse(damage).map_err(|e| {
            DomainError::validation(format!("weapon '{}': bad damage '{}': {}", id, damage, e))
        })?;

        Ok(Self {
            id,
            label,
            reach_steps,
            skill,
            defense_skill,
            damage,
            damage_type,
        })
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn reach_steps(&self) -> u32 {
        self.reach_steps
    }

    #[inline]
    pub fn skill(&self) -> &str {
        &self.skill
    }

    #[inline]
    pub fn defense_skill(&self) -> &str {
        &self.defense_skill
    }

    #[inline]
    pub fn damage(&self) -> &DiceFormula {
        &self.damage
    }

    #[inline]
    pub fn damage_type(&self) -> DamageType {
        self.damage_type
    }
}

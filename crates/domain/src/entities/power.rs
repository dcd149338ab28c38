//! Power ("art") definitions.
//!
//! Formulas are parsed into [`Formula`] when the definition is built, so a
//! bad token fails the load instead of a cast.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::weapon::DamageType;
use crate::error::DomainError;
use crate::value_objects::{ControlEffect, Formula};

/// Tag that lets protectors intercept a power.
pub const TAG_GUARD_INTERCEPT: &str = "guard-intercept";
/// Tag that makes total cover block a power.
pub const TAG_LINE_OF_SIGHT: &str = "line-of-sight";

/// How a power is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum PowerCost {
    Fixed { cost: u32 },
    /// Caster chooses a spend of at least `min`, capped by `max` when set
    Variable { min: u32, max: Option<u32> },
}

impl PowerCost {
    /// The minimum the caster must pay.
    pub fn base(&self) -> u32 {
        match self {
            PowerCost::Fixed { cost } => *cost,
            PowerCost::Variable { min, .. } => *min,
        }
    }

    /// Amount to charge given the caster's request and current MP.
    ///
    /// Fixed costs ignore the request. Variable costs clamp the request to
    /// `min(max, current)` but never below the minimum; a result above
    /// `current` means the caster cannot pay.
    pub fn resolve_spend(&self, requested: Option<u32>, current_mp: u32) -> u32 {
        match self {
            PowerCost::Fixed { cost } => *cost,
            PowerCost::Variable { min, max } => {
                let want = requested.unwrap_or(*min);
                let hard_max = max.filter(|m| *m > 0).unwrap_or(current_mp);
                want.min(hard_max).min(current_mp).max(*min)
            }
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, PowerCost::Variable { .. })
    }
}

impl Default for PowerCost {
    fn default() -> Self {
        PowerCost::Fixed { cost: 0 }
    }
}

/// Control status a power inflicts on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlSpec {
    pub effect: ControlEffect,
    pub duration: Formula,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerDef {
    id: String,
    label: String,
    cast_skill: String,
    resist: String,
    range_steps: u32,
    damage_type: DamageType,
    cost: PowerCost,
    damage: Option<Formula>,
    heal: Option<Formula>,
    control: Option<ControlSpec>,
    tags: BTreeSet<String>,
    description: Option<String>,
}

impl PowerDef {
    /// Validate the required fields of a power.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        cast_skill: impl Into<String>,
        resist: impl Into<String>,
        range_steps: u32,
        damage_type: DamageType,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        let label = label.into();
        let cast_skill = cast_skill.into();
        let resist = resist.into();

        if id.trim().is_empty() {
            return Err(DomainError::validation("power id cannot be empty"));
        }
        if label.trim().is_empty() {
            return Err(DomainError::validation(format!("power '{}': label is required", id)));
        }
        if cast_skill.trim().is_empty() || resist.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "power '{}': cast_skill and resist are required",
                id
            )));
        }
        if resist.trim().eq_ignore_ascii_case("POW") {
            return Err(DomainError::validation(format!(
                "power '{}': POW cannot be used as a resist skill",
                id
            )));
        }
        if range_steps == 0 {
            return Err(DomainError::validation(format!(
                "power '{}': range_steps must be positive",
                id
            )));
        }

        Ok(Self {
            id,
            label,
            cast_skill,
            resist,
            range_steps,
            damage_type,
            cost: PowerCost::default(),
            damage: None,
            heal: None,
            control: None,
            tags: BTreeSet::new(),
            description: None,
        })
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    pub fn with_cost(mut self, cost: PowerCost) -> Result<Self, DomainError> {
        if let PowerCost::Variable { min, max: Some(max) } = cost {
            if max > 0 && max < min {
                return Err(DomainError::validation(format!(
                    "power '{}': mp.max {} is below mp.cost {}",
                    self.id, max, min
                )));
            }
        }
        self.cost = cost;
        Ok(self)
    }

    pub fn with_damage(mut self, formula: &str) -> Result<Self, DomainError> {
        self.damage = Some(Formula::parse(formula).map_err(|e| DomainError::formula(formula, e))?);
        Ok(self)
    }

    pub fn with_heal(mut self, formula: &str) -> Result<Self, DomainError> {
        self.heal = Some(Formula::parse(formula).map_err(|e| DomainError::formula(formula, e))?);
        Ok(self)
    }

    pub fn with_control(
        mut self,
        effect: impl Into<ControlEffect>,
        duration: &str,
    ) -> Result<Self, DomainError> {
        let effect = effect.into();
        if effect.name().is_empty() {
            return Err(DomainError::validation(format!(
                "power '{}': control effect name is required",
                self.id
            )));
        }
        let duration =
            Formula::parse_integer(duration).map_err(|e| DomainError::formula(duration, e))?;
        self.control = Some(ControlSpec { effect, duration });
        Ok(self)
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn cast_skill(&self) -> &str {
        &self.cast_skill
    }

    #[inline]
    pub fn resist(&self) -> &str {
        &self.resist
    }

    #[inline]
    pub fn range_steps(&self) -> u32 {
        self.range_steps
    }

    #[inline]
    pub fn damage_type(&self) -> DamageType {
        self.damage_type
    }

    #[inline]
    pub fn cost(&self) -> PowerCost {
        self.cost
    }

    #[inline]
    pub fn damage(&self) -> Option<&Formula> {
        self.damage.as_ref()
    }

    #[inline]
    pub fn heal(&self) -> Option<&Formula> {
        self.heal.as_ref()
    }

    #[inline]
    pub fn control(&self) -> Option<&ControlSpec> {
        self.control.as_ref()
    }

    #[inline]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn allows_guard_intercept(&self) -> bool {
        self.tags.contains(TAG_GUARD_INTERCEPT) || self.tags.contains("allow-guard-intercept")
    }

    pub fn needs_line_of_sight(&self) -> bool {
        self.tags.contains(TAG_LINE_OF_SIGHT)
    }
}

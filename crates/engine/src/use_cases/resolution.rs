//! Building blocks shared by the combat and casting pipelines.
//!
//! Gates run before anything mutates; `Resolution` decides hit or miss;
//! `intercept_guard` swaps in a protector; `apply_mitigated` lands damage.

use serde::Serialize;

use tabletale_domain::value_objects::{resolve_contest, ContestWinner, DiceRollResult};
use tabletale_domain::{
    ActionKind, CheckRoll, DamageOutcome, DamageType, DiceFormula, TurnResource, World,
};

use super::error::RuleError;
use crate::infrastructure::ports::RandomPort;

// =============================================================================
// Rolls
// =============================================================================

pub(crate) fn roll_d100(random: &dyn RandomPort) -> i32 {
    random.gen_range(1, 100)
}

/// Roll a percentile check against `target`.
pub(crate) fn check(random: &dyn RandomPort, target: i32) -> CheckRoll {
    CheckRoll::resolve(roll_d100(random), target)
}

pub(crate) fn roll_dice(random: &dyn RandomPort, dice: &DiceFormula) -> DiceRollResult {
    dice.roll_with(&mut |min, max| random.gen_range(min, max))
}

// =============================================================================
// Hit Resolution
// =============================================================================

/// How an attack or cast was decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum Resolution {
    /// Defender is dying and cannot resist: the attacker rolls alone
    Single { check: CheckRoll },
    Contest {
        attacker: CheckRoll,
        defender: CheckRoll,
        winner: ContestWinner,
    },
    /// A dying attacker facing a standing defender loses without a roll
    AttackerDying,
}

impl Resolution {
    pub fn hit(&self) -> bool {
        match self {
            Resolution::Single { check } => check.is_success(),
            Resolution::Contest { winner, .. } => *winner == ContestWinner::Attacker,
            Resolution::AttackerDying => false,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Resolution::Single { check } => format!("unopposed {}", check),
            Resolution::Contest {
                attacker,
                defender,
                winner,
            } => {
                let side = match winner {
                    ContestWinner::Attacker => "attacker",
                    ContestWinner::Defender => "defender",
                };
                format!("{} vs {}, {} wins", attacker, defender, side)
            }
            Resolution::AttackerDying => "attacker is dying and cannot press".to_string(),
        }
    }
}

/// Decide an opposed exchange.
///
/// `attack_value` is the attacker's effective skill (already penalized for
/// overcharge if any); `defense_skill` is read from the defender's sheet.
pub(crate) fn resolve_opposed(
    world: &World,
    random: &dyn RandomPort,
    attacker: &str,
    attack_value: i32,
    defender: &str,
    defense_skill: &str,
) -> Result<Resolution, RuleError> {
    let defender_sheet = world
        .sheet(defender)
        .ok_or_else(|| RuleError::UnknownActor(defender.to_string()))?;

    if defender_sheet.is_dying() {
        return Ok(Resolution::Single {
            check: check(random, attack_value),
        });
    }
    if world.is_dying(attacker) {
        return Ok(Resolution::AttackerDying);
    }

    let attacker_roll = check(random, attack_value);
    let defender_roll = check(random, defender_sheet.skill_value(defense_skill));
    Ok(Resolution::Contest {
        attacker: attacker_roll,
        defender: defender_roll,
        winner: resolve_contest(&attacker_roll, &defender_roll),
    })
}

// =============================================================================
// Guard Interception
// =============================================================================

/// A protector stepping in front of an attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interception {
    pub guardian: String,
    pub protectee: String,
    /// Steps from the attacker to the guardian
    pub distance: u32,
}

/// Pick the protector who intercepts an attack on `protectee`, spending
/// their reaction.
///
/// Eligible protectors are alive, within one step of the protectee, still
/// hold their reaction and stand within `reach` of the attacker. The nearest
/// to the attacker wins; ties go to the earliest registered.
pub(crate) fn intercept_guard(
    world: &mut World,
    attacker: &str,
    protectee: &str,
    reach: u32,
) -> Result<Option<Interception>, RuleError> {
    let mut candidates: Vec<(u32, usize, String)> = world
        .protectors_of(protectee)
        .iter()
        .enumerate()
        .filter(|(_, guardian)| guardian.as_str() != attacker)
        .filter(|(_, guardian)| world.is_alive(guardian))
        .filter(|(_, guardian)| world.is_resource_available(guardian, TurnResource::Reaction))
        .filter(|(_, guardian)| {
            world
                .distance(guardian, protectee)
                .is_some_and(|d| d <= 1)
        })
        .filter_map(|(index, guardian)| {
            world
                .distance(attacker, guardian)
                .filter(|d| *d <= reach)
                .map(|d| (d, index, guardian.clone()))
        })
        .collect();
    candidates.sort();

    let Some((distance, _, guardian)) = candidates.into_iter().next() else {
        return Ok(None);
    };
    world.use_resource(&guardian, TurnResource::Reaction)?;
    tracing::info!(
        guardian = %guardian,
        protectee = %protectee,
        attacker = %attacker,
        "Guard intercepts"
    );
    Ok(Some(Interception {
        guardian,
        protectee: protectee.to_string(),
        distance,
    }))
}

// =============================================================================
// Damage
// =============================================================================

/// Damage that landed on a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageReport {
    /// Dice breakdown or formula expression
    pub roll: String,
    pub raw: i32,
    pub mitigation: i32,
    pub dealt: i32,
    pub outcome: DamageOutcome,
}

impl DamageReport {
    pub fn describe(&self, target: &str) -> String {
        let tail = match &self.outcome {
            DamageOutcome::AlreadyDead => format!("{} was already dead", target),
            DamageOutcome::Wounded { remaining_hp, .. } => {
                format!("{} has {} HP left", target, remaining_hp)
            }
            DamageOutcome::Downed { turns_left, .. } => {
                format!("{} falls and is dying ({} turns)", target, turns_left)
            }
            DamageOutcome::Killed { .. } => format!("{} dies", target),
        };
        if self.mitigation > 0 {
            format!(
                "{} damage ({} - {} mitigated); {}",
                self.dealt, self.roll, self.mitigation, tail
            )
        } else {
            format!("{} damage ({}); {}", self.dealt, self.roll, tail)
        }
    }
}

/// Subtract the target's mitigation for `damage_type` (floor 0) and apply.
pub(crate) fn apply_mitigated(
    world: &mut World,
    target: &str,
    roll: String,
    raw: i32,
    damage_type: DamageType,
) -> Result<DamageReport, RuleError> {
    let mitigation = world
        .sheet(target)
        .map(|s| s.mitigation_against(damage_type.is_elemental()))
        .ok_or_else(|| RuleError::UnknownActor(target.to_string()))?;
    let dealt = (raw - mitigation).max(0);
    let outcome = world.apply_damage(target, dealt)?;
    match &outcome {
        DamageOutcome::Downed { turns_left, .. } => {
            tracing::info!(actor = %target, turns_left, "Actor is dying");
        }
        DamageOutcome::Killed { .. } => tracing::info!(actor = %target, "Actor died"),
        _ => tracing::info!(actor = %target, dealt, "Damage applied"),
    }
    Ok(DamageReport {
        roll,
        raw,
        mitigation,
        dealt,
        outcome,
    })
}

// =============================================================================
// Gates
// =============================================================================

pub(crate) fn ensure_actor(world: &World, name: &str) -> Result<(), RuleError> {
    if world.has_actor(name) {
        Ok(())
    } else {
        Err(RuleError::UnknownActor(name.to_string()))
    }
}

pub(crate) fn ensure_participant(world: &World, name: &str) -> Result<(), RuleError> {
    ensure_actor(world, name)?;
    if world.is_participant(name) {
        Ok(())
    } else {
        Err(RuleError::NotParticipant(name.to_string()))
    }
}

pub(crate) fn ensure_able(world: &World, name: &str, action: ActionKind) -> Result<(), RuleError> {
    match world.action_block_reason(name, action) {
        Some(reason) => {
            tracing::debug!(actor = %name, action = %action, reason = %reason, "Action blocked");
            Err(RuleError::ActorUnable(reason))
        }
        None => Ok(()),
    }
}

pub(crate) fn ensure_resource(
    world: &World,
    name: &str,
    resource: TurnResource,
) -> Result<(), RuleError> {
    if world.is_resource_available(name, resource) {
        Ok(())
    } else {
        Err(RuleError::ResourceSpent {
            actor: name.to_string(),
            resource,
        })
    }
}

pub(crate) fn spend_resource(
    world: &mut World,
    name: &str,
    resource: TurnResource,
) -> Result<(), RuleError> {
    if world.use_resource(name, resource)? {
        Ok(())
    } else {
        Err(RuleError::ResourceSpent {
            actor: name.to_string(),
            resource,
        })
    }
}

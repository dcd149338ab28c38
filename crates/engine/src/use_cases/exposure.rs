//! Exposure: stress gain, tier consequences and stage escalation.

use std::sync::Arc;

use serde::Serialize;

use tabletale_domain::value_objects::{Characteristic, StressTier, MAX_STAGE};
use tabletale_domain::{
    CheckRoll, ControlEffect, DamageOutcome, DiceFormula, Severity, StageAdvance, StageChoice,
    StatusEntry, SuccessLevel, World,
};

use super::error::RuleError;
use super::resolution::{check, ensure_actor, roll_dice};
use super::Narrated;
use crate::infrastructure::ports::RandomPort;

const RESIST_SKILL: &str = "Arts_Resist";
const FLARE_DAMAGE: DiceFormula = DiceFormula {
    dice_count: 1,
    die_size: 6,
    modifier: 0,
};
const STUN_DICE: DiceFormula = DiceFormula {
    dice_count: 1,
    die_size: 3,
    modifier: 0,
};

/// What drives the stress roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureSource {
    Severity(Severity),
    /// Explicit dice, used by overcharge
    Dice(DiceFormula),
}

impl ExposureSource {
    fn dice(&self) -> DiceFormula {
        match self {
            ExposureSource::Severity(severity) => severity.stress_dice(),
            ExposureSource::Dice(dice) => *dice,
        }
    }
}

/// Consequences of crossing the severe threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlareReport {
    pub flares: u32,
    pub con_check: CheckRoll,
    pub damage: Option<DamageOutcome>,
    pub pow_check: CheckRoll,
    pub stunned_turns: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureOutcome {
    pub actor: String,
    pub dice: String,
    pub raw: i32,
    pub resist: CheckRoll,
    pub gain: u32,
    pub stress_before: u32,
    pub stress_after: u32,
    pub tiers: Vec<StressTier>,
    pub flare: Option<FlareReport>,
    pub escalation: Option<StageAdvance>,
}

impl Narrated for ExposureOutcome {
    fn narration(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{} resists the exposure ({}): stress +{} ({} -> {}).",
            self.actor, self.resist, self.gain, self.stress_before, self.stress_after
        )];
        for tier in &self.tiers {
            lines.push(match tier {
                StressTier::Mild => format!("{} feels a faint burning under the skin.", self.actor),
                StressTier::Moderate => {
                    format!("{}'s veins glow; the strain is starting to show.", self.actor)
                }
                StressTier::Severe => format!("{} suffers a severe flare.", self.actor),
            });
        }
        if let Some(flare) = &self.flare {
            if let Some(damage) = &flare.damage {
                lines.push(format!(
                    "The flare tears at {} for {} damage.",
                    self.actor,
                    damage.damage_dealt()
                ));
            }
            if let Some(turns) = flare.stunned_turns {
                lines.push(format!("{} is stunned for {} turn(s).", self.actor, turns));
            }
        }
        if let Some(advance) = &self.escalation {
            lines.extend(advance.narration());
        }
        lines
    }
}

impl Narrated for StageAdvance {
    fn narration(&self) -> Vec<String> {
        vec![format!(
            "Exposure stage {} -> {} ({}); stress floor now {}.",
            self.from_stage, self.to_stage, self.penalty, self.stress
        )]
    }
}

/// Read-only report of an actor's exposure track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureState {
    pub actor: String,
    pub stage: u8,
    pub stress: u32,
    pub severe_flares: u32,
    pub crystal_density: u32,
    pub affinity: i32,
    pub overcharge_uses: u32,
    pub resist_target: i32,
    /// Stress dice the next overcharge would roll
    pub next_overcharge: String,
}

impl Narrated for ExposureState {
    fn narration(&self) -> Vec<String> {
        vec![format!(
            "{}: stage {}, stress {}, severe flares {}, resist {}.",
            self.actor, self.stage, self.stress, self.severe_flares, self.resist_target
        )]
    }
}

/// Apply an exposure to one actor.
pub struct ApplyExposure {
    random: Arc<dyn RandomPort>,
}

impl ApplyExposure {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        Self { random }
    }

    /// Roll stress, resist it, and run whatever the new stress level
    /// triggers. Escalation at the end picks the `con` penalty.
    pub fn execute(
        &self,
        world: &mut World,
        actor: &str,
        source: ExposureSource,
        bonus: i32,
    ) -> Result<ExposureOutcome, RuleError> {
        ensure_actor(world, actor)?;
        let random = self.random.as_ref();

        let dice = source.dice();
        let raw = roll_dice(random, &dice).total;
        let resist = check(random, resist_target(world, actor, bonus));
        let gain = stress_gain(raw, &resist);
        let (stress_before, stress_after) = world.add_stress(actor, gain)?;
        tracing::debug!(
            actor = %actor,
            dice = %dice,
            raw,
            resist = %resist,
            gain,
            "Exposure rolled"
        );

        let tiers = StressTier::crossed(stress_before, stress_after);
        let flare = if tiers.contains(&StressTier::Severe) {
            Some(self.severe_flare(world, actor)?)
        } else {
            None
        };

        let should_escalate = world
            .sheet(actor)
            .map(|s| s.exposure().should_escalate())
            .unwrap_or(false);
        let escalation = if should_escalate {
            let advance = world.advance_stage(actor, StageChoice::Con)?;
            tracing::info!(actor = %actor, stage = advance.to_stage, "Exposure stage advanced");
            Some(advance)
        } else {
            None
        };

        Ok(ExposureOutcome {
            actor: actor.to_string(),
            dice: dice.to_string(),
            raw,
            resist,
            gain,
            stress_before,
            stress_after,
            tiers,
            flare,
            escalation,
        })
    }

    fn severe_flare(&self, world: &mut World, actor: &str) -> Result<FlareReport, RuleError> {
        let random = self.random.as_ref();
        let flares = world.record_severe_flare(actor)?;
        let (con, pow, barrier) = world
            .sheet(actor)
            .map(|s| {
                let block = s.characteristics();
                (
                    block.get(Characteristic::Con),
                    block.get(Characteristic::Pow),
                    s.mitigation().arts_barrier,
                )
            })
            .ok_or_else(|| RuleError::UnknownActor(actor.to_string()))?;

        let con_check = check(random, con);
        let damage = if con_check.level == SuccessLevel::Extreme {
            None
        } else {
            let rolled = roll_dice(random, &FLARE_DAMAGE).total;
            let amount = if barrier > 0 { (rolled + 1) / 2 } else { rolled };
            Some(world.apply_damage(actor, amount)?)
        };

        let pow_check = check(random, pow);
        let stunned_turns = if pow_check.is_success() {
            None
        } else {
            let turns = roll_dice(random, &STUN_DICE).total.max(1) as u32;
            world.add_status(actor, StatusEntry::control(ControlEffect::Stunned, turns, None))?;
            Some(turns)
        };
        tracing::info!(actor = %actor, flares, ?damage, ?stunned_turns, "Severe flare");

        Ok(FlareReport {
            flares,
            con_check,
            damage,
            pow_check,
            stunned_turns,
        })
    }
}

/// `max(arts resist, round((CON + POW) / 2)) + bonus - stage penalty`, at
/// least 1. Halves round to even.
pub fn resist_target(world: &World, actor: &str, bonus: i32) -> i32 {
    let Some(sheet) = world.sheet(actor) else {
        return 1;
    };
    let skill = match sheet.arts_resist() {
        Some(value) if value > 0 => value,
        _ => sheet.skill_value(RESIST_SKILL),
    };
    let block = sheet.characteristics();
    let blend = half_to_even(block.get(Characteristic::Con) + block.get(Characteristic::Pow));
    (skill.max(blend) + bonus - sheet.exposure().resist_penalty()).max(1)
}

fn half_to_even(sum: i32) -> i32 {
    let half = sum.div_euclid(2);
    if sum.rem_euclid(2) == 1 && half % 2 != 0 {
        half + 1
    } else {
        half
    }
}

/// Stress after the resist check: extreme 0, success half, fail full,
/// fumble one and a half. Any nonzero factor gains at least 1.
fn stress_gain(raw: i32, resist: &CheckRoll) -> u32 {
    if raw <= 0 {
        return 0;
    }
    let raw = raw as u32;
    if resist.is_fumble() {
        (raw * 3 / 2).max(1)
    } else {
        match resist.level {
            SuccessLevel::Extreme => 0,
            SuccessLevel::Hard | SuccessLevel::Regular => (raw / 2).max(1),
            SuccessLevel::Fail => raw,
        }
    }
}

/// Advance the stage by hand with a chosen penalty.
pub fn advance_stage(
    world: &mut World,
    actor: &str,
    choice: StageChoice,
) -> Result<StageAdvance, RuleError> {
    ensure_actor(world, actor)?;
    let stage = world.sheet(actor).map(|s| s.exposure().stage).unwrap_or(0);
    if stage >= MAX_STAGE {
        return Err(RuleError::StageMax(actor.to_string()));
    }
    let advance = world.advance_stage(actor, choice)?;
    tracing::info!(actor = %actor, stage = advance.to_stage, ?choice, "Exposure stage advanced");
    Ok(advance)
}

pub fn exposure_state(world: &World, actor: &str) -> Result<ExposureState, RuleError> {
    let sheet = world
        .sheet(actor)
        .ok_or_else(|| RuleError::UnknownActor(actor.to_string()))?;
    let track = sheet.exposure();
    Ok(ExposureState {
        actor: actor.to_string(),
        stage: track.stage,
        stress: track.stress,
        severe_flares: track.severe_flares,
        crystal_density: track.crystal_density,
        affinity: track.affinity,
        overcharge_uses: track.overcharge_uses,
        resist_target: resist_target(world, actor, 0),
        next_overcharge: track.overcharge_dice().to_string(),
    })
}

//! Power casting.
//!
//! Gates (block, participants, definition, target, range, line of sight)
//! run first. Payment follows: the fixed or clamped variable cost comes out
//! of MP, or, when MP is short on a power that costs something, the caster
//! overcharges: MP drains to zero, the cast skill drops by 20 and an
//! exposure with escalating dice lands on the caster before the roll.

use std::sync::Arc;

use serde::Serialize;

use tabletale_domain::value_objects::FormulaRoll;
use tabletale_domain::{ActionKind, Cover, HealOutcome, StatusEntry, TurnResource, World};

use super::error::RuleError;
use super::exposure::{ApplyExposure, ExposureOutcome, ExposureSource};
use super::resolution::{
    apply_mitigated, ensure_able, ensure_participant, ensure_resource, intercept_guard,
    resolve_opposed, spend_resource, DamageReport, Interception, Resolution,
};
use super::Narrated;
use crate::infrastructure::ports::RandomPort;

/// Skill penalty for casting on an empty reserve.
const OVERCHARGE_PENALTY: i32 = 20;

/// How the cast was paid for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum Payment {
    Paid { spent: u32, mp_left: i32 },
    Overcharged {
        drained: i32,
        skill_value: i32,
        exposure: Box<ExposureOutcome>,
    },
}

/// Control status placed by a successful cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlReport {
    pub effect: String,
    pub turns: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastOutcome {
    pub caster: String,
    pub power: String,
    /// Who the power landed on, after any interception
    pub target: String,
    pub distance: u32,
    pub interception: Option<Interception>,
    pub payment: Payment,
    pub resolution: Resolution,
    pub success: bool,
    pub damage: Option<DamageReport>,
    pub heal: Option<HealOutcome>,
    pub control: Option<ControlReport>,
}

impl Narrated for CastOutcome {
    fn narration(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(guard) = &self.interception {
            lines.push(format!(
                "{} shields {} from the {}.",
                guard.guardian, guard.protectee, self.power
            ));
        }
        match &self.payment {
            Payment::Paid { spent, mp_left } if *spent > 0 => {
                lines.push(format!("{} spends {} MP ({} left).", self.caster, spent, mp_left));
            }
            Payment::Paid { .. } => {}
            Payment::Overcharged {
                drained,
                skill_value,
                exposure,
            } => {
                lines.push(format!(
                    "{} overcharges, burning the last {} MP; the cast rolls against {}.",
                    self.caster, drained, skill_value
                ));
                lines.extend(exposure.narration());
            }
        }
        let verb = if self.success { "lands" } else { "fails" };
        lines.push(format!(
            "{} casts {} at {} and it {} ({}).",
            self.caster,
            self.power,
            self.target,
            verb,
            self.resolution.describe()
        ));
        if let Some(damage) = &self.damage {
            lines.push(damage.describe(&self.target));
        }
        if let Some(heal) = &self.heal {
            lines.push(match heal {
                HealOutcome::Healed {
                    amount_healed,
                    new_hp,
                } => format!("{} recovers {} HP ({}).", self.target, amount_healed, new_hp),
                HealOutcome::Stabilized { new_hp } => {
                    format!("{} is pulled back from the brink ({} HP).", self.target, new_hp)
                }
                HealOutcome::AlreadyFull => format!("{} is already unhurt.", self.target),
                HealOutcome::Dead => format!("{} is beyond healing.", self.target),
            });
        }
        if let Some(control) = &self.control {
            lines.push(format!(
                "{} is {} for {} turn(s).",
                self.target, control.effect, control.turns
            ));
        }
        lines
    }
}

/// Cast a power at a target.
pub struct CastPower {
    random: Arc<dyn RandomPort>,
    exposure: Arc<ApplyExposure>,
}

impl CastPower {
    pub fn new(random: Arc<dyn RandomPort>, exposure: Arc<ApplyExposure>) -> Self {
        Self { random, exposure }
    }

    pub fn execute(
        &self,
        world: &mut World,
        caster: &str,
        power_id: &str,
        target: Option<&str>,
        requested_spend: Option<u32>,
    ) -> Result<CastOutcome, RuleError> {
        ensure_participant(world, caster)?;
        if let Some(target) = target {
            ensure_participant(world, target)?;
        }
        ensure_able(world, caster, ActionKind::Cast)?;

        let power = world
            .power(power_id)
            .cloned()
            .ok_or_else(|| RuleError::UnknownPower(power_id.to_string()))?;
        let known = world
            .sheet(caster)
            .map(|s| s.known_powers().to_vec())
            .unwrap_or_default();
        if !known.is_empty() && !known.iter().any(|p| p == power.id()) {
            return Err(RuleError::UnknownPower(format!(
                "{} does not know {}",
                caster,
                power.label()
            )));
        }
        let target = target.ok_or(RuleError::MissingField("target"))?;
        ensure_resource(world, caster, TurnResource::Action)?;

        let range = power.range_steps();
        let interception = if power.allows_guard_intercept() && target != caster {
            intercept_guard(world, caster, target, range)?
        } else {
            None
        };
        let target = interception
            .as_ref()
            .map(|i| i.guardian.clone())
            .unwrap_or_else(|| target.to_string());

        let distance = match world.distance(caster, &target) {
            Some(d) if d <= range => d,
            _ => {
                tracing::debug!(caster = %caster, target = %target, range, "Out of range");
                return Err(RuleError::OutOfReach {
                    target,
                    reach: range,
                });
            }
        };
        if power.needs_line_of_sight() && world.cover_of(&target) == Cover::Total {
            return Err(RuleError::NoLineOfSight { target });
        }

        let (mp, base_skill) = world
            .sheet(caster)
            .map(|s| (s.mp(), s.skill_value(power.cast_skill())))
            .ok_or_else(|| RuleError::UnknownActor(caster.to_string()))?;
        let cost = power.cost();
        let spend = cost.resolve_spend(requested_spend, mp.max(0) as u32);
        let affordable = i64::from(spend) <= i64::from(mp);
        if !affordable && cost.base() == 0 {
            return Err(RuleError::InsufficientResource(format!(
                "{} has {} MP, {} needs {}",
                caster,
                mp,
                power.label(),
                spend
            )));
        }
        spend_resource(world, caster, TurnResource::Action)?;

        let (payment, skill_value) = if affordable {
            world.spend_mp(caster, spend)?;
            let mp_left = world.sheet(caster).map(|s| s.mp()).unwrap_or(0);
            (Payment::Paid { spent: spend, mp_left }, base_skill)
        } else {
            let drained = world.drain_mp(caster)?;
            let skill_value = (base_skill - OVERCHARGE_PENALTY).max(1);
            let dice = world
                .sheet(caster)
                .map(|s| s.exposure().overcharge_dice())
                .ok_or_else(|| RuleError::UnknownActor(caster.to_string()))?;
            world.record_overcharge(caster)?;
            tracing::info!(caster = %caster, drained, dice = %dice, "Overcharged cast");
            let exposure = self
                .exposure
                .execute(world, caster, ExposureSource::Dice(dice), 0)?;
            (
                Payment::Overcharged {
                    drained,
                    skill_value,
                    exposure: Box::new(exposure),
                },
                skill_value,
            )
        };

        let random = self.random.as_ref();
        let resolution = resolve_opposed(
            world,
            random,
            caster,
            skill_value,
            &target,
            power.resist(),
        )?;
        let success = resolution.hit();
        tracing::debug!(
            caster = %caster,
            target = %target,
            power = %power.id(),
            resolution = %resolution.describe(),
            "Cast resolved"
        );

        let (mut damage, mut heal, mut control) = (None, None, None);
        if success {
            let characteristics = world
                .sheet(caster)
                .map(|s| s.characteristics().clone())
                .ok_or_else(|| RuleError::UnknownActor(caster.to_string()))?;
            let mut roll_die = |min, max| random.gen_range(min, max);

            if let Some(formula) = power.damage() {
                let FormulaRoll {
                    expression, total, ..
                } = formula.evaluate(&characteristics, &mut roll_die);
                damage = Some(apply_mitigated(
                    world,
                    &target,
                    format!("{}={}", expression, total),
                    total,
                    power.damage_type(),
                )?);
            }
            if let Some(formula) = power.heal() {
                let amount = formula.evaluate(&characteristics, &mut roll_die).total;
                let outcome = world.heal(&target, amount.max(0))?;
                tracing::info!(target = %target, ?outcome, "Healed by power");
                heal = Some(outcome);
            }
            if let Some(spec) = power.control() {
                let turns = spec.duration.evaluate_integer(&characteristics).max(1) as u32;
                world.add_status(
                    &target,
                    StatusEntry::control(spec.effect.clone(), turns, Some(caster.to_string())),
                )?;
                tracing::info!(target = %target, effect = %spec.effect.name(), turns, "Control applied");
                control = Some(ControlReport {
                    effect: spec.effect.name().to_string(),
                    turns,
                });
            }
        }

        Ok(CastOutcome {
            caster: caster.to_string(),
            power: power.label().to_string(),
            target,
            distance,
            interception,
            payment,
            resolution,
            success,
            damage,
            heal,
            control,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{firebolt, scripted, world_with};
    use tabletale_domain::{ActionKind, DamageType, PowerCost, PowerDef};

    fn caster_world() -> World {
        let mut world = world_with(&[("mage", (0, 0)), ("foe", (2, 0))]);
        world.add_power(firebolt());
        world
    }

    fn cast(values: impl IntoIterator<Item = i32>) -> CastPower {
        let random = scripted(values);
        let exposure = Arc::new(ApplyExposure::new(random.clone()));
        CastPower::new(random, exposure)
    }

    mod gates {
        use super::*;

        #[test]
        fn unknown_power_and_missing_target() {
            let mut world = caster_world();
            assert!(matches!(
                cast([]).execute(&mut world, "mage", "meteor", Some("foe"), None),
                Err(RuleError::UnknownPower(_))
            ));
            assert!(matches!(
                cast([]).execute(&mut world, "mage", "firebolt", None, None),
                Err(RuleError::MissingField("target"))
            ));
        }

        #[test]
        fn range_is_checked_before_payment() {
            let mut world = caster_world();
            world.place("foe", tabletale_domain::GridPos::from((4, 0))).unwrap();
            let result = cast([]).execute(&mut world, "mage", "firebolt", Some("foe"), None);
            assert!(matches!(result, Err(RuleError::OutOfReach { reach: 3, .. })));
            assert_eq!(world.sheet("mage").unwrap().mp(), 10);
            assert!(world.is_resource_available("mage", TurnResource::Action));
        }

        #[test]
        fn total_cover_blocks_line_of_sight_powers() {
            let mut world = caster_world();
            let sight = firebolt().with_tags(["line-of-sight"]);
            world.add_power(sight);
            world.set_cover("foe", Cover::Total).unwrap();
            let result = cast([]).execute(&mut world, "mage", "firebolt", Some("foe"), None);
            assert!(matches!(result, Err(RuleError::NoLineOfSight { .. })));
        }

        #[test]
        fn silenced_caster_cannot_cast() {
            let mut world = caster_world();
            world
                .add_status(
                    "mage",
                    StatusEntry::control(tabletale_domain::ControlEffect::Silenced, 1, None),
                )
                .unwrap();
            let result = cast([]).execute(&mut world, "mage", "firebolt", Some("foe"), None);
            assert!(matches!(result, Err(RuleError::ActorUnable(_))));
            assert!(!world.is_action_blocked("mage", ActionKind::Move));
        }

        #[test]
        fn blocked_outsider_gets_the_same_error_as_an_attack() {
            let mut world = caster_world();
            world.grant("mage", "sword", 1).unwrap();
            world.place("foe", tabletale_domain::GridPos::from((1, 0))).unwrap();
            world.set_participants(["foe"]);
            world
                .add_status(
                    "mage",
                    StatusEntry::control(tabletale_domain::ControlEffect::Stunned, 1, None),
                )
                .unwrap();

            let cast_result = cast([]).execute(&mut world, "mage", "firebolt", Some("foe"), None);
            assert!(matches!(cast_result, Err(RuleError::NotParticipant(_))));
            let attack_result = crate::use_cases::combat::Attack::new(scripted([]))
                .execute(&mut world, "mage", "foe", "sword");
            assert!(matches!(attack_result, Err(RuleError::NotParticipant(_))));
        }

        #[test]
        fn powers_outside_the_known_list_are_refused() {
            let mut world = World::new();
            let sheet = crate::test_fixtures::sheet().with_known_power("ward");
            world.add_actor("mage", sheet).unwrap();
            world.reset_turn("mage").unwrap();
            world.add_power(firebolt());
            let result = cast([]).execute(&mut world, "mage", "firebolt", Some("mage"), None);
            assert!(matches!(result, Err(RuleError::UnknownPower(_))));
        }
    }

    mod payment {
        use super::*;

        #[test]
        fn fixed_cost_comes_out_of_mp() {
            let mut world = caster_world();
            // caster 10 vs resist 90: success; damage 1d6 = 3
            let outcome = cast([10, 90, 3])
                .execute(&mut world, "mage", "firebolt", Some("foe"), Some(9))
                .unwrap();
            assert_eq!(outcome.payment, Payment::Paid { spent: 4, mp_left: 6 });
            assert!(outcome.success);
            assert_eq!(outcome.damage.unwrap().dealt, 3);
            assert_eq!(world.sheet("foe").unwrap().hp(), 7);
        }

        #[test]
        fn variable_cost_is_clamped_to_bounds() {
            let mut world = caster_world();
            let surge = PowerDef::new("surge", "Surge", "Arts_Offense", "Arts_Resist", 3, DamageType::Arts)
                .unwrap()
                .with_cost(PowerCost::Variable {
                    min: 2,
                    max: Some(5),
                })
                .unwrap();
            world.add_power(surge);
            let outcome = cast([90, 10])
                .execute(&mut world, "mage", "surge", Some("foe"), Some(8))
                .unwrap();
            assert_eq!(outcome.payment, Payment::Paid { spent: 5, mp_left: 5 });
            assert!(!outcome.success);
        }

        #[test]
        fn short_caster_overcharges_and_is_exposed() {
            let mut world = caster_world();
            world.spend_mp("mage", 8).unwrap();
            // overcharge stress 1d4 = 3, resist 90 fails; cast 10 vs 90; damage 2
            let outcome = cast([3, 90, 10, 90, 2])
                .execute(&mut world, "mage", "firebolt", Some("foe"), None)
                .unwrap();
            match &outcome.payment {
                Payment::Overcharged {
                    drained,
                    skill_value,
                    exposure,
                } => {
                    assert_eq!(*drained, 2);
                    // Arts_Offense 40 - 20
                    assert_eq!(*skill_value, 20);
                    assert_eq!(exposure.dice, "1d4");
                    assert_eq!(exposure.gain, 3);
                }
                other => panic!("expected overcharge, got {:?}", other),
            }
            let sheet = world.sheet("mage").unwrap();
            assert_eq!(sheet.mp(), 0);
            assert_eq!(sheet.exposure().overcharge_uses, 1);
            assert_eq!(sheet.exposure().overcharge_dice().to_string(), "1d6");
        }
    }

    mod effects {
        use super::*;

        #[test]
        fn control_lasts_at_least_one_turn() {
            let mut world = caster_world();
            let snare = PowerDef::new("snare", "Snare", "Arts_Control", "Arts_Resist", 3, DamageType::Arts)
                .unwrap()
                .with_control(tabletale_domain::ControlEffect::Rooted, "0")
                .unwrap();
            world.add_power(snare);
            let outcome = cast([5, 90])
                .execute(&mut world, "mage", "snare", Some("foe"), None)
                .unwrap();
            assert_eq!(
                outcome.control,
                Some(ControlReport {
                    effect: "rooted".to_string(),
                    turns: 1
                })
            );
            assert!(world.is_action_blocked("foe", ActionKind::Move));
        }

        #[test]
        fn heal_on_a_dying_target_stabilizes() {
            let mut world = caster_world();
            let mend = PowerDef::new("mend", "Mend", "Arts_Offense", "Arts_Resist", 3, DamageType::Arts)
                .unwrap()
                .with_heal("1d4+1")
                .unwrap();
            world.add_power(mend);
            world.apply_damage("foe", 100).unwrap();
            // dying target: single check 10; heal 1d4 = 2 (+1)
            let outcome = cast([10, 2])
                .execute(&mut world, "mage", "mend", Some("foe"), None)
                .unwrap();
            assert!(matches!(outcome.resolution, Resolution::Single { .. }));
            assert_eq!(outcome.heal, Some(HealOutcome::Stabilized { new_hp: 3 }));
        }
    }
}

//! Combat use cases.
//!
//! An attack runs: participant gate, block check, weapon lookup, ownership,
//! guard interception, reach gate, opposed check, damage and mitigation.
//! Every gate runs before the first mutation.

mod first_aid;
mod guard;

pub use first_aid::{FirstAid, FirstAidReport};
pub use guard::{clear_guard, set_guard, ClearGuardOutcome, GuardOutcome};

use std::sync::Arc;

use serde::Serialize;

use tabletale_domain::{ActionKind, TurnResource, World};

use super::error::RuleError;
use super::resolution::{
    apply_mitigated, ensure_able, ensure_participant, ensure_resource, intercept_guard,
    resolve_opposed, roll_dice, spend_resource, DamageReport, Interception, Resolution,
};
use super::Narrated;
use crate::infrastructure::ports::RandomPort;

/// Container for combat use cases.
pub struct CombatUseCases {
    pub attack: Arc<Attack>,
    pub first_aid: Arc<FirstAid>,
}

impl CombatUseCases {
    pub fn new(attack: Arc<Attack>, first_aid: Arc<FirstAid>) -> Self {
        Self { attack, first_aid }
    }
}

/// Result of one weapon attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackOutcome {
    pub attacker: String,
    /// Who actually defended, after any interception
    pub defender: String,
    pub weapon: String,
    pub distance: u32,
    pub interception: Option<Interception>,
    pub resolution: Resolution,
    pub hit: bool,
    pub damage: Option<DamageReport>,
}

impl Narrated for AttackOutcome {
    fn narration(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(guard) = &self.interception {
            lines.push(format!(
                "{} steps in front of {} to take the blow.",
                guard.guardian, guard.protectee
            ));
        }
        let verb = if self.hit { "hits" } else { "misses" };
        lines.push(format!(
            "{} attacks {} with the {} and {} ({}).",
            self.attacker,
            self.defender,
            self.weapon,
            verb,
            self.resolution.describe()
        ));
        if let Some(damage) = &self.damage {
            lines.push(damage.describe(&self.defender));
        }
        lines
    }
}

/// Weapon attack.
pub struct Attack {
    random: Arc<dyn RandomPort>,
}

impl Attack {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        Self { random }
    }

    pub fn execute(
        &self,
        world: &mut World,
        attacker: &str,
        defender: &str,
        weapon_id: &str,
    ) -> Result<AttackOutcome, RuleError> {
        ensure_participant(world, attacker)?;
        ensure_participant(world, defender)?;
        ensure_able(world, attacker, ActionKind::Attack)?;
        if attacker == defender {
            return Err(RuleError::InvalidValue(format!("{} cannot attack themselves", attacker)));
        }
        if world.is_dead(defender) {
            return Err(RuleError::NothingToDo(format!("{} is already dead", defender)));
        }
        ensure_resource(world, attacker, TurnResource::Action)?;

        let weapon = world
            .weapon(weapon_id)
            .cloned()
            .ok_or_else(|| RuleError::UnknownWeapon(weapon_id.to_string()))?;
        if world.count_of(attacker, weapon.id()) == 0 {
            return Err(RuleError::WeaponNotOwned {
                actor: attacker.to_string(),
                weapon: weapon.label().to_string(),
            });
        }
        let reach = weapon.reach_steps();

        // Interception only picks protectors inside reach, so the reach gate
        // below can only fail for the original defender.
        let interception = intercept_guard(world, attacker, defender, reach)?;
        let target = interception
            .as_ref()
            .map(|i| i.guardian.clone())
            .unwrap_or_else(|| defender.to_string());

        let distance = match world.distance(attacker, &target) {
            Some(d) if d <= reach => d,
            _ => {
                tracing::debug!(attacker = %attacker, target = %target, reach, "Out of reach");
                return Err(RuleError::OutOfReach { target, reach });
            }
        };
        spend_resource(world, attacker, TurnResource::Action)?;

        let attack_value = world
            .sheet(attacker)
            .map(|s| s.skill_value(weapon.skill()))
            .ok_or_else(|| RuleError::UnknownActor(attacker.to_string()))?;
        let resolution = resolve_opposed(
            world,
            self.random.as_ref(),
            attacker,
            attack_value,
            &target,
            weapon.defense_skill(),
        )?;
        let hit = resolution.hit();
        tracing::debug!(
            attacker = %attacker,
            defender = %target,
            weapon = %weapon.id(),
            resolution = %resolution.describe(),
            "Attack resolved"
        );

        let damage = if hit {
            let roll = roll_dice(self.random.as_ref(), weapon.damage());
            Some(apply_mitigated(
                world,
                &target,
                roll.breakdown(),
                roll.total,
                weapon.damage_type(),
            )?)
        } else {
            None
        };

        Ok(AttackOutcome {
            attacker: attacker.to_string(),
            defender: target,
            weapon: weapon.label().to_string(),
            distance,
            interception,
            resolution,
            hit,
            damage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{scripted, world_with};
    use tabletale_domain::{DamageOutcome, GridPos};

    fn armed(actors: &[(&str, (i32, i32))]) -> World {
        let mut world = world_with(actors);
        world.grant("att", "sword", 1).unwrap();
        world
    }

    #[test]
    fn adjacent_defender_passes_the_reach_gate() {
        let mut world = armed(&[("att", (0, 0)), ("def", (1, 0))]);
        // attacker 10 vs Dodge 25 roll 90: attacker wins; damage die 4
        let attack = Attack::new(scripted([10, 90, 4]));
        let outcome = attack.execute(&mut world, "att", "def", "sword").unwrap();
        assert!(outcome.hit);
        assert_eq!(outcome.distance, 1);
        let damage = outcome.damage.unwrap();
        assert_eq!(damage.dealt, 4);
        assert_eq!(world.sheet("def").unwrap().hp(), 6);
        assert!(!world.is_resource_available("att", TurnResource::Action));
    }

    #[test]
    fn distant_defender_is_out_of_reach_and_nothing_changes() {
        let mut world = armed(&[("att", (0, 0)), ("def", (0, 3))]);
        let version = world.version();
        let attack = Attack::new(scripted([]));
        let err = attack.execute(&mut world, "att", "def", "sword").unwrap_err();
        assert!(matches!(err, RuleError::OutOfReach { reach: 1, .. }));
        assert_eq!(world.version(), version);
        assert_eq!(world.position_of("def"), Some(GridPos::new(0, 3)));
        assert!(world.is_resource_available("att", TurnResource::Action));
    }

    #[test]
    fn unknown_and_unowned_weapons() {
        let mut world = armed(&[("att", (0, 0)), ("def", (1, 0))]);
        let attack = Attack::new(scripted([]));
        assert!(matches!(
            attack.execute(&mut world, "att", "def", "halberd"),
            Err(RuleError::UnknownWeapon(_))
        ));
        assert!(matches!(
            attack.execute(&mut world, "att", "def", "spear"),
            Err(RuleError::WeaponNotOwned { .. })
        ));
    }

    #[test]
    fn second_attack_in_a_round_is_resource_spent() {
        let mut world = armed(&[("att", (0, 0)), ("def", (1, 0))]);
        let attack = Attack::new(scripted([90, 10, 90, 10]));
        attack.execute(&mut world, "att", "def", "sword").unwrap();
        let err = attack.execute(&mut world, "att", "def", "sword").unwrap_err();
        assert!(matches!(err, RuleError::ResourceSpent { .. }));
    }

    #[test]
    fn one_hp_defender_goes_down_then_dies() {
        let mut world = armed(&[("att", (0, 0)), ("def", (1, 0))]);
        world.apply_damage("def", 9).unwrap();

        let attack = Attack::new(scripted([10, 90, 5]));
        let outcome = attack.execute(&mut world, "att", "def", "sword").unwrap();
        assert!(matches!(
            outcome.damage.unwrap().outcome,
            DamageOutcome::Downed { .. }
        ));
        assert!(world.is_dying("def"));

        world.reset_turn("att").unwrap();
        // Dying defender: single check, then damage die 1
        let attack = Attack::new(scripted([10, 1]));
        let outcome = attack.execute(&mut world, "att", "def", "sword").unwrap();
        assert!(matches!(outcome.resolution, Resolution::Single { .. }));
        assert!(world.is_dead("def"));
        assert!(!world.is_dying("def"));
        assert_eq!(world.sheet("def").unwrap().hp(), 0);
    }

    mod guarding {
        use super::*;

        fn guarded() -> World {
            let mut world = armed(&[("att", (0, 0)), ("vip", (2, 0)), ("guard", (2, 1))]);
            world.grant("att", "spear", 1).unwrap();
            world.add_guard("guard", "vip").unwrap();
            world
        }

        #[test]
        fn protector_takes_the_blow_and_spends_reaction() {
            let mut world = guarded();
            // guard at distance 3 is beyond the spear: no interception
            let attack = Attack::new(scripted([90, 10]));
            let outcome = attack.execute(&mut world, "att", "vip", "spear").unwrap();
            assert!(outcome.interception.is_none());
            assert_eq!(outcome.defender, "vip");

            world.reset_turn("att").unwrap();
            world.place("guard", GridPos::new(1, 0)).unwrap();
            let outcome = attack.execute(&mut world, "att", "vip", "spear").unwrap();
            assert_eq!(outcome.defender, "guard");
            assert_eq!(outcome.distance, 1);
            assert!(!world.is_resource_available("guard", TurnResource::Reaction));
        }

        #[test]
        fn no_redirect_without_reaction() {
            let mut world = guarded();
            world.place("guard", GridPos::new(1, 0)).unwrap();
            let attack = Attack::new(scripted([90, 10, 90, 10]));
            let first = attack.execute(&mut world, "att", "vip", "spear").unwrap();
            assert_eq!(first.defender, "guard");

            world.reset_turn("att").unwrap();
            let second = attack.execute(&mut world, "att", "vip", "spear").unwrap();
            assert_eq!(second.defender, "vip");
        }
    }
}

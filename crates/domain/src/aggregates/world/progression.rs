//! Mana spending and the exposure track.

use super::World;
use crate::entities::DEFAULT_ARTS_RESIST;
use crate::error::DomainError;
use crate::events::StageAdvance;
use crate::value_objects::{Characteristic, StageChoice, MAX_STAGE, STAGE_STRESS_FLOORS};

/// CON lost by the `con` stage choice.
const CON_PENALTY: i32 = 5;
/// Arts resistance lost by the `resist` stage choice.
const RESIST_PENALTY: i32 = 10;
/// Affinity gained by the `affinity` stage choice.
const AFFINITY_GAIN: i32 = 5;

impl World {
    // =========================================================================
    // Mana
    // =========================================================================

    /// Spend MP. Returns `false` (nothing spent) when the actor is short.
    pub fn spend_mp(&mut self, name: &str, amount: u32) -> Result<bool, DomainError> {
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        let spent = self.sheet_mut(name)?.spend_mp(amount);
        if spent {
            self.touch();
        }
        Ok(spent)
    }

    /// Drain all MP. Returns the amount drained.
    pub fn drain_mp(&mut self, name: &str) -> Result<i32, DomainError> {
        let drained = self.sheet_mut(name)?.drain_mp();
        self.touch();
        Ok(drained)
    }

    // =========================================================================
    // Exposure Track
    // =========================================================================

    /// Add stress. Returns `(before, after)`.
    pub fn add_stress(&mut self, name: &str, amount: u32) -> Result<(u32, u32), DomainError> {
        let track = self.sheet_mut(name)?.exposure_mut();
        let before = track.stress;
        track.stress = before.saturating_add(amount);
        let after = track.stress;
        self.touch();
        Ok((before, after))
    }

    /// Count a severe flare. Returns the running count.
    pub fn record_severe_flare(&mut self, name: &str) -> Result<u32, DomainError> {
        let track = self.sheet_mut(name)?.exposure_mut();
        track.severe_flares += 1;
        let count = track.severe_flares;
        self.touch();
        Ok(count)
    }

    /// Count an overcharge. Returns the running count.
    pub fn record_overcharge(&mut self, name: &str) -> Result<u32, DomainError> {
        let track = self.sheet_mut(name)?.exposure_mut();
        track.overcharge_uses += 1;
        let uses = track.overcharge_uses;
        self.touch();
        Ok(uses)
    }

    /// Advance the exposure stage by one and apply the chosen penalty.
    ///
    /// Stress rises to the new stage's floor, crystal density grows and the
    /// flare count resets. Derived HP and MP are recomputed afterwards.
    pub fn advance_stage(
        &mut self,
        name: &str,
        choice: StageChoice,
    ) -> Result<StageAdvance, DomainError> {
        let sheet = self.sheet_mut(name)?;
        let from_stage = sheet.exposure().stage;
        if from_stage >= MAX_STAGE {
            return Err(DomainError::constraint(format!(
                "{} is already at exposure stage {}",
                name, MAX_STAGE
            )));
        }
        let to_stage = from_stage + 1;

        let penalty = match choice {
            StageChoice::Con => {
                let con = (sheet.characteristics().get(Characteristic::Con) - CON_PENALTY).max(1);
                sheet.set_characteristic(Characteristic::Con, con);
                format!("CON -> {}", con)
            }
            StageChoice::Resist => {
                let current = sheet.arts_resist().unwrap_or(DEFAULT_ARTS_RESIST);
                let resist = (current - RESIST_PENALTY).max(0);
                sheet.set_arts_resist(resist);
                format!("arts resist -> {}", resist)
            }
            StageChoice::Affinity => {
                let track = sheet.exposure_mut();
                track.affinity += AFFINITY_GAIN;
                track.overcharge_step += 1;
                format!(
                    "affinity -> {}, overcharge step -> {}",
                    track.affinity, track.overcharge_step
                )
            }
        };

        let track = sheet.exposure_mut();
        track.stage = to_stage;
        track.crystal_density += 1;
        track.severe_flares = 0;
        track.stress = track.stress.max(STAGE_STRESS_FLOORS[usize::from(to_stage)]);
        let (stress, crystal_density) = (track.stress, track.crystal_density);

        sheet.recompute_derived();
        self.touch();
        Ok(StageAdvance {
            from_stage,
            to_stage,
            choice,
            stress,
            crystal_density,
            penalty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::world_with;
    use super::*;

    #[test]
    fn stage_advance_raises_stress_to_floor_and_lowers_con() {
        let mut world = world_with(&[("a", (0, 0))]);
        world.add_stress("a", 5).unwrap();
        let advance = world.advance_stage("a", StageChoice::Con).unwrap();
        assert_eq!(advance.to_stage, 1);
        assert_eq!(advance.stress, 20);
        assert_eq!(advance.crystal_density, 1);

        let sheet = world.sheet("a").unwrap();
        assert_eq!(sheet.characteristics().get(Characteristic::Con), 45);
        // (45 + 50) / 10
        assert_eq!(sheet.max_hp(), 9);
    }

    #[test]
    fn resist_choice_lowers_arts_resist() {
        let mut world = world_with(&[("a", (0, 0))]);
        world.advance_stage("a", StageChoice::Resist).unwrap();
        assert_eq!(world.sheet("a").unwrap().arts_resist(), Some(30));
    }

    #[test]
    fn affinity_choice_steps_overcharge_ladder() {
        let mut world = world_with(&[("a", (0, 0))]);
        world.advance_stage("a", StageChoice::Affinity).unwrap();
        let track = world.sheet("a").unwrap().exposure();
        assert_eq!(track.affinity, 5);
        assert_eq!(track.overcharge_step, 1);
        assert_eq!(track.overcharge_dice().to_string(), "1d6");
    }

    #[test]
    fn stage_is_capped() {
        let mut world = world_with(&[("a", (0, 0))]);
        for _ in 0..MAX_STAGE {
            world.advance_stage("a", StageChoice::Con).unwrap();
        }
        assert_eq!(world.sheet("a").unwrap().exposure().stress, 80);
        let result = world.advance_stage("a", StageChoice::Con);
        assert!(matches!(result, Err(DomainError::Constraint(_))));
    }

    #[test]
    fn spending_more_mp_than_held_spends_nothing() {
        let mut world = world_with(&[("a", (0, 0))]);
        let mp = world.sheet("a").unwrap().mp();
        assert!(!world.spend_mp("a", (mp + 1) as u32).unwrap());
        assert_eq!(world.sheet("a").unwrap().mp(), mp);
        assert_eq!(world.drain_mp("a").unwrap(), mp);
        assert_eq!(world.sheet("a").unwrap().mp(), 0);
    }
}

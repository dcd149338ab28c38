//! The hit-point life cycle: wounded, dying, dead.
//!
//! A hit that takes HP to zero starts the dying countdown instead of killing
//! outright. Any hit while dying kills. Healing or first aid while dying
//! lifts the actor back to at least 1 HP.

use super::World;
use crate::error::DomainError;
use crate::events::{DamageOutcome, FirstAidOutcome, HealOutcome};
use crate::value_objects::{StatusDuration, StatusEntry, SystemStatus};

impl World {
    /// Dead: no HP left and no longer counting down.
    pub fn is_dead(&self, name: &str) -> bool {
        self.sheet(name)
            .map(|s| s.hp() <= 0 && !s.is_dying())
            .unwrap_or(false)
    }

    pub fn is_dying(&self, name: &str) -> bool {
        self.sheet(name).map(|s| s.is_dying()).unwrap_or(false)
    }

    /// Standing and able to act: HP above zero and not dying.
    pub fn is_alive(&self, name: &str) -> bool {
        self.sheet(name)
            .map(|s| s.hp() > 0 && !s.is_dying())
            .unwrap_or(false)
    }

    /// Apply damage after mitigation.
    pub fn apply_damage(&mut self, name: &str, amount: i32) -> Result<DamageOutcome, DomainError> {
        let amount = amount.max(0);
        let dying_turns = self.dying_turns;
        if self.is_dead(name) {
            self.require_actor(name)?;
            return Ok(DamageOutcome::AlreadyDead);
        }

        let sheet = self.sheet_mut(name)?;
        sheet.take_hp(amount);

        let outcome = if sheet.is_dying() {
            self.kill(name)?;
            DamageOutcome::Killed {
                damage_dealt: amount,
            }
        } else if sheet.hp() <= 0 {
            sheet.start_dying(dying_turns);
            self.add_status(
                name,
                StatusEntry::system(SystemStatus::Dying, StatusDuration::Turns(dying_turns)),
            )?;
            DamageOutcome::Downed {
                damage_dealt: amount,
                turns_left: dying_turns,
            }
        } else {
            DamageOutcome::Wounded {
                damage_dealt: amount,
                remaining_hp: sheet.hp(),
            }
        };
        self.touch();
        Ok(outcome)
    }

    /// Restore HP up to the maximum.
    pub fn heal(&mut self, name: &str, amount: i32) -> Result<HealOutcome, DomainError> {
        if self.is_dead(name) {
            return Ok(HealOutcome::Dead);
        }
        let sheet = self.sheet_mut(name)?;
        let was_dying = sheet.is_dying();
        if !was_dying && sheet.hp() >= sheet.max_hp() {
            return Ok(HealOutcome::AlreadyFull);
        }

        let amount_healed = sheet.restore_hp(amount);
        let new_hp = sheet.hp();
        if was_dying && new_hp > 0 {
            self.stabilize(name)?;
            return Ok(HealOutcome::Stabilized { new_hp });
        }
        self.touch();
        Ok(HealOutcome::Healed {
            amount_healed,
            new_hp,
        })
    }

    /// Effect of a successful first-aid check on `name`.
    ///
    /// Dying targets are stabilized. Wounded targets regain 1 HP, once per
    /// injury.
    pub fn apply_first_aid(&mut self, name: &str) -> Result<FirstAidOutcome, DomainError> {
        if self.is_dead(name) {
            self.require_actor(name)?;
            return Ok(FirstAidOutcome::NothingToDo);
        }
        if self.is_dying(name) {
            let new_hp = self.stabilize(name)?;
            return Ok(FirstAidOutcome::Stabilized { new_hp });
        }

        let sheet = self.sheet_mut(name)?;
        if sheet.hp() >= sheet.max_hp() {
            return Ok(FirstAidOutcome::NothingToDo);
        }
        if sheet.first_aid_used_on_current_injury() {
            return Ok(FirstAidOutcome::AlreadyTreated);
        }
        sheet.restore_hp(1);
        sheet.mark_first_aid();
        let new_hp = sheet.hp();
        self.touch();
        Ok(FirstAidOutcome::Healed { new_hp })
    }

    /// Whether first aid would do anything for `name` right now.
    pub fn needs_first_aid(&self, name: &str) -> bool {
        match self.sheet(name) {
            Some(sheet) if sheet.is_dying() => true,
            Some(sheet) => sheet.hp() > 0 && sheet.hp() < sheet.max_hp(),
            None => false,
        }
    }

    /// Clear the dying state and lift HP to at least 1. Returns the new HP.
    fn stabilize(&mut self, name: &str) -> Result<i32, DomainError> {
        let sheet = self.sheet_mut(name)?;
        sheet.clear_dying();
        let hp = sheet.hp().max(1);
        sheet.set_hp(hp);
        let new_hp = sheet.hp();
        self.remove_status(name, SystemStatus::Dying.name())?;
        self.touch();
        Ok(new_hp)
    }

    /// HP to zero, dying cleared, dead status attached.
    pub(crate) fn kill(&mut self, name: &str) -> Result<(), DomainError> {
        let sheet = self.sheet_mut(name)?;
        sheet.set_hp(0);
        sheet.clear_dying();
        self.remove_status(name, SystemStatus::Dying.name())?;
        self.add_status(
            name,
            StatusEntry::system(SystemStatus::Dead, StatusDuration::Indefinite),
        )?;
        self.touch();
        Ok(())
    }
}

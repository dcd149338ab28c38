//! Character sheet - hit points, resources, percentile skills and the
//! dying countdown.
//!
//! # Design Notes
//!
//! - **Dying is a field, not a flag**: `dying_turns_left.is_some()` is the
//!   dying state. There is no separate boolean to drift out of sync.
//! - **Derived values**: max HP, max MP and move speed derive from the
//!   characteristic block and are recomputed when it changes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value_objects::{Characteristic, Characteristics, ExposureTrack};

/// Turns a dying actor survives without help.
pub const DEFAULT_DYING_TURNS: u32 = 3;

/// Sheet arts-resist value when none is authored.
pub const DEFAULT_ARTS_RESIST: i32 = 40;

/// Fixed damage reduction by damage category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Mitigation {
    pub physical_armor: i32,
    pub arts_barrier: i32,
}

/// Default percentile value for a named skill.
///
/// Dodge derives from DEX; unknown skills fall back to 25.
pub fn default_skill_value(skill: &str, characteristics: &Characteristics) -> i32 {
    match skill {
        "Stealth" => 20,
        "Perception" => 25,
        "Dodge" => characteristics.get(Characteristic::Dex) / 2,
        "Arts_Resist" => DEFAULT_ARTS_RESIST,
        "FirstAid" => 30,
        "Medicine" => 5,
        "Fighting_Blade" | "Fighting_Polearm" => 30,
        "Arts_Offense" | "Arts_Control" => 40,
        _ => 25,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSheet {
    hp: i32,
    max_hp: i32,
    mp: i32,
    max_mp: i32,
    characteristics: Characteristics,
    skills: BTreeMap<String, i32>,
    move_speed: u32,
    injury_id: u32,
    first_aid_applied_on: u32,
    dying_turns_left: Option<u32>,
    mitigation: Mitigation,
    arts_resist: Option<i32>,
    exposure: ExposureTrack,
    known_powers: Vec<String>,
}

impl CharacterSheet {
    /// Build a sheet with HP, MP and speed derived from `characteristics`.
    pub fn from_characteristics(characteristics: Characteristics) -> Self {
        let max_hp = derive_max_hp(&characteristics);
        let max_mp = derive_max_mp(&characteristics);
        let move_speed = derive_move_speed(&characteristics);
        Self {
            hp: max_hp,
            max_hp,
            mp: max_mp,
            max_mp,
            characteristics,
            skills: BTreeMap::new(),
            move_speed,
            injury_id: 0,
            first_aid_applied_on: 0,
            dying_turns_left: None,
            mitigation: Mitigation::default(),
            arts_resist: None,
            exposure: ExposureTrack::default(),
            known_powers: Vec::new(),
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    pub fn with_skill(mut self, name: impl Into<String>, value: i32) -> Self {
        self.skills.insert(name.into(), value);
        self
    }

    /// Override HP. `hp` is clamped into `0..=max_hp`.
    pub fn with_hp(mut self, hp: i32, max_hp: i32) -> Self {
        self.max_hp = max_hp.max(1);
        self.hp = hp.clamp(0, self.max_hp);
        self
    }

    pub fn with_mp(mut self, mp: i32, max_mp: i32) -> Self {
        self.max_mp = max_mp.max(0);
        self.mp = mp.clamp(0, self.max_mp);
        self
    }

    pub fn with_move_speed(mut self, steps: u32) -> Self {
        self.move_speed = steps;
        self
    }

    pub fn with_mitigation(mut self, mitigation: Mitigation) -> Self {
        self.mitigation = mitigation;
        self
    }

    pub fn with_arts_resist(mut self, value: i32) -> Self {
        self.arts_resist = Some(value);
        self
    }

    pub fn with_exposure(mut self, exposure: ExposureTrack) -> Self {
        self.exposure = exposure;
        self
    }

    pub fn with_known_power(mut self, power_id: impl Into<String>) -> Self {
        let power_id = power_id.into();
        if !self.known_powers.contains(&power_id) {
            self.known_powers.push(power_id);
        }
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn hp(&self) -> i32 {
        self.hp
    }

    #[inline]
    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    #[inline]
    pub fn mp(&self) -> i32 {
        self.mp
    }

    #[inline]
    pub fn max_mp(&self) -> i32 {
        self.max_mp
    }

    #[inline]
    pub fn characteristics(&self) -> &Characteristics {
        &self.characteristics
    }

    #[inline]
    pub fn skills(&self) -> &BTreeMap<String, i32> {
        &self.skills
    }

    #[inline]
    pub fn move_speed(&self) -> u32 {
        self.move_speed
    }

    #[inline]
    pub fn injury_id(&self) -> u32 {
        self.injury_id
    }

    #[inline]
    pub fn dying_turns_left(&self) -> Option<u32> {
        self.dying_turns_left
    }

    #[inline]
    pub fn is_dying(&self) -> bool {
        self.dying_turns_left.is_some()
    }

    #[inline]
    pub fn mitigation(&self) -> Mitigation {
        self.mitigation
    }

    /// Authored arts resistance, if any.
    #[inline]
    pub fn arts_resist(&self) -> Option<i32> {
        self.arts_resist
    }

    #[inline]
    pub fn exposure(&self) -> &ExposureTrack {
        &self.exposure
    }

    pub fn exposure_mut(&mut self) -> &mut ExposureTrack {
        &mut self.exposure
    }

    /// Powers this character can cast, in authored order.
    #[inline]
    pub fn known_powers(&self) -> &[String] {
        &self.known_powers
    }

    /// Whether the current wound has already received first-aid healing.
    pub fn first_aid_used_on_current_injury(&self) -> bool {
        self.injury_id > 0 && self.first_aid_applied_on == self.injury_id
    }

    /// Percentile value used for a check.
    ///
    /// Characteristic names (STR, DEX, ..., LUCK) read the characteristic
    /// block; anything else reads the skill table, then the default table.
    pub fn skill_value(&self, name: &str) -> i32 {
        if let Ok(characteristic) = name.parse::<Characteristic>() {
            return self.characteristics.get(characteristic);
        }
        self.skills
            .get(name)
            .copied()
            .unwrap_or_else(|| default_skill_value(name, &self.characteristics))
    }

    /// Mitigation that applies to a damage category.
    pub fn mitigation_against(&self, elemental: bool) -> i32 {
        if elemental {
            self.mitigation.arts_barrier.max(0)
        } else {
            self.mitigation.physical_armor.max(0)
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Subtract HP (floored at zero) and open a new injury.
    pub(crate) fn take_hp(&mut self, amount: i32) {
        if amount > 0 {
            self.injury_id += 1;
        }
        self.hp = (self.hp - amount.max(0)).max(0);
    }

    /// Add HP up to the maximum. Returns the amount actually restored.
    pub(crate) fn restore_hp(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).min(self.max_hp);
        self.hp - before
    }

    pub(crate) fn set_hp(&mut self, hp: i32) {
        self.hp = hp.clamp(0, self.max_hp);
    }

    pub(crate) fn start_dying(&mut self, turns: u32) {
        self.hp = 0;
        self.dying_turns_left = Some(turns);
    }

    pub(crate) fn set_dying_turns(&mut self, turns: u32) {
        self.dying_turns_left = Some(turns);
    }

    pub(crate) fn clear_dying(&mut self) {
        self.dying_turns_left = None;
    }

    pub(crate) fn mark_first_aid(&mut self) {
        self.first_aid_applied_on = self.injury_id;
    }

    /// Spend MP. Returns `false` (and spends nothing) when short.
    pub(crate) fn spend_mp(&mut self, amount: i32) -> bool {
        if amount > self.mp {
            return false;
        }
        self.mp -= amount.max(0);
        true
    }

    /// Drain all MP. Returns how much was drained.
    pub(crate) fn drain_mp(&mut self) -> i32 {
        std::mem::take(&mut self.mp)
    }

    pub(crate) fn set_characteristic(&mut self, characteristic: Characteristic, value: i32) {
        self.characteristics.set(characteristic, value);
    }

    pub(crate) fn set_arts_resist(&mut self, value: i32) {
        self.arts_resist = Some(value);
    }

    /// Recompute max HP and max MP from characteristics, keeping the HP ratio.
    pub(crate) fn recompute_derived(&mut self) {
        let new_max_hp = derive_max_hp(&self.characteristics);
        if new_max_hp != self.max_hp {
            let ratio = f64::from(self.hp) / f64::from(self.max_hp.max(1));
            let scaled = (ratio * f64::from(new_max_hp)).round() as i32;
            self.max_hp = new_max_hp;
            self.hp = if self.hp > 0 {
                scaled.clamp(1, new_max_hp)
            } else {
                0
            };
        }
        self.max_mp = derive_max_mp(&self.characteristics);
        self.mp = self.mp.min(self.max_mp);
    }
}

fn derive_max_hp(characteristics: &Characteristics) -> i32 {
    let con = characteristics.get(Characteristic::Con);
    let siz = characteristics.get(Characteristic::Siz);
    ((con + siz) / 10).max(1)
}

fn derive_max_mp(characteristics: &Characteristics) -> i32 {
    (characteristics.get(Characteristic::Pow) / 5).max(0)
}

/// Grid steps per turn from the MOV rating (8, +1 if DEX and STR exceed SIZ,
/// -1 if both fall short), at 1.5 MOV per step, clamped to 3..=10.
fn derive_move_speed(characteristics: &Characteristics) -> u32 {
    let str_ = characteristics.get(Characteristic::Str);
    let dex = characteristics.get(Characteristic::Dex);
    let siz = characteristics.get(Characteristic::Siz);
    let mov: f64 = if dex > siz && str_ > siz {
        9.0
    } else if dex < siz && str_ < siz {
        7.0
    } else {
        8.0
    };
    ((mov / 1.5).round() as u32).clamp(3, 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soldier() -> CharacterSheet {
        CharacterSheet::from_characteristics(
            Characteristics::new()
                .with(Characteristic::Str, 70)
                .with(Characteristic::Con, 60)
                .with(Characteristic::Siz, 55)
                .with(Characteristic::Dex, 65)
                .with(Characteristic::Pow, 45),
        )
    }

    mod derivation {
        use super::*;

        #[test]
        fn derives_hp_mp_and_speed() {
            let sheet = soldier();
            assert_eq!(sheet.max_hp(), 11);
            assert_eq!(sheet.hp(), 11);
            assert_eq!(sheet.max_mp(), 9);
            // MOV 9 -> 6 steps
            assert_eq!(sheet.move_speed(), 6);
        }

        #[test]
        fn small_weak_characters_are_slower() {
            let sheet = CharacterSheet::from_characteristics(
                Characteristics::new()
                    .with(Characteristic::Str, 30)
                    .with(Characteristic::Dex, 30)
                    .with(Characteristic::Siz, 80),
            );
            // MOV 7 -> round(4.67) = 5
            assert_eq!(sheet.move_speed(), 5);
        }

        #[test]
        fn recompute_keeps_hp_ratio() {
            let mut sheet = soldier().with_hp(5, 10);
            sheet.set_characteristic(Characteristic::Con, 45);
            sheet.recompute_derived();
            assert_eq!(sheet.max_hp(), 10);
            assert_eq!(sheet.hp(), 5);

            sheet.set_characteristic(Characteristic::Con, 25);
            sheet.recompute_derived();
            assert_eq!(sheet.max_hp(), 8);
            assert_eq!(sheet.hp(), 4);
        }
    }

    mod skills {
        use super::*;

        #[test]
        fn characteristic_names_read_characteristics() {
            let sheet = soldier();
            assert_eq!(sheet.skill_value("STR"), 70);
            assert_eq!(sheet.skill_value("LUCK"), 50);
        }

        #[test]
        fn authored_skills_override_defaults() {
            let sheet = soldier().with_skill("Fighting_Blade", 65);
            assert_eq!(sheet.skill_value("Fighting_Blade"), 65);
            assert_eq!(sheet.skill_value("FirstAid"), 30);
            assert_eq!(sheet.skill_value("Dodge"), 32);
            assert_eq!(sheet.skill_value("Basket_Weaving"), 25);
        }
    }

    mod wounds {
        use super::*;

        #[test]
        fn taking_hp_opens_new_injury() {
            let mut sheet = soldier();
            sheet.take_hp(3);
            sheet.take_hp(0);
            assert_eq!(sheet.injury_id(), 1);
            assert_eq!(sheet.hp(), 8);
        }

        #[test]
        fn first_aid_gate_tracks_injury() {
            let mut sheet = soldier();
            assert!(!sheet.first_aid_used_on_current_injury());
            sheet.take_hp(2);
            sheet.mark_first_aid();
            assert!(sheet.first_aid_used_on_current_injury());
            sheet.take_hp(1);
            assert!(!sheet.first_aid_used_on_current_injury());
        }

        #[test]
        fn restore_is_capped() {
            let mut sheet = soldier();
            sheet.take_hp(2);
            assert_eq!(sheet.restore_hp(10), 2);
            assert_eq!(sheet.hp(), sheet.max_hp());
        }

        #[test]
        fn mitigation_by_category() {
            let sheet = soldier().with_mitigation(Mitigation {
                physical_armor: 2,
                arts_barrier: 1,
            });
            assert_eq!(sheet.mitigation_against(false), 2);
            assert_eq!(sheet.mitigation_against(true), 1);
        }
    }
}

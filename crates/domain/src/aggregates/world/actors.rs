//! Roster, placement, scene membership, inventory and relations.

use std::collections::BTreeMap;

use super::World;
use crate::entities::CharacterSheet;
use crate::error::DomainError;
use crate::value_objects::{clamp_relation, Cover, GridPos, StatusTable, TurnState};

impl World {
    // =========================================================================
    // Roster
    // =========================================================================

    /// Add an actor with a fresh turn budget and no statuses.
    pub fn add_actor(
        &mut self,
        name: impl Into<String>,
        sheet: CharacterSheet,
    ) -> Result<(), DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("actor name cannot be empty"));
        }
        self.turns
            .insert(name.clone(), TurnState::fresh(sheet.move_speed()));
        self.statuses.entry(name.clone()).or_insert_with(StatusTable::new);
        self.sheets.insert(name, sheet);
        self.touch();
        Ok(())
    }

    pub fn has_actor(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    pub fn actor_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    pub fn sheet(&self, name: &str) -> Option<&CharacterSheet> {
        self.sheets.get(name)
    }

    pub(crate) fn sheet_mut(&mut self, name: &str) -> Result<&mut CharacterSheet, DomainError> {
        self.sheets
            .get_mut(name)
            .ok_or_else(|| DomainError::not_found("Actor", name))
    }

    pub(crate) fn require_actor(&self, name: &str) -> Result<&CharacterSheet, DomainError> {
        self.sheets
            .get(name)
            .ok_or_else(|| DomainError::not_found("Actor", name))
    }

    // =========================================================================
    // Positions and Scenes
    // =========================================================================

    pub fn place(&mut self, name: &str, pos: GridPos) -> Result<(), DomainError> {
        self.require_actor(name)?;
        self.positions.insert(name.to_string(), pos);
        self.touch();
        Ok(())
    }

    pub fn position_of(&self, name: &str) -> Option<GridPos> {
        self.positions.get(name).copied()
    }

    pub fn positions(&self) -> impl Iterator<Item = (&str, GridPos)> {
        self.positions.iter().map(|(n, p)| (n.as_str(), *p))
    }

    pub fn set_scene(&mut self, name: &str, scene: impl Into<String>) -> Result<(), DomainError> {
        self.require_actor(name)?;
        self.scene_of.insert(name.to_string(), scene.into());
        self.touch();
        Ok(())
    }

    pub fn scene_of(&self, name: &str) -> Option<&str> {
        self.scene_of.get(name).map(String::as_str)
    }

    /// Actors whose scene is `scene`, in name order.
    pub fn actors_in_scene<'a>(&'a self, scene: &'a str) -> impl Iterator<Item = &'a str> {
        self.scene_of
            .iter()
            .filter(move |(_, s)| s.as_str() == scene)
            .map(|(n, _)| n.as_str())
    }

    /// Two actors are apart only when both have a scene and the scenes differ.
    pub fn share_scene(&self, a: &str, b: &str) -> bool {
        match (self.scene_of.get(a), self.scene_of.get(b)) {
            (Some(sa), Some(sb)) => sa == sb,
            _ => true,
        }
    }

    /// Manhattan steps between two actors, undefined across scenes or when
    /// either position is missing.
    pub fn distance(&self, a: &str, b: &str) -> Option<u32> {
        if !self.share_scene(a, b) {
            return None;
        }
        let pa = self.positions.get(a)?;
        let pb = self.positions.get(b)?;
        Some(pa.distance_to(*pb))
    }

    pub fn cover_of(&self, name: &str) -> Cover {
        self.cover.get(name).copied().unwrap_or_default()
    }

    pub fn set_cover(&mut self, name: &str, cover: Cover) -> Result<(), DomainError> {
        self.require_actor(name)?;
        self.cover.insert(name.to_string(), cover);
        self.touch();
        Ok(())
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    pub fn inventory_of(&self, name: &str) -> Option<&BTreeMap<String, u32>> {
        self.inventories.get(name)
    }

    pub fn count_of(&self, name: &str, item: &str) -> u32 {
        self.inventories
            .get(name)
            .and_then(|bag| bag.get(item))
            .copied()
            .unwrap_or(0)
    }

    /// Add items. Returns the new count.
    pub fn grant(&mut self, name: &str, item: &str, count: u32) -> Result<u32, DomainError> {
        self.require_actor(name)?;
        let slot = self
            .inventories
            .entry(name.to_string())
            .or_default()
            .entry(item.to_string())
            .or_insert(0);
        *slot = slot.saturating_add(count);
        let total = *slot;
        self.touch();
        Ok(total)
    }

    /// Remove items. Fails without changing anything when the actor holds
    /// fewer than `count`. Returns the new count.
    pub fn take(&mut self, name: &str, item: &str, count: u32) -> Result<u32, DomainError> {
        let held = self.count_of(name, item);
        if held < count {
            return Err(DomainError::constraint(format!(
                "{} holds {} x {}, needs {}",
                name, held, item, count
            )));
        }
        let left = held - count;
        if let Some(bag) = self.inventories.get_mut(name) {
            if left == 0 {
                bag.remove(item);
            } else {
                bag.insert(item.to_string(), left);
            }
        }
        self.touch();
        Ok(left)
    }

    // =========================================================================
    // Relations
    // =========================================================================

    /// Directed score from `a` toward `b`; unknown pairs are neutral.
    pub fn relation(&self, a: &str, b: &str) -> i32 {
        self.relations
            .get(&(a.to_string(), b.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn relations(&self) -> impl Iterator<Item = (&str, &str, i32)> {
        self.relations
            .iter()
            .map(|((a, b), v)| (a.as_str(), b.as_str(), *v))
    }

    /// Set the directed score, clamped. Returns the stored value.
    pub fn set_relation(&mut self, a: &str, b: &str, value: i32) -> i32 {
        let value = clamp_relation(value);
        self.relations.insert((a.to_string(), b.to_string()), value);
        self.touch();
        value
    }

    pub fn change_relation(&mut self, a: &str, b: &str, delta: i32) -> i32 {
        let current = self.relation(a, b);
        self.set_relation(a, b, current.saturating_add(delta))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::world_with;
    use super::*;

    #[test]
    fn distance_is_manhattan_within_a_scene() {
        let world = world_with(&[("a", (0, 0)), ("b", (2, 3))]);
        assert_eq!(world.distance("a", "b"), Some(5));
    }

    #[test]
    fn distance_is_undefined_across_scenes() {
        let mut world = world_with(&[("a", (0, 0)), ("b", (1, 0))]);
        world.set_scene("b", "hall").unwrap();
        assert_eq!(world.distance("a", "b"), None);
        assert_eq!(world.distance("a", "ghost"), None);
    }

    #[test]
    fn take_fails_without_partial_change() {
        let mut world = world_with(&[("a", (0, 0))]);
        world.grant("a", "bandage", 2).unwrap();
        assert!(world.take("a", "bandage", 3).is_err());
        assert_eq!(world.count_of("a", "bandage"), 2);
        assert_eq!(world.take("a", "bandage", 2).unwrap(), 0);
        assert!(world.inventory_of("a").unwrap().is_empty());
    }

    #[test]
    fn relations_are_directed_and_clamped() {
        let mut world = World::new();
        world.set_relation("a", "b", -30);
        assert_eq!(world.relation("b", "a"), 0);
        assert_eq!(world.change_relation("a", "b", -500), -100);
    }

    #[test]
    fn placing_unknown_actor_fails() {
        let mut world = World::new();
        let result = world.place("ghost", GridPos::new(0, 0));
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}

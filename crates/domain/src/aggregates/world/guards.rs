//! Protection links: protectee -> protectors, in registration order.

use super::World;
use crate::error::DomainError;

impl World {
    /// Register `guardian` as a protector of `protectee`.
    ///
    /// Returns `false` when the link already exists.
    pub fn add_guard(&mut self, guardian: &str, protectee: &str) -> Result<bool, DomainError> {
        self.require_actor(guardian)?;
        self.require_actor(protectee)?;
        if guardian == protectee {
            return Err(DomainError::validation(format!(
                "{} cannot guard themselves",
                guardian
            )));
        }
        let list = self.guards.entry(protectee.to_string()).or_default();
        if list.iter().any(|g| g == guardian) {
            return Ok(false);
        }
        list.push(guardian.to_string());
        self.touch();
        Ok(true)
    }

    /// Remove links. `None` on either side matches everything:
    /// both `None` clears all links, a protectee alone clears its
    /// protectors, a guardian alone removes it everywhere.
    ///
    /// Returns how many links were removed.
    pub fn clear_guards(&mut self, guardian: Option<&str>, protectee: Option<&str>) -> usize {
        let mut removed = 0;
        self.guards.retain(|p, list| {
            if protectee.is_some_and(|want| want != p) {
                return true;
            }
            let before = list.len();
            match guardian {
                Some(g) => list.retain(|x| x != g),
                None => list.clear(),
            }
            removed += before - list.len();
            !list.is_empty()
        });
        if removed > 0 {
            self.touch();
        }
        removed
    }

    pub fn protectors_of(&self, protectee: &str) -> &[String] {
        self.guards
            .get(protectee)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All links as `(protectee, protectors)`.
    pub fn guard_links(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.guards
            .iter()
            .map(|(p, list)| (p.as_str(), list.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::world_with;

    fn guarded() -> super::World {
        let mut world = world_with(&[("vip", (0, 0)), ("g1", (1, 0)), ("g2", (0, 1)), ("x", (5, 5))]);
        world.add_guard("g1", "vip").unwrap();
        world.add_guard("g2", "vip").unwrap();
        world.add_guard("g1", "x").unwrap();
        world
    }

    #[test]
    fn duplicates_are_ignored_and_order_kept() {
        let mut world = guarded();
        assert!(!world.add_guard("g1", "vip").unwrap());
        assert_eq!(world.protectors_of("vip"), &["g1".to_string(), "g2".to_string()]);
    }

    #[test]
    fn self_guard_is_rejected() {
        let mut world = guarded();
        assert!(world.add_guard("vip", "vip").is_err());
    }

    #[test]
    fn clear_by_guardian_removes_it_everywhere() {
        let mut world = guarded();
        assert_eq!(world.clear_guards(Some("g1"), None), 2);
        assert_eq!(world.protectors_of("vip"), &["g2".to_string()]);
        assert!(world.protectors_of("x").is_empty());
    }

    #[test]
    fn clear_by_pair_and_all() {
        let mut world = guarded();
        assert_eq!(world.clear_guards(Some("g2"), Some("vip")), 1);
        assert_eq!(world.clear_guards(None, Some("vip")), 1);
        assert_eq!(world.clear_guards(None, None), 1);
        assert_eq!(world.guard_links().count(), 0);
    }
}

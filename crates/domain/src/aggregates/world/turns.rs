//! Turn resources, status effects and the action-blocking predicate.

use super::World;
use crate::error::DomainError;
use crate::events::TurnEndReport;
use crate::value_objects::{
    ActionKind, StatusDuration, StatusEntry, StatusTable, SystemStatus, TurnResource, TurnState,
};

impl World {
    // =========================================================================
    // Turn Resources
    // =========================================================================

    pub fn turn_state(&self, name: &str) -> Option<&TurnState> {
        self.turns.get(name)
    }

    /// Start an actor's turn: action, bonus and reaction back, movement
    /// budget set to the sheet's speed, readied action cleared.
    pub fn reset_turn(&mut self, name: &str) -> Result<&TurnState, DomainError> {
        let speed = self.require_actor(name)?.move_speed();
        self.turns.insert(name.to_string(), TurnState::fresh(speed));
        self.touch();
        self.turns
            .get(name)
            .ok_or_else(|| DomainError::not_found("TurnState", name))
    }

    /// Spend a once-per-round resource. Returns `false` when it was
    /// already spent.
    pub fn use_resource(&mut self, name: &str, resource: TurnResource) -> Result<bool, DomainError> {
        let state = self
            .turns
            .get_mut(name)
            .ok_or_else(|| DomainError::not_found("Actor", name))?;
        let spent = state.spend(resource);
        if spent {
            self.touch();
        }
        Ok(spent)
    }

    pub fn is_resource_available(&self, name: &str, resource: TurnResource) -> bool {
        self.turns
            .get(name)
            .map(|t| t.is_available(resource))
            .unwrap_or(false)
    }

    /// Deduct up to `steps` of movement. Returns the steps actually spent.
    pub fn consume_movement(&mut self, name: &str, steps: u32) -> Result<u32, DomainError> {
        let state = self
            .turns
            .get_mut(name)
            .ok_or_else(|| DomainError::not_found("Actor", name))?;
        let spent = steps.min(state.move_left);
        state.move_left -= spent;
        if spent > 0 {
            self.touch();
        }
        Ok(spent)
    }

    pub fn set_readied(&mut self, name: &str, readied: Option<String>) -> Result<(), DomainError> {
        let state = self
            .turns
            .get_mut(name)
            .ok_or_else(|| DomainError::not_found("Actor", name))?;
        state.readied = readied;
        self.touch();
        Ok(())
    }

    /// End-of-turn bookkeeping for `name`'s own turn.
    ///
    /// Timed control statuses count down and expire. A dying actor's
    /// countdown drops by one; at zero the actor dies.
    pub fn tick_end_of_turn(&mut self, name: &str) -> Result<TurnEndReport, DomainError> {
        self.require_actor(name)?;
        let expired = self
            .statuses
            .get_mut(name)
            .map(StatusTable::tick)
            .unwrap_or_default();

        let mut report = TurnEndReport {
            expired,
            ..Default::default()
        };

        let sheet = self.sheet_mut(name)?;
        if let Some(left) = sheet.dying_turns_left() {
            let left = left.saturating_sub(1);
            if left == 0 {
                self.kill(name)?;
                report.died = true;
            } else {
                sheet.set_dying_turns(left);
                if let Some(table) = self.statuses.get_mut(name) {
                    table.insert(StatusEntry::system(
                        SystemStatus::Dying,
                        StatusDuration::Turns(left),
                    ));
                }
                report.dying_turns_left = Some(left);
            }
        }
        self.touch();
        Ok(report)
    }

    // =========================================================================
    // Statuses
    // =========================================================================

    pub fn statuses_of(&self, name: &str) -> Option<&StatusTable> {
        self.statuses.get(name)
    }

    /// Attach a status, replacing one of the same name.
    pub fn add_status(&mut self, name: &str, entry: StatusEntry) -> Result<(), DomainError> {
        self.require_actor(name)?;
        self.statuses.entry(name.to_string()).or_default().insert(entry);
        self.touch();
        Ok(())
    }

    pub fn remove_status(
        &mut self,
        name: &str,
        status: &str,
    ) -> Result<Option<StatusEntry>, DomainError> {
        self.require_actor(name)?;
        let removed = self.statuses.get_mut(name).and_then(|t| t.remove(status));
        if removed.is_some() {
            self.touch();
        }
        Ok(removed)
    }

    /// Why `name` cannot take `action` right now, if anything stops it.
    ///
    /// Death, dying and zero HP block everything; otherwise the first
    /// control status whose block set covers the action wins.
    pub fn action_block_reason(&self, name: &str, action: ActionKind) -> Option<String> {
        let sheet = match self.sheet(name) {
            Some(sheet) => sheet,
            None => return Some(format!("{} is not in this story", name)),
        };
        if sheet.is_dying() {
            return Some(format!("{} is dying and cannot {}", name, action));
        }
        if sheet.hp() <= 0 {
            return Some(format!("{} is down and cannot {}", name, action));
        }
        self.statuses
            .get(name)
            .and_then(|t| t.blocking(action))
            .map(|entry| format!("{} is {} and cannot {}", name, entry.name(), action))
    }

    pub fn is_action_blocked(&self, name: &str, action: ActionKind) -> bool {
        self.action_block_reason(name, action).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::world_with;
    use super::*;
    use crate::value_objects::ControlEffect;

    mod resources {
        use super::*;

        #[test]
        fn reset_restores_budget_and_unblocks_movement() {
            let mut world = world_with(&[("a", (0, 0))]);
            world.use_resource("a", TurnResource::Action).unwrap();
            world.consume_movement("a", 2).unwrap();
            let speed = world.sheet("a").unwrap().move_speed();

            let state = world.reset_turn("a").unwrap().clone();
            assert_eq!(state, TurnState::fresh(speed));
            assert!(!world.is_action_blocked("a", ActionKind::Move));
        }

        #[test]
        fn resources_spend_once_per_round() {
            let mut world = world_with(&[("a", (0, 0))]);
            assert!(world.use_resource("a", TurnResource::Reaction).unwrap());
            assert!(!world.use_resource("a", TurnResource::Reaction).unwrap());
            assert!(world.use_resource("a", TurnResource::Bonus).unwrap());
        }

        #[test]
        fn movement_is_capped_by_budget() {
            let mut world = world_with(&[("a", (0, 0))]);
            let speed = world.sheet("a").unwrap().move_speed();
            assert_eq!(world.consume_movement("a", speed + 4).unwrap(), speed);
            assert_eq!(world.turn_state("a").unwrap().move_left, 0);
        }
    }

    mod statuses {
        use super::*;

        #[test]
        fn control_status_blocks_and_expires() {
            let mut world = world_with(&[("a", (0, 0))]);
            world
                .add_status("a", StatusEntry::control(ControlEffect::Rooted, 1, None))
                .unwrap();
            assert!(world.is_action_blocked("a", ActionKind::Move));
            assert!(!world.is_action_blocked("a", ActionKind::Attack));

            let report = world.tick_end_of_turn("a").unwrap();
            assert_eq!(report.expired, vec!["rooted".to_string()]);
            assert!(!world.is_action_blocked("a", ActionKind::Move));
        }

        #[test]
        fn silenced_blocks_only_casting() {
            let mut world = world_with(&[("a", (0, 0))]);
            world
                .add_status("a", StatusEntry::control(ControlEffect::Silenced, 2, None))
                .unwrap();
            let reason = world.action_block_reason("a", ActionKind::Cast).unwrap();
            assert!(reason.contains("silenced"));
            assert!(!world.is_action_blocked("a", ActionKind::Move));
        }

        #[test]
        fn dying_blocks_everything() {
            let mut world = world_with(&[("a", (0, 0))]);
            world.apply_damage("a", 100).unwrap();
            for action in [ActionKind::Move, ActionKind::Attack, ActionKind::FirstAid] {
                assert!(world.is_action_blocked("a", action));
            }
        }
    }

    mod dying_countdown {
        use super::*;

        #[test]
        fn countdown_runs_out_into_death() {
            let mut world = world_with(&[("a", (0, 0))]).with_dying_turns(2);
            world.apply_damage("a", 100).unwrap();

            let first = world.tick_end_of_turn("a").unwrap();
            assert_eq!(first.dying_turns_left, Some(1));
            assert!(!first.died);

            let second = world.tick_end_of_turn("a").unwrap();
            assert!(second.died);
            assert!(world.is_dead("a"));
        }

        #[test]
        fn healthy_actor_tick_reports_nothing() {
            let mut world = world_with(&[("a", (0, 0))]);
            assert_eq!(world.tick_end_of_turn("a").unwrap(), TurnEndReport::default());
        }
    }
}

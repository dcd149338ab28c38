//! First aid: stabilize the dying or patch a fresh wound.

use std::sync::Arc;

use serde::Serialize;

use tabletale_domain::{ActionKind, CheckRoll, FirstAidOutcome, TurnResource, World};

use crate::infrastructure::ports::RandomPort;
use crate::use_cases::error::RuleError;
use crate::use_cases::resolution::{
    check, ensure_able, ensure_participant, ensure_resource, spend_resource,
};
use crate::use_cases::Narrated;

const FIRST_AID_SKILL: &str = "FirstAid";
/// Rescuer must stand on or next to the target.
const FIRST_AID_REACH: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstAidReport {
    pub rescuer: String,
    pub target: String,
    pub check: CheckRoll,
    /// `None` when the check failed
    pub outcome: Option<FirstAidOutcome>,
}

impl Narrated for FirstAidReport {
    fn narration(&self) -> Vec<String> {
        let line = match &self.outcome {
            None => format!(
                "{} tries to treat {} but fumbles the bandages ({}).",
                self.rescuer, self.target, self.check
            ),
            Some(FirstAidOutcome::Stabilized { new_hp }) => format!(
                "{} stabilizes {} ({} HP).",
                self.rescuer, self.target, new_hp
            ),
            Some(FirstAidOutcome::Healed { new_hp }) => format!(
                "{} patches up {} ({} HP).",
                self.rescuer, self.target, new_hp
            ),
            Some(FirstAidOutcome::AlreadyTreated) => {
                format!("{}'s wound has already been treated.", self.target)
            }
            Some(FirstAidOutcome::NothingToDo) => format!("{} needs no treatment.", self.target),
        };
        vec![line]
    }
}

pub struct FirstAid {
    random: Arc<dyn RandomPort>,
}

impl FirstAid {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        Self { random }
    }

    /// A FirstAid check. A failed check still spends the action.
    pub fn execute(
        &self,
        world: &mut World,
        rescuer: &str,
        target: &str,
    ) -> Result<FirstAidReport, RuleError> {
        ensure_participant(world, rescuer)?;
        ensure_participant(world, target)?;
        ensure_able(world, rescuer, ActionKind::FirstAid)?;
        if !world.needs_first_aid(target) {
            return Err(RuleError::NothingToDo(format!("{} needs no first aid", target)));
        }
        match world.distance(rescuer, target) {
            Some(d) if d <= FIRST_AID_REACH => {}
            _ => {
                return Err(RuleError::OutOfReach {
                    target: target.to_string(),
                    reach: FIRST_AID_REACH,
                })
            }
        }
        ensure_resource(world, rescuer, TurnResource::Action)?;
        spend_resource(world, rescuer, TurnResource::Action)?;

        let skill = world
            .sheet(rescuer)
            .map(|s| s.skill_value(FIRST_AID_SKILL))
            .ok_or_else(|| RuleError::UnknownActor(rescuer.to_string()))?;
        let roll = check(self.random.as_ref(), skill);
        tracing::debug!(rescuer = %rescuer, target = %target, check = %roll, "First aid check");

        let outcome = if roll.is_success() {
            let outcome = world.apply_first_aid(target)?;
            tracing::info!(rescuer = %rescuer, target = %target, ?outcome, "First aid applied");
            Some(outcome)
        } else {
            None
        };
        Ok(FirstAidReport {
            rescuer: rescuer.to_string(),
            target: target.to_string(),
            check: roll,
            outcome,
        })
    }
}

//! Runs gated actions against the world and reports every outcome as an
//! [`ActionResult`].

use serde::Serialize;
use serde_json::json;

use tabletale_domain::World;
use tabletale_shared::{ActionResult, ErrorCode, ToolCall};

use super::tools::{gate, Action};
use crate::use_cases::combat::{clear_guard, set_guard};
use crate::use_cases::exposure::{advance_stage, exposure_state};
use crate::use_cases::movement::{advance_position, use_entrance};
use crate::use_cases::social::{adjust_relation, transfer_item};
use crate::use_cases::{endings, Narrated, RuleError, RuleUseCases};

/// Turns tool calls into rule invocations.
pub struct ActionExecutor {
    rules: RuleUseCases,
}

impl ActionExecutor {
    pub fn new(rules: RuleUseCases) -> Self {
        Self { rules }
    }

    /// Gate a raw call, then execute it.
    pub fn handle(&self, world: &mut World, call: &ToolCall, turn_actor: Option<&str>) -> ActionResult {
        match gate(world, call, turn_actor) {
            Ok(action) => self.execute(world, action),
            Err(e) => {
                tracing::warn!(tool = %call.tool, actor = ?turn_actor, error = %e, "Tool call rejected");
                ActionResult::failure(e.code(), e.to_string())
            }
        }
    }

    /// Execute an already-validated action.
    ///
    /// Once the run has a verdict only reads are served. After a successful
    /// change the ending rules are evaluated; a verdict reached here is
    /// appended to the narration and reported under `data.ending`.
    pub fn execute(&self, world: &mut World, action: Action) -> ActionResult {
        let kind = action.kind();
        if world.verdict().is_some() && !kind.is_read_only() {
            return ActionResult::failure(ErrorCode::RunEnded, RuleError::RunEnded.to_string());
        }

        let result = match action {
            Action::Attack {
                attacker,
                defender,
                weapon,
                reason,
            } => {
                if let Some(reason) = reason {
                    tracing::debug!(attacker = %attacker, reason = %reason, "Attack reason");
                }
                respond(self.rules.combat.attack.execute(world, &attacker, &defender, &weapon))
            }
            Action::Advance { actor, target, steps } => {
                respond(advance_position(world, &actor, &target, steps))
            }
            Action::UseEntrance { actor, entrance } => respond(use_entrance(world, &actor, &entrance)),
            Action::AdjustRelation {
                from,
                to,
                delta,
                reason,
            } => respond(adjust_relation(world, &from, &to, delta, reason.as_deref())),
            Action::TransferItem {
                from,
                to,
                item,
                count,
            } => respond(transfer_item(world, &from, &to, &item, count)),
            Action::SetProtection { guardian, protectee } => {
                respond(set_guard(world, &guardian, &protectee))
            }
            Action::ClearProtection { guardian, protectee } => {
                respond(clear_guard(world, guardian.as_deref(), protectee.as_deref()))
            }
            Action::FirstAid { rescuer, target } => {
                respond(self.rules.combat.first_aid.execute(world, &rescuer, &target))
            }
            Action::Cast {
                caster,
                power,
                target,
                spend,
            } => respond(self.rules.cast.execute(world, &caster, &power, target.as_deref(), spend)),
            Action::ApplyExposure { actor, source, bonus } => {
                respond(self.rules.exposure.execute(world, &actor, source, bonus))
            }
            Action::AdvanceStage { actor, choice } => respond(advance_stage(world, &actor, choice)),
            Action::ExposureState { actor } => respond(exposure_state(world, &actor)),
        };

        if !result.ok || kind.is_read_only() {
            return result;
        }
        let report = endings::evaluate(world);
        if !report.newly_ended {
            return result;
        }
        let mut data = result.data.clone();
        if let Some(map) = data.as_object_mut() {
            map.insert("ending".to_string(), json!(report.verdict));
        }
        result.narrate_all(report.narration()).with_data(data)
    }
}

fn respond<T: Serialize + Narrated>(result: Result<T, RuleError>) -> ActionResult {
    match result {
        Ok(outcome) => ActionResult::success(&outcome).narrate_all(outcome.narration()),
        Err(e) => {
            tracing::warn!(code = %e.code(), error = %e, "Action failed");
            ActionResult::failure(e.code(), e.to_string())
        }
    }
}

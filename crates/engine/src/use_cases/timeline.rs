//! Advancing the clock and firing scheduled events.

use serde::Serialize;

use tabletale_domain::value_objects::ObjectiveStatus;
use tabletale_domain::{EventEffect, Objective, TimelineEvent, World};

use super::endings::{end_now, EndingReport};
use super::error::RuleError;
use super::Narrated;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FiredEvent {
    pub name: String,
    pub at_min: u32,
    pub note: Option<String>,
    /// One line per applied effect
    pub applied: Vec<String>,
    /// Effects that could not be applied, with the reason
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeAdvance {
    pub from_min: u32,
    pub to_min: u32,
    pub clock: String,
    pub fired: Vec<FiredEvent>,
    pub ending: Option<EndingReport>,
}

impl Narrated for TimeAdvance {
    fn narration(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Time passes: {} minute(s), now {}.",
            self.to_min - self.from_min,
            self.clock
        )];
        for event in &self.fired {
            match &event.note {
                Some(note) => lines.push(format!("{}: {}", event.name, note)),
                None => lines.push(format!("{} happens.", event.name)),
            }
            lines.extend(event.applied.iter().cloned());
        }
        if let Some(ending) = &self.ending {
            lines.extend(ending.narration());
        }
        lines
    }
}

/// Move the clock forward and apply every event that has come due, in
/// time order.
pub fn advance_time(world: &mut World, minutes: u32) -> Result<TimeAdvance, RuleError> {
    if minutes == 0 {
        return Err(RuleError::InvalidValue(
            "minutes must be positive".to_string(),
        ));
    }
    let from_min = world.time_min();
    let to_min = world.advance_clock(minutes);
    let due = world.timeline_mut().take_due(to_min);

    let mut fired = Vec::with_capacity(due.len());
    let mut ending = None;
    for event in due {
        let (report, forced) = fire(world, event);
        if ending.is_none() {
            ending = forced;
        }
        fired.push(report);
    }
    tracing::info!(from_min, to_min, fired = fired.len(), "Clock advanced");

    Ok(TimeAdvance {
        from_min,
        to_min,
        clock: world.clock().to_string(),
        fired,
        ending,
    })
}

fn fire(world: &mut World, event: TimelineEvent) -> (FiredEvent, Option<EndingReport>) {
    let mut applied = Vec::new();
    let mut skipped = Vec::new();
    let mut ending = None;

    for effect in &event.effects {
        match apply_effect(world, effect) {
            Ok(EffectResult::Line(line)) => applied.push(line),
            Ok(EffectResult::Ended(report)) => {
                applied.extend(report.narration());
                ending = Some(report);
            }
            Err(err) => {
                tracing::warn!(event = %event.name, effect = effect.kind(), error = %err, "Timeline effect skipped");
                skipped.push(format!("{}: {}", effect.kind(), err));
            }
        }
    }
    tracing::debug!(event = %event.name, at_min = event.at_min, "Timeline event fired");

    (
        FiredEvent {
            name: event.name,
            at_min: event.at_min,
            note: event.note,
            applied,
            skipped,
        },
        ending,
    )
}

enum EffectResult {
    Line(String),
    Ended(EndingReport),
}

fn apply_effect(world: &mut World, effect: &EventEffect) -> Result<EffectResult, RuleError> {
    let line = match effect {
        EventEffect::AddObjective { name, position } => {
            let mut objective = Objective::new(name.clone());
            objective.position = *position;
            world.add_objective(objective);
            format!("New objective: {}.", name)
        }
        EventEffect::CompleteObjective { name } => {
            world.set_objective_status(name, ObjectiveStatus::Done);
            format!("Objective done: {}.", name)
        }
        EventEffect::BlockObjective { name } => {
            world.set_objective_status(name, ObjectiveStatus::Blocked);
            format!("Objective blocked: {}.", name)
        }
        EventEffect::Relation { a, b, value } => {
            ensure_known(world, a)?;
            ensure_known(world, b)?;
            let stored = world.set_relation(a, b, *value);
            format!("{} now regards {} at {}.", a, b, stored)
        }
        EventEffect::Grant {
            target,
            item,
            count,
        } => {
            let total = world.grant(target, item, *count)?;
            format!("{} receives {} x{} ({} held).", target, item, count, total)
        }
        EventEffect::Damage { target, amount } => {
            let outcome = world.apply_damage(target, *amount)?;
            format!("{} takes {} damage.", target, outcome.damage_dealt())
        }
        EventEffect::Heal { target, amount } => {
            let outcome = world.heal(target, *amount)?;
            format!("{} is tended to ({:?}).", target, outcome)
        }
        EventEffect::Mark { text } => {
            world.add_mark(text.clone());
            format!("Noted: {}.", text)
        }
        EventEffect::Tension { delta } => {
            let tension = world.adjust_tension(*delta);
            format!("Tension is now {}.", tension)
        }
        EventEffect::End {
            ending_id,
            label,
            outcome,
            note,
        } => {
            return Ok(EffectResult::Ended(end_now(
                world,
                ending_id.as_deref(),
                label.as_deref(),
                *outcome,
                note.as_deref(),
            )));
        }
    };
    Ok(EffectResult::Line(line))
}

fn ensure_known(world: &World, name: &str) -> Result<(), RuleError> {
    if world.has_actor(name) {
        Ok(())
    } else {
        Err(RuleError::UnknownActor(name.to_string()))
    }
}

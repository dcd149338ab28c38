//! Ending evaluation.
//!
//! Rules are checked in priority order (highest first, authored order on
//! ties). The first rule whose condition holds freezes the verdict; once
//! frozen, nothing changes it.

use serde::Serialize;

use tabletale_domain::value_objects::{
    ActorCheck, HostileCheck, ObjectiveCheck, ObjectiveStatus, StatusFilter,
};
use tabletale_domain::{EndingCondition, EndingOutcome, EndingVerdict, World};

use super::Narrated;

/// Result of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndingReport {
    pub ended: bool,
    /// True only on the pass that froze the verdict
    pub newly_ended: bool,
    pub verdict: Option<EndingVerdict>,
}

impl Narrated for EndingReport {
    fn narration(&self) -> Vec<String> {
        match (&self.verdict, self.newly_ended) {
            (Some(verdict), true) => {
                let mut lines = vec![format!("Ending reached: {}.", verdict.label)];
                if !verdict.reasons.is_empty() {
                    lines.push(format!("Because: {}.", verdict.reasons.join("; ")));
                }
                lines
            }
            _ => Vec::new(),
        }
    }
}

/// Evaluate the rule set, freezing the first match.
pub fn evaluate(world: &mut World) -> EndingReport {
    if let Some(verdict) = world.verdict() {
        return EndingReport {
            ended: true,
            newly_ended: false,
            verdict: Some(verdict.clone()),
        };
    }

    let matched = world.ending_rules().iter().find_map(|rule| {
        let mut reasons = Vec::new();
        holds(world, &rule.when, &mut reasons).then(|| EndingVerdict {
            ending_id: rule.id.clone(),
            label: rule.display_label().to_string(),
            outcome: rule.outcome,
            reasons,
            time_min: world.time_min(),
        })
    });

    match matched {
        Some(verdict) => {
            tracing::info!(
                ending = %verdict.ending_id,
                outcome = ?verdict.outcome,
                time_min = verdict.time_min,
                "Ending frozen"
            );
            world.freeze_verdict(verdict.clone());
            EndingReport {
                ended: true,
                newly_ended: true,
                verdict: Some(verdict),
            }
        }
        None => EndingReport {
            ended: false,
            newly_ended: false,
            verdict: None,
        },
    }
}

/// Force the run to end. Idempotent: an existing verdict is returned as-is.
pub fn end_now(
    world: &mut World,
    ending_id: Option<&str>,
    label: Option<&str>,
    outcome: Option<EndingOutcome>,
    reason: Option<&str>,
) -> EndingReport {
    if let Some(verdict) = world.verdict() {
        return EndingReport {
            ended: true,
            newly_ended: false,
            verdict: Some(verdict.clone()),
        };
    }
    let ending_id = ending_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or("manual")
        .to_string();
    let verdict = EndingVerdict {
        label: label.map(str::to_string).unwrap_or_else(|| ending_id.clone()),
        ending_id,
        outcome,
        reasons: reason.map(|r| vec![r.to_string()]).unwrap_or_default(),
        time_min: world.time_min(),
    };
    tracing::info!(ending = %verdict.ending_id, "Ending forced");
    world.freeze_verdict(verdict.clone());
    EndingReport {
        ended: true,
        newly_ended: true,
        verdict: Some(verdict),
    }
}

/// Whether any two living actors regard each other at or below `threshold`
/// in either direction.
///
/// Candidates are `names` when given, else everyone with a position, else
/// every actor. Dying actors do not count as living here.
pub fn hostiles_present(world: &World, names: Option<&[String]>, threshold: i32) -> bool {
    let candidates: Vec<&str> = match names {
        Some(names) if !names.is_empty() => names.iter().map(String::as_str).collect(),
        _ => {
            let placed: Vec<&str> = world.positions().map(|(name, _)| name).collect();
            if placed.is_empty() {
                world.actor_names().collect()
            } else {
                placed
            }
        }
    };
    let living: Vec<&str> = candidates
        .into_iter()
        .filter(|name| world.is_alive(name))
        .collect();

    living.iter().enumerate().any(|(i, a)| {
        living[i + 1..].iter().any(|b| {
            world.relation(a, b) <= threshold || world.relation(b, a) <= threshold
        })
    })
}

fn holds(world: &World, condition: &EndingCondition, reasons: &mut Vec<String>) -> bool {
    match condition {
        EndingCondition::All(parts) => {
            let mut collected = Vec::new();
            let ok = !parts.is_empty() && parts.iter().all(|p| holds(world, p, &mut collected));
            if ok {
                reasons.extend(collected);
            }
            ok
        }
        EndingCondition::Any(parts) => parts.iter().any(|p| holds(world, p, reasons)),
        EndingCondition::Not(inner) => {
            let ok = !holds(world, inner, &mut Vec::new());
            if ok {
                reasons.push(condition.description());
            }
            ok
        }
        leaf => {
            let ok = leaf_holds(world, leaf);
            if ok {
                reasons.push(leaf.description());
            }
            ok
        }
    }
}

fn leaf_holds(world: &World, leaf: &EndingCondition) -> bool {
    match leaf {
        EndingCondition::Objectives(check) => objectives_hold(world, check),
        EndingCondition::TimeBefore(t) => t.minutes().is_some_and(|m| world.time_min() < m),
        EndingCondition::TimeAtLeast(t) => t.minutes().is_some_and(|m| world.time_min() >= m),
        EndingCondition::ActorsAlive(check) => actors_hold(world, check, true),
        EndingCondition::ActorsDead(check) => actors_hold(world, check, false),
        EndingCondition::ParticipantsAliveAtLeast(n) => participants_alive(world) >= *n,
        EndingCondition::ParticipantsAliveAtMost(n) => participants_alive(world) <= *n,
        EndingCondition::HostilesPresent(check) => hostile_gate(world, check),
        EndingCondition::MarksContains(wanted) => {
            wanted.matches_any(|m| world.marks().any(|mark| mark == m))
        }
        EndingCondition::TensionAtLeast(n) => world.tension() >= *n,
        EndingCondition::TensionAtMost(n) => world.tension() <= *n,
        EndingCondition::LocationIs(places) => places.matches_any(|p| world.location() == p),
        EndingCondition::All(_) | EndingCondition::Any(_) | EndingCondition::Not(_) => false,
    }
}

fn objectives_hold(world: &World, check: &ObjectiveCheck) -> bool {
    let names: Vec<&str> = if check.names.is_empty() {
        world.objectives().iter().map(|o| o.name.as_str()).collect()
    } else {
        check.names.iter().map(String::as_str).collect()
    };
    check.require.combine(names.into_iter().map(|name| {
        let status = world
            .objective(name)
            .map(|o| o.status)
            .unwrap_or(ObjectiveStatus::Pending);
        match check.status {
            StatusFilter::Any => true,
            StatusFilter::Done => status == ObjectiveStatus::Done,
            StatusFilter::Blocked => status == ObjectiveStatus::Blocked,
        }
    }))
}

fn actors_hold(world: &World, check: &ActorCheck, alive: bool) -> bool {
    check
        .require
        .combine(check.names.iter().map(|name| world.is_alive(name) == alive))
}

/// Living named participants. Dying actors are not alive here, and an
/// empty participant list counts nobody.
fn participants_alive(world: &World) -> u32 {
    let count = world
        .participants()
        .iter()
        .filter(|n| world.is_alive(n))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

fn hostile_gate(world: &World, check: &HostileCheck) -> bool {
    let participants = world.participants();
    let names = (!participants.is_empty()).then_some(participants);
    hostiles_present(world, names, check.threshold()) == check.expected()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::world_with;
    use tabletale_domain::value_objects::{OneOrMany, Require, TimeSpec};
    use tabletale_domain::{EndingRule, Objective};

    fn rule(id: &str, priority: i32, when: EndingCondition) -> EndingRule {
        EndingRule {
            id: id.to_string(),
            label: None,
            outcome: Some(EndingOutcome::Neutral),
            priority,
            when,
        }
    }

    mod evaluation {
        use super::*;

        #[test]
        fn highest_priority_match_wins_and_freezes() {
            let mut world = world_with(&[("a", (0, 0))]);
            world.set_tension(4);
            world.set_ending_rules(vec![
                rule("calm", 0, EndingCondition::TensionAtMost(5)),
                rule("storm", 5, EndingCondition::TensionAtLeast(4)),
            ]);

            let report = evaluate(&mut world);
            assert!(report.newly_ended);
            let verdict = report.verdict.unwrap();
            assert_eq!(verdict.ending_id, "storm");
            assert_eq!(verdict.reasons, vec!["tension >= 4".to_string()]);

            world.set_tension(0);
            let again = evaluate(&mut world);
            assert!(again.ended && !again.newly_ended);
            assert_eq!(again.verdict.unwrap().ending_id, "storm");
        }

        #[test]
        fn no_rules_means_no_ending() {
            let mut world = world_with(&[("a", (0, 0))]);
            assert!(!evaluate(&mut world).ended);
        }

        #[test]
        fn combinators_nest() {
            let mut world = world_with(&[("a", (0, 0)), ("b", (1, 0))]);
            world.add_objective(Objective::new("escape"));
            world.add_mark("bell rang");
            let when = EndingCondition::All(vec![
                EndingCondition::Any(vec![
                    EndingCondition::LocationIs(OneOrMany::One("Moon".into())),
                    EndingCondition::MarksContains(OneOrMany::Many(vec![
                        "horn".into(),
                        "bell rang".into(),
                    ])),
                ]),
                EndingCondition::Not(Box::new(EndingCondition::Objectives(ObjectiveCheck {
                    names: vec!["escape".into()],
                    require: Require::All,
                    status: StatusFilter::Done,
                }))),
                EndingCondition::TimeBefore(TimeSpec::Clock("09:00".into())),
            ]);
            let mut reasons = Vec::new();
            assert!(holds(&world, &when, &mut reasons));
            assert_eq!(reasons.len(), 3);

            world.set_objective_status("escape", ObjectiveStatus::Done);
            assert!(!holds(&world, &when, &mut Vec::new()));
        }

        #[test]
        fn empty_combinators_do_not_hold() {
            let world = world_with(&[("a", (0, 0))]);
            assert!(!holds(&world, &EndingCondition::All(vec![]), &mut Vec::new()));
            assert!(!holds(&world, &EndingCondition::Any(vec![]), &mut Vec::new()));
        }
    }

    mod leaves {
        use super::*;

        #[test]
        fn dying_actor_is_not_alive() {
            let mut world = world_with(&[("a", (0, 0)), ("b", (1, 0))]);
            world.set_participants(["a", "b"]);
            let alive = EndingCondition::ActorsAlive(ActorCheck {
                names: vec!["a".into()],
                require: Require::All,
            });
            let dead = EndingCondition::ActorsDead(ActorCheck {
                names: vec!["a".into()],
                require: Require::All,
            });
            assert!(leaf_holds(&world, &alive));
            assert!(!leaf_holds(&world, &dead));

            world.apply_damage("a", 100).unwrap();
            assert!(world.is_dying("a"));
            assert!(!leaf_holds(&world, &alive));
            assert!(leaf_holds(&world, &dead));
            assert!(leaf_holds(&world, &EndingCondition::ParticipantsAliveAtMost(1)));
            assert!(!leaf_holds(&world, &EndingCondition::ParticipantsAliveAtLeast(2)));
        }

        #[test]
        fn dying_boss_triggers_actors_dead_ending() {
            let mut world = world_with(&[("hero", (0, 0)), ("boss", (1, 0))]);
            world.set_ending_rules(vec![rule(
                "boss_down",
                0,
                EndingCondition::ActorsDead(ActorCheck {
                    names: vec!["boss".into()],
                    require: Require::All,
                }),
            )]);
            world.apply_damage("boss", 100).unwrap();

            let report = evaluate(&mut world);
            assert!(report.newly_ended);
            assert_eq!(report.verdict.unwrap().ending_id, "boss_down");
        }

        #[test]
        fn empty_participant_list_counts_nobody_alive() {
            let world = world_with(&[("a", (0, 0)), ("b", (1, 0))]);
            assert!(world.participants().is_empty());
            assert!(leaf_holds(&world, &EndingCondition::ParticipantsAliveAtMost(0)));
            assert!(!leaf_holds(&world, &EndingCondition::ParticipantsAliveAtLeast(1)));
        }

        #[test]
        fn objectives_without_names_cover_all() {
            let mut world = world_with(&[("a", (0, 0))]);
            world.add_objective(Objective::new("one"));
            world.add_objective(Objective::new("two"));
            world.set_objective_status("one", ObjectiveStatus::Blocked);
            let any_blocked = EndingCondition::Objectives(ObjectiveCheck {
                names: vec![],
                require: Require::Any,
                status: StatusFilter::Blocked,
            });
            assert!(leaf_holds(&world, &any_blocked));
        }

        #[test]
        fn hostiles_need_two_living_enemies() {
            let mut world = world_with(&[("a", (0, 0)), ("b", (1, 0)), ("c", (2, 0))]);
            assert!(!hostiles_present(&world, None, -10));
            world.set_relation("b", "a", -10);
            assert!(hostiles_present(&world, None, -10));
            assert!(!hostiles_present(&world, None, -20));

            world.apply_damage("b", 100).unwrap();
            assert!(!hostiles_present(&world, None, -10));
            let cleared = EndingCondition::HostilesPresent(HostileCheck::Flag(false));
            assert!(leaf_holds(&world, &cleared));
        }
    }

    mod forced {
        use super::*;

        #[test]
        fn end_now_is_idempotent() {
            let mut world = world_with(&[("a", (0, 0))]);
            let first = end_now(&mut world, Some("collapse"), Some("The roof gives way"), None, Some("timeline"));
            assert!(first.newly_ended);
            let second = end_now(&mut world, Some("other"), None, None, None);
            assert!(!second.newly_ended);
            assert_eq!(second.verdict.unwrap().ending_id, "collapse");
            assert_eq!(world.verdict().unwrap().reasons, vec!["timeline".to_string()]);
        }
    }
}

//! The round loop.
//!
//! The world sits behind a mutex and every engine call happens inside a
//! short critical section. The lock is never held while a decision-maker
//! is thinking or while the loop waits at the pause gate.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use tabletale_domain::value_objects::{Characteristic, HOSTILE_THRESHOLD};
use tabletale_domain::{EndingVerdict, TurnEndReport, World};
use tabletale_shared::{ActionResult, ToolCall};

use crate::api::ActionExecutor;
use crate::infrastructure::pause::PauseGate;
use crate::infrastructure::ports::{DecisionPort, TurnPrompt};
use crate::use_cases::scene_view::{render_lines, visible_snapshot};
use crate::use_cases::{endings, timeline};

/// Loop limits taken from the engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub max_rounds: u32,
    pub end_when_no_hostiles: bool,
    pub minutes_per_round: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum StopReason {
    Ending { ending_id: String },
    ObjectivesResolved,
    NoHostiles,
    MaxRounds,
    /// Nobody left who can take a turn
    NoActors,
}

/// What happened during one actor's turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRecord {
    pub round: u32,
    pub actor: String,
    pub calls: Vec<ToolCall>,
    pub results: Vec<ActionResult>,
    pub end_of_turn: Option<TurnEndReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub rounds: u32,
    pub stop: StopReason,
    pub verdict: Option<EndingVerdict>,
    pub turns: Vec<TurnRecord>,
}

pub struct RoundRunner {
    world: Arc<Mutex<World>>,
    executor: ActionExecutor,
    decisions: Arc<dyn DecisionPort>,
    pause: PauseGate,
    settings: RunSettings,
}

impl RoundRunner {
    pub fn new(
        world: World,
        executor: ActionExecutor,
        decisions: Arc<dyn DecisionPort>,
        pause: PauseGate,
        settings: RunSettings,
    ) -> Self {
        Self {
            world: Arc::new(Mutex::new(world)),
            executor,
            decisions,
            pause,
            settings,
        }
    }

    /// Shared handle for observers. Lock it only briefly.
    pub fn world(&self) -> Arc<Mutex<World>> {
        self.world.clone()
    }

    pub fn pause_gate(&self) -> PauseGate {
        self.pause.clone()
    }

    /// Play rounds until something stops the run.
    pub async fn run(&self) -> RunSummary {
        let mut turns = Vec::new();
        for round in 1..=self.settings.max_rounds {
            tracing::info!(round, "Round begins");
            let order = self.turn_order().await;
            if order.is_empty() {
                return self.finish(round - 1, StopReason::NoActors, turns).await;
            }

            for actor in order {
                if let Some(record) = self.take_turn(round, &actor).await {
                    turns.push(record);
                }
                if let Some(stop) = self.stop_reason().await {
                    return self.finish(round, stop, turns).await;
                }
                self.pause.wait_if_requested().await;
            }

            if self.settings.minutes_per_round > 0 {
                let mut world = self.world.lock().await;
                match timeline::advance_time(&mut world, self.settings.minutes_per_round) {
                    Ok(advance) => {
                        for event in &advance.fired {
                            tracing::info!(event = %event.name, clock = %advance.clock, "Timeline event fired");
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "Clock did not advance"),
                }
                drop(world);
                if let Some(stop) = self.stop_reason().await {
                    return self.finish(round, stop, turns).await;
                }
            }
        }
        let rounds = self.settings.max_rounds;
        self.finish(rounds, StopReason::MaxRounds, turns).await
    }

    async fn turn_order(&self) -> Vec<String> {
        action_order(&*self.world.lock().await)
    }

    async fn take_turn(&self, round: u32, actor: &str) -> Option<TurnRecord> {
        // Reset and build the prompt, then release the world.
        let prompt = {
            let mut world = self.world.lock().await;
            if world.is_dead(actor) {
                tracing::debug!(actor = %actor, "Skipping the dead");
                return None;
            }
            if let Err(e) = world.reset_turn(actor) {
                tracing::warn!(actor = %actor, error = %e, "Turn reset failed");
                return None;
            }
            let can_act = !world.is_dying(actor);
            let view = visible_snapshot(&world, Some(actor));
            let rendered = render_lines(&view);
            can_act.then(|| TurnPrompt {
                actor: actor.to_string(),
                round,
                view,
                rendered,
            })
        };

        let calls = match prompt {
            Some(prompt) => match self.decisions.decide(prompt).await {
                Ok(calls) => calls,
                Err(e) => {
                    tracing::warn!(actor = %actor, error = %e, "Decision failed, turn passes");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let mut world = self.world.lock().await;
        let mut results = Vec::with_capacity(calls.len());
        for call in &calls {
            let result = self.executor.handle(&mut world, call, Some(actor));
            tracing::info!(
                actor = %actor,
                tool = %call.tool,
                ok = result.ok,
                code = ?result.error_code(),
                "Action resolved"
            );
            results.push(result);
            if world.verdict().is_some() {
                break;
            }
        }

        let end_of_turn = match world.tick_end_of_turn(actor) {
            Ok(report) => {
                if report.died {
                    tracing::info!(actor = %actor, "Died at the end of their turn");
                }
                Some(report)
            }
            Err(e) => {
                tracing::warn!(actor = %actor, error = %e, "End-of-turn tick failed");
                None
            }
        };
        endings::evaluate(&mut world);

        Some(TurnRecord {
            round,
            actor: actor.to_string(),
            calls,
            results,
            end_of_turn,
        })
    }

    async fn stop_reason(&self) -> Option<StopReason> {
        let world = self.world.lock().await;
        if let Some(verdict) = world.verdict() {
            return Some(StopReason::Ending {
                ending_id: verdict.ending_id.clone(),
            });
        }
        if !world.objectives().is_empty() && world.all_objectives_resolved() {
            return Some(StopReason::ObjectivesResolved);
        }
        if self.settings.end_when_no_hostiles && !endings::hostiles_present(&world, None, HOSTILE_THRESHOLD) {
            return Some(StopReason::NoHostiles);
        }
        None
    }

    async fn finish(&self, rounds: u32, stop: StopReason, turns: Vec<TurnRecord>) -> RunSummary {
        let verdict = self.world.lock().await.verdict().cloned();
        tracing::info!(rounds, stop = ?stop, "Run finished");
        RunSummary {
            rounds,
            stop,
            verdict,
            turns,
        }
    }
}

/// This round's acting order: participants (every actor when none are
/// named) minus the dead, by DEX descending, ties by name descending.
///
/// Dying actors keep their slot so their countdown still ticks.
pub fn action_order(world: &World) -> Vec<String> {
    let names: Vec<&str> = if world.participants().is_empty() {
        world.actor_names().collect()
    } else {
        world.participants().iter().map(String::as_str).collect()
    };
    let mut ranked: Vec<(i32, &str)> = names
        .into_iter()
        .filter(|n| world.has_actor(n) && !world.is_dead(n))
        .map(|n| {
            let dex = world
                .sheet(n)
                .map(|s| s.characteristics().get(Characteristic::Dex))
                .unwrap_or_default();
            (dex, n)
        })
        .collect();
    ranked.sort_by(|a, b| b.cmp(a));
    ranked.into_iter().map(|(_, n)| n.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{DecisionError, MockDecisionPort};
    use crate::test_fixtures::{scripted, sheet, sheet_with, world_with};
    use crate::use_cases::RuleUseCases;
    use tabletale_domain::value_objects::{ActorCheck, EndingCondition};
    use tabletale_domain::{EndingRule, Objective, ObjectiveStatus};

    fn settings(max_rounds: u32) -> RunSettings {
        RunSettings {
            max_rounds,
            end_when_no_hostiles: false,
            minutes_per_round: 0,
        }
    }

    fn runner(world: World, decisions: MockDecisionPort, rolls: Vec<i32>, settings: RunSettings) -> RoundRunner {
        RoundRunner::new(
            world,
            ActionExecutor::new(RuleUseCases::new(scripted(rolls))),
            Arc::new(decisions),
            PauseGate::new(),
            settings,
        )
    }

    #[tokio::test]
    async fn passing_actors_run_to_max_rounds() {
        let world = world_with(&[("ash", (0, 0)), ("bram", (3, 0))]);
        let mut decisions = MockDecisionPort::new();
        decisions.expect_decide().times(4).returning(|_| Ok(Vec::new()));

        let summary = runner(world, decisions, vec![], settings(2)).run().await;
        assert_eq!(summary.stop, StopReason::MaxRounds);
        assert_eq!(summary.rounds, 2);
        assert_eq!(summary.turns.len(), 4);
        // equal DEX: name descending
        assert_eq!(summary.turns[0].actor, "bram");
    }

    fn world_with_dex(actors: &[(&str, i32)]) -> World {
        let mut world = World::new();
        for (i, (name, dex)) in actors.iter().enumerate() {
            world.add_actor(*name, sheet_with(Characteristic::Dex, *dex)).unwrap();
            world.place(name, tabletale_domain::GridPos::new(i as i32, 0)).unwrap();
            world.set_scene(name, "yard").unwrap();
        }
        world
    }

    #[test]
    fn action_order_is_dex_then_name_descending() {
        let mut world = world_with_dex(&[("ash", 40), ("bram", 70), ("cora", 40), ("dell", 55)]);
        world.set_participants(["ash", "bram", "cora", "dell"]);
        assert_eq!(action_order(&world), vec!["bram", "dell", "cora", "ash"]);

        world.apply_damage("dell", 100).unwrap();
        world.apply_damage("dell", 1).unwrap();
        assert!(world.is_dead("dell"));
        assert_eq!(action_order(&world), vec!["bram", "cora", "ash"]);
    }

    #[test]
    fn action_order_keeps_the_dying() {
        let mut world = world_with_dex(&[("ash", 60), ("bram", 50)]);
        world.add_actor("cora", sheet()).unwrap();
        world.apply_damage("ash", 100).unwrap();
        assert!(world.is_dying("ash"));
        assert_eq!(action_order(&world), vec!["ash", "cora", "bram"]);
    }

    #[tokio::test]
    async fn faster_actor_listed_second_acts_first() {
        let mut world = world_with_dex(&[("ash", 40), ("bram", 80)]);
        world.set_participants(["ash", "bram"]);
        let mut decisions = MockDecisionPort::new();
        decisions.expect_decide().times(2).returning(|_| Ok(Vec::new()));

        let summary = runner(world, decisions, vec![], settings(1)).run().await;
        let order: Vec<&str> = summary.turns.iter().map(|t| t.actor.as_str()).collect();
        assert_eq!(order, vec!["bram", "ash"]);
    }

    #[tokio::test]
    async fn prompt_is_scoped_to_the_actor() {
        let world = world_with(&[("ash", (0, 0))]);
        let mut decisions = MockDecisionPort::new();
        decisions
            .expect_decide()
            .withf(|prompt| prompt.actor == "ash" && prompt.view.viewer.as_deref() == Some("ash"))
            .times(1)
            .returning(|_| Ok(Vec::new()));

        runner(world, decisions, vec![], settings(1)).run().await;
    }

    #[tokio::test]
    async fn decision_errors_do_not_stop_the_run() {
        let world = world_with(&[("ash", (0, 0))]);
        let mut decisions = MockDecisionPort::new();
        decisions
            .expect_decide()
            .returning(|_| Err(DecisionError::Unavailable("offline".into())));

        let summary = runner(world, decisions, vec![], settings(2)).run().await;
        assert_eq!(summary.stop, StopReason::MaxRounds);
        assert!(summary.turns.iter().all(|t| t.results.is_empty()));
    }

    #[tokio::test]
    async fn movement_calls_reach_the_world() {
        let world = world_with(&[("ash", (0, 0))]);
        let mut decisions = MockDecisionPort::new();
        decisions
            .expect_decide()
            .returning(|_| Ok(vec![ToolCall::new("advance_position").arg("target", serde_json::json!([2, 0]))]));

        let runner = runner(world, decisions, vec![], settings(1));
        let summary = runner.run().await;
        assert!(summary.turns[0].results[0].ok);
        let world = runner.world();
        let world = world.lock().await;
        assert_eq!(world.position_of("ash"), Some(tabletale_domain::GridPos::new(2, 0)));
    }

    #[tokio::test]
    async fn frozen_ending_stops_the_loop() {
        let mut world = world_with(&[("ash", (0, 0)), ("bram", (1, 0))]);
        world.set_ending_rules(vec![EndingRule {
            id: "standing".into(),
            label: Some("Both still standing".into()),
            outcome: None,
            priority: 0,
            when: EndingCondition::ActorsAlive(ActorCheck {
                names: vec!["ash".into()],
                require: Default::default(),
            }),
        }]);
        let mut decisions = MockDecisionPort::new();
        decisions.expect_decide().times(1).returning(|_| Ok(Vec::new()));

        let summary = runner(world, decisions, vec![], settings(5)).run().await;
        assert_eq!(
            summary.stop,
            StopReason::Ending {
                ending_id: "standing".into()
            }
        );
        assert_eq!(summary.verdict.unwrap().ending_id, "standing");
    }

    #[tokio::test]
    async fn resolved_objectives_stop_the_loop() {
        let mut world = world_with(&[("ash", (0, 0))]);
        let mut gate = Objective::new("gate");
        gate.status = ObjectiveStatus::Done;
        world.add_objective(gate);
        let mut decisions = MockDecisionPort::new();
        decisions.expect_decide().times(1).returning(|_| Ok(Vec::new()));

        let summary = runner(world, decisions, vec![], settings(5)).run().await;
        assert_eq!(summary.stop, StopReason::ObjectivesResolved);
    }

    #[tokio::test]
    async fn no_hostiles_gate_only_when_enabled() {
        let world = world_with(&[("ash", (0, 0)), ("bram", (1, 0))]);
        let mut decisions = MockDecisionPort::new();
        decisions.expect_decide().times(1).returning(|_| Ok(Vec::new()));

        let mut enabled = settings(5);
        enabled.end_when_no_hostiles = true;
        let summary = runner(world, decisions, vec![], enabled).run().await;
        assert_eq!(summary.stop, StopReason::NoHostiles);
    }

    #[tokio::test]
    async fn dying_actor_is_not_asked_but_counts_down() {
        let mut world = world_with(&[("ash", (0, 0)), ("bram", (1, 0))]).with_dying_turns(2);
        world.apply_damage("bram", 100).unwrap();
        let mut decisions = MockDecisionPort::new();
        decisions
            .expect_decide()
            .withf(|prompt| prompt.actor == "ash")
            .returning(|_| Ok(Vec::new()));

        let runner = runner(world, decisions, vec![], settings(3));
        let summary = runner.run().await;
        let bram_turns: Vec<_> = summary.turns.iter().filter(|t| t.actor == "bram").collect();
        assert_eq!(bram_turns.len(), 2);
        assert!(bram_turns[1].end_of_turn.as_ref().unwrap().died);
        assert!(runner.world().lock().await.is_dead("bram"));
    }

    #[tokio::test]
    async fn clock_advances_between_rounds() {
        let world = world_with(&[("ash", (0, 0))]);
        let start = world.time_min();
        let mut decisions = MockDecisionPort::new();
        decisions.expect_decide().returning(|_| Ok(Vec::new()));

        let mut ticking = settings(3);
        ticking.minutes_per_round = 2;
        let runner = runner(world, decisions, vec![], ticking);
        runner.run().await;
        assert_eq!(runner.world().lock().await.time_min(), start + 6);
    }
}

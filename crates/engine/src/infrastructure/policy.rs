//! Built-in heuristic decision-maker.
//!
//! Reads only the scene view it is given. Each turn it picks one of:
//! first aid for an adjacent dying friend, an attack or cast at a hostile
//! already in reach, or a move toward the nearest hostile followed by an
//! attack attempt. With no hostiles in view it passes.

use async_trait::async_trait;

use tabletale_domain::value_objects::HOSTILE_THRESHOLD;
use tabletale_domain::GridPos;
use tabletale_shared::{ActorView, ReachKind, SceneView, ToolCall};

use super::ports::{DecisionError, DecisionPort, TurnPrompt};

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPolicy;

impl HeuristicPolicy {
    pub fn new() -> Self {
        Self
    }

    /// The calls this policy would make for `viewer` given `view`.
    pub fn plan(&self, viewer: &str, view: &SceneView) -> Vec<ToolCall> {
        let Some(me) = view.actor(viewer) else {
            return Vec::new();
        };
        let Some(origin) = me.position else {
            return Vec::new();
        };

        let hostiles: Vec<&ActorView> = view
            .actors
            .iter()
            .filter(|a| a.name != viewer && !a.dead && a.dying_turns_left.is_none())
            .filter(|a| is_hostile(view, viewer, &a.name))
            .collect();

        if let Some(friend) = view.actors.iter().find(|a| {
            a.name != viewer
                && a.dying_turns_left.is_some()
                && !is_hostile(view, viewer, &a.name)
                && a.position.map(|p| p.distance_to(origin)) == Some(1)
        }) {
            return vec![ToolCall::new("first_aid")
                .arg("target", friend.name.clone())
                .arg("reason", "stabilize a fallen ally")];
        }

        if hostiles.is_empty() {
            return Vec::new();
        }

        // Weapons first, then powers, in preview order
        let mut previews: Vec<_> = view.reach.iter().collect();
        previews.sort_by_key(|p| match p.kind {
            ReachKind::Weapon => 0,
            ReachKind::Power => 1,
        });
        for preview in &previews {
            let hit = preview
                .targets
                .iter()
                .find(|t| hostiles.iter().any(|h| h.name == t.name));
            if let Some(target) = hit {
                return vec![strike(preview.kind, &preview.id, &target.name)];
            }
        }

        let Some(nearest) = nearest(origin, &hostiles) else {
            return Vec::new();
        };
        let mut calls = vec![ToolCall::new("advance_position")
            .arg("target", nearest.name.clone())
            .arg("reason", "close the distance")];
        let longest_weapon = view
            .reach
            .iter()
            .filter(|p| p.kind == ReachKind::Weapon)
            .max_by_key(|p| p.range_steps);
        if let Some(weapon) = longest_weapon {
            calls.push(strike(ReachKind::Weapon, &weapon.id, &nearest.name));
        }
        calls
    }
}

#[async_trait]
impl DecisionPort for HeuristicPolicy {
    async fn decide(&self, prompt: TurnPrompt) -> Result<Vec<ToolCall>, DecisionError> {
        let calls = self.plan(&prompt.actor, &prompt.view);
        tracing::debug!(actor = %prompt.actor, round = prompt.round, calls = calls.len(), "Heuristic plan");
        Ok(calls)
    }
}

fn is_hostile(view: &SceneView, a: &str, b: &str) -> bool {
    view.relations.iter().any(|r| {
        ((r.from == a && r.to == b) || (r.from == b && r.to == a)) && r.score <= HOSTILE_THRESHOLD
    })
}

fn nearest<'a>(origin: GridPos, actors: &[&'a ActorView]) -> Option<&'a ActorView> {
    actors
        .iter()
        .filter_map(|a| a.position.map(|p| (origin.distance_to(p), *a)))
        .min_by(|(da, a), (db, b)| da.cmp(db).then_with(|| a.name.cmp(&b.name)))
        .map(|(_, a)| a)
}

fn strike(kind: ReachKind, id: &str, target: &str) -> ToolCall {
    match kind {
        ReachKind::Weapon => ToolCall::new("perform_attack")
            .arg("defender", target)
            .arg("weapon", id),
        ReachKind::Power => ToolCall::new("cast_arts").arg("art", id).arg("target", target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{firebolt, world_with};
    use crate::use_cases::scene_view::visible_snapshot;
    use tabletale_domain::World;

    fn hostile_world(raider_at: (i32, i32)) -> World {
        let mut world = world_with(&[("ash", (0, 0)), ("raider", raider_at)]);
        world.grant("ash", "sword", 1).unwrap();
        world.set_relation("raider", "ash", -50);
        world
    }

    #[test]
    fn attacks_hostile_in_reach() {
        let world = hostile_world((1, 0));
        let calls = HeuristicPolicy::new().plan("ash", &visible_snapshot(&world, Some("ash")));
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool, "perform_attack");
        assert_eq!(calls[0].args["defender"], "raider");
        assert_eq!(calls[0].args["weapon"], "sword");
    }

    #[test]
    fn closes_distance_then_swings() {
        let world = hostile_world((4, 0));
        let calls = HeuristicPolicy::new().plan("ash", &visible_snapshot(&world, Some("ash")));
        let tools: Vec<&str> = calls.iter().map(|c| c.tool.as_str()).collect();
        assert_eq!(tools, vec!["advance_position", "perform_attack"]);
        assert_eq!(calls[0].args["target"], "raider");
    }

    #[test]
    fn casts_when_only_a_power_reaches() {
        let mut world = hostile_world((3, 0));
        world.add_power(firebolt());
        let calls = HeuristicPolicy::new().plan("ash", &visible_snapshot(&world, Some("ash")));
        assert_eq!(calls[0].tool, "cast_arts");
        assert_eq!(calls[0].args["art"], "firebolt");
    }

    #[test]
    fn passes_without_hostiles() {
        let world = world_with(&[("ash", (0, 0)), ("bram", (1, 0))]);
        let calls = HeuristicPolicy::new().plan("ash", &visible_snapshot(&world, Some("ash")));
        assert!(calls.is_empty());
    }

    #[test]
    fn tends_to_dying_ally_first() {
        let mut world = hostile_world((1, 0));
        world.add_actor("bram", crate::test_fixtures::sheet()).unwrap();
        world.place("bram", GridPos::new(0, 1)).unwrap();
        world.set_scene("bram", "yard").unwrap();
        world.apply_damage("bram", 100).unwrap();

        let calls = HeuristicPolicy::new().plan("ash", &visible_snapshot(&world, Some("ash")));
        assert_eq!(calls[0].tool, "first_aid");
        assert_eq!(calls[0].args["target"], "bram");
    }

    #[tokio::test]
    async fn decide_uses_the_prompt_view() {
        let world = hostile_world((1, 0));
        let prompt = TurnPrompt {
            actor: "ash".into(),
            round: 1,
            view: visible_snapshot(&world, Some("ash")),
            rendered: Vec::new(),
        };
        let calls = HeuristicPolicy::new().decide(prompt).await.unwrap();
        assert_eq!(calls.len(), 1);
    }
}

//! Grid movement, named-target resolution and scene transitions.

use serde::Serialize;

use tabletale_domain::{ActionKind, Entrance, GridPos, World};

use super::error::RuleError;
use super::resolution::{ensure_able, ensure_participant};
use super::Narrated;

/// A movement destination as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRef {
    Point(GridPos),
    /// Free text: an "x,y" literal, an entrance, an objective or an actor
    Named(String),
}

impl TargetRef {
    pub fn label(&self) -> String {
        match self {
            TargetRef::Point(pos) => pos.to_string(),
            TargetRef::Named(name) => name.clone(),
        }
    }
}

/// Where a target resolved to and what it matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTarget {
    pub position: GridPos,
    /// "point", "entrance", "objective" or "actor"
    pub matched: &'static str,
}

/// Resolve a destination for `actor`.
///
/// Named targets try, in order: a literal "x,y", an entrance label in the
/// actor's scene, an entrance id leaving that scene, an objective with a
/// position, then another actor's position in the same scene.
pub fn resolve_target(world: &World, actor: &str, target: &TargetRef) -> Option<ResolvedTarget> {
    let name = match target {
        TargetRef::Point(position) => {
            return Some(ResolvedTarget {
                position: *position,
                matched: "point",
            })
        }
        TargetRef::Named(name) => name.trim(),
    };
    if name.is_empty() {
        return None;
    }
    if let Ok(position) = name.parse::<GridPos>() {
        return Some(ResolvedTarget {
            position,
            matched: "point",
        });
    }

    let scene = world.scene_of(actor);
    let graph = world.scene_graph();
    let by_label = scene.and_then(|scene| {
        graph
            .entrances_from(scene)
            .find(|e| e.label.eq_ignore_ascii_case(name))
    });
    let by_id = || {
        graph
            .entrance(name)
            .filter(|e| scene.map_or(true, |scene| e.from_scene == scene))
    };
    if let Some(entrance) = by_label.or_else(by_id) {
        return Some(ResolvedTarget {
            position: entrance.position,
            matched: "entrance",
        });
    }

    if let Some(position) = world.objective(name).and_then(|o| o.position) {
        return Some(ResolvedTarget {
            position,
            matched: "objective",
        });
    }

    if world.has_actor(name) && world.share_scene(actor, name) {
        if let Some(position) = world.position_of(name) {
            return Some(ResolvedTarget {
                position,
                matched: "actor",
            });
        }
    }
    None
}

// =============================================================================
// Advance
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub actor: String,
    pub target: String,
    pub from: GridPos,
    pub position: GridPos,
    pub moved: u32,
    pub reached: bool,
    /// Steps still between the actor and the target
    pub remaining: u32,
    pub move_left: u32,
}

impl Narrated for MoveOutcome {
    fn narration(&self) -> Vec<String> {
        let line = if self.moved == 0 {
            format!("{} stays at {}.", self.actor, self.position)
        } else if self.reached {
            format!(
                "{} moves {} steps and reaches {} at {}.",
                self.actor, self.moved, self.target, self.position
            )
        } else {
            format!(
                "{} moves {} steps toward {} and stops at {} ({} steps short).",
                self.actor, self.moved, self.target, self.position, self.remaining
            )
        };
        vec![line]
    }
}

/// Walk toward a target, spending movement. `steps` defaults to, and is
/// capped by, the movement left this turn.
pub fn advance_position(
    world: &mut World,
    actor: &str,
    target: &TargetRef,
    steps: Option<u32>,
) -> Result<MoveOutcome, RuleError> {
    ensure_participant(world, actor)?;
    ensure_able(world, actor, ActionKind::Move)?;
    let goal = resolve_target(world, actor, target)
        .ok_or_else(|| RuleError::InvalidValue(format!("cannot resolve target '{}'", target.label())))?;

    let (from, position, moved) = step_toward(world, actor, goal.position, steps)?;
    let remaining = position.distance_to(goal.position);
    tracing::debug!(actor = %actor, %from, to = %position, moved, "Advance");

    Ok(MoveOutcome {
        actor: actor.to_string(),
        target: target.label(),
        from,
        position,
        moved,
        reached: remaining == 0,
        remaining,
        move_left: move_left(world, actor),
    })
}

fn move_left(world: &World, actor: &str) -> u32 {
    world.turn_state(actor).map(|t| t.move_left).unwrap_or(0)
}

/// Move up to `steps` (capped by budget) toward `goal`. Returns
/// `(from, to, moved)`.
fn step_toward(
    world: &mut World,
    actor: &str,
    goal: GridPos,
    steps: Option<u32>,
) -> Result<(GridPos, GridPos, u32), RuleError> {
    let from = world
        .position_of(actor)
        .ok_or_else(|| RuleError::InvalidValue(format!("{} has no position", actor)))?;
    let budget = move_left(world, actor);
    let steps = steps.unwrap_or(budget).min(budget);
    if steps == 0 {
        return Ok((from, from, 0));
    }
    let (position, moved) = from.step_toward(goal, steps);
    if moved > 0 {
        world.place(actor, position)?;
        world.consume_movement(actor, moved)?;
    }
    Ok((from, position, moved))
}

// =============================================================================
// Entrances
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum EntranceOutcome {
    Approaching {
        actor: String,
        entrance: String,
        position: GridPos,
        moved: u32,
        remaining: u32,
    },
    Arrived {
        actor: String,
        entrance: String,
        scene: String,
        scene_name: String,
        position: GridPos,
    },
}

impl Narrated for EntranceOutcome {
    fn narration(&self) -> Vec<String> {
        match self {
            EntranceOutcome::Approaching {
                actor,
                entrance,
                remaining,
                ..
            } => vec![format!(
                "{} heads for the {} ({} steps to go).",
                actor, entrance, remaining
            )],
            EntranceOutcome::Arrived {
                actor,
                entrance,
                scene_name,
                position,
                ..
            } => vec![format!(
                "{} passes through the {} into {} at {}.",
                actor, entrance, scene_name, position
            )],
        }
    }
}

/// Walk to an entrance and, once standing on it, cross into its scene.
pub fn use_entrance(world: &mut World, actor: &str, key: &str) -> Result<EntranceOutcome, RuleError> {
    ensure_participant(world, actor)?;
    ensure_able(world, actor, ActionKind::Move)?;
    let entrance = find_entrance(world, actor, key)?;

    let (_, position, moved) = step_toward(world, actor, entrance.position, None)?;
    if position != entrance.position {
        return Ok(EntranceOutcome::Approaching {
            actor: actor.to_string(),
            entrance: entrance.label,
            position,
            moved,
            remaining: position.distance_to(entrance.position),
        });
    }

    let scene_name = world
        .scene_graph()
        .scene(&entrance.to_scene)
        .map(|s| s.name().to_string())
        .unwrap_or_else(|| entrance.to_scene.clone());
    world.set_scene(actor, entrance.to_scene.clone())?;
    world.place(actor, entrance.spawn)?;
    world.set_location(scene_name.clone());
    tracing::info!(actor = %actor, scene = %entrance.to_scene, "Scene change");

    Ok(EntranceOutcome::Arrived {
        actor: actor.to_string(),
        entrance: entrance.label,
        scene: entrance.to_scene,
        scene_name,
        position: entrance.spawn,
    })
}

fn find_entrance(world: &World, actor: &str, key: &str) -> Result<Entrance, RuleError> {
    let key = key.trim();
    let graph = world.scene_graph();
    let scene = world.scene_of(actor);
    let entrance = graph
        .entrance(key)
        .or_else(|| scene.and_then(|scene| graph.entrance_in_scene(scene, key)))
        .ok_or_else(|| RuleError::EntranceNotFound(key.to_string()))?;
    if let Some(scene) = scene {
        if entrance.from_scene != scene {
            return Err(RuleError::WrongScene {
                entrance: entrance.id.clone(),
                scene: scene.to_string(),
            });
        }
    }
    Ok(entrance.clone())
}

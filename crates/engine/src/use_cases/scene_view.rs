//! Scene-scoped projections handed to decision-makers.
//!
//! A view never leaks actors from other scenes: an actor elsewhere is not
//! listed, and a relation is shown only when both ends are present.

use tabletale_domain::value_objects::{RelationTier, StatusDuration};
use tabletale_domain::World;
use tabletale_shared::{
    ActorView, EntranceView, ObjectiveView, ReachKind, ReachPreview, RelationView, SceneView,
    StatusView, TargetInReach,
};

/// Build the view of the world as `viewer` sees it.
///
/// Without a viewer, or for a viewer with no scene, only the scene-free
/// fields (clock, weather, marks, objectives) are filled in.
pub fn visible_snapshot(world: &World, viewer: Option<&str>) -> SceneView {
    let mut view = SceneView {
        viewer: viewer.map(str::to_string),
        version: world.version(),
        time_min: world.time_min(),
        clock: world.clock().to_string(),
        weather: world.weather().to_string(),
        location: world.location().to_string(),
        tension: world.tension(),
        marks: world.marks().map(str::to_string).collect(),
        objectives: world
            .objectives()
            .iter()
            .map(|o| ObjectiveView {
                name: o.name.clone(),
                status: o.status,
                position: o.position,
            })
            .collect(),
        ..Default::default()
    };

    let Some(viewer) = viewer else {
        return view;
    };
    let Some(scene) = world.scene_of(viewer) else {
        return view;
    };

    let present: Vec<&str> = world.actors_in_scene(scene).collect();
    view.scene_id = Some(scene.to_string());
    view.scene_name = world
        .scene_graph()
        .scene(scene)
        .map(|s| s.name().to_string());
    view.actors = present.iter().map(|name| actor_view(world, name)).collect();
    view.relations = world
        .relations()
        .filter(|(from, to, _)| present.contains(from) && present.contains(to))
        .map(|(from, to, score)| RelationView {
            from: from.to_string(),
            to: to.to_string(),
            score,
            tier: RelationTier::from_score(score).as_str().to_string(),
        })
        .collect();

    let origin = world.position_of(viewer);
    view.entrances = world
        .scene_graph()
        .entrances_from(scene)
        .map(|e| EntranceView {
            id: e.id.clone(),
            label: e.label.clone(),
            to_scene: e.to_scene.clone(),
            position: e.position,
            distance: origin.map(|o| o.distance_to(e.position)),
        })
        .collect();
    view.turn = world.turn_state(viewer).cloned();
    view.reach = reach_previews(world, viewer);
    view
}

fn actor_view(world: &World, name: &str) -> ActorView {
    let sheet = world.sheet(name);
    let statuses = world
        .statuses_of(name)
        .map(|table| {
            table
                .iter()
                .map(|entry| StatusView {
                    name: entry.name().to_string(),
                    category: if entry.is_system() { "system" } else { "control" }.to_string(),
                    remaining: match entry.remaining {
                        StatusDuration::Turns(n) => Some(n),
                        StatusDuration::Indefinite => None,
                    },
                    source: entry.source.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    ActorView {
        name: name.to_string(),
        position: world.position_of(name),
        hp: sheet.map(|s| s.hp()).unwrap_or(0),
        max_hp: sheet.map(|s| s.max_hp()).unwrap_or(0),
        mp: sheet.map(|s| s.mp()).unwrap_or(0),
        max_mp: sheet.map(|s| s.max_mp()).unwrap_or(0),
        dying_turns_left: sheet.and_then(|s| s.dying_turns_left()),
        dead: world.is_dead(name),
        participant: world.is_participant(name),
        cover: world.cover_of(name).as_str().to_string(),
        statuses,
        protectors: world.protectors_of(name).to_vec(),
        inventory: world
            .inventory_of(name)
            .map(|inv| inv.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default(),
    }
}

/// For every weapon the viewer holds and every power they may cast, the
/// living actors in the same scene within reach, nearest first.
///
/// An actor with no known-power list may cast anything, so every power is
/// previewed.
pub fn reach_previews(world: &World, viewer: &str) -> Vec<ReachPreview> {
    let mut previews: Vec<ReachPreview> = world
        .weapons()
        .filter(|w| world.count_of(viewer, w.id()) > 0)
        .map(|w| ReachPreview {
            kind: ReachKind::Weapon,
            id: w.id().to_string(),
            label: w.label().to_string(),
            range_steps: w.reach_steps(),
            targets: targets_within(world, viewer, w.reach_steps()),
        })
        .collect();

    let known = world
        .sheet(viewer)
        .map(|s| s.known_powers().to_vec())
        .unwrap_or_default();
    previews.extend(
        world
            .powers()
            .filter(|p| known.is_empty() || known.iter().any(|k| k == p.id()))
            .map(|p| ReachPreview {
                kind: ReachKind::Power,
                id: p.id().to_string(),
                label: p.label().to_string(),
                range_steps: p.range_steps(),
                targets: targets_within(world, viewer, p.range_steps()),
            }),
    );
    previews
}

fn targets_within(world: &World, viewer: &str, range: u32) -> Vec<TargetInReach> {
    let Some(scene) = world.scene_of(viewer) else {
        return Vec::new();
    };
    let mut targets: Vec<TargetInReach> = world
        .actors_in_scene(scene)
        .filter(|name| *name != viewer && !world.is_dead(name))
        .filter_map(|name| {
            world
                .distance(viewer, name)
                .filter(|d| *d <= range)
                .map(|distance| TargetInReach {
                    name: name.to_string(),
                    distance,
                })
        })
        .collect();
    targets.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.name.cmp(&b.name)));
    targets
}

/// Plain-text rendering of a view.
pub fn render_lines(view: &SceneView) -> Vec<String> {
    let mut lines = vec![format!(
        "Time {} | weather {} | location {} | tension {}",
        view.clock, view.weather, view.location, view.tension
    )];
    if let (Some(id), name) = (&view.scene_id, &view.scene_name) {
        lines.push(format!("Scene: {} ({})", name.as_deref().unwrap_or(id), id));
    }
    if !view.marks.is_empty() {
        lines.push(format!("Recent: {}", view.marks.join("; ")));
    }
    for objective in &view.objectives {
        let at = objective
            .position
            .map(|p| format!(" at {}", p))
            .unwrap_or_default();
        lines.push(format!("Objective: {} [{}]{}", objective.name, objective.status, at));
    }

    for actor in &view.actors {
        let mut line = format!("{} HP {}/{} MP {}/{}", actor.name, actor.hp, actor.max_hp, actor.mp, actor.max_mp);
        if let Some(pos) = actor.position {
            line.push_str(&format!(" at {}", pos));
        }
        if actor.dead {
            line.push_str(" [dead]");
        } else if let Some(turns) = actor.dying_turns_left {
            line.push_str(&format!(" [dying, {} turn(s)]", turns));
        }
        let controls: Vec<&str> = actor
            .statuses
            .iter()
            .filter(|s| s.category == "control")
            .map(|s| s.name.as_str())
            .collect();
        if !controls.is_empty() {
            line.push_str(&format!(" [{}]", controls.join(", ")));
        }
        if actor.cover != "none" {
            line.push_str(&format!(" cover {}", actor.cover));
        }
        if !actor.protectors.is_empty() {
            line.push_str(&format!(" guarded by {}", actor.protectors.join(", ")));
        }
        lines.push(line);
    }

    for relation in &view.relations {
        lines.push(format!(
            "{} -> {}: {} ({})",
            relation.from, relation.to, relation.score, relation.tier
        ));
    }
    for entrance in &view.entrances {
        let distance = entrance
            .distance
            .map(|d| format!(", {} steps", d))
            .unwrap_or_default();
        lines.push(format!(
            "Exit '{}' ({}) at {} to {}{}",
            entrance.label, entrance.id, entrance.position, entrance.to_scene, distance
        ));
    }
    if let Some(turn) = &view.turn {
        lines.push(format!(
            "Your turn: action {}, bonus {}, reaction {}, {} steps left",
            available(!turn.action_used),
            available(!turn.bonus_used),
            available(turn.reaction_available),
            turn.move_left
        ));
    }
    for preview in &view.reach {
        let targets: Vec<String> = preview
            .targets
            .iter()
            .map(|t| format!("{} ({})", t.name, t.distance))
            .collect();
        let kind = match preview.kind {
            ReachKind::Weapon => "weapon",
            ReachKind::Power => "power",
        };
        lines.push(format!(
            "{} {} [{}] reach {}: {}",
            kind,
            preview.label,
            preview.id,
            preview.range_steps,
            if targets.is_empty() {
                "nobody".to_string()
            } else {
                targets.join(", ")
            }
        ));
    }
    lines
}

fn available(flag: bool) -> &'static str {
    if flag {
        "ready"
    } else {
        "used"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{firebolt, world_with};

    fn split_world() -> World {
        let mut world = world_with(&[("a", (0, 0)), ("b", (1, 0)), ("c", (3, 0)), ("far", (0, 0))]);
        world.set_scene("far", "cellar").unwrap();
        world.set_relation("a", "b", 20);
        world.set_relation("a", "far", -50);
        world
    }

    #[test]
    fn view_hides_other_scenes() {
        let world = split_world();
        let view = visible_snapshot(&world, Some("a"));
        assert_eq!(view.scene_id.as_deref(), Some("yard"));
        let names: Vec<&str> = view.actors.iter().map(|a| a.name.as_str()).collect();
        assert!(names.contains(&"b"));
        assert!(!names.contains(&"far"));
        assert_eq!(view.relations.len(), 1);
        assert_eq!(view.relations[0].tier, "warm");
    }

    #[test]
    fn viewer_without_scene_gets_an_empty_view() {
        let mut world = split_world();
        world.add_actor("ghost", crate::test_fixtures::sheet()).unwrap();
        let view = visible_snapshot(&world, Some("ghost"));
        assert!(view.is_empty());
        assert!(view.actors.is_empty());
        assert_eq!(view.clock, "08:00");
    }

    #[test]
    fn reach_lists_targets_nearest_first() {
        let mut world = split_world();
        world.grant("a", "spear", 1).unwrap();
        world.add_power(firebolt());
        world.place("c", (0, 1).into()).unwrap();

        let previews = reach_previews(&world, "a");
        let spear = previews.iter().find(|p| p.id == "spear").unwrap();
        let names: Vec<&str> = spear.targets.iter().map(|t| t.name.as_str()).collect();
        // b and c tie at 1; "far" is in another scene
        assert_eq!(names, vec!["b", "c"]);
        assert!(previews.iter().any(|p| p.kind == ReachKind::Power && p.id == "firebolt"));
        assert!(!previews.iter().any(|p| p.id == "sword"));
    }

    #[test]
    fn rendering_mentions_exits_and_turn() {
        let world = split_world();
        let view = visible_snapshot(&world, Some("a"));
        let lines = render_lines(&view);
        assert!(lines[0].starts_with("Time 08:00"));
        assert!(lines.iter().any(|l| l.starts_with("Your turn: action ready")));
        assert!(lines.iter().any(|l| l == "a -> b: 20 (warm)"));
    }
}

//! Story loading from the authoring directory.
//!
//! A story directory holds `story.json` and `characters.json`, plus the
//! optional rules tables `weapons.json` and `powers.json`. Everything is
//! validated while building the [`World`]; the first problem aborts the load.

pub mod schema;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use tabletale_domain::entities::{TimelineEvent, TAG_GUARD_INTERCEPT, TAG_LINE_OF_SIGHT};
use tabletale_domain::value_objects::Characteristics;
use tabletale_domain::{
    CharacterSheet, DamageType, DomainError, Entrance, GameClock, GridPos, Mitigation, Objective, PowerCost,
    PowerDef, Scene, SceneGraph, Timeline, WeaponDef, World,
};

use schema::{
    CharacterSpec, CharactersFile, ObjectiveSpec, PointSpec, PowerSpec, StoryFile, WeaponSpec,
};

pub const STORY_FILE: &str = "story.json";
pub const CHARACTERS_FILE: &str = "characters.json";
pub const WEAPONS_FILE: &str = "weapons.json";
pub const POWERS_FILE: &str = "powers.json";

/// Scene used when a story declares none.
pub const DEFAULT_SCENE: &str = "main";

#[derive(Debug, thiserror::Error)]
pub enum AuthoringError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{file}: {message}")]
    Invalid { file: &'static str, message: String },
    #[error("{file}: {source}")]
    Domain {
        file: &'static str,
        #[source]
        source: DomainError,
    },
}

impl AuthoringError {
    fn invalid(file: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            file,
            message: message.into(),
        }
    }

    fn domain(file: &'static str) -> impl FnOnce(DomainError) -> Self {
        move |source| Self::Domain { file, source }
    }
}

/// A loaded story, ready to run.
#[derive(Debug, Clone)]
pub struct Story {
    pub title: String,
    pub world: World,
}

/// Load every authoring file in `dir` and build the starting world.
pub fn load_story_dir(dir: &Path, dying_turns: u32) -> Result<Story, AuthoringError> {
    let story: StoryFile = read_json(&dir.join(STORY_FILE))?;
    let characters: CharactersFile = read_json(&dir.join(CHARACTERS_FILE))?;
    let weapons: BTreeMap<String, WeaponSpec> = read_optional_json(&dir.join(WEAPONS_FILE))?;
    let powers: BTreeMap<String, PowerSpec> = read_optional_json(&dir.join(POWERS_FILE))?;

    let title = story
        .title
        .clone()
        .unwrap_or_else(|| dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());

    let mut world = build_world(&story, dying_turns)?;
    for (id, spec) in &weapons {
        world.add_weapon(build_weapon(id, spec)?);
    }
    for (id, spec) in &powers {
        world.add_power(build_power(id, spec)?);
    }
    add_characters(&mut world, &characters)?;
    place_actors(&mut world, &story)?;
    apply_narrative(&mut world, &story)?;

    tracing::info!(
        title = %title,
        actors = characters.characters.len(),
        weapons = weapons.len(),
        powers = powers.len(),
        events = world.timeline().pending().len(),
        endings = world.ending_rules().len(),
        "Story loaded"
    );
    Ok(Story { title, world })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AuthoringError> {
    let text = fs::read_to_string(path).map_err(|source| AuthoringError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| AuthoringError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_optional_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, AuthoringError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Optional authoring file absent");
        return Ok(T::default());
    }
    read_json(path)
}

fn point(file: &'static str, what: &str, spec: &PointSpec) -> Result<GridPos, AuthoringError> {
    spec.to_pos()
        .ok_or_else(|| AuthoringError::invalid(file, format!("{}: bad grid point {:?}", what, spec)))
}

// =============================================================================
// story.json
// =============================================================================

fn build_world(story: &StoryFile, dying_turns: u32) -> Result<World, AuthoringError> {
    let start = match &story.time {
        Some(spec) => spec
            .minutes()
            .ok_or_else(|| AuthoringError::invalid(STORY_FILE, format!("bad start time {:?}", spec)))?,
        None => GameClock::default().minutes(),
    };

    let mut graph = SceneGraph::new();
    for spec in &story.scenes {
        let mut scene = Scene::new(&spec.id, &spec.name).map_err(AuthoringError::domain(STORY_FILE))?;
        if let Some(description) = &spec.description {
            scene = scene.with_description(description);
        }
        graph.add_scene(scene);
    }
    for spec in &story.entrances {
        let entrance = Entrance {
            id: spec.id.clone(),
            label: spec.label.clone(),
            from_scene: spec.from_scene.clone(),
            to_scene: spec.to_scene.clone(),
            position: point(STORY_FILE, &spec.id, &spec.position)?,
            spawn: point(STORY_FILE, &spec.id, &spec.spawn)?,
        };
        graph
            .add_entrance(entrance)
            .map_err(AuthoringError::domain(STORY_FILE))?;
    }

    let mut events = Vec::with_capacity(story.events.len());
    for spec in &story.events {
        let at_min = spec.at.minutes().ok_or_else(|| {
            AuthoringError::invalid(STORY_FILE, format!("event '{}': bad time {:?}", spec.name, spec.at))
        })?;
        events.push(TimelineEvent {
            name: spec.name.clone(),
            at_min,
            note: spec.note.clone(),
            effects: spec.effects.clone(),
        });
    }

    Ok(World::new()
        .with_dying_turns(dying_turns)
        .with_clock(GameClock::from_minutes(start))
        .with_scene_graph(graph)
        .with_timeline(Timeline::new(events)))
}

fn place_actors(world: &mut World, story: &StoryFile) -> Result<(), AuthoringError> {
    let fallback_scene = story
        .scenes
        .first()
        .map(|s| s.id.clone())
        .unwrap_or_else(|| DEFAULT_SCENE.to_string());

    for (name, spec) in &story.placements {
        if !world.has_actor(name) {
            return Err(AuthoringError::invalid(
                STORY_FILE,
                format!("placement for unknown actor '{}'", name),
            ));
        }
        let scene = spec.scene.clone().unwrap_or_else(|| fallback_scene.clone());
        if !story.scenes.is_empty() && world.scene_graph().scene(&scene).is_none() {
            return Err(AuthoringError::invalid(
                STORY_FILE,
                format!("'{}' starts in unknown scene '{}'", name, scene),
            ));
        }
        let pos = point(STORY_FILE, name, &spec.position)?;
        world.place(name, pos).map_err(AuthoringError::domain(STORY_FILE))?;
        world.set_scene(name, scene).map_err(AuthoringError::domain(STORY_FILE))?;
        if let Some(cover) = spec.cover {
            world.set_cover(name, cover).map_err(AuthoringError::domain(STORY_FILE))?;
        }
    }
    Ok(())
}

fn apply_narrative(world: &mut World, story: &StoryFile) -> Result<(), AuthoringError> {
    let participants: Vec<String> = match &story.participants {
        Some(names) => {
            if let Some(unknown) = names.iter().find(|n| !world.has_actor(n)) {
                return Err(AuthoringError::invalid(
                    STORY_FILE,
                    format!("unknown participant '{}'", unknown),
                ));
            }
            names.clone()
        }
        None => story.placements.keys().cloned().collect(),
    };
    world.set_participants(participants);

    for spec in &story.objectives {
        let objective = match spec {
            ObjectiveSpec::Name(name) => Objective::new(name),
            ObjectiveSpec::Full {
                name,
                position,
                status,
            } => {
                let mut objective = Objective::new(name);
                if let Some(p) = position {
                    objective.position = Some(point(STORY_FILE, name, p)?);
                }
                objective.status = status.unwrap_or_default();
                objective
            }
        };
        world.add_objective(objective);
    }

    let location = story
        .location
        .clone()
        .or_else(|| story.scenes.first().map(|s| s.name.clone()));
    if let Some(location) = location {
        world.set_location(location);
    }
    if let Some(weather) = &story.weather {
        world.set_weather(weather.clone());
    }
    if let Some(tension) = story.tension {
        world.set_tension(tension);
    }
    for mark in &story.marks {
        world.add_mark(mark.clone());
    }
    world.set_ending_rules(story.endings.clone());
    Ok(())
}

// =============================================================================
// characters.json
// =============================================================================

fn add_characters(world: &mut World, file: &CharactersFile) -> Result<(), AuthoringError> {
    for (name, spec) in &file.characters {
        for power in &spec.powers {
            if world.power(power).is_none() {
                return Err(AuthoringError::invalid(
                    CHARACTERS_FILE,
                    format!("'{}' knows undefined power '{}'", name, power),
                ));
            }
        }
        world
            .add_actor(name.clone(), build_sheet(spec))
            .map_err(AuthoringError::domain(CHARACTERS_FILE))?;
        for (item, count) in &spec.inventory {
            if *count > 0 {
                world
                    .grant(name, item, *count)
                    .map_err(AuthoringError::domain(CHARACTERS_FILE))?;
            }
        }
    }

    for (from, row) in &file.relations {
        for (to, score) in row {
            if !world.has_actor(from) || !world.has_actor(to) {
                tracing::warn!(from = %from, to = %to, "Relation names an unknown actor, skipping");
                continue;
            }
            world.set_relation(from, to, *score);
        }
    }
    Ok(())
}

fn build_sheet(spec: &CharacterSpec) -> CharacterSheet {
    let characteristics = spec
        .characteristics
        .iter()
        .fold(Characteristics::new(), |block, (c, v)| block.with(*c, *v));
    let mut sheet = CharacterSheet::from_characteristics(characteristics);

    for (skill, value) in &spec.skills {
        sheet = sheet.with_skill(skill.clone(), *value);
    }
    if let Some(hp) = spec.hp {
        let max = sheet.max_hp();
        sheet = sheet.with_hp(hp, max);
    }
    if let Some(mp) = spec.mp {
        let max = sheet.max_mp();
        sheet = sheet.with_mp(mp, max);
    }
    if let Some(speed) = spec.move_speed {
        sheet = sheet.with_move_speed(speed);
    }
    sheet = sheet.with_mitigation(Mitigation {
        physical_armor: spec.physical_armor,
        arts_barrier: spec.arts_barrier,
    });
    if let Some(resist) = spec.arts_resist {
        sheet = sheet.with_arts_resist(resist);
    }
    for power in &spec.powers {
        sheet = sheet.with_known_power(power.clone());
    }
    sheet
}

// =============================================================================
// weapons.json / powers.json
// =============================================================================

fn damage_type(label: Option<&str>, fallback: DamageType) -> DamageType {
    label.map(DamageType::from_label).unwrap_or(fallback)
}

fn build_weapon(id: &str, spec: &WeaponSpec) -> Result<WeaponDef, AuthoringError> {
    WeaponDef::new(
        id,
        &spec.label,
        spec.reach_steps,
        &spec.skill,
        &spec.defense_skill,
        &spec.damage,
        damage_type(spec.damage_type.as_deref(), DamageType::Physical),
    )
    .map_err(AuthoringError::domain(WEAPONS_FILE))
}

const TAG_ALLOW_GUARD_INTERCEPT: &str = "allow-guard-intercept";

/// The rule tag `tag` was probably meant to be, when it is not an exact match.
fn near_miss_tag(tag: &str) -> Option<&'static str> {
    if [TAG_GUARD_INTERCEPT, TAG_ALLOW_GUARD_INTERCEPT, TAG_LINE_OF_SIGHT].contains(&tag) {
        return None;
    }
    let normalized = tag.trim().to_ascii_lowercase().replace(['_', ' '], "-");
    let normalized = normalized.strip_prefix("allow-").unwrap_or(&normalized);
    [TAG_GUARD_INTERCEPT, TAG_LINE_OF_SIGHT]
        .into_iter()
        .find(|known| normalized == *known)
}

fn build_power(id: &str, spec: &PowerSpec) -> Result<PowerDef, AuthoringError> {
    let domain = AuthoringError::domain;
    let mut power = PowerDef::new(
        id,
        &spec.label,
        &spec.cast_skill,
        &spec.resist,
        spec.range_steps,
        damage_type(spec.damage_type.as_deref(), DamageType::Arts),
    )
    .map_err(domain(POWERS_FILE))?;

    if let Some(mp) = &spec.mp {
        let cost = if mp.variable {
            PowerCost::Variable {
                min: mp.cost,
                max: mp.max.filter(|m| *m > 0),
            }
        } else {
            PowerCost::Fixed { cost: mp.cost }
        };
        power = power.with_cost(cost).map_err(domain(POWERS_FILE))?;
    }
    if let Some(damage) = &spec.damage {
        power = power.with_damage(damage).map_err(domain(POWERS_FILE))?;
    }
    if let Some(heal) = &spec.heal {
        power = power.with_heal(heal).map_err(domain(POWERS_FILE))?;
    }
    if let Some(control) = &spec.control {
        let duration = control
            .duration
            .as_ref()
            .map(|d| d.source())
            .unwrap_or_else(|| "1".to_string());
        power = power
            .with_control(control.effect.as_str(), &duration)
            .map_err(domain(POWERS_FILE))?;
    }
    for tag in &spec.tags {
        if let Some(known) = near_miss_tag(tag) {
            tracing::warn!(power = %id, tag = %tag, expected = %known, "Power tag looks misspelled and will be ignored");
        }
    }
    power = power.with_tags(spec.tags.iter().cloned());
    if let Some(description) = &spec.description {
        power = power.with_description(description);
    }
    Ok(power)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletale_domain::{Cover, ObjectiveStatus};

    const STORY: &str = r#"{
        "title": "Ambush at the Ford",
        "weather": "rain",
        "time": "21:30",
        "tension": 2,
        "scenes": [
            {"id": "ford", "name": "River Ford"},
            {"id": "mill", "name": "Old Mill"}
        ],
        "entrances": [
            {"id": "mill_door", "label": "Mill door", "from_scene": "ford", "to_scene": "mill",
             "position": [4, 0], "spawn": {"x": 0, "y": 1}}
        ],
        "placements": {
            "ash": {"position": [0, 0], "cover": "half"},
            "raider": {"scene": "ford", "position": "3,0"}
        },
        "objectives": ["hold_the_ford", {"name": "reach_mill", "position": [4, 0]}],
        "events": [
            {"name": "reinforcements", "at": "22:00", "effects": [{"type": "tension", "delta": 1}]}
        ],
        "endings": [
            {"id": "held", "label": "The ford holds", "outcome": "success", "priority": 5,
             "when": {"actors_dead": {"names": ["raider"]}}}
        ]
    }"#;

    const CHARACTERS: &str = r#"{
        "characters": {
            "ash": {
                "characteristics": {"STR": 60, "CON": 60, "DEX": 55, "POW": 70},
                "skills": {"Fighting": 65},
                "physical_armor": 1,
                "powers": ["ember"],
                "inventory": {"bandage": 2}
            },
            "raider": {"characteristics": {"STR": 55, "CON": 50}, "hp": 4}
        },
        "relations": {"raider": {"ash": -60}, "ghost": {"ash": 10}}
    }"#;

    const WEAPONS: &str = r#"{
        "spear": {"label": "Spear", "reach_steps": 2, "skill": "Fighting",
                  "defense_skill": "Dodge", "damage": "1d8+1"}
    }"#;

    const POWERS: &str = r#"{
        "ember": {"label": "Ember", "cast_skill": "Arts_Control", "resist": "Arts_Resist",
                  "range_steps": 4, "mp": {"cost": 2, "variable": true, "max": 6},
                  "damage": "1d6+INT_10", "control": {"effect": "burning", "duration": 2},
                  "tags": ["guard-intercept"]}
    }"#;

    fn story_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            fs::write(dir.path().join(name), body).unwrap();
        }
        dir
    }

    fn full_dir() -> tempfile::TempDir {
        story_dir(&[
            (STORY_FILE, STORY),
            (CHARACTERS_FILE, CHARACTERS),
            (WEAPONS_FILE, WEAPONS),
            (POWERS_FILE, POWERS),
        ])
    }

    #[test]
    fn loads_a_complete_story() {
        let dir = full_dir();
        let story = load_story_dir(dir.path(), 3).unwrap();
        let world = &story.world;

        assert_eq!(story.title, "Ambush at the Ford");
        assert_eq!(world.clock().to_string(), "21:30");
        assert_eq!(world.tension(), 2);
        assert_eq!(world.weather(), "rain");
        assert_eq!(world.location(), "River Ford");

        assert_eq!(world.position_of("raider"), Some(GridPos::new(3, 0)));
        assert_eq!(world.scene_of("ash"), Some("ford"));
        assert_eq!(world.cover_of("ash"), Cover::Half);
        assert_eq!(world.participants(), &["ash".to_string(), "raider".to_string()]);

        assert_eq!(world.sheet("raider").unwrap().hp(), 4);
        assert_eq!(world.sheet("ash").unwrap().skill_value("Fighting"), 65);
        assert_eq!(world.sheet("ash").unwrap().mitigation().physical_armor, 1);
        assert_eq!(world.count_of("ash", "bandage"), 2);
        assert_eq!(world.relation("raider", "ash"), -60);

        assert_eq!(world.weapon("spear").unwrap().reach_steps(), 2);
        let ember = world.power("ember").unwrap();
        assert!(ember.allows_guard_intercept());
        assert_eq!(
            ember.cost(),
            PowerCost::Variable {
                min: 2,
                max: Some(6)
            }
        );

        assert_eq!(world.objective("reach_mill").unwrap().position, Some(GridPos::new(4, 0)));
        assert_eq!(world.objective("hold_the_ford").unwrap().status, ObjectiveStatus::Pending);
        assert_eq!(world.timeline().pending().len(), 1);
        assert_eq!(world.ending_rules()[0].id, "held");
        assert!(world.scene_graph().entrance("mill_door").is_some());
    }

    #[test]
    fn rules_tables_are_optional() {
        let characters = r#"{"characters": {"ash": {}}}"#;
        let story = r#"{"placements": {"ash": {"position": [0, 0]}}}"#;
        let dir = story_dir(&[(STORY_FILE, story), (CHARACTERS_FILE, characters)]);

        let loaded = load_story_dir(dir.path(), 3).unwrap();
        assert_eq!(loaded.world.scene_of("ash"), Some(DEFAULT_SCENE));
        assert_eq!(loaded.world.weapons().count(), 0);
    }

    #[test]
    fn missing_story_file_is_an_io_error() {
        let dir = story_dir(&[(CHARACTERS_FILE, CHARACTERS)]);
        let err = load_story_dir(dir.path(), 3).unwrap_err();
        assert!(matches!(err, AuthoringError::Io { .. }));
    }

    #[test]
    fn unknown_power_key_is_rejected() {
        let powers = r#"{"ember": {"label": "Ember", "cast_skill": "Arts_Control",
                          "resist": "Arts_Resist", "dammage": "1d6"}}"#;
        let dir = story_dir(&[(STORY_FILE, STORY), (CHARACTERS_FILE, CHARACTERS), (POWERS_FILE, powers)]);
        let err = load_story_dir(dir.path(), 3).unwrap_err();
        assert!(matches!(err, AuthoringError::Json { .. }));
        assert!(err.to_string().contains("dammage"));
    }

    #[test]
    fn placement_for_stranger_is_invalid() {
        let story = r#"{"placements": {"nobody": {"position": [0, 0]}}}"#;
        let dir = story_dir(&[(STORY_FILE, story), (CHARACTERS_FILE, r#"{"characters": {}}"#)]);
        let err = load_story_dir(dir.path(), 3).unwrap_err();
        assert!(matches!(err, AuthoringError::Invalid { file: STORY_FILE, .. }));
    }

    #[test]
    fn entrance_to_unknown_scene_is_a_domain_error() {
        let story = r#"{
            "scenes": [{"id": "ford", "name": "Ford"}],
            "entrances": [{"id": "d", "label": "Door", "from_scene": "ford", "to_scene": "void",
                           "position": [1, 1], "spawn": [0, 0]}]
        }"#;
        let dir = story_dir(&[(STORY_FILE, story), (CHARACTERS_FILE, r#"{}"#)]);
        let err = load_story_dir(dir.path(), 3).unwrap_err();
        assert!(matches!(err, AuthoringError::Domain { .. }));
    }

    #[test]
    fn misspelled_rule_tags_are_flagged() {
        assert_eq!(near_miss_tag("guard_intercept"), Some(TAG_GUARD_INTERCEPT));
        assert_eq!(near_miss_tag("Line Of Sight"), Some(TAG_LINE_OF_SIGHT));
        assert_eq!(near_miss_tag("guard-intercept"), None);
        assert_eq!(near_miss_tag("allow-guard-intercept"), None);
        assert_eq!(near_miss_tag("allow_guard_intercept"), Some(TAG_GUARD_INTERCEPT));
        assert_eq!(near_miss_tag("support"), None);
    }
}

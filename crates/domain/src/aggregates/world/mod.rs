//! World aggregate - the single authoritative store for one run
//!
//! # Rustic DDD Design
//!
//! - **Private fields**: every map is encapsulated; reads go through
//!   accessors and writes through methods that uphold the invariants.
//! - **Version counter**: every mutator bumps `version`, so a cached view
//!   built at version N is stale as soon as the counter moves.
//! - **No RNG, no I/O**: rolls happen in the engine and arrive here as
//!   plain numbers.
//!
//! The `impl World` blocks are split by concern:
//! - [`actors`]: roster, positions, scenes, cover, inventory, relations
//! - [`life`]: damage, healing, the dying countdown and first aid
//! - [`turns`]: per-round resources, statuses and action blocking
//! - [`guards`]: protection links
//! - [`progression`]: mana and the exposure track

mod actors;
mod guards;
mod life;
mod progression;
mod turns;

use std::collections::{BTreeMap, VecDeque};

use crate::entities::{
    order_by_priority, CharacterSheet, EndingRule, EndingVerdict, PowerDef, SceneGraph, Timeline,
    WeaponDef, DEFAULT_DYING_TURNS,
};
use crate::game_time::{GameClock, DEFAULT_START_MINUTES};
use crate::value_objects::{Cover, GridPos, Objective, ObjectiveStatus, StatusTable, TurnState};

/// Marks kept before the oldest is dropped.
pub const MARKS_KEPT: usize = 10;

/// Highest narrative tension.
pub const MAX_TENSION: u8 = 5;

/// Tension a fresh world starts at.
pub const DEFAULT_TENSION: u8 = 1;

/// The root aggregate of a run.
///
/// # Invariants
///
/// - `version` increases on every mutation
/// - `tension` stays within `0..=MAX_TENSION`
/// - at most `MARKS_KEPT` marks are held
/// - participants and each protector list hold no duplicates
/// - relation scores stay within `-100..=100`
/// - once `verdict` is set it never changes
#[derive(Debug, Clone)]
pub struct World {
    version: u64,

    // Narrative state
    clock: GameClock,
    weather: String,
    location: String,
    tension: u8,
    marks: VecDeque<String>,

    // Per-actor state, keyed by actor name
    sheets: BTreeMap<String, CharacterSheet>,
    positions: BTreeMap<String, GridPos>,
    scene_of: BTreeMap<String, String>,
    inventories: BTreeMap<String, BTreeMap<String, u32>>,
    turns: BTreeMap<String, TurnState>,
    statuses: BTreeMap<String, StatusTable>,
    cover: BTreeMap<String, Cover>,
    /// Directed `(from, to)` scores
    relations: BTreeMap<(String, String), i32>,
    /// Protectee -> protectors in registration order
    guards: BTreeMap<String, Vec<String>>,

    participants: Vec<String>,
    objectives: Vec<Objective>,

    // Static tables
    weapons: BTreeMap<String, WeaponDef>,
    powers: BTreeMap<String, PowerDef>,
    scenes: SceneGraph,
    timeline: Timeline,
    ending_rules: Vec<EndingRule>,

    verdict: Option<EndingVerdict>,
    dying_turns: u32,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    // =========================================================================
    // Constructor
    // =========================================================================

    pub fn new() -> Self {
        Self {
            version: 0,
            clock: GameClock::from_minutes(DEFAULT_START_MINUTES),
            weather: "clear".to_string(),
            location: String::new(),
            tension: DEFAULT_TENSION,
            marks: VecDeque::new(),
            sheets: BTreeMap::new(),
            positions: BTreeMap::new(),
            scene_of: BTreeMap::new(),
            inventories: BTreeMap::new(),
            turns: BTreeMap::new(),
            statuses: BTreeMap::new(),
            cover: BTreeMap::new(),
            relations: BTreeMap::new(),
            guards: BTreeMap::new(),
            participants: Vec::new(),
            objectives: Vec::new(),
            weapons: BTreeMap::new(),
            powers: BTreeMap::new(),
            scenes: SceneGraph::new(),
            timeline: Timeline::default(),
            ending_rules: Vec::new(),
            verdict: None,
            dying_turns: DEFAULT_DYING_TURNS,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    pub fn with_dying_turns(mut self, turns: u32) -> Self {
        self.dying_turns = turns.max(1);
        self
    }

    pub fn with_clock(mut self, clock: GameClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_scene_graph(mut self, scenes: SceneGraph) -> Self {
        self.scenes = scenes;
        self
    }

    pub fn with_timeline(mut self, timeline: Timeline) -> Self {
        self.timeline = timeline;
        self
    }

    // =========================================================================
    // Version
    // =========================================================================

    /// Mark the aggregate as changed.
    pub fn touch(&mut self) {
        self.version += 1;
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    // =========================================================================
    // Narrative State
    // =========================================================================

    #[inline]
    pub fn clock(&self) -> GameClock {
        self.clock
    }

    #[inline]
    pub fn time_min(&self) -> u32 {
        self.clock.minutes()
    }

    /// Move the clock forward. Returns the new time in minutes.
    pub fn advance_clock(&mut self, minutes: u32) -> u32 {
        self.clock = self.clock.advanced(minutes);
        self.touch();
        self.clock.minutes()
    }

    #[inline]
    pub fn weather(&self) -> &str {
        &self.weather
    }

    pub fn set_weather(&mut self, weather: impl Into<String>) {
        self.weather = weather.into();
        self.touch();
    }

    #[inline]
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
        self.touch();
    }

    #[inline]
    pub fn tension(&self) -> u8 {
        self.tension
    }

    /// Set tension, clamped to `0..=MAX_TENSION`.
    pub fn set_tension(&mut self, tension: i32) -> u8 {
        self.tension = tension.clamp(0, i32::from(MAX_TENSION)) as u8;
        self.touch();
        self.tension
    }

    pub fn adjust_tension(&mut self, delta: i32) -> u8 {
        self.set_tension(i32::from(self.tension) + delta)
    }

    pub fn marks(&self) -> impl Iterator<Item = &str> {
        self.marks.iter().map(String::as_str)
    }

    /// Record a narrative mark. Blank marks are ignored; only the latest
    /// `MARKS_KEPT` are held.
    pub fn add_mark(&mut self, mark: impl Into<String>) {
        let mark = mark.into();
        let mark = mark.trim();
        if mark.is_empty() {
            return;
        }
        self.marks.push_back(mark.to_string());
        while self.marks.len() > MARKS_KEPT {
            self.marks.pop_front();
        }
        self.touch();
    }

    // =========================================================================
    // Participants
    // =========================================================================

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    /// Replace the participant list, dropping duplicates but keeping order.
    pub fn set_participants<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !list.contains(&name) {
                list.push(name);
            }
        }
        self.participants = list;
        self.touch();
    }

    /// An empty participant list lets everyone act.
    pub fn is_participant(&self, name: &str) -> bool {
        self.participants.is_empty() || self.participants.iter().any(|p| p == name)
    }

    // =========================================================================
    // Objectives
    // =========================================================================

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    pub fn objective(&self, name: &str) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.name == name)
    }

    /// Register an objective. An existing objective of the same name keeps
    /// its status and takes the new position if one is given.
    pub fn add_objective(&mut self, objective: Objective) {
        match self.objectives.iter_mut().find(|o| o.name == objective.name) {
            Some(existing) => {
                if objective.position.is_some() {
                    existing.position = objective.position;
                }
            }
            None => self.objectives.push(objective),
        }
        self.touch();
    }

    /// Set an objective's status, registering it first if unknown.
    pub fn set_objective_status(&mut self, name: &str, status: ObjectiveStatus) {
        match self.objectives.iter_mut().find(|o| o.name == name) {
            Some(existing) => existing.status = status,
            None => {
                let mut objective = Objective::new(name);
                objective.status = status;
                self.objectives.push(objective);
            }
        }
        self.touch();
    }

    /// True when at least one objective exists and none is pending.
    pub fn all_objectives_resolved(&self) -> bool {
        !self.objectives.is_empty() && self.objectives.iter().all(|o| o.status.is_resolved())
    }

    // =========================================================================
    // Static Tables
    // =========================================================================

    pub fn add_weapon(&mut self, weapon: WeaponDef) {
        self.weapons.insert(weapon.id().to_string(), weapon);
        self.touch();
    }

    pub fn weapon(&self, id: &str) -> Option<&WeaponDef> {
        self.weapons.get(id)
    }

    pub fn weapons(&self) -> impl Iterator<Item = &WeaponDef> {
        self.weapons.values()
    }

    pub fn add_power(&mut self, power: PowerDef) {
        self.powers.insert(power.id().to_string(), power);
        self.touch();
    }

    pub fn power(&self, id: &str) -> Option<&PowerDef> {
        self.powers.get(id)
    }

    pub fn powers(&self) -> impl Iterator<Item = &PowerDef> {
        self.powers.values()
    }

    #[inline]
    pub fn scene_graph(&self) -> &SceneGraph {
        &self.scenes
    }

    #[inline]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut Timeline {
        self.touch();
        &mut self.timeline
    }

    // =========================================================================
    // Endings
    // =========================================================================

    /// Ending rules in evaluation order.
    pub fn ending_rules(&self) -> &[EndingRule] {
        &self.ending_rules
    }

    /// Replace the rule set and clear any verdict.
    pub fn set_ending_rules(&mut self, mut rules: Vec<EndingRule>) {
        order_by_priority(&mut rules);
        self.ending_rules = rules;
        self.verdict = None;
        self.touch();
    }

    pub fn verdict(&self) -> Option<&EndingVerdict> {
        self.verdict.as_ref()
    }

    /// Freeze the verdict. Returns `false` if one was already frozen.
    pub fn freeze_verdict(&mut self, verdict: EndingVerdict) -> bool {
        if self.verdict.is_some() {
            return false;
        }
        self.verdict = Some(verdict);
        self.touch();
        true
    }

    #[inline]
    pub fn dying_turns(&self) -> u32 {
        self.dying_turns
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mutation_bumps_version() {
        let mut world = World::new();
        let v0 = world.version();
        world.add_mark("bell rang");
        world.adjust_tension(1);
        world.set_location("Supply Yard");
        assert_eq!(world.version(), v0 + 3);
    }

    #[test]
    fn tension_is_clamped() {
        let mut world = World::new();
        assert_eq!(world.tension(), DEFAULT_TENSION);
        assert_eq!(world.adjust_tension(10), MAX_TENSION);
        assert_eq!(world.adjust_tension(-20), 0);
    }

    #[test]
    fn only_latest_marks_are_kept() {
        let mut world = World::new();
        for i in 0..12 {
            world.add_mark(format!("m{}", i));
        }
        world.add_mark("   ");
        let marks: Vec<&str> = world.marks().collect();
        assert_eq!(marks.len(), MARKS_KEPT);
        assert_eq!(marks[0], "m2");
        assert_eq!(marks[9], "m11");
    }

    #[test]
    fn participants_dedupe_and_empty_means_everyone() {
        let mut world = World::new();
        assert!(world.is_participant("anyone"));
        world.set_participants(["Amiya", "Kal'tsit", "Amiya"]);
        assert_eq!(world.participants().len(), 2);
        assert!(!world.is_participant("Mephisto"));
    }

    #[test]
    fn unknown_objective_is_registered_on_status_change() {
        let mut world = World::new();
        world.add_objective(Objective::new("escape"));
        world.set_objective_status("rescue", ObjectiveStatus::Blocked);
        assert_eq!(world.objectives().len(), 2);
        assert!(!world.all_objectives_resolved());
        world.set_objective_status("escape", ObjectiveStatus::Done);
        assert!(world.all_objectives_resolved());
    }

    #[test]
    fn verdict_freezes_once() {
        let mut world = World::new();
        let verdict = |id: &str| EndingVerdict {
            ending_id: id.into(),
            label: id.into(),
            outcome: None,
            reasons: vec![],
            time_min: 480,
        };
        assert!(world.freeze_verdict(verdict("first")));
        assert!(!world.freeze_verdict(verdict("second")));
        assert_eq!(world.verdict().unwrap().ending_id, "first");
    }
}

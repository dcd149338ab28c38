//! Tool calls and the validation gate.
//!
//! A decision-maker proposes loosely-typed [`ToolCall`]s. Before any rule
//! runs, [`gate`] turns one into a typed [`Action`]:
//!
//! 1. implicit actor injected and `target` aliases mapped per tool
//! 2. required fields present and non-empty
//! 3. numeric fields coerced to non-negative integers ("3" is accepted)
//! 4. movement targets normalized and resolved, failing closed
//! 5. participant policy applied
//! 6. derived fields the engine computes itself are dropped
//!
//! Nothing in the world changes here.

use serde_json::{Map, Value};

use tabletale_domain::value_objects::{Severity, StageChoice};
use tabletale_domain::{DiceFormula, GridPos, PowerCost, World};
use tabletale_shared::{ErrorCode, ToolCall};

use crate::use_cases::movement::{resolve_target, TargetRef};
use crate::use_cases::ExposureSource;

// =============================================================================
// Tool Table
// =============================================================================

/// Which actors a tool's participant check looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantPolicy {
    None,
    /// Only the acting actor
    Source,
    /// Every actor field
    Both,
}

/// Static description of one tool's arguments.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub required: &'static [&'static str],
    /// Fields naming actors, source first
    pub actor_keys: &'static [&'static str],
    pub non_negative: &'static [&'static str],
    pub participants: ParticipantPolicy,
    /// Field that `target` is copied into when absent
    pub target_alias: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    PerformAttack,
    AdvancePosition,
    UseEntrance,
    AdjustRelation,
    TransferItem,
    SetProtection,
    ClearProtection,
    FirstAid,
    CastArts,
    ApplyExposure,
    AdvanceInfectionStage,
    GetInfectionState,
}

impl ToolKind {
    pub const ALL: [ToolKind; 12] = [
        ToolKind::PerformAttack,
        ToolKind::AdvancePosition,
        ToolKind::UseEntrance,
        ToolKind::AdjustRelation,
        ToolKind::TransferItem,
        ToolKind::SetProtection,
        ToolKind::ClearProtection,
        ToolKind::FirstAid,
        ToolKind::CastArts,
        ToolKind::ApplyExposure,
        ToolKind::AdvanceInfectionStage,
        ToolKind::GetInfectionState,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::PerformAttack => "perform_attack",
            ToolKind::AdvancePosition => "advance_position",
            ToolKind::UseEntrance => "use_entrance",
            ToolKind::AdjustRelation => "adjust_relation",
            ToolKind::TransferItem => "transfer_item",
            ToolKind::SetProtection => "set_protection",
            ToolKind::ClearProtection => "clear_protection",
            ToolKind::FirstAid => "first_aid",
            ToolKind::CastArts => "cast_arts",
            ToolKind::ApplyExposure => "apply_exposure",
            ToolKind::AdvanceInfectionStage => "advance_infection_stage",
            ToolKind::GetInfectionState => "get_infection_state",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn spec(&self) -> ToolSpec {
        use ParticipantPolicy::{Both, Source};
        match self {
            ToolKind::PerformAttack => ToolSpec {
                required: &["attacker", "defender", "weapon"],
                actor_keys: &["attacker", "defender"],
                non_negative: &[],
                participants: Both,
                target_alias: Some("defender"),
            },
            ToolKind::AdvancePosition => ToolSpec {
                required: &["name", "target"],
                actor_keys: &["name"],
                non_negative: &["steps"],
                participants: Source,
                target_alias: None,
            },
            ToolKind::UseEntrance => ToolSpec {
                required: &["name", "entrance"],
                actor_keys: &["name"],
                non_negative: &[],
                participants: Source,
                target_alias: Some("entrance"),
            },
            ToolKind::AdjustRelation => ToolSpec {
                required: &["a", "b", "value"],
                actor_keys: &["a", "b"],
                non_negative: &[],
                participants: Source,
                target_alias: Some("b"),
            },
            ToolKind::TransferItem => ToolSpec {
                required: &["from", "to", "item"],
                actor_keys: &["from", "to"],
                non_negative: &["count"],
                participants: Source,
                target_alias: Some("to"),
            },
            ToolKind::SetProtection => ToolSpec {
                required: &["guardian", "protectee"],
                actor_keys: &["guardian", "protectee"],
                non_negative: &[],
                participants: Both,
                target_alias: Some("protectee"),
            },
            ToolKind::ClearProtection => ToolSpec {
                required: &[],
                actor_keys: &["guardian", "protectee"],
                non_negative: &[],
                participants: ParticipantPolicy::None,
                target_alias: Some("protectee"),
            },
            ToolKind::FirstAid => ToolSpec {
                required: &["name", "target"],
                actor_keys: &["name", "target"],
                non_negative: &[],
                participants: Both,
                target_alias: None,
            },
            ToolKind::CastArts => ToolSpec {
                required: &["attacker", "art"],
                actor_keys: &["attacker", "target"],
                non_negative: &["mp"],
                participants: Both,
                target_alias: None,
            },
            ToolKind::ApplyExposure => ToolSpec {
                required: &["name"],
                actor_keys: &["name"],
                non_negative: &["bonus"],
                participants: Source,
                target_alias: None,
            },
            ToolKind::AdvanceInfectionStage => ToolSpec {
                required: &["name"],
                actor_keys: &["name"],
                non_negative: &[],
                participants: ParticipantPolicy::None,
                target_alias: None,
            },
            ToolKind::GetInfectionState => ToolSpec {
                required: &["name"],
                actor_keys: &["name"],
                non_negative: &[],
                participants: ParticipantPolicy::None,
                target_alias: None,
            },
        }
    }

    /// Reads never change the world and stay available after the run ends.
    pub fn is_read_only(&self) -> bool {
        matches!(self, ToolKind::GetInfectionState)
    }
}

// =============================================================================
// Typed Actions
// =============================================================================

/// A validated, strongly-typed action ready for the rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Attack {
        attacker: String,
        defender: String,
        weapon: String,
        reason: Option<String>,
    },
    Advance {
        actor: String,
        target: TargetRef,
        steps: Option<u32>,
    },
    UseEntrance {
        actor: String,
        entrance: String,
    },
    AdjustRelation {
        from: String,
        to: String,
        delta: i32,
        reason: Option<String>,
    },
    TransferItem {
        from: String,
        to: String,
        item: String,
        count: u32,
    },
    SetProtection {
        guardian: String,
        protectee: String,
    },
    ClearProtection {
        guardian: Option<String>,
        protectee: Option<String>,
    },
    FirstAid {
        rescuer: String,
        target: String,
    },
    Cast {
        caster: String,
        power: String,
        target: Option<String>,
        spend: Option<u32>,
    },
    ApplyExposure {
        actor: String,
        source: ExposureSource,
        bonus: i32,
    },
    AdvanceStage {
        actor: String,
        choice: StageChoice,
    },
    ExposureState {
        actor: String,
    },
}

impl Action {
    pub fn kind(&self) -> ToolKind {
        match self {
            Action::Attack { .. } => ToolKind::PerformAttack,
            Action::Advance { .. } => ToolKind::AdvancePosition,
            Action::UseEntrance { .. } => ToolKind::UseEntrance,
            Action::AdjustRelation { .. } => ToolKind::AdjustRelation,
            Action::TransferItem { .. } => ToolKind::TransferItem,
            Action::SetProtection { .. } => ToolKind::SetProtection,
            Action::ClearProtection { .. } => ToolKind::ClearProtection,
            Action::FirstAid { .. } => ToolKind::FirstAid,
            Action::Cast { .. } => ToolKind::CastArts,
            Action::ApplyExposure { .. } => ToolKind::ApplyExposure,
            Action::AdvanceStage { .. } => ToolKind::AdvanceInfectionStage,
            Action::ExposureState { .. } => ToolKind::GetInfectionState,
        }
    }

    /// The actor performing the action, when there is one.
    pub fn source(&self) -> Option<&str> {
        match self {
            Action::Attack { attacker, .. } => Some(attacker),
            Action::Advance { actor, .. }
            | Action::UseEntrance { actor, .. }
            | Action::ApplyExposure { actor, .. }
            | Action::AdvanceStage { actor, .. }
            | Action::ExposureState { actor } => Some(actor),
            Action::AdjustRelation { from, .. } | Action::TransferItem { from, .. } => Some(from),
            Action::SetProtection { guardian, .. } => Some(guardian),
            Action::ClearProtection { guardian, .. } => guardian.as_deref(),
            Action::FirstAid { rescuer, .. } => Some(rescuer),
            Action::Cast { caster, .. } => Some(caster),
        }
    }
}

// =============================================================================
// Gate Errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Missing field: {0}")]
    MissingField(String),
    #[error("Field {0} must be a non-negative integer")]
    NotNonNegative(String),
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
    #[error("{field}={name} is not a participant")]
    NotParticipant { field: String, name: String },
    #[error("{actor} cannot act during {turn}'s turn")]
    OutOfTurn { actor: String, turn: String },
}

impl GateError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GateError::UnknownTool(_) => ErrorCode::UnknownTool,
            GateError::MissingField(_) => ErrorCode::MissingField,
            GateError::NotNonNegative(_) | GateError::InvalidValue { .. } => {
                ErrorCode::InvalidValue
            }
            GateError::NotParticipant { .. } | GateError::OutOfTurn { .. } => {
                ErrorCode::NotParticipant
            }
        }
    }

    fn invalid(field: &str, message: impl Into<String>) -> Self {
        GateError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// =============================================================================
// The Gate
// =============================================================================

/// Validate and normalize a proposed call.
///
/// `turn_actor` is the actor whose turn it is. It fills the implicit source
/// field, and a call naming a different source is rejected.
pub fn gate(world: &World, call: &ToolCall, turn_actor: Option<&str>) -> Result<Action, GateError> {
    let kind = ToolKind::from_name(&call.tool)
        .ok_or_else(|| GateError::UnknownTool(call.tool.clone()))?;
    let spec = kind.spec();
    let mut args = normalize_aliases(&spec, &call.args, turn_actor);

    for key in spec.required {
        if is_blank(args.get(*key)) {
            return Err(GateError::MissingField((*key).to_string()));
        }
    }

    let mut numbers = std::collections::BTreeMap::new();
    for key in spec.non_negative {
        if let Some(value) = args.get(*key).filter(|v| !v.is_null()) {
            let n = coerce_non_negative(value).ok_or_else(|| GateError::NotNonNegative((*key).to_string()))?;
            numbers.insert(*key, n);
        }
    }

    // Actor fields become plain strings
    for key in spec.actor_keys {
        if let Some(value) = args.get(*key).cloned() {
            if !value.is_null() {
                args.insert((*key).to_string(), Value::String(text_of(&value)));
            }
        }
    }

    if !kind.is_read_only() {
        if let (Some(turn), Some(source)) = (turn_actor, spec.actor_keys.first().and_then(|k| str_arg(&args, k))) {
            if source != turn {
                return Err(GateError::OutOfTurn {
                    actor: source,
                    turn: turn.to_string(),
                });
            }
        }
    }

    check_participants(world, &spec, &args)?;

    let action = build_action(world, kind, &args, &numbers)?;
    tracing::debug!(tool = kind.name(), source = ?action.source(), "Tool call accepted");
    Ok(action)
}

/// Inject the implicit actor and map `target` onto the tool's own field.
fn normalize_aliases(spec: &ToolSpec, args: &Map<String, Value>, turn_actor: Option<&str>) -> Map<String, Value> {
    let mut args = args.clone();
    if let (Some(source_key), Some(actor)) = (spec.actor_keys.first(), turn_actor) {
        if is_blank(args.get(*source_key)) {
            args.insert((*source_key).to_string(), Value::String(actor.to_string()));
        }
    }
    if let Some(field) = spec.target_alias {
        if let Some(target) = args.remove("target") {
            if is_blank(args.get(field)) {
                args.insert(field.to_string(), target);
            }
        }
    }
    args
}

fn check_participants(world: &World, spec: &ToolSpec, args: &Map<String, Value>) -> Result<(), GateError> {
    if world.participants().is_empty() {
        return Ok(());
    }
    let keys: &[&str] = match spec.participants {
        ParticipantPolicy::None => &[],
        ParticipantPolicy::Source => spec.actor_keys.get(..1).unwrap_or(&[]),
        ParticipantPolicy::Both => spec.actor_keys,
    };
    for key in keys {
        if let Some(name) = str_arg(args, key) {
            if !world.is_participant(&name) {
                tracing::warn!(field = *key, name = %name, "Tool call names a non-participant");
                return Err(GateError::NotParticipant {
                    field: (*key).to_string(),
                    name,
                });
            }
        }
    }
    Ok(())
}

fn build_action(
    world: &World,
    kind: ToolKind,
    args: &Map<String, Value>,
    numbers: &std::collections::BTreeMap<&str, u32>,
) -> Result<Action, GateError> {
    let required = |key: &str| str_arg(args, key).ok_or_else(|| GateError::MissingField(key.to_string()));
    let reason = str_arg(args, "reason");

    let action = match kind {
        ToolKind::PerformAttack => Action::Attack {
            attacker: required("attacker")?,
            defender: required("defender")?,
            weapon: required("weapon")?,
            reason,
        },
        ToolKind::AdvancePosition => {
            let actor = required("name")?;
            let target = movement_target(world, &actor, args.get("target"))?;
            let budget = world.turn_state(&actor).map(|t| t.move_left).unwrap_or(0);
            let steps = numbers.get("steps").copied().filter(|s| {
                if *s > budget {
                    tracing::debug!(actor = %actor, steps = *s, budget, "Dropping steps beyond movement budget");
                    false
                } else {
                    true
                }
            });
            Action::Advance { actor, target, steps }
        }
        ToolKind::UseEntrance => Action::UseEntrance {
            actor: required("name")?,
            entrance: required("entrance")?,
        },
        ToolKind::AdjustRelation => {
            let delta = args
                .get("value")
                .and_then(coerce_int)
                .ok_or_else(|| GateError::invalid("value", "must be an integer"))?;
            Action::AdjustRelation {
                from: required("a")?,
                to: required("b")?,
                delta,
                reason,
            }
        }
        ToolKind::TransferItem => Action::TransferItem {
            from: required("from")?,
            to: required("to")?,
            item: required("item")?,
            count: numbers.get("count").copied().unwrap_or(1),
        },
        ToolKind::SetProtection => Action::SetProtection {
            guardian: required("guardian")?,
            protectee: required("protectee")?,
        },
        ToolKind::ClearProtection => Action::ClearProtection {
            guardian: str_arg(args, "guardian"),
            protectee: str_arg(args, "protectee"),
        },
        ToolKind::FirstAid => Action::FirstAid {
            rescuer: required("name")?,
            target: required("target")?,
        },
        ToolKind::CastArts => {
            let power = required("art")?;
            let spend = match world.power(&power).map(|p| p.cost()) {
                Some(PowerCost::Variable { .. }) => numbers.get("mp").copied(),
                _ => {
                    if numbers.contains_key("mp") {
                        tracing::debug!(power = %power, "Dropping caller spend for fixed-cost power");
                    }
                    None
                }
            };
            Action::Cast {
                caster: required("attacker")?,
                power,
                target: str_arg(args, "target"),
                spend,
            }
        }
        ToolKind::ApplyExposure => Action::ApplyExposure {
            actor: required("name")?,
            source: exposure_source(args)?,
            bonus: numbers
                .get("bonus")
                .map(|b| i32::try_from(*b).unwrap_or(i32::MAX))
                .unwrap_or(0),
        },
        ToolKind::AdvanceInfectionStage => {
            let choice = match str_arg(args, "choice") {
                Some(text) => text
                    .parse::<StageChoice>()
                    .map_err(|e| GateError::invalid("choice", e.to_string()))?,
                None => StageChoice::default(),
            };
            Action::AdvanceStage {
                actor: required("name")?,
                choice,
            }
        }
        ToolKind::GetInfectionState => Action::ExposureState {
            actor: required("name")?,
        },
    };
    Ok(action)
}

/// Accepts `[x, y]`, `{"x": .., "y": ..}` or a name. Names must resolve.
fn movement_target(world: &World, actor: &str, value: Option<&Value>) -> Result<TargetRef, GateError> {
    let value = value.ok_or_else(|| GateError::MissingField("target".to_string()))?;
    let target = match value {
        Value::Array(items) if items.len() >= 2 => {
            let x = items.first().and_then(coerce_int);
            let y = items.get(1).and_then(coerce_int);
            match (x, y) {
                (Some(x), Some(y)) => TargetRef::Point(GridPos::new(x, y)),
                _ => return Err(GateError::invalid("target", "coordinates must be integers, e.g. [1, 1]")),
            }
        }
        Value::Object(map) => match (map.get("x").and_then(coerce_int), map.get("y").and_then(coerce_int)) {
            (Some(x), Some(y)) => TargetRef::Point(GridPos::new(x, y)),
            _ => return Err(GateError::invalid("target", "object targets need integer x and y")),
        },
        Value::String(name) => TargetRef::Named(name.trim().to_string()),
        _ => return Err(GateError::invalid("target", "use [x, y] or a named point")),
    };
    if resolve_target(world, actor, &target).is_none() {
        return Err(GateError::invalid(
            "target",
            format!("cannot resolve '{}'; use [x, y], an entrance, an objective or an actor", target.label()),
        ));
    }
    Ok(target)
}

fn exposure_source(args: &Map<String, Value>) -> Result<ExposureSource, GateError> {
    if let Some(dice) = str_arg(args, "dice") {
        let formula = DiceFormula::parse(&dice).map_err(|e| GateError::invalid("dice", e.to_string()))?;
        return Ok(ExposureSource::Dice(formula));
    }
    let severity = match str_arg(args, "severity") {
        Some(text) => text
            .parse::<Severity>()
            .map_err(|e| GateError::invalid("severity", e.to_string()))?,
        None => Severity::default(),
    };
    Ok(ExposureSource::Severity(severity))
}

// =============================================================================
// Value Coercion
// =============================================================================

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn str_arg(args: &Map<String, Value>, key: &str) -> Option<String> {
    let value = args.get(key)?;
    if is_blank(Some(value)) {
        return None;
    }
    Some(text_of(value))
}

/// Integers, integral floats and numeric strings.
fn coerce_int(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

fn coerce_non_negative(value: &Value) -> Option<u32> {
    coerce_int(value).and_then(|n| u32::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{firebolt, world_with};
    use serde_json::json;
    use tabletale_domain::value_objects::Characteristics;
    use tabletale_domain::{CharacterSheet, Objective, PowerDef, DamageType};

    fn call(tool: &str, args: Value) -> ToolCall {
        let args = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        ToolCall { tool: tool.to_string(), args }
    }

    fn arena() -> World {
        let mut world = world_with(&[("ash", (0, 0)), ("bram", (1, 0)), ("cole", (3, 3))]);
        world.add_power(firebolt());
        world
    }

    mod aliases {
        use super::*;

        #[test]
        fn implicit_attacker_and_target_alias() {
            let world = arena();
            let action = gate(
                &world,
                &call("perform_attack", json!({"target": "bram", "weapon": "sword"})),
                Some("ash"),
            )
            .unwrap();
            assert_eq!(
                action,
                Action::Attack {
                    attacker: "ash".into(),
                    defender: "bram".into(),
                    weapon: "sword".into(),
                    reason: None
                }
            );
        }

        #[test]
        fn explicit_field_wins_over_alias() {
            let world = arena();
            let action = gate(
                &world,
                &call("set_protection", json!({"protectee": "bram", "target": "cole"})),
                Some("ash"),
            )
            .unwrap();
            assert_eq!(
                action,
                Action::SetProtection {
                    guardian: "ash".into(),
                    protectee: "bram".into()
                }
            );
        }

        #[test]
        fn unknown_tool_is_rejected() {
            let world = arena();
            let err = gate(&world, &call("summon_dragon", json!({})), Some("ash")).unwrap_err();
            assert_eq!(err.code(), ErrorCode::UnknownTool);
        }
    }

    mod fields {
        use super::*;

        #[test]
        fn missing_required_field() {
            let world = arena();
            let err = gate(&world, &call("perform_attack", json!({"defender": "bram"})), Some("ash")).unwrap_err();
            assert_eq!(err, GateError::MissingField("weapon".into()));
        }

        #[test]
        fn numeric_strings_are_coerced() {
            let world = arena();
            let action = gate(
                &world,
                &call("transfer_item", json!({"to": "bram", "item": "bandage", "count": "2"})),
                Some("ash"),
            )
            .unwrap();
            assert!(matches!(action, Action::TransferItem { count: 2, .. }));
        }

        #[test]
        fn negative_counts_are_rejected() {
            let world = arena();
            let err = gate(
                &world,
                &call("transfer_item", json!({"to": "bram", "item": "bandage", "count": -1})),
                Some("ash"),
            )
            .unwrap_err();
            assert_eq!(err, GateError::NotNonNegative("count".into()));
            assert_eq!(err.code(), ErrorCode::InvalidValue);
        }

        #[test]
        fn relation_delta_may_be_negative() {
            let world = arena();
            let action = gate(&world, &call("adjust_relation", json!({"target": "bram", "value": "-15"})), Some("ash"))
                .unwrap();
            assert!(matches!(action, Action::AdjustRelation { delta: -15, .. }));
        }
    }

    mod movement {
        use super::*;

        #[test]
        fn coordinate_pair_target() {
            let world = arena();
            let action = gate(&world, &call("advance_position", json!({"target": [2, 0]})), Some("ash")).unwrap();
            assert_eq!(
                action,
                Action::Advance {
                    actor: "ash".into(),
                    target: TargetRef::Point(GridPos::new(2, 0)),
                    steps: None
                }
            );
        }

        #[test]
        fn named_objective_target_resolves() {
            let mut world = arena();
            let mut well = Objective::new("well");
            well.position = Some(GridPos::new(2, 2));
            world.add_objective(well);
            let action = gate(&world, &call("advance_position", json!({"target": "well", "steps": 1})), Some("ash"))
                .unwrap();
            assert!(matches!(action, Action::Advance { steps: Some(1), .. }));
        }

        #[test]
        fn unresolvable_name_fails_closed() {
            let world = arena();
            let err = gate(&world, &call("advance_position", json!({"target": "moon"})), Some("ash")).unwrap_err();
            assert!(matches!(err, GateError::InvalidValue { ref field, .. } if field == "target"));
        }

        #[test]
        fn steps_beyond_budget_are_dropped() {
            let world = arena();
            let action = gate(&world, &call("advance_position", json!({"target": [9, 9], "steps": 99})), Some("ash"))
                .unwrap();
            assert!(matches!(action, Action::Advance { steps: None, .. }));
        }
    }

    mod casting {
        use super::*;

        #[test]
        fn fixed_cost_spend_is_dropped() {
            let world = arena();
            let action = gate(
                &world,
                &call("cast_arts", json!({"art": "firebolt", "target": "bram", "mp": 50})),
                Some("ash"),
            )
            .unwrap();
            assert!(matches!(action, Action::Cast { spend: None, .. }));
        }

        #[test]
        fn variable_cost_spend_is_kept() {
            let mut world = arena();
            let surge = PowerDef::new("surge", "Surge", "Arts_Control", "Arts_Resist", 3, DamageType::Arts)
                .unwrap()
                .with_cost(PowerCost::Variable { min: 1, max: None })
                .unwrap();
            world.add_power(surge);
            let action = gate(&world, &call("cast_arts", json!({"art": "surge", "target": "bram", "mp": "3"})), Some("ash"))
                .unwrap();
            assert!(matches!(action, Action::Cast { spend: Some(3), .. }));
        }
    }

    mod participants {
        use super::*;

        #[test]
        fn non_participant_target_is_rejected() {
            let mut world = arena();
            world
                .add_actor("drifter", CharacterSheet::from_characteristics(Characteristics::new()))
                .unwrap();
            world.set_participants(["ash", "bram"]);
            let err = gate(
                &world,
                &call("perform_attack", json!({"defender": "drifter", "weapon": "sword"})),
                Some("ash"),
            )
            .unwrap_err();
            assert_eq!(err.code(), ErrorCode::NotParticipant);
        }

        #[test]
        fn acting_for_someone_else_is_rejected() {
            let world = arena();
            let err = gate(
                &world,
                &call("perform_attack", json!({"attacker": "bram", "defender": "ash", "weapon": "sword"})),
                Some("ash"),
            )
            .unwrap_err();
            assert!(matches!(err, GateError::OutOfTurn { .. }));
        }

        #[test]
        fn reads_are_allowed_for_anyone() {
            let world = arena();
            let action = gate(&world, &call("get_infection_state", json!({"name": "cole"})), Some("ash")).unwrap();
            assert_eq!(action, Action::ExposureState { actor: "cole".into() });
        }
    }
}

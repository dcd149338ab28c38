//! Protection links.

use serde::Serialize;

use tabletale_domain::{ActionKind, World};

use crate::use_cases::error::RuleError;
use crate::use_cases::resolution::{ensure_able, ensure_actor, ensure_participant};
use crate::use_cases::Narrated;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardOutcome {
    pub guardian: String,
    pub protectee: String,
    /// `false` when the link already existed
    pub added: bool,
}

impl Narrated for GuardOutcome {
    fn narration(&self) -> Vec<String> {
        if self.added {
            vec![format!("{} takes up a guard over {}.", self.guardian, self.protectee)]
        } else {
            vec![format!("{} is already guarding {}.", self.guardian, self.protectee)]
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearGuardOutcome {
    pub guardian: Option<String>,
    pub protectee: Option<String>,
    pub removed: usize,
}

impl Narrated for ClearGuardOutcome {
    fn narration(&self) -> Vec<String> {
        let scope = match (&self.guardian, &self.protectee) {
            (Some(g), Some(p)) => format!("{} stops guarding {}", g, p),
            (Some(g), None) => format!("{} drops every guard", g),
            (None, Some(p)) => format!("No one guards {} any longer", p),
            (None, None) => "All guards stand down".to_string(),
        };
        vec![format!("{} ({} link(s) removed).", scope, self.removed)]
    }
}

/// Register `guardian` as a protector of `protectee`.
pub fn set_guard(world: &mut World, guardian: &str, protectee: &str) -> Result<GuardOutcome, RuleError> {
    ensure_participant(world, guardian)?;
    ensure_participant(world, protectee)?;
    ensure_able(world, guardian, ActionKind::Guard)?;
    if guardian == protectee {
        return Err(RuleError::InvalidValue(format!("{} cannot guard themselves", guardian)));
    }
    let added = world.add_guard(guardian, protectee)?;
    if added {
        tracing::info!(guardian = %guardian, protectee = %protectee, "Guard set");
    }
    Ok(GuardOutcome {
        guardian: guardian.to_string(),
        protectee: protectee.to_string(),
        added,
    })
}

/// Remove links: everything, all of a protectee's, all of a guardian's, or
/// one pair.
pub fn clear_guard(
    world: &mut World,
    guardian: Option<&str>,
    protectee: Option<&str>,
) -> Result<ClearGuardOutcome, RuleError> {
    for name in guardian.into_iter().chain(protectee) {
        ensure_actor(world, name)?;
    }
    let removed = world.clear_guards(guardian, protectee);
    tracing::debug!(?guardian, ?protectee, removed, "Guards cleared");
    Ok(ClearGuardOutcome {
        guardian: guardian.map(str::to_string),
        protectee: protectee.map(str::to_string),
        removed,
    })
}

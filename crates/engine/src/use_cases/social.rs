//! Relations and item hand-offs between actors.

use serde::Serialize;

use tabletale_domain::value_objects::RelationTier;
use tabletale_domain::World;

use super::error::RuleError;
use super::resolution::{ensure_actor, ensure_participant};
use super::Narrated;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationChange {
    pub from: String,
    pub to: String,
    pub before: i32,
    pub after: i32,
    pub tier: String,
    pub reason: Option<String>,
}

impl Narrated for RelationChange {
    fn narration(&self) -> Vec<String> {
        let mut line = format!(
            "{}'s regard for {} moves {} -> {} ({}).",
            self.from, self.to, self.before, self.after, self.tier
        );
        if let Some(reason) = &self.reason {
            line.push_str(&format!(" {}", reason));
        }
        vec![line]
    }
}

/// Shift the directed relation `from -> to` by `delta`, clamped to ±100.
pub fn adjust_relation(
    world: &mut World,
    from: &str,
    to: &str,
    delta: i32,
    reason: Option<&str>,
) -> Result<RelationChange, RuleError> {
    ensure_participant(world, from)?;
    ensure_actor(world, to)?;
    if from == to {
        return Err(RuleError::InvalidValue(format!(
            "{} cannot change a relation with themselves",
            from
        )));
    }
    let before = world.relation(from, to);
    let after = world.change_relation(from, to, delta);
    tracing::info!(from = %from, to = %to, before, after, "Relation changed");
    Ok(RelationChange {
        from: from.to_string(),
        to: to.to_string(),
        before,
        after,
        tier: RelationTier::from_score(after).as_str().to_string(),
        reason: reason.map(str::to_string),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub item: String,
    pub count: u32,
    pub from_left: u32,
    pub to_total: u32,
}

impl Narrated for Transfer {
    fn narration(&self) -> Vec<String> {
        vec![format!(
            "{} hands {} x{} to {}.",
            self.from, self.item, self.count, self.to
        )]
    }
}

/// Move `count` of `item` from one inventory to another. Nothing moves
/// when the giver holds fewer than `count`.
pub fn transfer_item(
    world: &mut World,
    from: &str,
    to: &str,
    item: &str,
    count: u32,
) -> Result<Transfer, RuleError> {
    ensure_participant(world, from)?;
    ensure_actor(world, to)?;
    if count == 0 {
        return Err(RuleError::InvalidValue("count must be positive".to_string()));
    }
    let held = world.count_of(from, item);
    if held < count {
        return Err(RuleError::ItemMissing {
            actor: from.to_string(),
            item: item.to_string(),
            count,
        });
    }
    let from_left = world.take(from, item, count)?;
    let to_total = world.grant(to, item, count)?;
    tracing::info!(from = %from, to = %to, item = %item, count, "Item transferred");
    Ok(Transfer {
        from: from.to_string(),
        to: to.to_string(),
        item: item.to_string(),
        count,
        from_left,
        to_total,
    })
}

//! Shared builders for rule tests.
//!
//! Every actor gets the same baseline sheet (all characteristics 50, so
//! 10 HP, 10 MP, 5 steps of movement) unless a test swaps it out.

use std::sync::Arc;

use tabletale_domain::value_objects::{Characteristic, Characteristics};
use tabletale_domain::{CharacterSheet, DamageType, GridPos, PowerCost, PowerDef, WeaponDef, World};

use crate::infrastructure::ports::RandomPort;
use crate::infrastructure::random::ScriptedRandom;

pub fn sheet() -> CharacterSheet {
    CharacterSheet::from_characteristics(Characteristics::new())
}

pub fn sheet_with(characteristic: Characteristic, value: i32) -> CharacterSheet {
    CharacterSheet::from_characteristics(Characteristics::new().with(characteristic, value))
}

/// Actors placed in scene "yard", everyone a participant, turns reset.
pub fn world_with(actors: &[(&str, (i32, i32))]) -> World {
    let mut world = World::new();
    for (name, pos) in actors {
        world.add_actor(*name, sheet()).unwrap();
        world.place(name, GridPos::from(*pos)).unwrap();
        world.set_scene(name, "yard").unwrap();
        world.reset_turn(name).unwrap();
    }
    world.add_weapon(sword());
    world.add_weapon(spear());
    world
}

/// Reach 1, 1d6 physical
pub fn sword() -> WeaponDef {
    WeaponDef::new("sword", "Sword", 1, "Fighting_Blade", "Dodge", "1d6", DamageType::Physical)
        .unwrap()
}

/// Reach 2, 1d8+1 physical
pub fn spear() -> WeaponDef {
    WeaponDef::new(
        "spear",
        "Spear",
        2,
        "Fighting_Polearm",
        "Dodge",
        "1d8+1",
        DamageType::Physical,
    )
    .unwrap()
}

/// Range 3, fixed cost 4, 1d6 arts damage
pub fn firebolt() -> PowerDef {
    PowerDef::new("firebolt", "Firebolt", "Arts_Offense", "Arts_Resist", 3, DamageType::Arts)
        .unwrap()
        .with_cost(PowerCost::Fixed { cost: 4 })
        .unwrap()
        .with_damage("1d6")
        .unwrap()
}

pub fn scripted(values: impl IntoIterator<Item = i32>) -> Arc<dyn RandomPort> {
    Arc::new(ScriptedRandom::new(values))
}

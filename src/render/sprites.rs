//! Sprite lookup chains: which image (if any) stands for a tile, enemy, NPC or
//! map object, and what to paint when nothing is loaded.

use crate::state::{Enemy, Npc, Secret};
use std::collections::HashSet;

/// Anything that can tell whether a sprite is ready to draw.
pub trait SpriteSource {
    fn has(&self, key: &str) -> bool;
}

impl SpriteSource for HashSet<String> {
    fn has(&self, key: &str) -> bool {
        self.contains(key)
    }
}

impl SpriteSource for HashSet<&str> {
    fn has(&self, key: &str) -> bool {
        self.contains(key)
    }
}

pub const GRASS_UNDERLAY: &str = "#228b22";

/// How a single map tile is painted.
#[derive(Clone, Debug, PartialEq)]
pub enum TileStyle<'a> {
    /// Grass fill with an optional sprite on top (mountain edges, stone doors).
    Underlaid { sprite: Option<&'a str> },
    Sprite(&'a str),
    Void,
    Herb,
    Lava,
    Street,
    Flat(&'static str),
}

fn alias(kind: &str) -> &str {
    match kind {
        "sign" => "signpost",
        "road" | "path" => "street",
        other => other,
    }
}

pub fn flat_colour(kind: &str) -> &'static str {
    if kind.contains("floor") {
        "#444"
    } else if kind.contains("wall") {
        "#888"
    } else {
        match kind {
            "door" => "#852",
            "grass" => "#282",
            "water" => "#22d",
            "rock" => "#555",
            "tree" => "#0f0",
            _ => "#a0a",
        }
    }
}

pub fn tile_style<'a>(kind: &'a str, sprites: &impl SpriteSource) -> TileStyle<'a> {
    if kind.starts_with("mtn_") || kind == "door_stone" {
        return TileStyle::Underlaid {
            sprite: sprites.has(kind).then_some(kind),
        };
    }
    let key = alias(kind);
    if sprites.has(key) {
        return TileStyle::Sprite(key);
    }
    if kind.contains("wall") && sprites.has("wall") {
        return TileStyle::Sprite("wall");
    }
    match key {
        "void" => TileStyle::Void,
        "herb" => TileStyle::Herb,
        "lava" => TileStyle::Lava,
        "street" => TileStyle::Street,
        _ => TileStyle::Flat(flat_colour(kind)),
    }
}

const ENEMY_SPRITES: &[(&str, &str)] = &[
    ("bear", "bear"),
    ("guardian", "fire_guardian"),
    ("wolf", "wolf"),
    ("cinder", "cinder_hound"),
    ("sentinel", "obsidian_sentinel"),
    ("bat", "sulfur_bat"),
    ("weaver", "magma_weaver"),
    ("knife", "knife_goblin"),
    ("goblin", "goblin_scout"),
];

/// How an enemy is painted.
#[derive(Clone, Debug, PartialEq)]
pub enum EnemyLook {
    Sprite(&'static str),
    Square(&'static str),
}

/// Preferred sprite key for an enemy name, before availability is checked.
pub fn enemy_sprite_key(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    ENEMY_SPRITES
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, key)| *key)
}

pub fn enemy_look(enemy: &Enemy, sprites: &impl SpriteSource) -> EnemyLook {
    if let Some(key) = enemy_sprite_key(&enemy.name).filter(|k| sprites.has(k)) {
        return EnemyLook::Sprite(key);
    }
    if sprites.has("skeleton") {
        return EnemyLook::Sprite("skeleton");
    }
    let lower = enemy.name.to_lowercase();
    if lower.contains("goblin") {
        EnemyLook::Square("green")
    } else if lower.contains("giant") {
        EnemyLook::Square("blue")
    } else {
        EnemyLook::Square("red")
    }
}

/// Sprite key an NPC's `asset` file name maps to.
pub fn npc_asset_key(npc: &Npc) -> Option<&str> {
    npc.asset
        .as_deref()
        .map(|a| a.strip_suffix(".png").unwrap_or(a))
        .filter(|a| !a.is_empty())
}

/// `None` means "draw the blue placeholder".
pub fn npc_sprite<'a>(npc: &'a Npc, sprites: &impl SpriteSource) -> Option<&'a str> {
    match npc_asset_key(npc) {
        Some(key) if sprites.has(key) => Some(key),
        _ => sprites.has("player").then_some("player"),
    }
}

pub fn secret_sprite_key(secret: &Secret) -> &'static str {
    let is_chest = secret
        .obj_type
        .as_deref()
        .is_some_and(|t| t.eq_ignore_ascii_case("chest"))
        || secret.name.to_lowercase().contains("chest");
    if is_chest { "chest" } else { "crate" }
}

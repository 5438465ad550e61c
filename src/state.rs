//! Game state payload as served by `GET /api/state`.
//!
//! The server has gone through several shapes over time, so everything here is
//! parsed leniently: missing sections fall back to empty, ids may be strings or
//! numbers, and inventory entries may still arrive as legacy `[name, slot]`
//! pairs.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

fn nullable<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

// --- Identifiers & coordinates ----------------------------------------------

/// Server-side identifier. Sent back verbatim as a string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Text(String),
        }
        Ok(match Raw::deserialize(d)? {
            Raw::Int(n) => EntityId(n.to_string()),
            Raw::Float(f) => EntityId(f.to_string()),
            Raw::Text(s) => EntityId(s),
        })
    }
}

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId(s.to_string())
    }
}

/// World coordinate, serialized as `[x, y, z]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl From<[i32; 3]> for Position {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Position> for [i32; 3] {
    fn from(p: Position) -> Self {
        [p.x, p.y, p.z]
    }
}

impl Position {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The `"x,y,z"` key used by the visible-map mapping.
    pub fn tile_key(&self) -> String {
        format!("{},{},{}", self.x, self.y, self.z)
    }

    pub fn parse_tile_key(key: &str) -> Option<Self> {
        let mut parts = key.split(',');
        let x = parts.next()?.trim().parse().ok()?;
        let y = parts.next()?.trim().parse().ok()?;
        let z = parts.next()?.trim().parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { x, y, z })
    }

    pub fn same_level(&self, other: &Position) -> bool {
        self.z == other.z
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z,
        }
    }
}

// --- Visible map --------------------------------------------------------------

/// Tiles the player has seen, keyed by position. Built from the raw
/// `{"x,y,z": tile_type}` object; malformed keys are dropped.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "HashMap<String, String>")]
pub struct TileMap {
    tiles: HashMap<Position, String>,
}

impl From<HashMap<String, String>> for TileMap {
    fn from(raw: HashMap<String, String>) -> Self {
        let tiles = raw
            .into_iter()
            .filter_map(|(key, kind)| Position::parse_tile_key(&key).map(|p| (p, kind)))
            .collect();
        Self { tiles }
    }
}

impl FromIterator<(Position, String)> for TileMap {
    fn from_iter<I: IntoIterator<Item = (Position, String)>>(iter: I) -> Self {
        Self {
            tiles: iter.into_iter().collect(),
        }
    }
}

impl TileMap {
    pub fn get(&self, pos: &Position) -> Option<&str> {
        self.tiles.get(pos).map(String::as_str)
    }

    pub fn contains(&self, pos: &Position) -> bool {
        self.tiles.contains_key(pos)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles on one z-level, in no particular order.
    pub fn on_level(&self, z: i32) -> impl Iterator<Item = (&Position, &str)> {
        self.tiles
            .iter()
            .filter(move |(p, _)| p.z == z)
            .map(|(p, k)| (p, k.as_str()))
    }
}

// --- Inventory ----------------------------------------------------------------

/// Loosely typed stat value (`"1d8"`, `4`, `2.5`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ItemProperties {
    pub icon: Option<String>,
    pub damage: Option<Scalar>,
    pub defense: Option<Scalar>,
    pub heal: Option<Scalar>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "ItemRepr")]
pub struct Item {
    pub id: EntityId,
    pub name: String,
    pub slot: Option<String>,
    pub is_equipped: bool,
    pub item_type: Option<String>,
    pub quantity: u32,
    pub value: Option<u32>,
    pub description: Option<String>,
    pub properties: ItemProperties,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ItemRepr {
    Full(ItemFields),
    Pair(String, Option<String>),
}

#[derive(Deserialize)]
struct ItemFields {
    id: Option<EntityId>,
    #[serde(default, deserialize_with = "nullable")]
    name: String,
    slot: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    is_equipped: bool,
    item_type: Option<String>,
    quantity: Option<u32>,
    value: Option<u32>,
    description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    properties: ItemProperties,
}

impl From<ItemRepr> for Item {
    fn from(repr: ItemRepr) -> Self {
        match repr {
            ItemRepr::Full(f) => Item {
                id: f.id.unwrap_or_else(|| EntityId(f.name.clone())),
                name: f.name,
                slot: f.slot.filter(|s| !s.is_empty()),
                is_equipped: f.is_equipped,
                item_type: f.item_type,
                quantity: f.quantity.unwrap_or(1),
                value: f.value,
                description: f.description,
                properties: f.properties,
            },
            ItemRepr::Pair(name, slot) => Item {
                id: EntityId(name.clone()),
                name,
                slot: slot.filter(|s| !s.is_empty()),
                is_equipped: false,
                item_type: None,
                quantity: 1,
                value: None,
                description: None,
                properties: ItemProperties::default(),
            },
        }
    }
}

impl Item {
    pub fn is_consumable(&self) -> bool {
        self.item_type.as_deref() == Some("consumable")
    }
}

// --- Player -------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SkillValue {
    Detailed {
        level: u32,
        #[serde(default)]
        xp: u32,
    },
    Level(u32),
}

impl SkillValue {
    pub fn level(&self) -> u32 {
        match *self {
            SkillValue::Detailed { level, .. } | SkillValue::Level(level) => level,
        }
    }

    pub fn xp(&self) -> u32 {
        match *self {
            SkillValue::Detailed { xp, .. } => xp,
            SkillValue::Level(_) => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum QuestEntry {
    Plain(String),
    Detailed {
        title: Option<String>,
        description: Option<String>,
    },
}

impl QuestEntry {
    pub fn title(&self) -> &str {
        match self {
            QuestEntry::Plain(s) => s,
            QuestEntry::Detailed { title, .. } => title.as_deref().unwrap_or("Active Quest"),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            QuestEntry::Plain(_) => "",
            QuestEntry::Detailed { description, .. } => {
                description.as_deref().unwrap_or("In Progress")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Player {
    pub xyz: Position,
    pub hp: Option<i32>,
    pub max_hp: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub gold: u32,
    pub level: Option<u32>,
    #[serde(default, deserialize_with = "nullable")]
    pub inventory: Vec<Item>,
    #[serde(default, deserialize_with = "nullable")]
    pub skills: BTreeMap<String, SkillValue>,
    #[serde(default, deserialize_with = "nullable")]
    pub quest_log: Vec<QuestEntry>,
}

impl Player {
    pub fn equipped_in(&self, slot: &str) -> Option<&Item> {
        self.inventory
            .iter()
            .find(|i| i.is_equipped && i.slot.as_deref() == Some(slot))
    }

    /// Unequipped items, in server order.
    pub fn backpack(&self) -> impl Iterator<Item = &Item> {
        self.inventory.iter().filter(|i| !i.is_equipped)
    }

    pub fn item(&self, id: &EntityId) -> Option<&Item> {
        self.inventory.iter().find(|i| &i.id == id)
    }
}

// --- World entities ---------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Enemy {
    pub id: Option<EntityId>,
    pub xyz: Position,
    #[serde(default, deserialize_with = "nullable")]
    pub hp: i32,
    #[serde(default, deserialize_with = "nullable")]
    pub max_hp: i32,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
}

impl Enemy {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn is_injured(&self) -> bool {
        self.max_hp > 0 && self.hp < self.max_hp
    }

    /// Remaining health in `0.0..=1.0`; `None` when max hp is unknown.
    pub fn hp_fraction(&self) -> Option<f64> {
        if self.max_hp <= 0 {
            return None;
        }
        Some((self.hp as f64 / self.max_hp as f64).clamp(0.0, 1.0))
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Npc {
    pub id: Option<EntityId>,
    pub xyz: Position,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    pub asset: Option<String>,
}

impl Npc {
    /// Id sent back to the chat endpoint; falls back to the name.
    pub fn chat_id(&self) -> EntityId {
        self.id.clone().unwrap_or_else(|| EntityId(self.name.clone()))
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Secret {
    #[serde(default, deserialize_with = "nullable")]
    pub id: EntityId,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    pub xyz: Option<Position>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub obj_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Corpse {
    pub id: Option<EntityId>,
    pub xyz: Position,
    pub name: Option<String>,
}

impl Corpse {
    pub fn loot_id(&self) -> EntityId {
        self.id.clone().unwrap_or_else(|| EntityId(self.xyz.tile_key()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct World {
    #[serde(default, deserialize_with = "nullable")]
    pub map: TileMap,
    #[serde(default, deserialize_with = "nullable")]
    pub enemies: Vec<Enemy>,
    #[serde(default, deserialize_with = "nullable")]
    pub npcs: Vec<Npc>,
    #[serde(default, deserialize_with = "nullable")]
    pub secrets: Vec<Secret>,
}

// --- Combat -----------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Actor {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CombatState {
    #[serde(default, deserialize_with = "nullable")]
    pub active: bool,
    pub enemy_name: Option<String>,
    pub enemy_hp: Option<i32>,
    pub current_turn: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub moves_left: i32,
    #[serde(default, deserialize_with = "nullable")]
    pub actions_left: i32,
    #[serde(default, deserialize_with = "nullable")]
    pub bonus_actions_left: i32,
    #[serde(default, deserialize_with = "nullable")]
    pub actors: Vec<Actor>,
    pub turn_index: Option<usize>,
}

impl CombatState {
    /// Servers that predate turn tracking omit `current_turn`; the player is
    /// always the one acting there.
    pub fn is_player_turn(&self) -> bool {
        self.current_turn.as_deref().is_none_or(|t| t == "player")
    }
}

// --- Root -------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GameState {
    pub player: Option<Player>,
    pub world: Option<World>,
    #[serde(default, deserialize_with = "nullable")]
    pub corpses: Vec<Corpse>,
    pub combat: Option<CombatState>,
}

impl GameState {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn player_pos(&self) -> Option<Position> {
        self.player.as_ref().map(|p| p.xyz)
    }

    pub fn in_combat(&self) -> bool {
        self.combat.as_ref().is_some_and(|c| c.active)
    }

    pub fn enemies(&self) -> &[Enemy] {
        self.world.as_ref().map(|w| w.enemies.as_slice()).unwrap_or(&[])
    }

    pub fn npcs(&self) -> &[Npc] {
        self.world.as_ref().map(|w| w.npcs.as_slice()).unwrap_or(&[])
    }

    pub fn secrets(&self) -> &[Secret] {
        self.world.as_ref().map(|w| w.secrets.as_slice()).unwrap_or(&[])
    }
}

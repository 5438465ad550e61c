//! Paperdoll, backpack grid, skills list and the side item panel, plus the
//! drag-and-drop rules shared with the shop.

use super::{MarkupCache, UiAction, by_id, escape_html, patch_html};
use crate::state::{EntityId, Item, Player, SkillValue};
use serde::{Deserialize, Serialize};

pub const DOLL_ID: &str = "equipped-slots";
pub const BACKPACK_ID: &str = "inventory-list";
pub const SKILLS_ID: &str = "skills-list";
pub const ITEMS_ID: &str = "items-list";

pub const BACKPACK_ZONE: &str = "backpack";
pub const SHOP_MERCHANT_ZONE: &str = "shop-merchant";
pub const SHOP_PLAYER_ZONE: &str = "shop-player";
const DOLL_ZONE_PREFIX: &str = "doll:";

pub const BACKPACK_CELLS: usize = 20;
pub const BACKPACK_COLUMNS: usize = 5;
pub const XP_PER_LEVEL: u32 = 50;

/// A paperdoll slot and its cell on the 3x4 grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub key: &'static str,
    pub label: &'static str,
    pub x: u32,
    pub y: u32,
}

pub const SLOTS: [Slot; 8] = [
    Slot { key: "head", label: "Head", x: 1, y: 0 },
    Slot { key: "neck", label: "Neck", x: 2, y: 0 },
    Slot { key: "chest", label: "Chest", x: 1, y: 1 },
    Slot { key: "hands", label: "Hands", x: 0, y: 1 },
    Slot { key: "main_hand", label: "Main Hand", x: 0, y: 2 },
    Slot { key: "off_hand", label: "Off Hand", x: 2, y: 2 },
    Slot { key: "legs", label: "Legs", x: 1, y: 2 },
    Slot { key: "feet", label: "Feet", x: 1, y: 3 },
];

/// Pixel `(top, left)` of a slot inside the doll.
pub fn slot_position(slot: &Slot) -> (u32, u32) {
    (slot.y * 36 + 10, slot.x * 36 + 6)
}

const ICONS: &[(&str, &str)] = &[
    ("Training Sword", "⚔️"),
    ("Iron Sword", "⚔️"),
    ("Steel Sword", "⚔️"),
    ("Rusty Dagger", "🗡️"),
    ("Steel Dagger", "🗡️"),
    ("Cloth Tunic", "👕"),
    ("Leather Armor", "👕"),
    ("Chainmail", "⛓️"),
    ("Leather Helmet", "🧢"),
    ("Iron Helmet", "🪖"),
    ("Leather Boots", "👢"),
    ("Healing Potion", "🧪"),
    ("Iron Ore", "🪨"),
    ("Mystic Herb", "🌿"),
    ("Gold", "💰"),
    ("Wooden Shield", "🛡️"),
    ("Iron Shield", "🛡️"),
    ("Iron Key", "🔑"),
    ("Ring", "💍"),
    ("Leather Gloves", "🧤"),
];

pub const FALLBACK_ICON: &str = "📦";

pub fn icon_for_name(name: &str) -> Option<&'static str> {
    ICONS.iter().find(|(n, _)| *n == name).map(|(_, i)| *i)
}

pub fn item_icon(item: &Item) -> &str {
    item.properties
        .icon
        .as_deref()
        .filter(|i| !i.is_empty())
        .or_else(|| icon_for_name(&item.name))
        .unwrap_or(FALLBACK_ICON)
}

// --- Drag and drop ------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragSource {
    Bag,
    Doll,
    Merchant,
    Player,
}

/// JSON carried under `text/plain` while something is dragged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DragPayload {
    pub source: DragSource,
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DragPayload {
    pub fn item(source: DragSource, item: &Item) -> Self {
        Self {
            source,
            id: item.id.clone(),
            slot: item.slot.clone(),
            cost: None,
            name: None,
        }
    }

    pub fn priced(source: DragSource, id: EntityId, name: &str, cost: u32) -> Self {
        Self {
            source,
            id,
            slot: None,
            cost: Some(cost),
            name: Some(name.to_string()),
        }
    }

    /// Escaped for use as a `data-drag` attribute value.
    pub fn to_attr(&self) -> String {
        escape_html(&serde_json::to_string(self).unwrap_or_default())
    }
}

/// Where something was dropped, from the target's `data-drop` attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropZone {
    Doll(String),
    Backpack,
    ShopMerchant,
    ShopPlayer,
}

impl DropZone {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            BACKPACK_ZONE => Some(DropZone::Backpack),
            SHOP_MERCHANT_ZONE => Some(DropZone::ShopMerchant),
            SHOP_PLAYER_ZONE => Some(DropZone::ShopPlayer),
            other => other
                .strip_prefix(DOLL_ZONE_PREFIX)
                .filter(|s| !s.is_empty())
                .map(|s| DropZone::Doll(s.to_string())),
        }
    }

    /// Value for a `data-drop` attribute.
    pub fn attr(&self) -> String {
        match self {
            DropZone::Doll(slot) => format!("{DOLL_ZONE_PREFIX}{slot}"),
            DropZone::Backpack => BACKPACK_ZONE.into(),
            DropZone::ShopMerchant => SHOP_MERCHANT_ZONE.into(),
            DropZone::ShopPlayer => SHOP_PLAYER_ZONE.into(),
        }
    }
}

/// The action a drop triggers, if the pairing is valid.
pub fn resolve_drop(payload: &DragPayload, zone: &DropZone) -> Option<UiAction> {
    match (payload.source, zone) {
        (DragSource::Bag, DropZone::Doll(slot)) if payload.slot.as_deref() == Some(slot.as_str()) => {
            Some(UiAction::Equip {
                id: payload.id.clone(),
            })
        }
        (DragSource::Doll, DropZone::Backpack) => Some(UiAction::Unequip {
            id: payload.id.clone(),
        }),
        (DragSource::Merchant, DropZone::ShopPlayer) => Some(UiAction::Buy {
            id: payload.id.clone(),
            name: payload.name.clone().unwrap_or_default(),
            cost: payload.cost.unwrap_or(0),
        }),
        (DragSource::Player, DropZone::ShopMerchant) => Some(UiAction::Sell {
            id: payload.id.clone(),
            name: payload.name.clone().unwrap_or_default(),
            cost: payload.cost.unwrap_or(0),
        }),
        _ => None,
    }
}

/// What clicking a backpack item does.
pub fn bag_click(item: &Item) -> Option<UiAction> {
    if item.slot.is_some() {
        Some(UiAction::Equip {
            id: item.id.clone(),
        })
    } else if item.is_consumable() {
        Some(UiAction::UseItem {
            id: item.id.clone(),
        })
    } else {
        None
    }
}

/// What a confirmed click in the item panel does.
pub fn panel_click(item: &Item) -> Option<UiAction> {
    if item.is_equipped {
        Some(UiAction::Unequip {
            id: item.id.clone(),
        })
    } else {
        bag_click(item)
    }
}

// --- Markup ---------------------------------------------------------------------

pub fn doll_html(player: &Player) -> String {
    let mut html = String::from(
        "<div style=\"position:relative; width:120px; height:160px; margin:0 auto; background:#111; border:1px solid #444;\">",
    );
    for slot in &SLOTS {
        let (top, left) = slot_position(slot);
        let base = format!(
            "position:absolute; top:{top}px; left:{left}px; width:34px; height:34px; border:1px solid #666; background:#222; display:flex; align-items:center; justify-content:center;"
        );
        match player.equipped_in(slot.key) {
            Some(item) => html.push_str(&format!(
                "<div class=\"paper-doll-slot\" data-drop=\"{DOLL_ZONE_PREFIX}{key}\" data-action=\"doll-item\" data-id=\"{id}\" data-name=\"{name}\" \
                 draggable=\"true\" data-drag=\"{drag}\" title=\"{name}\" style=\"{base} cursor:grab;\">\
                 <div style=\"font-size:24px;\">{icon}</div></div>",
                key = slot.key,
                id = escape_html(item.id.as_str()),
                name = escape_html(&item.name),
                drag = DragPayload::item(DragSource::Doll, item).to_attr(),
                icon = escape_html(item_icon(item)),
            )),
            None => html.push_str(&format!(
                "<div class=\"paper-doll-slot\" data-drop=\"{DOLL_ZONE_PREFIX}{key}\" style=\"{base} cursor:default;\">\
                 <div style=\"opacity:0.2; font-size:10px; pointer-events:none;\">{label}</div></div>",
                key = slot.key,
                label = slot.label,
            )),
        }
    }
    html.push_str("</div>");
    html
}

fn quantity_badge(item: &Item) -> String {
    if item.quantity > 1 {
        format!(
            "<span style=\"position:absolute; bottom:0; right:1px; color:#fff; font-size:10px; text-shadow:1px 1px 0 #000;\">{}</span>",
            item.quantity
        )
    } else {
        String::new()
    }
}

/// Backpack cells; always [`BACKPACK_CELLS`] of them.
pub fn backpack_html(player: &Player) -> String {
    let cell = "width:36px; height:36px; background:#1a1a1a; border:1px solid #333; position:relative; display:flex; align-items:center; justify-content:center;";
    let mut items = player.backpack();
    let mut html = String::new();
    for _ in 0..BACKPACK_CELLS {
        match items.next() {
            Some(item) => html.push_str(&format!(
                "<li data-drop=\"{zone}\" data-action=\"bag-item\" data-id=\"{id}\" draggable=\"true\" data-drag=\"{drag}\" title=\"{name}\" style=\"{cell} cursor:grab;\">\
                 <div style=\"font-size:24px;\">{icon}</div>{badge}</li>",
                zone = BACKPACK_ZONE,
                id = escape_html(item.id.as_str()),
                drag = DragPayload::item(DragSource::Bag, item).to_attr(),
                name = escape_html(&item.name),
                icon = escape_html(item_icon(item)),
                badge = quantity_badge(item),
            )),
            None => html.push_str(&format!("<li data-drop=\"{BACKPACK_ZONE}\" style=\"{cell}\"></li>")),
        }
    }
    html
}

/// Percentage the XP bar is filled for `skill`.
pub fn skill_progress(skill: &SkillValue) -> f64 {
    let threshold = skill.level() * XP_PER_LEVEL;
    if threshold == 0 {
        return 0.0;
    }
    (f64::from(skill.xp()) / f64::from(threshold) * 100.0).min(100.0)
}

pub fn skills_html(player: &Player) -> String {
    if player.skills.is_empty() {
        return "<span style=\"color:#666; font-style:italic;\">No skills learnt.</span>".into();
    }
    player
        .skills
        .iter()
        .map(|(name, skill)| {
            format!(
                "<div style=\"background:#222; padding:5px; border-radius:4px; border:1px solid #444;\">\
                 <div style=\"display:flex; justify-content:space-between; margin-bottom:2px;\">\
                 <span style=\"font-weight:bold; text-transform:capitalize;\">{name}</span>\
                 <span style=\"color:#8f8;\">Lvl {level}</span></div>\
                 <div style=\"background:#000; height:4px; width:100%; border-radius:2px;\">\
                 <div style=\"background:#0f0; width:{pct}%; height:100%; border-radius:2px; transition: width 0.3s;\"></div></div>\
                 <div style=\"font-size:0.7em; color:#888; text-align:right;\">{xp} / {threshold} XP</div></div>",
                name = escape_html(name),
                level = skill.level(),
                pct = skill_progress(skill),
                xp = skill.xp(),
                threshold = skill.level() * XP_PER_LEVEL,
            )
        })
        .collect()
}

/// Hover text for an item in the side panel.
pub fn item_tooltip(item: &Item) -> String {
    let mut desc = item.name.clone();
    if item.is_equipped {
        desc.push_str(" (Equipped)");
    }
    if item.quantity > 1 {
        desc.push_str(&format!(" x{}", item.quantity));
    }
    let props = &item.properties;
    if let Some(d) = &props.damage {
        desc.push_str(&format!("\nDamage: {d}"));
    }
    if let Some(d) = &props.defense {
        desc.push_str(&format!("\nDefense: +{d}"));
    }
    if let Some(h) = &props.heal {
        desc.push_str(&format!("\nHeals: {h}"));
    }
    if let Some(t) = &item.item_type {
        desc.push_str(&format!("\nType: {t}"));
    }
    desc
}

pub fn item_panel_html(player: &Player) -> String {
    let mut html = format!(
        "<div class=\"item-entry\" style=\"color:#ffd700; font-weight:bold; background:none; border:none; border-bottom:1px solid #444; margin-bottom:10px; padding-bottom:5px;\">Gold: {}g</div>\
         <div style=\"display:grid; grid-template-columns:repeat(auto-fill, minmax(40px, 1fr)); gap:8px;\">",
        player.gold
    );
    if player.inventory.is_empty() {
        html.push_str("<div style=\"grid-column: 1/-1; color:#666; font-style:italic;\">Bag is empty.</div>");
    }
    for item in &player.inventory {
        let highlight = if item.is_equipped {
            "border-color:#0f0; box-shadow:0 0 5px rgba(0, 255, 0, 0.3);"
        } else {
            ""
        };
        let badge = if item.quantity > 1 {
            format!(
                "<span style=\"position:absolute; bottom:1px; right:3px; font-size:10px; color:#fff; font-weight:bold; text-shadow:1px 1px 0 #000;\">{}</span>",
                item.quantity
            )
        } else {
            String::new()
        };
        html.push_str(&format!(
            "<div data-action=\"panel-item\" data-id=\"{id}\" title=\"{tip}\" style=\"width:42px; height:42px; background:#1a1a1a; border:1px solid #444; border-radius:6px; position:relative; cursor:help; display:flex; align-items:center; justify-content:center; font-size:24px; {highlight}\">{icon}{badge}</div>",
            id = escape_html(item.id.as_str()),
            tip = escape_html(&item_tooltip(item)),
            icon = escape_html(item_icon(item)),
        ));
    }
    html.push_str("</div>");
    html
}

pub fn update(player: &Player, cache: &mut MarkupCache) {
    patch_html(cache, DOLL_ID, &doll_html(player));
    if let Some(list) = by_id(BACKPACK_ID) {
        if list.get_attribute("data-drop").as_deref() != Some(BACKPACK_ZONE) {
            list.set_attribute("data-drop", BACKPACK_ZONE).ok();
        }
    }
    patch_html(cache, BACKPACK_ID, &backpack_html(player));
    patch_html(cache, SKILLS_ID, &skills_html(player));
    patch_html(cache, ITEMS_ID, &item_panel_html(player));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        serde_json::from_str(
            r#"{
              "xyz": [0, 0, 0],
              "gold": 42,
              "inventory": [
                {"id": 1, "name": "Iron Sword", "slot": "main_hand", "is_equipped": true,
                 "item_type": "weapon", "properties": {"damage": "1d8"}},
                {"id": 2, "name": "Healing Potion", "item_type": "consumable", "quantity": 3,
                 "properties": {"heal": 8}},
                {"id": 3, "name": "Leather Helmet", "slot": "head", "item_type": "armor",
                 "properties": {"defense": 1, "icon": "⛑️"}},
                {"id": 4, "name": "Odd Pebble"}
              ],
              "skills": {"mining": {"level": 2, "xp": 30}, "herbalism": 1}
            }"#,
        )
        .unwrap()
    }

    fn item(p: &Player, id: &str) -> Item {
        p.item(&EntityId::from(id)).unwrap().clone()
    }

    #[test]
    fn slot_grid_positions() {
        let feet = SLOTS.iter().find(|s| s.key == "feet").unwrap();
        assert_eq!(slot_position(feet), (118, 42));
        let off = SLOTS.iter().find(|s| s.key == "off_hand").unwrap();
        assert_eq!(slot_position(off), (82, 78));
    }

    #[test]
    fn icons_prefer_properties_then_table() {
        let p = player();
        assert_eq!(item_icon(&item(&p, "3")), "⛑️");
        assert_eq!(item_icon(&item(&p, "1")), "⚔️");
        assert_eq!(item_icon(&item(&p, "4")), FALLBACK_ICON);
    }

    #[test]
    fn doll_shows_equipped_and_labels() {
        let html = doll_html(&player());
        assert!(html.contains("data-action=\"doll-item\" data-id=\"1\""));
        assert!(html.contains(">Head</div>"));
        assert!(html.contains("data-drop=\"doll:main_hand\""));
        assert_eq!(html.matches("paper-doll-slot").count(), 8);
    }

    #[test]
    fn backpack_always_has_twenty_cells() {
        let html = backpack_html(&player());
        assert_eq!(html.matches("<li").count(), BACKPACK_CELLS);
        assert_eq!(html.matches("data-action=\"bag-item\"").count(), 3);
        assert!(html.contains(">3</span>"));
    }

    #[test]
    fn every_backpack_cell_accepts_drops() {
        let html = backpack_html(&player());
        assert_eq!(html.matches("data-drop=\"backpack\"").count(), BACKPACK_CELLS);
        // An equipped item dragged from the doll onto the bag unequips.
        let p = player();
        let sword = DragPayload::item(DragSource::Doll, &item(&p, "1"));
        let zone = DropZone::parse(BACKPACK_ZONE).unwrap();
        assert_eq!(
            resolve_drop(&sword, &zone),
            Some(UiAction::Unequip {
                id: EntityId::from("1")
            })
        );
    }

    #[test]
    fn drops_pair_sources_with_zones() {
        let p = player();
        let helmet = DragPayload::item(DragSource::Bag, &item(&p, "3"));
        assert_eq!(
            resolve_drop(&helmet, &DropZone::Doll("head".into())),
            Some(UiAction::Equip {
                id: EntityId::from("3")
            })
        );
        assert_eq!(resolve_drop(&helmet, &DropZone::Doll("feet".into())), None);
        let sword = DragPayload::item(DragSource::Doll, &item(&p, "1"));
        assert_eq!(
            resolve_drop(&sword, &DropZone::Backpack),
            Some(UiAction::Unequip {
                id: EntityId::from("1")
            })
        );
        let ware = DragPayload::priced(DragSource::Merchant, EntityId::from("iron_sword"), "Iron Sword", 20);
        assert_eq!(
            resolve_drop(&ware, &DropZone::ShopPlayer),
            Some(UiAction::Buy {
                id: EntityId::from("iron_sword"),
                name: "Iron Sword".into(),
                cost: 20
            })
        );
        assert_eq!(resolve_drop(&ware, &DropZone::ShopMerchant), None);
    }

    #[test]
    fn drag_payload_wire_shape() {
        let p = player();
        let json = serde_json::to_string(&DragPayload::item(DragSource::Bag, &item(&p, "3"))).unwrap();
        assert_eq!(json, r#"{"source":"bag","id":"3","slot":"head"}"#);
        let back: DragPayload =
            serde_json::from_str(r#"{"source":"merchant","id":7,"cost":5,"name":"Rope"}"#).unwrap();
        assert_eq!(back.id, EntityId::from("7"));
        assert_eq!(back.cost, Some(5));
    }

    #[test]
    fn drop_zones_parse() {
        assert_eq!(DropZone::parse("doll:head"), Some(DropZone::Doll("head".into())));
        assert_eq!(DropZone::parse("backpack"), Some(DropZone::Backpack));
        assert_eq!(DropZone::parse("doll:"), None);
        assert_eq!(DropZone::parse("floor"), None);
    }

    #[test]
    fn drop_zone_attrs_parse_back() {
        for zone in [
            DropZone::Doll("feet".into()),
            DropZone::Backpack,
            DropZone::ShopMerchant,
            DropZone::ShopPlayer,
        ] {
            assert_eq!(DropZone::parse(&zone.attr()), Some(zone));
        }
        assert_eq!(DropZone::parse(SHOP_MERCHANT_ZONE), Some(DropZone::ShopMerchant));
        assert_eq!(DropZone::parse(SHOP_PLAYER_ZONE), Some(DropZone::ShopPlayer));
    }

    #[test]
    fn clicks_equip_use_or_nothing() {
        let p = player();
        assert!(matches!(bag_click(&item(&p, "3")), Some(UiAction::Equip { .. })));
        assert!(matches!(bag_click(&item(&p, "2")), Some(UiAction::UseItem { .. })));
        assert_eq!(bag_click(&item(&p, "4")), None);
        assert!(matches!(panel_click(&item(&p, "1")), Some(UiAction::Unequip { .. })));
    }

    #[test]
    fn skill_bars() {
        let p = player();
        let mining = &p.skills["mining"];
        assert_eq!(skill_progress(mining), 30.0);
        assert_eq!(skill_progress(&p.skills["herbalism"]), 0.0);
        assert_eq!(skill_progress(&SkillValue::Level(0)), 0.0);
        let html = skills_html(&p);
        assert!(html.contains("30 / 100 XP"));
        assert!(html.contains("Lvl 2"));
        let empty = Player {
            skills: Default::default(),
            ..p
        };
        assert!(skills_html(&empty).contains("No skills learnt."));
    }

    #[test]
    fn tooltip_lists_stats() {
        let p = player();
        assert_eq!(
            item_tooltip(&item(&p, "1")),
            "Iron Sword (Equipped)\nDamage: 1d8\nType: weapon"
        );
        assert_eq!(
            item_tooltip(&item(&p, "2")),
            "Healing Potion x3\nHeals: 8\nType: consumable"
        );
        assert!(item_panel_html(&p).contains("Gold: 42g"));
    }
}

//! Merchant window: two grids, merchant stock on the left and the player's
//! sellable items on the right.

use super::inventory::{
    DragPayload, DragSource, FALLBACK_ICON, SHOP_MERCHANT_ZONE, SHOP_PLAYER_ZONE, icon_for_name, item_icon,
};
use super::{by_id, escape_html, set_html, set_text};
use crate::api::{ShopItem, ShopListing};
use crate::state::{EntityId, Player};

pub const MODAL_ID: &str = "shop-modal";
pub const TITLE_ID: &str = "shop-merchant-name";
pub const GOLD_ID: &str = "shop-player-gold";
pub const STOCK_ID: &str = "shop-list";
pub const PLAYER_ID: &str = "player-shop-inv";

pub const LOADING_HTML: &str = "<div style=\"color:#aaa;\">Loading...</div>";
pub const ERROR_HTML: &str = "Error loading shop.";
const EMPTY_HTML: &str =
    "<div style=\"grid-column:1/-1; color:#555; font-style:italic; padding:10px;\">Empty</div>";

pub fn buy_price(value: Option<u32>) -> u32 {
    value.unwrap_or(0)
}

pub fn sell_price(value: Option<u32>) -> u32 {
    (value.unwrap_or(0) / 2).max(1)
}

pub fn can_afford(gold: u32, cost: u32) -> bool {
    gold >= cost
}

pub fn buy_prompt(name: &str, cost: u32) -> String {
    format!("Buy {name} for {cost}g?")
}

pub fn sell_prompt(name: &str, cost: u32) -> String {
    format!("Sell {name} for {cost}g?")
}

fn ware_icon(item: &ShopItem) -> &str {
    item.properties
        .icon
        .as_deref()
        .filter(|i| !i.is_empty())
        .or_else(|| icon_for_name(&item.name))
        .unwrap_or(FALLBACK_ICON)
}

struct Cell<'a> {
    action: &'static str,
    verb: &'static str,
    id: &'a EntityId,
    name: &'a str,
    icon: &'a str,
    cost: u32,
    description: &'a str,
    drag: DragPayload,
}

fn cell_html(cell: &Cell<'_>) -> String {
    let tip = format!("{}\n{} {}g\n{}", cell.name, cell.verb, cell.cost, cell.description);
    format!(
        "<div class=\"shop-slot\" draggable=\"true\" data-drag=\"{drag}\" data-action=\"{action}\" data-id=\"{id}\" data-name=\"{name}\" data-cost=\"{cost}\" title=\"{tip}\" \
         style=\"width:42px; height:42px; background:#1a1a1a; border:1px solid #444; border-radius:4px; display:flex; align-items:center; justify-content:center; font-size:24px; cursor:grab; position:relative;\">{icon}</div>",
        drag = cell.drag.to_attr(),
        action = cell.action,
        id = escape_html(cell.id.as_str()),
        name = escape_html(cell.name),
        cost = cell.cost,
        tip = escape_html(&tip),
        icon = escape_html(cell.icon),
    )
}

pub fn stock_html(stock: &[ShopListing]) -> String {
    if stock.is_empty() {
        return EMPTY_HTML.into();
    }
    stock
        .iter()
        .map(|l| {
            let cost = buy_price(l.item.value);
            cell_html(&Cell {
                action: "buy",
                verb: "Buy for",
                id: &l.id,
                name: &l.item.name,
                icon: ware_icon(&l.item),
                cost,
                description: l.item.description.as_deref().unwrap_or(""),
                drag: DragPayload::priced(DragSource::Merchant, l.id.clone(), &l.item.name, cost),
            })
        })
        .collect()
}

/// Unequipped items the player could sell.
pub fn sellable_html(player: &Player) -> String {
    let cells: Vec<String> = player
        .backpack()
        .map(|item| {
            let cost = sell_price(item.value);
            cell_html(&Cell {
                action: "sell",
                verb: "Sell for",
                id: &item.id,
                name: &item.name,
                icon: item_icon(item),
                cost,
                description: item.description.as_deref().unwrap_or(""),
                drag: DragPayload::priced(DragSource::Player, item.id.clone(), &item.name, cost),
            })
        })
        .collect();
    if cells.is_empty() {
        EMPTY_HTML.into()
    } else {
        cells.concat()
    }
}

/// Centre the modal, restore it if minimised and show the loading state.
pub fn open_frame(merchant: &str, gold: u32) {
    if let Some(modal) = by_id(MODAL_ID) {
        let style = modal.style();
        for (k, v) in [
            ("top", "10%"),
            ("left", "50%"),
            ("transform", "translateX(-50%)"),
            ("width", "700px"),
            ("height", "500px"),
            ("display", "block"),
        ] {
            style.set_property(k, v).ok();
        }
        if let Ok(Some(content)) = modal.query_selector(".panel-content") {
            content.set_attribute("style", "display:flex;").ok();
        }
    }
    set_text(TITLE_ID, merchant);
    set_gold(gold);
    set_html(STOCK_ID, LOADING_HTML);
    set_html(PLAYER_ID, LOADING_HTML);
    if let Some(el) = by_id(STOCK_ID) {
        el.set_attribute("data-drop", SHOP_MERCHANT_ZONE).ok();
    }
    if let Some(el) = by_id(PLAYER_ID) {
        el.set_attribute("data-drop", SHOP_PLAYER_ZONE).ok();
    }
}

pub fn set_gold(gold: u32) {
    set_text(GOLD_ID, &gold.to_string());
}

pub fn render(stock: &[ShopListing], player: Option<&Player>) {
    set_html(STOCK_ID, &stock_html(stock));
    set_html(PLAYER_ID, &player.map(sellable_html).unwrap_or_else(|| EMPTY_HTML.into()));
}

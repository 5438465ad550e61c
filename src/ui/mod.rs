//! DOM side of the client: panel updaters, event delegation and the small
//! helpers they share. Panel markup is built by pure functions in the
//! submodules so it can be tested without a browser.

pub mod chat;
pub mod combat;
pub mod crafting;
pub mod inventory;
pub mod loot;
pub mod nearby;
pub mod panels;
pub mod popup;
pub mod quests;
pub mod shop;

use crate::app;
use crate::error::{ClientError, Result};
use crate::state::{EntityId, GameState};
use combat::CombatTab;
use gloo::console;
use gloo::events::{EventListener, EventListenerOptions};
use inventory::{DragPayload, DropZone};
use std::collections::HashMap;
use wasm_bindgen::JsCast;
use web_sys::{Document, DragEvent, Element, HtmlElement, HtmlInputElement, KeyboardEvent, MouseEvent};

// --- Markup helpers -----------------------------------------------------------

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// One narrative log line.
pub fn log_entry_text(msg: &str) -> String {
    format!("> {msg}")
}

/// Area name shown in the header for a z-level.
pub fn region_name(z: i32) -> &'static str {
    match z {
        0 => "Unknown Dungeon",
        1 => "Oakhaven Town",
        2 => "North Forest",
        3 => "Volcanic Depths",
        4 => "Frozen Caverns",
        _ => "Dungeon Crawler",
    }
}

/// Remembers the last markup written per element so unchanged panels are not
/// rewritten (rewrites reset hover and focus state).
#[derive(Debug, Default)]
pub struct MarkupCache {
    last: HashMap<String, String>,
}

impl MarkupCache {
    /// Record `html` for `id`; true when it differs from what was there.
    pub fn changed(&mut self, id: &str, html: &str) -> bool {
        match self.last.get(id) {
            Some(prev) if prev == html => false,
            _ => {
                self.last.insert(id.to_string(), html.to_string());
                true
            }
        }
    }

    pub fn forget(&mut self, id: &str) {
        self.last.remove(id);
    }
}

// --- DOM helpers --------------------------------------------------------------

pub fn document() -> Option<Document> {
    web_sys::window()?.document()
}

pub fn by_id(id: &str) -> Option<HtmlElement> {
    document()?.get_element_by_id(id)?.dyn_into().ok()
}

pub fn require(id: &str) -> Result<HtmlElement> {
    by_id(id).ok_or_else(|| ClientError::MissingElement(id.to_string()))
}

pub fn set_text(id: &str, text: &str) {
    if let Some(el) = by_id(id) {
        el.set_text_content(Some(text));
    }
}

pub fn set_html(id: &str, html: &str) {
    if let Some(el) = by_id(id) {
        el.set_inner_html(html);
    }
}

/// Write `html` into `id` only when it changed since the last write.
pub fn patch_html(cache: &mut MarkupCache, id: &str, html: &str) {
    if let Some(el) = by_id(id) {
        if cache.changed(id, html) {
            el.set_inner_html(html);
        }
    }
}

pub fn set_display(id: &str, display: &str) {
    if let Some(el) = by_id(id) {
        el.style().set_property("display", display).ok();
    }
}

pub fn is_shown(id: &str) -> bool {
    by_id(id)
        .and_then(|el| el.style().get_property_value("display").ok())
        .is_some_and(|d| d != "none" && !d.is_empty())
}

pub fn alert(msg: &str) {
    if let Some(w) = web_sys::window() {
        w.alert_with_message(msg).ok();
    }
}

pub fn confirm(msg: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(msg).ok())
        .unwrap_or(false)
}

/// Append `> msg` to the narrative log and keep it scrolled to the bottom.
pub fn log_message(msg: &str) {
    let Some(doc) = document() else {
        return;
    };
    let Some(log) = doc
        .get_element_by_id("narrative-log")
        .or_else(|| doc.get_element_by_id("log-content"))
    else {
        console::log!(log_entry_text(msg));
        return;
    };
    if let Ok(entry) = doc.create_element("div") {
        entry.set_class_name("log-entry");
        entry.set_text_content(Some(&log_entry_text(msg)));
        log.append_child(&entry).ok();
        log.set_scroll_top(log.scroll_height());
    }
}

fn toggle_tabs(container_id: &str, tab: &str, pane_id: &str, set_display: bool) {
    let Some(container) = by_id(container_id) else {
        return;
    };
    if let Ok(buttons) = container.query_selector_all(".tab-btn") {
        for i in 0..buttons.length() {
            if let Some(btn) = buttons.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                let active = btn.get_attribute("data-tab").as_deref() == Some(tab);
                btn.class_list().toggle_with_force("active", active).ok();
            }
        }
    }
    if let Ok(panes) = container.query_selector_all(".tab-content") {
        for i in 0..panes.length() {
            if let Some(pane) = panes.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) {
                let active = pane.id() == pane_id;
                pane.class_list().toggle_with_force("active", active).ok();
                if set_display {
                    pane.style()
                        .set_property("display", if active { "block" } else { "none" })
                        .ok();
                }
            }
        }
    }
}

/// Interaction panel tabs: nearby, items, quest.
pub fn switch_tab(tab: &str) {
    toggle_tabs("interaction-panel", tab, &format!("{tab}-tab"), false);
}

/// Character sheet tabs: hero, equipment, skills, crafting.
pub fn switch_char_tab(tab: &str) {
    toggle_tabs("char-sheet", tab, &format!("{tab}-char-tab"), true);
}

// --- Per-poll updaters ----------------------------------------------------------

/// Everything that reflects the polled state outside the canvas.
pub fn refresh_all(state: &GameState, cache: &mut MarkupCache, combat_tab: &mut CombatTab) {
    combat::update(state, cache, combat_tab);
    nearby::update(state, cache);
    let Some(player) = state.player.as_ref() else {
        return;
    };
    set_text("game-title", region_name(player.xyz.z));
    if let Some(level) = player.level {
        set_text("stat-lvl", &level.to_string());
    }
    let gold = player.gold.to_string();
    set_text("stat-gold", &gold);
    set_text("hero-gold-display", &gold);
    inventory::update(player, cache);
    quests::update(player, cache);
}

// --- Actions --------------------------------------------------------------------

/// Everything a `data-action` element can ask for.
#[derive(Clone, Debug, PartialEq)]
pub enum UiAction {
    Chat { npc: EntityId, name: String },
    SendChat,
    ChatOption { num: String, label: String },
    CloseChat,
    OpenShop { merchant: Option<String> },
    CloseShop,
    Buy { id: EntityId, name: String, cost: u32 },
    Sell { id: EntityId, name: String, cost: u32 },
    Loot { corpse: EntityId },
    TakeLoot { loot: EntityId },
    CloseLoot,
    Inspect { secret: EntityId },
    Interact,
    Investigate,
    CombatTab(CombatTab),
    Combat { action: String, target: Option<EntityId> },
    BagItem { id: EntityId },
    Equip { id: EntityId },
    Unequip { id: EntityId },
    UseItem { id: EntityId },
    DollItem { id: EntityId, name: String },
    PanelItem { id: EntityId },
    Craft { recipe: String },
    Tab(String),
    CharTab(String),
    ToggleMap,
    Reset,
}

impl UiAction {
    /// Build an action from its `data-action` name and the element's other
    /// `data-*` attributes.
    pub fn parse(action: &str, attr: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let id = || attr("data-id").map(EntityId);
        let name = || attr("data-name").unwrap_or_default();
        let cost = || attr("data-cost").and_then(|c| c.parse().ok()).unwrap_or(0);
        Some(match action {
            "chat" => UiAction::Chat {
                npc: id()?,
                name: name(),
            },
            "send-chat" => UiAction::SendChat,
            "chat-option" => UiAction::ChatOption {
                num: attr("data-num")?,
                label: attr("data-label").unwrap_or_default(),
            },
            "close-chat" => UiAction::CloseChat,
            "open-shop" => UiAction::OpenShop {
                merchant: attr("data-name").filter(|m| !m.is_empty()),
            },
            "close-shop" => UiAction::CloseShop,
            "buy" => UiAction::Buy {
                id: id()?,
                name: name(),
                cost: cost(),
            },
            "sell" => UiAction::Sell {
                id: id()?,
                name: name(),
                cost: cost(),
            },
            "loot" => UiAction::Loot { corpse: id()? },
            "take-loot" => UiAction::TakeLoot { loot: id()? },
            "close-loot" => UiAction::CloseLoot,
            "inspect" => UiAction::Inspect { secret: id()? },
            "interact" => UiAction::Interact,
            "investigate" => UiAction::Investigate,
            "combat-tab" => UiAction::CombatTab(CombatTab::parse(&attr("data-tab")?)?),
            "combat" => UiAction::Combat {
                action: attr("data-command")?,
                target: id(),
            },
            "bag-item" => UiAction::BagItem { id: id()? },
            "doll-item" => UiAction::DollItem {
                id: id()?,
                name: name(),
            },
            "panel-item" => UiAction::PanelItem { id: id()? },
            "craft" => UiAction::Craft {
                recipe: attr("data-id")?,
            },
            "tab" => UiAction::Tab(attr("data-tab")?),
            "char-tab" => UiAction::CharTab(attr("data-tab")?),
            "toggle-map" => UiAction::ToggleMap,
            "reset" => UiAction::Reset,
            _ => return None,
        })
    }
}

fn closest(target: Option<web_sys::EventTarget>, selector: &str) -> Option<Element> {
    target?
        .dyn_into::<Element>()
        .ok()?
        .closest(selector)
        .ok()
        .flatten()
}

/// Install the document-level listeners that route clicks, drags and chat
/// submits to [`app::dispatch`].
pub fn install_delegation() -> Result<()> {
    let doc = document().ok_or(ClientError::NoDocument)?;

    EventListener::new(&doc, "click", |event| {
        let Some(el) = closest(event.target(), "[data-action]") else {
            return;
        };
        let Some(name) = el.get_attribute("data-action") else {
            return;
        };
        let ctrl = event
            .dyn_ref::<MouseEvent>()
            .is_some_and(|m| m.ctrl_key());
        match UiAction::parse(&name, |a| el.get_attribute(a)) {
            Some(action) => app::dispatch(action, ctrl),
            None => console::warn!("unhandled ui action", name),
        }
    })
    .forget();

    EventListener::new(&doc, "dragstart", |event| {
        let Some(el) = closest(event.target(), "[data-drag]") else {
            return;
        };
        let (Some(evt), Some(payload)) = (event.dyn_ref::<DragEvent>(), el.get_attribute("data-drag"))
        else {
            return;
        };
        if let Some(dt) = evt.data_transfer() {
            dt.set_data("text/plain", &payload).ok();
        }
    })
    .forget();

    EventListener::new_with_options(
        &doc,
        "dragover",
        EventListenerOptions::enable_prevent_default(),
        |event| {
            if closest(event.target(), "[data-drop]").is_some() {
                event.prevent_default();
            }
        },
    )
    .forget();

    EventListener::new_with_options(
        &doc,
        "drop",
        EventListenerOptions::enable_prevent_default(),
        |event| {
            let Some(zone) = closest(event.target(), "[data-drop]")
                .and_then(|el| el.get_attribute("data-drop"))
                .and_then(|z| DropZone::parse(&z))
            else {
                return;
            };
            event.prevent_default();
            let raw = event
                .dyn_ref::<DragEvent>()
                .and_then(|e| e.data_transfer())
                .and_then(|dt| dt.get_data("text/plain").ok())
                .unwrap_or_default();
            match serde_json::from_str::<DragPayload>(&raw) {
                Ok(payload) => {
                    // Drops skip the confirmation prompt.
                    if let Some(action) = inventory::resolve_drop(&payload, &zone) {
                        app::dispatch(action, true);
                    }
                }
                Err(err) => console::warn!("bad drag payload", err.to_string()),
            }
        },
    )
    .forget();

    EventListener::new(&doc, "keydown", |event| {
        let Some(evt) = event.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        if evt.key() != "Enter" {
            return;
        }
        let is_chat = event
            .target()
            .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
            .is_some_and(|input| input.id() == "chat-input");
        if is_chat {
            app::dispatch(UiAction::SendChat, false);
        }
    })
    .forget();

    panels::install_draggables(&doc)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |k| pairs.iter().find(|(a, _)| *a == k).map(|(_, v)| v.to_string())
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn log_lines_are_prefixed() {
        assert_eq!(log_entry_text("You step north."), "> You step north.");
    }

    #[test]
    fn markup_cache_skips_identical_writes() {
        let mut cache = MarkupCache::default();
        assert!(cache.changed("nearby-list", "<p>a</p>"));
        assert!(!cache.changed("nearby-list", "<p>a</p>"));
        assert!(cache.changed("nearby-list", "<p>b</p>"));
        cache.forget("nearby-list");
        assert!(cache.changed("nearby-list", "<p>b</p>"));
    }

    #[test]
    fn parses_actions_from_attributes() {
        assert_eq!(
            UiAction::parse("chat", attrs(&[("data-id", "3"), ("data-name", "Elara")])),
            Some(UiAction::Chat {
                npc: EntityId::from("3"),
                name: "Elara".into()
            })
        );
        assert_eq!(
            UiAction::parse(
                "buy",
                attrs(&[("data-id", "sword"), ("data-name", "Sword"), ("data-cost", "20")])
            ),
            Some(UiAction::Buy {
                id: EntityId::from("sword"),
                name: "Sword".into(),
                cost: 20
            })
        );
        assert_eq!(
            UiAction::parse("combat", attrs(&[("data-command", "end_turn")])),
            Some(UiAction::Combat {
                action: "end_turn".into(),
                target: None
            })
        );
        assert_eq!(
            UiAction::parse("combat-tab", attrs(&[("data-tab", "bonus")])),
            Some(UiAction::CombatTab(CombatTab::Bonus))
        );
        assert_eq!(
            UiAction::parse("open-shop", attrs(&[("data-name", "")])),
            Some(UiAction::OpenShop { merchant: None })
        );
    }

    #[test]
    fn missing_required_attributes_reject_the_action() {
        assert_eq!(UiAction::parse("chat", attrs(&[])), None);
        assert_eq!(UiAction::parse("combat-tab", attrs(&[("data-tab", "magic")])), None);
        assert_eq!(UiAction::parse("dance", attrs(&[])), None);
    }

    #[test]
    fn region_names() {
        assert_eq!(region_name(1), "Oakhaven Town");
        assert_eq!(region_name(9), "Dungeon Crawler");
    }
}

//! Corpse loot modal.

use super::{by_id, escape_html, set_html, set_text};
use crate::api::LootWindow;

pub const MODAL_ID: &str = "loot-modal";
pub const TITLE_ID: &str = "loot-title";
pub const LIST_ID: &str = "loot-list";

pub fn title(window: &LootWindow) -> String {
    format!("LOOT: {}", window.name)
}

pub fn list_html(window: &LootWindow) -> String {
    if window.loot.is_empty() {
        return "<div style=\"font-style:italic\">Empty...</div>".into();
    }
    window
        .loot
        .iter()
        .map(|item| {
            format!(
                "<div style=\"padding:5px; border-bottom:1px solid #444; display:flex; justify-content:space-between; align-items:center;\">\
                 <div style=\"display:flex; align-items:center;\">\
                 <span style=\"font-size:20px; margin-right:10px;\">{icon}</span><span>{name}</span></div>\
                 <button data-action=\"take-loot\" data-id=\"{id}\" style=\"cursor:pointer; background:#522; border:1px solid #844; color:#fcc; padding:2px 8px;\">Take</button></div>",
                icon = escape_html(item.icon.as_deref().unwrap_or("📦")),
                name = escape_html(&item.name),
                id = escape_html(item.take_key().as_str()),
            )
        })
        .collect()
}

/// What to do after a take, from the server's message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TakeOutcome {
    pub announce: bool,
    pub close: bool,
}

pub fn take_outcome(message: Option<&str>) -> TakeOutcome {
    let msg = message.unwrap_or("");
    TakeOutcome {
        announce: !msg.is_empty() && !msg.contains("Nothing left") && !msg.contains("removed"),
        close: msg == "Corpse removed." || msg == "Nothing left.",
    }
}

pub fn show(window: &LootWindow) {
    set_text(TITLE_ID, &title(window));
    set_html(LIST_ID, &list_html(window));
    if let Some(modal) = by_id(MODAL_ID) {
        modal.style().set_property("display", "block").ok();
    }
}

pub fn close() {
    if let Some(modal) = by_id(MODAL_ID) {
        modal.style().set_property("display", "none").ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{InteractResponse, Narrative};
    use crate::state::EntityId;

    fn window(json: &str) -> LootWindow {
        let resp: InteractResponse = serde_json::from_str(json).unwrap();
        match resp.narrative {
            Some(Narrative::Loot(w)) => w,
            other => panic!("expected loot window, got {other:?}"),
        }
    }

    #[test]
    fn lists_items_with_take_buttons() {
        let w = window(
            r#"{"narrative": {"type": "loot_window", "name": "Goblin", "corpse_id": 4,
                "loot": [{"id": 9, "name": "Rusty Dagger", "icon": "🗡️"}, {"id": 10, "name": "Rag"}]}}"#,
        );
        assert_eq!(title(&w), "LOOT: Goblin");
        let html = list_html(&w);
        assert_eq!(html.matches("data-action=\"take-loot\"").count(), 2);
        assert!(html.contains("🗡️"));
        assert!(html.contains("📦"));
    }

    #[test]
    fn items_without_ids_are_taken_by_name() {
        let w = window(
            r#"{"narrative": {"type": "loot_window", "name": "Bandit", "corpse_id": "c2",
                "loot": [{"name": "Gold Ring"}, {"id": 5, "name": "Torch"}]}}"#,
        );
        assert_eq!(w.loot[0].id, None);
        assert_eq!(w.loot[0].take_key(), EntityId::from("Gold Ring"));
        assert_eq!(w.loot[1].take_key(), EntityId::from("5"));
        let html = list_html(&w);
        assert!(html.contains("data-id=\"Gold Ring\""));
        assert!(html.contains("data-id=\"5\""));
    }

    #[test]
    fn empty_corpse() {
        let w = window(r#"{"narrative": {"type": "loot_window", "name": "Rat", "corpse_id": 1, "loot": []}}"#);
        assert!(list_html(&w).contains("Empty..."));
    }

    #[test]
    fn outcomes_by_message() {
        assert_eq!(
            take_outcome(Some("You take the Rusty Dagger.")),
            TakeOutcome {
                announce: true,
                close: false
            }
        );
        assert_eq!(
            take_outcome(Some("Corpse removed.")),
            TakeOutcome {
                announce: false,
                close: true
            }
        );
        assert_eq!(
            take_outcome(Some("Nothing left.")),
            TakeOutcome {
                announce: false,
                close: true
            }
        );
        assert!(!take_outcome(None).announce);
    }
}

//! Combat command panel and result playback.

use super::{MarkupCache, by_id, escape_html, patch_html, set_html};
use crate::api::CombatEvent;
use crate::render::fog::{chebyshev, euclidean};
use crate::state::{CombatState, GameState, Position};
use gloo::console;

/// Enemies further than this are not offered as targets.
pub const TARGET_RANGE: f64 = 6.0;
/// Chebyshev reach of a melee attack.
pub const MELEE_REACH: i32 = 1;

pub const PANEL_ID: &str = "combat-controls";
pub const MENU_ID: &str = "combat-menu-area";
pub const ORDER_ID: &str = "c-turn-order";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CombatTab {
    #[default]
    Move,
    Action,
    Bonus,
}

impl CombatTab {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "move" => Some(CombatTab::Move),
            "action" => Some(CombatTab::Action),
            "bonus" => Some(CombatTab::Bonus),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            CombatTab::Move => "move",
            CombatTab::Action => "action",
            CombatTab::Bonus => "bonus",
        }
    }

    fn label(self) -> &'static str {
        match self {
            CombatTab::Move => "MOVE",
            CombatTab::Action => "ACTION",
            CombatTab::Bonus => "BONUS",
        }
    }
}

/// An attack button candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    pub id: String,
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub in_reach: bool,
}

/// Living enemies within sight range, flagged by melee reach.
pub fn targets(state: &GameState) -> Vec<Target> {
    let Some(me) = state.player_pos() else {
        return Vec::new();
    };
    state
        .enemies()
        .iter()
        .filter(|e| e.is_alive() && e.xyz.same_level(&me))
        .filter(|e| euclidean(&me, &e.xyz) <= TARGET_RANGE)
        .map(|e| Target {
            id: e
                .id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            name: e.name.clone(),
            hp: e.hp,
            max_hp: e.max_hp,
            in_reach: in_melee_reach(&me, &e.xyz),
        })
        .collect()
}

pub fn in_melee_reach(me: &Position, other: &Position) -> bool {
    chebyshev(me, other) <= MELEE_REACH
}

pub fn header_html(player_turn: bool) -> String {
    let (text, color, glow) = if player_turn {
        ("YOUR COMMAND", "#5f5", "#050")
    } else {
        ("ENEMY TURN", "#f55", "#500")
    };
    format!(
        "<div style=\"text-align:center; margin-bottom:5px; border-bottom:1px solid #444; padding-bottom:5px;\">\
         <h3 style=\"margin:0; color:{color}; text-shadow:0 0 5px {glow};\">{text}</h3></div>\
         <div id=\"{MENU_ID}\" style=\"min-height:160px;\"></div>\
         <div id=\"{ORDER_ID}\" style=\"font-size:0.75em; color:#888; border-top:1px dashed #444; margin-top:5px; padding-top:2px;\"></div>"
    )
}

pub fn border_colour(player_turn: bool) -> &'static str {
    if player_turn { "#00aa00" } else { "#aa0000" }
}

pub const WAITING_HTML: &str =
    "<div style=\"text-align:center; padding-top:40px; color:#aaa; font-style:italic;\">Waiting...</div>";

pub const PROCESSING_HTML: &str =
    "<div style=\"text-align:center; padding-top:40px; color:#fff;\">Processing... <div class=\"spinner\"></div></div>";

fn tab_button(tab: CombatTab, left: i32, active: bool) -> String {
    let color = if active {
        "#fff"
    } else if left > 0 {
        "#aaa"
    } else {
        "#444"
    };
    let bg = if active { "#444" } else { "#222" };
    let border = if active { "2px solid #0ff" } else { "1px solid #333" };
    let num = if left > 0 { "#0f0" } else { "#666" };
    format!(
        "<button data-action=\"combat-tab\" data-tab=\"{key}\" style=\"flex:1; background:{bg}; color:{color}; border:{border}; padding:5px; font-size:0.8em; font-weight:bold; cursor:pointer;\">\
         {label} <span style=\"background:#000; color:{num}; padding:0 4px; border-radius:4px;\">{left}</span></button>",
        key = tab.key(),
        label = tab.label(),
    )
}

fn empty_note(text: &str) -> String {
    format!("<div style=\"text-align:center; color:#555; padding-top:20px;\">{text}</div>")
}

/// Menu body for the player's turn.
pub fn menu_html(combat: &CombatState, tab: CombatTab, targets: &[Target]) -> String {
    let mut html = String::from("<div style=\"display:flex; gap:2px; margin-bottom:10px;\">");
    html.push_str(&tab_button(CombatTab::Move, combat.moves_left, tab == CombatTab::Move));
    html.push_str(&tab_button(CombatTab::Action, combat.actions_left, tab == CombatTab::Action));
    html.push_str(&tab_button(CombatTab::Bonus, combat.bonus_actions_left, tab == CombatTab::Bonus));
    html.push_str("</div><div style=\"min-height:120px; border:1px solid #333; padding:5px; margin-bottom:5px; background:rgba(0,0,0,0.3);\">");

    match tab {
        CombatTab::Move if combat.moves_left > 0 => html.push_str(
            "<div style=\"text-align:center; padding-top:10px;\">\
             <button class=\"rpg-btn btn-move\" style=\"pointer-events:none; border-color:#fff;\">WASD / Arrows</button>\
             <p style=\"color:#aaa; font-size:0.8em; margin-top:5px;\">Move on map to spend moves.</p></div>",
        ),
        CombatTab::Move => html.push_str(&empty_note("No movement remaining.")),
        CombatTab::Action if combat.actions_left > 0 => {
            html.push_str("<div style=\"display:grid; grid-template-columns:1fr; gap:5px;\">");
            for t in targets {
                let (edge, opacity, disabled) = if t.in_reach {
                    ("#f00", "1", "")
                } else {
                    ("#555", "0.5", " disabled")
                };
                html.push_str(&format!(
                    "<button data-action=\"combat\" data-command=\"attack\" data-id=\"{id}\" class=\"rpg-list-btn\"{disabled} style=\"border-left:3px solid {edge}; opacity:{opacity}\">\
                     <div style=\"display:flex; justify-content:space-between;\"><span>⚔ {name}</span><span>{hp}/{max}</span></div></button>",
                    id = escape_html(&t.id),
                    name = escape_html(&t.name),
                    hp = t.hp,
                    max = t.max_hp,
                ));
            }
            if targets.is_empty() {
                html.push_str("<div style=\"color:#666;\">No visible targets.</div>");
            }
            html.push_str("</div>");
        }
        CombatTab::Action => html.push_str(&empty_note("Action used.")),
        CombatTab::Bonus if combat.bonus_actions_left > 0 => html.push_str(
            "<div style=\"display:flex; flex-direction:column; gap:5px;\">\
             <button data-action=\"combat\" data-command=\"second_wind\" class=\"rpg-list-btn\" style=\"border-left:3px solid #0f0;\">\
             <b>💚 Second Wind</b> <span style=\"font-size:0.8em; color:#aaa; float:right;\">Heal HP</span></button>\
             <button data-action=\"combat\" data-command=\"use_potion\" class=\"rpg-list-btn\" style=\"border-left:3px solid #ff0;\">\
             <b>🧪 Potion</b> <span style=\"font-size:0.8em; color:#aaa; float:right;\">Heal 2d4+2</span></button></div>",
        ),
        CombatTab::Bonus => html.push_str(&empty_note("Bonus action used.")),
    }

    html.push_str(
        "</div><div style=\"text-align:center;\">\
         <button data-action=\"combat\" data-command=\"end_turn\" class=\"rpg-btn\" style=\"width:100%; border:2px solid #888; background:#220000;\">END TURN 🏁</button>\
         <button data-action=\"combat\" data-command=\"flee\" style=\"margin-top:5px; background:none; border:none; color:#666; font-size:0.8em; cursor:pointer; text-decoration:underline;\">Flee Battle</button></div>",
    );
    html
}

pub fn turn_order_html(combat: &CombatState) -> String {
    combat
        .actors
        .iter()
        .enumerate()
        .map(|(i, actor)| {
            let current = combat.turn_index == Some(i);
            let (style, mark) = if current {
                ("color:#fff; background:#222; font-weight:bold;", "▶")
            } else {
                ("color:#666;", "")
            };
            format!(
                "<span style=\"{style} margin-right:5px;\">{mark}{}</span>",
                escape_html(&actor.name)
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Sync the panel with the polled combat state.
pub fn update(state: &GameState, cache: &mut MarkupCache, tab: &mut CombatTab) {
    let Some(panel) = by_id(PANEL_ID) else {
        return;
    };
    let Some(combat) = state.combat.as_ref().filter(|c| c.active) else {
        if panel.style().get_property_value("display").ok().as_deref() == Some("block") {
            console::log!("combat ended");
        }
        panel.style().set_property("display", "none").ok();
        *tab = CombatTab::default();
        cache.forget(MENU_ID);
        cache.forget(ORDER_ID);
        cache.forget("combat-frame");
        return;
    };
    panel.style().set_property("display", "block").ok();
    let player_turn = combat.is_player_turn();

    let frame = header_html(player_turn);
    if cache.changed("combat-frame", &frame) {
        let content = panel
            .query_selector(".panel-content")
            .ok()
            .flatten()
            .unwrap_or_else(|| panel.clone().into());
        content.set_inner_html(&frame);
        cache.forget(MENU_ID);
        cache.forget(ORDER_ID);
        if player_turn {
            *tab = CombatTab::default();
        }
    }

    let menu = if player_turn {
        menu_html(combat, *tab, &targets(state))
    } else {
        WAITING_HTML.to_string()
    };
    patch_html(cache, MENU_ID, &menu);
    patch_html(cache, ORDER_ID, &turn_order_html(combat));
    panel
        .style()
        .set_property("border-color", border_colour(player_turn))
        .ok();
}

/// Dim the panel and show the spinner while a command is in flight.
pub fn set_busy(busy: bool, cache: &mut MarkupCache) {
    if let Some(panel) = by_id(PANEL_ID) {
        let style = panel.style();
        style.set_property("opacity", if busy { "0.5" } else { "1" }).ok();
        style
            .set_property("pointer-events", if busy { "none" } else { "auto" })
            .ok();
    }
    if busy {
        set_html(MENU_ID, PROCESSING_HTML);
    }
    cache.forget(MENU_ID);
}

// --- Playback -----------------------------------------------------------------

/// What a single combat event turns into on screen.
#[derive(Clone, Debug, PartialEq)]
pub enum Beat {
    Log { text: String, hold_ms: u32 },
    Flash { sound: &'static str, shadow: &'static str, flash_ms: u32, hold_ms: u32 },
    Banner { title: String, content: String, color: String, duration_ms: u32, sound: Option<&'static str> },
    Skip,
}

pub const TEXT_HOLD_MS: u32 = 800;
pub const FLASH_MS: u32 = 100;
pub const ANIM_HOLD_MS: u32 = 300;
pub const BANNER_MS: u32 = 1500;

/// Popup colour picked from the title, unless the event names one.
pub fn popup_colour(title: &str, explicit: Option<&str>) -> (String, Option<&'static str>) {
    let mut color = "rgba(0, 0, 0, 0.8)";
    let mut sound = None;
    if title.contains("HIT") || title.contains("DAMAGE") {
        color = "rgba(150, 0, 0, 0.9)";
    }
    if title.contains("VICTORY") || title.contains("Player") {
        color = "rgba(0, 150, 0, 0.9)";
        sound = Some("coin");
    }
    if title.contains("MISS") {
        color = "rgba(100, 100, 0, 0.9)";
    }
    (explicit.unwrap_or(color).to_string(), sound)
}

pub fn beat_for(event: &CombatEvent) -> Beat {
    match event {
        CombatEvent::Text { message } => Beat::Log {
            text: message.clone(),
            hold_ms: TEXT_HOLD_MS,
        },
        CombatEvent::Anim { actor } => match actor.as_str() {
            "player" => Beat::Flash {
                sound: "attack",
                shadow: "inset 0 0 50px white",
                flash_ms: FLASH_MS,
                hold_ms: ANIM_HOLD_MS,
            },
            "enemy" => Beat::Flash {
                sound: "hit",
                shadow: "inset 0 0 50px red",
                flash_ms: FLASH_MS,
                hold_ms: ANIM_HOLD_MS,
            },
            _ => Beat::Skip,
        },
        CombatEvent::SwitchTurn {
            actor,
            title,
            content,
        } => {
            let enemy = actor.as_deref() == Some("enemy");
            Beat::Banner {
                title: title
                    .clone()
                    .unwrap_or_else(|| if enemy { "Enemy Turn" } else { "Player Turn" }.into()),
                content: content
                    .clone()
                    .unwrap_or_else(|| if enemy { "Attacking..." } else { "Ready!" }.into()),
                color: if enemy {
                    "rgba(100, 0, 0, 0.8)"
                } else {
                    "rgba(0, 100, 0, 0.8)"
                }
                .into(),
                duration_ms: BANNER_MS,
                sound: None,
            }
        }
        CombatEvent::Popup {
            title,
            content,
            color,
            duration,
        } => {
            let title = title.clone().unwrap_or_default();
            let (color, sound) = popup_colour(&title, color.as_deref());
            Beat::Banner {
                title,
                content: content.clone().unwrap_or_default(),
                color,
                duration_ms: duration.unwrap_or(BANNER_MS),
                sound,
            }
        }
        CombatEvent::Unknown => Beat::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Actor;

    fn state_with(enemies: &str) -> GameState {
        GameState::from_json(&format!(
            r#"{{"player":{{"xyz":[5,5,0]}},"world":{{"enemies":{enemies}}}}}"#
        ))
        .unwrap()
    }

    #[test]
    fn targets_filter_dead_far_and_other_levels() {
        let s = state_with(
            r#"[{"id":1,"xyz":[6,6,0],"hp":3,"max_hp":5,"name":"Goblin"},
                {"id":2,"xyz":[9,9,0],"hp":3,"max_hp":5,"name":"Wolf"},
                {"id":3,"xyz":[12,5,0],"hp":3,"max_hp":5,"name":"Bat"},
                {"id":4,"xyz":[5,6,0],"hp":0,"max_hp":5,"name":"Dead"},
                {"id":5,"xyz":[5,6,1],"hp":5,"max_hp":5,"name":"Below"}]"#,
        );
        let t = targets(&s);
        let names: Vec<_> = t.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Goblin", "Wolf"]);
        assert!(t[0].in_reach);
        assert!(!t[1].in_reach);
    }

    #[test]
    fn diagonal_neighbours_are_in_reach() {
        let me = Position::new(0, 0, 0);
        assert!(in_melee_reach(&me, &Position::new(1, 1, 0)));
        assert!(!in_melee_reach(&me, &Position::new(2, 0, 0)));
    }

    fn combat(moves: i32, actions: i32, bonus: i32) -> CombatState {
        CombatState {
            active: true,
            current_turn: Some("player".into()),
            moves_left: moves,
            actions_left: actions,
            bonus_actions_left: bonus,
            ..Default::default()
        }
    }

    #[test]
    fn menu_tabs_show_remaining_or_exhausted() {
        let c = combat(0, 1, 0);
        assert!(menu_html(&c, CombatTab::Move, &[]).contains("No movement remaining."));
        assert!(menu_html(&c, CombatTab::Action, &[]).contains("No visible targets."));
        assert!(menu_html(&c, CombatTab::Bonus, &[]).contains("Bonus action used."));
        assert!(menu_html(&combat(0, 0, 0), CombatTab::Action, &[]).contains("Action used."));
        let full = menu_html(&combat(3, 1, 1), CombatTab::Bonus, &[]);
        assert!(full.contains("second_wind"));
        assert!(full.contains("use_potion"));
        assert!(full.contains("END TURN"));
        assert!(full.contains("Flee Battle"));
    }

    #[test]
    fn out_of_reach_targets_are_disabled() {
        let targets = [
            Target {
                id: "1".into(),
                name: "Goblin".into(),
                hp: 3,
                max_hp: 7,
                in_reach: true,
            },
            Target {
                id: "2".into(),
                name: "Wolf".into(),
                hp: 4,
                max_hp: 4,
                in_reach: false,
            },
        ];
        let html = menu_html(&combat(0, 1, 0), CombatTab::Action, &targets);
        assert!(html.contains("3/7"));
        assert_eq!(html.matches(" disabled").count(), 1);
    }

    #[test]
    fn turn_order_marks_current_actor() {
        let mut c = combat(1, 1, 1);
        c.actors = vec![
            Actor {
                name: "Hero".into(),
                kind: Some("player".into()),
            },
            Actor {
                name: "Goblin".into(),
                kind: Some("enemy".into()),
            },
        ];
        c.turn_index = Some(1);
        let html = turn_order_html(&c);
        assert!(html.contains("▶Goblin"));
        assert!(!html.contains("▶Hero"));
        assert_eq!(html.matches(" | ").count(), 1);
    }

    #[test]
    fn header_reflects_turn() {
        assert!(header_html(true).contains("YOUR COMMAND"));
        assert!(header_html(false).contains("ENEMY TURN"));
        assert_eq!(border_colour(true), "#00aa00");
        assert_eq!(border_colour(false), "#aa0000");
    }

    #[test]
    fn popup_colours_follow_keywords() {
        assert_eq!(popup_colour("CRITICAL HIT", None).0, "rgba(150, 0, 0, 0.9)");
        assert_eq!(
            popup_colour("VICTORY", None),
            ("rgba(0, 150, 0, 0.9)".to_string(), Some("coin"))
        );
        assert_eq!(popup_colour("MISS", None).0, "rgba(100, 100, 0, 0.9)");
        assert_eq!(popup_colour("Something", None).0, "rgba(0, 0, 0, 0.8)");
        assert_eq!(popup_colour("HIT", Some("purple")).0, "purple");
    }

    #[test]
    fn events_become_beats() {
        assert_eq!(
            beat_for(&CombatEvent::Text {
                message: "Swing".into()
            }),
            Beat::Log {
                text: "Swing".into(),
                hold_ms: 800
            }
        );
        assert!(matches!(
            beat_for(&CombatEvent::Anim { actor: "enemy".into() }),
            Beat::Flash { sound: "hit", .. }
        ));
        let Beat::Banner { title, content, duration_ms, .. } = beat_for(&CombatEvent::SwitchTurn {
            actor: Some("enemy".into()),
            title: None,
            content: None,
        }) else {
            panic!("expected banner");
        };
        assert_eq!((title.as_str(), content.as_str(), duration_ms), ("Enemy Turn", "Attacking...", 1500));
        assert_eq!(beat_for(&CombatEvent::Unknown), Beat::Skip);
    }
}

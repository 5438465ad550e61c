//! "Nearby" tab: who and what the player can reach from here.

use super::{MarkupCache, escape_html, patch_html};
use crate::api::SpottedEntity;
use crate::render::fog::chebyshev;
use crate::state::{EntityId, GameState};

pub const LIST_ID: &str = "nearby-list";
pub const TALK_RANGE: i32 = 3;
pub const TOUCH_RANGE: i32 = 1;

pub const EMPTY_HTML: &str =
    "<p style=\"color: #666; font-style: italic;\">Nothing of interest...</p>";

#[derive(Clone, Debug, PartialEq)]
pub enum Nearby {
    Npc { id: EntityId, name: String, dist: i32 },
    Corpse { id: EntityId, name: String },
    Secret { id: EntityId, name: String },
}

pub fn collect(state: &GameState) -> Vec<Nearby> {
    let Some(me) = state.player_pos() else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for npc in state.npcs() {
        if !npc.xyz.same_level(&me) {
            continue;
        }
        let dist = chebyshev(&me, &npc.xyz);
        if dist <= TALK_RANGE {
            out.push(Nearby::Npc {
                id: npc.chat_id(),
                name: npc.name.clone(),
                dist,
            });
        }
    }
    for corpse in &state.corpses {
        if corpse.xyz.same_level(&me) && chebyshev(&me, &corpse.xyz) <= TOUCH_RANGE {
            out.push(Nearby::Corpse {
                id: corpse.loot_id(),
                name: corpse.name.clone().unwrap_or_else(|| "Pile of Bones".into()),
            });
        }
    }
    for secret in state.secrets() {
        // Secrets without coordinates were already filtered by the server.
        let close = secret
            .xyz
            .is_none_or(|p| p.same_level(&me) && chebyshev(&me, &p) <= TOUCH_RANGE);
        if close {
            out.push(Nearby::Secret {
                id: secret.id.clone(),
                name: secret.name.clone(),
            });
        }
    }
    out
}

fn entry_html(entry: &Nearby) -> String {
    match entry {
        Nearby::Npc { id, name, dist } => format!(
            "<div class=\"interaction-item\" style=\"border:1px solid #005500; margin-bottom:5px; padding:5px; background: #001100;\">\
             <div style=\"font-weight:bold; color:#0f0;\">{name}</div>\
             <div style=\"font-size:0.8em; color:#8f8;\">Distance: {dist}m</div>\
             <div class=\"interaction-actions\">\
             <button data-action=\"chat\" data-id=\"{id}\" data-name=\"{name}\" style=\"color:#0f0; border-color:#0f0;\">🗣 Chat</button>\
             </div></div>",
            id = escape_html(id.as_str()),
            name = escape_html(name),
        ),
        Nearby::Corpse { id, name } => format!(
            "<div class=\"interaction-item\" style=\"border:1px solid #444; margin-bottom:5px; padding:5px; background: #111;\">\
             <div style=\"font-weight:bold; color:#ccc;\">{name}</div>\
             <div class=\"interaction-actions\">\
             <button data-action=\"loot\" data-id=\"{id}\">🎒 Loot</button>\
             </div></div>",
            id = escape_html(id.as_str()),
            name = escape_html(name),
        ),
        Nearby::Secret { id, name } => format!(
            "<div class=\"interaction-item\" style=\"border:1px solid #555500; margin-bottom:5px; padding:5px; background: #111100;\">\
             <div style=\"font-weight:bold; color:#ff0;\">{name}</div>\
             <div class=\"interaction-actions\">\
             <button data-action=\"inspect\" data-id=\"{id}\">✋ Inspect</button>\
             </div></div>",
            id = escape_html(id.as_str()),
            name = escape_html(name),
        ),
    }
}

pub fn render(entries: &[Nearby]) -> String {
    if entries.is_empty() {
        return EMPTY_HTML.to_string();
    }
    entries.iter().map(entry_html).collect()
}

/// Investigation results, closest first.
pub fn render_spotted(entities: &[SpottedEntity]) -> String {
    let mut sorted: Vec<&SpottedEntity> = entities.iter().collect();
    sorted.sort_by(|a, b| a.dist.total_cmp(&b.dist));
    sorted
        .into_iter()
        .map(|e| {
            format!(
                "<div class=\"item-entry\"><strong>{}</strong> ({}m)<br><span style=\"font-size:0.8em; color:#aaa;\">{}</span></div>",
                escape_html(&e.name),
                e.dist,
                escape_html(&e.status)
            )
        })
        .collect()
}

pub fn update(state: &GameState, cache: &mut MarkupCache) {
    if state.player.is_none() {
        return;
    }
    patch_html(cache, LIST_ID, &render(&collect(state)));
}

//! NPC conversation modal and branching dialogue.

use super::{by_id, escape_html};
use crate::error::{ClientError, Result};
use wasm_bindgen::JsCast;
use web_sys::HtmlInputElement;

pub const MODAL_ID: &str = "chat-modal";
pub const HISTORY_ID: &str = "chat-history";
pub const INPUT_ID: &str = "chat-input";
pub const NAME_ID: &str = "chat-overlaid-name";
pub const PORTRAIT_ID: &str = "chat-portrait";

/// Sent on open so the NPC can greet.
pub const GREETING: &str = "__INIT__";

pub const LOADING_HTML: &str = "<div class=\"chat-message npc\">Loading...</div>";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogueOption {
    pub num: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dialogue {
    pub text: String,
    pub options: Vec<DialogueOption>,
}

/// Byte range of an option marker (`\nN. `) starting at `at`, with the digits.
fn marker_at(s: &str, at: usize) -> Option<(usize, &str)> {
    let rest = s[at..].strip_prefix('\n')?;
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let after = rest[digits..].strip_prefix('.')?;
    let ws = after.chars().next().filter(|c| c.is_whitespace())?;
    let end = at + 1 + digits + 1 + ws.len_utf8();
    Some((end, &rest[..digits]))
}

/// Split a reply into the NPC's text and numbered `N. label` options. Options
/// only start on a new line, so the first line is always text.
pub fn parse_dialogue(reply: &str) -> Dialogue {
    let markers: Vec<(usize, usize, &str)> = reply
        .match_indices('\n')
        .filter_map(|(at, _)| marker_at(reply, at).map(|(end, num)| (at, end, num)))
        .collect();
    let Some(first) = markers.first() else {
        return Dialogue {
            text: reply.to_string(),
            options: Vec::new(),
        };
    };
    let options = markers
        .iter()
        .enumerate()
        .map(|(i, (_, end, num))| {
            let stop = markers.get(i + 1).map_or(reply.len(), |next| next.0);
            DialogueOption {
                num: num.to_string(),
                label: reply[*end..stop].trim().to_string(),
            }
        })
        .collect();
    Dialogue {
        text: reply[..first.0].to_string(),
        options,
    }
}

pub fn portrait_for(npc_name: &str) -> &'static str {
    let name = npc_name.to_lowercase();
    if name.contains("elara") {
        "static/img/Sorceress.jpg"
    } else if name.contains("gareth") {
        "static/img/Warrior.jpg"
    } else if name.contains("skeleton") {
        "static/img/skeleton.png"
    } else if name.contains("troll") {
        "static/img/bones.png"
    } else {
        "static/img/player.png"
    }
}

pub fn user_line_html(msg: &str) -> String {
    format!("<div class=\"chat-message user\">{}</div>", escape_html(msg))
}

pub fn error_html(err: &str) -> String {
    format!("<div style=\"color: red;\">Error: {}</div>", escape_html(err))
}

/// NPC reply plus its option buttons and, for merchants, the trade button.
pub fn reply_html(dialogue: &Dialogue, can_trade: bool, npc_name: &str) -> String {
    let mut html = format!(
        "<div class=\"chat-message npc\">{}</div>",
        escape_html(&dialogue.text).replace('\n', "<br>")
    );
    if dialogue.options.is_empty() && !can_trade {
        return html;
    }
    html.push_str("<div style=\"margin-top:10px; display:flex; flex-direction:column; gap:5px;\">");
    if can_trade {
        html.push_str(&format!(
            "<button class=\"chat-option-btn\" data-action=\"open-shop\" data-name=\"{}\" \
             style=\"padding:8px; text-align:center; background:#2a4200; border:1px solid #480; color:#df8; font-weight:bold; cursor:pointer;\">💰 TRADE / SHOP</button>",
            escape_html(npc_name)
        ));
    }
    for opt in &dialogue.options {
        html.push_str(&format!(
            "<button class=\"chat-option-btn\" data-action=\"chat-option\" data-num=\"{num}\" data-label=\"{label}\" style=\"padding:8px; text-align:left; cursor:pointer;\">{label}</button>",
            num = escape_html(&opt.num),
            label = escape_html(&opt.label),
        ));
    }
    html.push_str("</div>");
    html
}

// --- DOM ------------------------------------------------------------------------

pub fn open(npc_name: &str) {
    if let Some(modal) = by_id(MODAL_ID) {
        modal.style().set_property("display", "flex").ok();
    }
    if let Some(name) = by_id(NAME_ID) {
        name.set_text_content(Some(npc_name));
    }
    if let Some(portrait) = by_id(PORTRAIT_ID) {
        portrait
            .style()
            .set_property("background-image", &format!("url('{}')", portrait_for(npc_name)))
            .ok();
    }
    if let Some(history) = by_id(HISTORY_ID) {
        history.set_inner_html(LOADING_HTML);
    }
    if let Ok(input) = input() {
        input.focus().ok();
    }
}

pub fn close() {
    if let Some(modal) = by_id(MODAL_ID) {
        modal.style().set_property("display", "none").ok();
    }
}

fn input() -> Result<HtmlInputElement> {
    super::require(INPUT_ID)?
        .dyn_into()
        .map_err(|_| ClientError::cast(INPUT_ID))
}

/// Take the trimmed input text and clear the box.
pub fn take_input() -> Option<String> {
    let input = input().ok()?;
    let msg = input.value().trim().to_string();
    input.set_value("");
    (!msg.is_empty()).then_some(msg)
}

/// Append markup to the history, dropping the loading placeholder first.
pub fn append(html: &str) {
    let Some(history) = by_id(HISTORY_ID) else {
        return;
    };
    if history.inner_html() == LOADING_HTML {
        history.set_inner_html("");
    }
    history.insert_adjacent_html("beforeend", html).ok();
    history.set_scroll_top(history.scroll_height());
}

pub fn set_npc_name(name: &str) {
    if let Some(el) = by_id(NAME_ID) {
        el.set_text_content(Some(name));
    }
}

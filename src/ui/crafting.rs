use super::{escape_html, set_html};
use crate::api::Recipe;
use std::collections::BTreeMap;

pub const LIST_ID: &str = "crafting-list";

pub const LOADING_HTML: &str = "<div style=\"padding:10px; color:#aaa;\">Loading recipes...</div>";

/// "2x Iron Ore, 1x Mystic Herb"
pub fn needs_line(recipe: &Recipe) -> String {
    recipe
        .ingredients
        .iter()
        .map(|(name, n)| format!("{n}x {name}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render(recipes: &BTreeMap<String, Recipe>) -> String {
    if recipes.is_empty() {
        return "<div style=\"padding:10px;\">No recipes known.</div>".into();
    }
    recipes
        .iter()
        .map(|(id, r)| {
            format!(
                "<div style=\"background:#222; padding:8px; margin-bottom:4px; border:1px solid #444;\">\
                 <div style=\"color:#d4af37; font-weight:bold;\">{name}</div>\
                 <div style=\"font-size:0.8em; color:#aaa; margin-bottom:4px;\">Needs: {needs}</div>\
                 <button data-action=\"craft\" data-id=\"{id}\" style=\"background:#400; color:#faa; border:1px solid #800; width:100%; cursor:pointer; padding:4px;\">Craft</button></div>",
                name = escape_html(&r.name),
                needs = escape_html(&needs_line(r)),
                id = escape_html(id),
            )
        })
        .collect()
}

pub fn show_loading() {
    set_html(LIST_ID, LOADING_HTML);
}

pub fn show(recipes: &BTreeMap<String, Recipe>) {
    set_html(LIST_ID, &render(recipes));
}

// Browser tests; run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use dungeon_client::state::Player;
use dungeon_client::ui::{self, MarkupCache, chat, inventory};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

fn mount(id: &str) -> HtmlElement {
    let doc = ui::document().expect("document");
    if let Some(old) = doc.get_element_by_id(id) {
        old.remove();
    }
    let el: HtmlElement = doc.create_element("div").unwrap().dyn_into().unwrap();
    el.set_id(id);
    doc.body().unwrap().append_child(&el).unwrap();
    el
}

#[wasm_bindgen_test]
fn patch_skips_unchanged_markup() {
    let el = mount("nearby-list");
    let mut cache = MarkupCache::default();
    ui::patch_html(&mut cache, "nearby-list", "<p>a</p>");
    assert_eq!(el.inner_html(), "<p>a</p>");
    // A manual edit survives an identical patch.
    el.set_inner_html("<p>edited</p>");
    ui::patch_html(&mut cache, "nearby-list", "<p>a</p>");
    assert_eq!(el.inner_html(), "<p>edited</p>");
    ui::patch_html(&mut cache, "nearby-list", "<p>b</p>");
    assert_eq!(el.inner_html(), "<p>b</p>");
}

#[wasm_bindgen_test]
fn log_appends_prefixed_entries() {
    let log = mount("narrative-log");
    ui::log_message("You enter the cellar.");
    ui::log_message("It smells of rats.");
    assert_eq!(log.child_element_count(), 2);
    assert_eq!(
        log.last_element_child().unwrap().text_content().as_deref(),
        Some("> It smells of rats.")
    );
}

#[wasm_bindgen_test]
fn chat_history_drops_loading_placeholder() {
    let history = mount(chat::HISTORY_ID);
    history.set_inner_html(chat::LOADING_HTML);
    chat::append(&chat::user_line_html("hello"));
    assert_eq!(history.child_element_count(), 1);
    assert!(history.inner_html().contains("hello"));
}

#[wasm_bindgen_test]
fn map_modal_visibility() {
    let modal = mount("map-modal");
    modal.style().set_property("display", "none").unwrap();
    assert!(!ui::is_shown("map-modal"));
    ui::set_display("map-modal", "block");
    assert!(ui::is_shown("map-modal"));
}

#[wasm_bindgen_test]
fn backpack_container_is_a_drop_zone() {
    let list = mount(inventory::BACKPACK_ID);
    let player: Player = serde_json::from_str(
        r#"{"xyz": [0, 0, 0], "inventory": [{"id": 1, "name": "Rope"}]}"#,
    )
    .unwrap();
    inventory::update(&player, &mut MarkupCache::default());
    assert_eq!(list.get_attribute("data-drop").as_deref(), Some(inventory::BACKPACK_ZONE));
    assert_eq!(list.child_element_count(), inventory::BACKPACK_CELLS as u32);
}

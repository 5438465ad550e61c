//! Dungeon client crate.
//!
//! Browser front end for the dungeon crawler server: polls `/api/state`,
//! draws the visible map on a canvas, and drives the DOM panels (nearby,
//! inventory, combat, shop, chat, loot, crafting). All game rules live on the
//! server; this crate only presents state and forwards commands.

use wasm_bindgen::prelude::*;

pub mod api;
pub mod app;
pub mod assets;
pub mod audio;
pub mod config;
pub mod error;
pub mod input;
pub mod render;
pub mod state;
pub mod ui;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use state::GameState;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Boot the client: assets, audio, renderer, input, panels, poller and frame
/// loop. Call once after the page has loaded.
#[wasm_bindgen]
pub fn start_game() -> std::result::Result<(), JsValue> {
    app::boot().map_err(JsValue::from)
}

//! Client runtime: the single `App` behind a thread-local, the state poller,
//! the frame loop, and the handlers every input and UI action ends up in.
//!
//! Async handlers never hold the `App` borrow across an `.await`; they copy
//! what they need out with [`with_app`] and write results back the same way.

use crate::api::{ApiClient, CombatEvent, CombatResult, InteractTarget, Narrative};
use crate::assets::AssetStore;
use crate::audio::Audio;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::input::{self, ClickOutcome, Direction, MoveThrottle};
use crate::render::Renderer;
use crate::render::camera::Zoom;
use crate::state::{EntityId, GameState};
use crate::ui::combat::{self as combat_ui, Beat, CombatTab};
use crate::ui::popup::{self, Popup};
use crate::ui::{
    self, MarkupCache, UiAction, chat, crafting, inventory, loot, nearby, shop,
};
use gloo::console;
use gloo::timers::callback::Interval;
use gloo::timers::future::TimeoutFuture;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

pub const MAP_MODAL_ID: &str = "map-modal";
const RESET_PROMPT: &str = "Are you sure you want to reset the world? All progress will be lost.";

struct App {
    api: ApiClient,
    renderer: Renderer,
    assets: AssetStore,
    audio: Audio,
    state: Option<GameState>,
    zoom: Zoom,
    throttle: MoveThrottle,
    markup: MarkupCache,
    combat_tab: CombatTab,
    combat_busy: bool,
    polling: bool,
    chat_npc: Option<(EntityId, String)>,
    loot_corpse: Option<EntityId>,
    shop_merchant: Option<String>,
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
    APP.with(|cell| cell.borrow_mut().as_mut().map(f))
}

fn api() -> Option<ApiClient> {
    with_app(|app| app.api.clone())
}

fn play(sound: &str) {
    with_app(|app| app.audio.play(sound));
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

// --- Boot -----------------------------------------------------------------------

pub fn boot() -> Result<()> {
    let config = ClientConfig::load();
    let assets = AssetStore::new(&config.image_base);
    assets.preload()?;
    let audio = Audio::load(&config.audio_base)?;
    audio.install()?;
    let renderer = Renderer::attach(&config.canvas_id, config.base_tile_size, config.vision_radius)?;
    input::attach(renderer.canvas())?;

    APP.with(|cell| {
        *cell.borrow_mut() = Some(App {
            api: ApiClient::new(config.api_base.clone()),
            renderer,
            assets,
            audio,
            state: None,
            zoom: Zoom::default(),
            throttle: MoveThrottle::default(),
            markup: MarkupCache::default(),
            combat_tab: CombatTab::default(),
            combat_busy: false,
            polling: false,
            chat_npc: None,
            loot_corpse: None,
            shop_merchant: None,
        })
    });

    ui::install_delegation()?;
    start_poller(config.poll_interval_ms);
    start_frame_loop();
    spawn_local(refresh());
    console::log!("dungeon client ready, polling every", config.poll_interval_ms, "ms");
    Ok(())
}

// --- Polling ----------------------------------------------------------------------

fn start_poller(interval_ms: u32) {
    Interval::new(interval_ms, || {
        // Skip the tick while the previous fetch is still out.
        let claimed = with_app(|app| !std::mem::replace(&mut app.polling, true)).unwrap_or(false);
        if claimed {
            spawn_local(async {
                refresh().await;
                with_app(|app| app.polling = false);
            });
        }
    })
    .forget();
}

/// Fetch `/api/state` and push it through the renderer and every panel.
pub async fn refresh() {
    let Some(api) = api() else {
        return;
    };
    match api.fetch_state().await {
        Ok(state) => apply_state(state),
        Err(err) => console::error!("state fetch failed:", err.to_string()),
    }
}

fn apply_state(state: GameState) {
    with_app(|app| {
        app.assets.request_npc_assets(state.npcs());
        if !app.combat_busy {
            ui::refresh_all(&state, &mut app.markup, &mut app.combat_tab);
        }
        app.state = Some(state);
    });
}

fn player_gold() -> u32 {
    with_app(|app| app.state.as_ref().and_then(|s| s.player.as_ref()).map(|p| p.gold))
        .flatten()
        .unwrap_or(0)
}

// --- Frame loop -------------------------------------------------------------------

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn request_frame(cb: &FrameCallback) {
    if let (Some(w), Some(closure)) = (web_sys::window(), cb.borrow().as_ref()) {
        let _ = w.request_animation_frame(closure.as_ref().unchecked_ref());
    }
}

fn start_frame_loop() {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |_ts: f64| {
        with_app(|app| {
            if let Some(state) = app.state.as_ref() {
                app.renderer.draw(state, app.zoom, &app.assets);
            }
        });
        request_frame(&f);
    }) as Box<dyn FnMut(f64)>));
    request_frame(&g);
}

// --- Input entry points -------------------------------------------------------------

pub fn request_move(dir: Direction) {
    let now = now_ms();
    let Some(api) = with_app(|app| app.throttle.try_begin(now).then(|| app.api.clone())).flatten()
    else {
        return;
    };
    spawn_local(async move {
        match api.move_player(dir).await {
            Ok(resp) => {
                play("step");
                if let Some(text) = resp.narrative.filter(|n| !n.is_empty()) {
                    ui::log_message(&text);
                }
            }
            Err(err) => console::warn!("move failed:", dir.as_str(), err.to_string()),
        }
        with_app(|app| app.throttle.finish());
        refresh().await;
    });
}

pub fn zoom_wheel(delta_y: f64) {
    with_app(|app| app.zoom = app.zoom.wheel(delta_y));
}

pub fn click_map(x: f64, y: f64) {
    let outcome = with_app(|app| {
        let camera = app.renderer.camera()?;
        let me = app.state.as_ref()?.player_pos()?;
        Some(input::resolve_click(&camera, &me, x, y))
    })
    .flatten();
    match outcome {
        Some(ClickOutcome::Step(dir)) => request_move(dir),
        Some(ClickOutcome::OwnTile) => ui::log_message("You are standing here."),
        None => {}
    }
}

// --- UI actions ---------------------------------------------------------------------

/// Route a UI action. `skip_prompt` bypasses confirmation dialogs (Ctrl-click
/// and drops).
pub fn dispatch(action: UiAction, skip_prompt: bool) {
    match action {
        UiAction::Chat { npc, name } => {
            with_app(|app| app.chat_npc = Some((npc.clone(), name.clone())));
            chat::open(&name);
            spawn_local(send_chat(chat::GREETING.to_string()));
        }
        UiAction::SendChat => {
            if let Some(msg) = chat::take_input() {
                chat::append(&chat::user_line_html(&msg));
                spawn_local(send_chat(msg));
            }
        }
        UiAction::ChatOption { num, label } => {
            chat::append(&chat::user_line_html(&label));
            spawn_local(send_chat(num));
        }
        UiAction::CloseChat => {
            with_app(|app| app.chat_npc = None);
            chat::close();
        }
        UiAction::OpenShop { merchant } => spawn_local(open_shop(merchant)),
        UiAction::CloseShop => ui::set_display(shop::MODAL_ID, "none"),
        UiAction::Buy { id, name, cost } => {
            if !skip_prompt && !ui::confirm(&shop::buy_prompt(&name, cost)) {
                return;
            }
            if !shop::can_afford(player_gold(), cost) {
                ui::alert("Not enough gold!");
                return;
            }
            spawn_local(trade(id, true));
        }
        UiAction::Sell { id, name, cost } => {
            if !skip_prompt && !ui::confirm(&shop::sell_prompt(&name, cost)) {
                return;
            }
            spawn_local(trade(id, false));
        }
        UiAction::Loot { corpse } => spawn_local(open_loot(corpse)),
        UiAction::TakeLoot { loot } => spawn_local(take_loot(loot)),
        UiAction::CloseLoot => loot::close(),
        UiAction::Inspect { secret } => spawn_local(inspect(secret)),
        UiAction::Interact => spawn_local(interact()),
        UiAction::Investigate => spawn_local(investigate()),
        UiAction::CombatTab(tab) => {
            with_app(|app| {
                app.combat_tab = tab;
                app.markup.forget(combat_ui::MENU_ID);
                if let Some(state) = app.state.as_ref() {
                    combat_ui::update(state, &mut app.markup, &mut app.combat_tab);
                }
            });
        }
        UiAction::Combat { action, target } => {
            let claimed =
                with_app(|app| !std::mem::replace(&mut app.combat_busy, true)).unwrap_or(false);
            if claimed {
                spawn_local(run_combat(action, target));
            }
        }
        UiAction::BagItem { id } => {
            let next = with_app(|app| {
                let player = app.state.as_ref()?.player.as_ref()?;
                inventory::bag_click(player.item(&id)?)
            })
            .flatten();
            if let Some(next) = next {
                dispatch(next, true);
            }
        }
        UiAction::Equip { id } => spawn_local(equip(id, true)),
        UiAction::Unequip { id } => spawn_local(equip(id, false)),
        UiAction::UseItem { id } => spawn_local(use_item(id)),
        UiAction::DollItem { id, name } => {
            if skip_prompt || ui::confirm(&format!("Unequip {name}?")) {
                spawn_local(equip(id, false));
            }
        }
        UiAction::PanelItem { id } => {
            let item = with_app(|app| {
                app.state
                    .as_ref()?
                    .player
                    .as_ref()?
                    .item(&id)
                    .cloned()
            })
            .flatten();
            let Some(item) = item else {
                return;
            };
            if !skip_prompt && !ui::confirm(&format!("Interact with {}?", item.name)) {
                return;
            }
            if let Some(next) = inventory::panel_click(&item) {
                dispatch(next, true);
            }
        }
        UiAction::Craft { recipe } => spawn_local(craft(recipe)),
        UiAction::Tab(tab) => ui::switch_tab(&tab),
        UiAction::CharTab(tab) => {
            play("page");
            ui::switch_char_tab(&tab);
            if tab == "crafting" {
                spawn_local(load_recipes());
            }
        }
        UiAction::ToggleMap => {
            let next = if ui::is_shown(MAP_MODAL_ID) { "none" } else { "block" };
            ui::set_display(MAP_MODAL_ID, next);
        }
        UiAction::Reset => {
            if ui::confirm(RESET_PROMPT) {
                spawn_local(reset());
            }
        }
    }
}

// --- Chat ---------------------------------------------------------------------------

async fn send_chat(message: String) {
    let Some((api, Some((npc, name)))) = with_app(|app| (app.api.clone(), app.chat_npc.clone()))
    else {
        return;
    };
    match api.chat(&npc, &message).await {
        Ok(resp) => {
            let speaker = resp.npc_name.clone().unwrap_or(name);
            if let Some(reply) = resp.reply.as_deref() {
                let dialogue = chat::parse_dialogue(reply);
                chat::append(&chat::reply_html(&dialogue, resp.can_trade, &speaker));
            }
            chat::set_npc_name(&speaker);
            refresh().await;
        }
        Err(err) => {
            console::error!("chat failed:", err.to_string());
            chat::append(&chat::error_html(&err.to_string()));
        }
    }
}

// --- Shop ---------------------------------------------------------------------------

async fn open_shop(merchant: Option<String>) {
    with_app(|app| app.shop_merchant = merchant.clone());
    shop::open_frame(merchant.as_deref().unwrap_or("Merchant"), player_gold());
    render_shop().await;
}

async fn render_shop() {
    let Some((api, merchant)) = with_app(|app| (app.api.clone(), app.shop_merchant.clone())) else {
        return;
    };
    match api.shop_list().await {
        Ok(catalog) => {
            let stock = catalog.stock(merchant.as_deref());
            with_app(|app| {
                let player = app.state.as_ref().and_then(|s| s.player.as_ref());
                shop::render(&stock, player);
            });
        }
        Err(err) => {
            console::error!("shop list failed:", err.to_string());
            ui::set_html(shop::STOCK_ID, shop::ERROR_HTML);
        }
    }
}

async fn trade(id: EntityId, buying: bool) {
    let Some(api) = api() else {
        return;
    };
    let result = if buying {
        api.shop_buy(&id).await
    } else {
        api.shop_sell(&id).await
    };
    match result {
        Ok(resp) => {
            if let Some(msg) = resp.text() {
                ui::log_message(msg);
            }
        }
        Err(err) => {
            console::error!("trade failed:", err.to_string());
            return;
        }
    }
    refresh().await;
    shop::set_gold(player_gold());
    render_shop().await;
    play("coin");
}

// --- World interaction --------------------------------------------------------------

async fn open_loot(corpse: EntityId) {
    let Some(api) = api() else {
        return;
    };
    match api.interact_specific(&InteractTarget::loot_corpse(corpse)).await {
        Ok(resp) => match resp.narrative {
            Some(Narrative::Loot(window)) => {
                with_app(|app| app.loot_corpse = Some(window.corpse_id.clone()));
                loot::show(&window);
            }
            Some(Narrative::Text(text)) => ui::alert(&text),
            Some(Narrative::Other(value)) => ui::alert(&value.to_string()),
            None => {}
        },
        Err(err) => console::error!("loot failed:", err.to_string()),
    }
    refresh().await;
}

async fn take_loot(item: EntityId) {
    let Some((api, Some(corpse))) = with_app(|app| (app.api.clone(), app.loot_corpse.clone()))
    else {
        return;
    };
    let resp = match api.take_loot(&corpse, &item).await {
        Ok(resp) => resp,
        Err(err) => {
            console::error!("take failed:", err.to_string());
            return;
        }
    };
    let outcome = loot::take_outcome(resp.message.as_deref());
    if outcome.announce {
        let msg = resp.message.clone().unwrap_or_default();
        spawn_local(popup::show(
            Popup::new("ACQUIRED", ui::escape_html(&msg)).color("rgba(0, 100, 0, 0.8)"),
        ));
        play("coin");
    }
    if outcome.close {
        loot::close();
        with_app(|app| app.loot_corpse = None);
        refresh().await;
    } else {
        open_loot(corpse).await;
    }
}

fn log_narrative(narrative: Option<Narrative>) {
    match narrative {
        Some(Narrative::Text(text)) => ui::log_message(&text),
        Some(Narrative::Loot(window)) => {
            with_app(|app| app.loot_corpse = Some(window.corpse_id.clone()));
            loot::show(&window);
        }
        Some(Narrative::Other(value)) => ui::log_message(&value.to_string()),
        None => {}
    }
}

async fn inspect(secret: EntityId) {
    let Some(api) = api() else {
        return;
    };
    match api.interact_specific(&InteractTarget::inspect_secret(secret)).await {
        Ok(resp) => log_narrative(resp.narrative),
        Err(err) => console::error!("inspect failed:", err.to_string()),
    }
    refresh().await;
}

async fn interact() {
    let Some(api) = api() else {
        return;
    };
    match api.interact().await {
        Ok(resp) => {
            if let Some(text) = resp.narrative {
                ui::log_message(&text);
            }
        }
        Err(err) => console::error!("interact failed:", err.to_string()),
    }
    refresh().await;
}

async fn investigate() {
    let Some(api) = api() else {
        return;
    };
    ui::log_message("Investigating surroundings...");
    match api.investigate().await {
        Ok(resp) => {
            if let Some(text) = resp.narrative.as_deref() {
                ui::log_message(text);
            }
            if resp.entities.is_empty() {
                ui::log_message("You find nothing new nearby.");
            } else {
                ui::set_html(nearby::LIST_ID, &nearby::render_spotted(&resp.entities));
                with_app(|app| app.markup.forget(nearby::LIST_ID));
                ui::switch_tab("nearby");
            }
        }
        Err(err) => {
            console::error!("investigate failed:", err.to_string());
            ui::log_message("Failed to investigate.");
        }
    }
}

// --- Combat -------------------------------------------------------------------------

async fn run_combat(action: String, target: Option<EntityId>) {
    let Some(api) = api() else {
        return;
    };
    with_app(|app| combat_ui::set_busy(true, &mut app.markup));
    match api.combat_action(&action, target.as_ref()).await {
        Ok(resp) => {
            match resp.result {
                Some(CombatResult::Events { events }) => play_events(&events).await,
                Some(CombatResult::Text(text)) => ui::log_message(&text),
                None => {}
            }
            if let Some(text) = resp.narrative {
                ui::log_message(&text);
            }
        }
        Err(err) => {
            console::error!("combat action failed:", err.to_string());
            ui::log_message(&format!("Action failed: {err}"));
        }
    }
    with_app(|app| {
        app.combat_busy = false;
        combat_ui::set_busy(false, &mut app.markup);
    });
    refresh().await;
}

async fn play_events(events: &[CombatEvent]) {
    for event in events {
        match combat_ui::beat_for(event) {
            Beat::Log { text, hold_ms } => {
                ui::log_message(&text);
                TimeoutFuture::new(hold_ms).await;
            }
            Beat::Flash {
                sound,
                shadow,
                flash_ms,
                hold_ms,
            } => {
                play(sound);
                flash(shadow, flash_ms);
                TimeoutFuture::new(hold_ms).await;
            }
            Beat::Banner {
                title,
                content,
                color,
                duration_ms,
                sound,
            } => {
                if let Some(sound) = sound {
                    play(sound);
                }
                popup::show(Popup::new(title, content).color(color).duration(duration_ms)).await;
            }
            Beat::Skip => {}
        }
    }
}

fn flash(shadow: &'static str, ms: u32) {
    let Some(body) = ui::document().and_then(|d| d.body()) else {
        return;
    };
    body.style().set_property("box-shadow", shadow).ok();
    spawn_local(async move {
        TimeoutFuture::new(ms).await;
        body.style().set_property("box-shadow", "none").ok();
    });
}

// --- Inventory and crafting ---------------------------------------------------------

async fn equip(id: EntityId, equipping: bool) {
    let Some(api) = api() else {
        return;
    };
    let result = if equipping {
        api.equip(&id).await
    } else {
        api.unequip(&id).await
    };
    match result {
        Ok(_) => play("equip"),
        Err(err) => console::error!("equip failed:", err.to_string()),
    }
    refresh().await;
}

async fn use_item(id: EntityId) {
    let Some(api) = api() else {
        return;
    };
    match api.use_item(&id).await {
        Ok(resp) => {
            if let Some(msg) = resp.text() {
                ui::alert(msg);
            }
        }
        Err(err) => console::error!("use failed:", err.to_string()),
    }
    refresh().await;
}

async fn load_recipes() {
    let Some(api) = api() else {
        return;
    };
    crafting::show_loading();
    match api.craft_list().await {
        Ok(recipes) => crafting::show(&recipes),
        Err(err) => console::error!("recipe list failed:", err.to_string()),
    }
}

async fn craft(recipe: String) {
    let Some(api) = api() else {
        return;
    };
    match api.craft(&recipe).await {
        Ok(resp) => {
            if let Some(msg) = resp.text() {
                ui::alert(msg);
            }
        }
        Err(err) => console::error!("craft failed:", err.to_string()),
    }
    refresh().await;
}

async fn reset() {
    let Some(api) = api() else {
        return;
    };
    if let Err(err) = api.reset().await {
        console::error!("reset failed:", err.to_string());
        return;
    }
    if let Err(err) = reload() {
        console::error!("reload failed:", err.to_string());
    }
}

fn reload() -> Result<()> {
    web_sys::window()
        .ok_or(ClientError::NoWindow)?
        .location()
        .reload()?;
    Ok(())
}

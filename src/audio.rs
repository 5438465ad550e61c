//! Sound effects and background music.

use crate::error::{ClientError, Result};
use gloo::console;
use gloo::events::EventListener;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::{HtmlAudioElement, HtmlElement};

pub const BGM: &str = "bgm_dungeon";
pub const EFFECT_VOLUME: f64 = 0.4;
pub const BGM_VOLUME: f64 = 0.2;

pub const SOUND_BANK: &[(&str, &str)] = &[
    (BGM, "bgm_dungeon.ogg"),
    ("step", "step.ogg"),
    ("door", "door.ogg"),
    ("attack", "attack_sword.ogg"),
    ("hit", "hit_blunt.ogg"),
    ("coin", "coin.ogg"),
    ("equip", "equip.ogg"),
    ("page", "page.ogg"),
    ("click", "click.ogg"),
    ("mining", "mining.ogg"),
];

pub fn mute_label(muted: bool) -> &'static str {
    if muted { "🔇 OFF" } else { "🔊 ON" }
}

struct Bank {
    sounds: HashMap<&'static str, HtmlAudioElement>,
    warned: RefCell<HashSet<String>>,
    muted: Cell<bool>,
}

/// Shared audio handle; clones play through the same bank.
#[derive(Clone)]
pub struct Audio {
    bank: Rc<Bank>,
}

impl Audio {
    pub fn load(audio_base: &str) -> Result<Self> {
        let mut sounds = HashMap::new();
        for (name, file) in SOUND_BANK {
            let el = HtmlAudioElement::new_with_src(&format!("{audio_base}{file}"))?;
            el.set_volume(EFFECT_VOLUME);
            sounds.insert(*name, el);
        }
        if let Some(bgm) = sounds.get(BGM) {
            bgm.set_loop(true);
            bgm.set_volume(BGM_VOLUME);
        }
        Ok(Self {
            bank: Rc::new(Bank {
                sounds,
                warned: RefCell::new(HashSet::new()),
                muted: Cell::new(false),
            }),
        })
    }

    pub fn is_muted(&self) -> bool {
        self.bank.muted.get()
    }

    /// Fire a one-shot effect on a cloned node so rapid repeats overlap.
    pub fn play(&self, name: &str) {
        if self.is_muted() || name == BGM {
            return;
        }
        let Some(sound) = self.bank.sounds.get(name) else {
            if self.bank.warned.borrow_mut().insert(name.to_string()) {
                console::warn!("unknown sound", name.to_string());
            }
            return;
        };
        let Ok(node) = sound.clone_node() else {
            return;
        };
        if let Ok(clone) = node.dyn_into::<HtmlAudioElement>() {
            clone.set_volume(EFFECT_VOLUME);
            // Rejections here are autoplay refusals; nothing to do about them.
            let _ = clone.play();
        }
    }

    fn start_bgm(&self) {
        if self.is_muted() {
            return;
        }
        if let Some(bgm) = self.bank.sounds.get(BGM) {
            let _ = bgm.play();
        }
    }

    pub fn toggle_mute(&self) -> bool {
        let muted = !self.is_muted();
        self.bank.muted.set(muted);
        if let Some(bgm) = self.bank.sounds.get(BGM) {
            if muted {
                let _ = bgm.pause();
            } else {
                let _ = bgm.play();
            }
        }
        muted
    }

    /// Add the fixed mute toggle and start music on the first click or key.
    pub fn install(&self) -> Result<()> {
        let doc = web_sys::window()
            .ok_or(ClientError::NoWindow)?
            .document()
            .ok_or(ClientError::NoDocument)?;
        let toggle: HtmlElement = doc
            .create_element("div")?
            .dyn_into()
            .map_err(|_| ClientError::cast("div"))?;
        toggle.set_id("mute-toggle");
        toggle.set_attribute(
            "style",
            "position:fixed; bottom:10px; left:10px; z-index:1000; cursor:pointer; padding:5px 10px; background:rgba(0,0,0,0.7); border:1px solid #444; color:gold; font-family:monospace;",
        )?;
        toggle.set_text_content(Some(mute_label(false)));
        doc.body().ok_or(ClientError::NoDocument)?.append_child(&toggle)?;

        let audio = self.clone();
        let label = toggle.clone();
        EventListener::new(&toggle, "click", move |_| {
            let muted = audio.toggle_mute();
            label.set_text_content(Some(mute_label(muted)));
        })
        .forget();

        let unlocked = Rc::new(Cell::new(false));
        for event in ["click", "keydown"] {
            let audio = self.clone();
            let unlocked = unlocked.clone();
            EventListener::once(&doc, event, move |_| {
                if !unlocked.replace(true) {
                    audio.start_bgm();
                }
            })
            .forget();
        }
        Ok(())
    }
}

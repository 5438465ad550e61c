//! Sprite loading. Images are fetched once, keyed for transparency where needed,
//! and kept as offscreen canvases ready for `drawImage`.

use crate::error::{ClientError, Result};
use crate::render::sprites::{SpriteSource, npc_asset_key};
use crate::state::Npc;
use gloo::console;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, ImageData};

/// Sprites preloaded at boot: key → file under the image base.
pub const MANIFEST: &[(&str, &str)] = &[
    ("floor", "floor.png"),
    ("floor_wood", "floor_wood.png"),
    ("wall", "wall_grey.png"),
    ("wall_grey", "wall_grey.png"),
    ("wall_house", "wall_house.png"),
    ("door", "door.png"),
    ("grass", "grass.png"),
    ("water", "water.png"),
    ("rock", "rock.png"),
    ("tree", "tree.png"),
    ("fountain", "fountain.png"),
    ("flower_pot", "flower_pot.png"),
    ("street_lamp", "street_lamp.png"),
    ("signpost", "signpost.png"),
    ("barrel", "barrel.png"),
    ("crate", "crate.png"),
    ("anvil", "anvil.png"),
    ("shelf", "shelf.png"),
    ("player", "player.png"),
    ("skeleton", "Skeleton.png"),
    ("chest", "chest.png"),
    ("open_door", "door.png"),
    ("bones", "bones.png"),
    ("elara", "elara_transparent.png"),
    ("seraphina", "seraphina.png"),
    ("elder", "elder.png"),
    ("warrior2", "warrior2.png"),
    ("herb", "herb.png"),
    ("bear", "bear.png"),
    ("wolf", "wolf.png"),
    ("mountain_entrance", "mountain_entrance.png"),
    ("fire_guardian", "fire_guardian.png"),
    ("door_stone", "door_stone.png"),
    ("mtn_tl", "mtn_tl.png"),
    ("mtn_tm", "mtn_tm.png"),
    ("mtn_tr", "mtn_tr.png"),
    ("mtn_ml", "mtn_ml.png"),
    ("mtn_mm", "mtn_mm.png"),
    ("mtn_mr", "mtn_mr.png"),
    ("mtn_bl", "mtn_bl.png"),
    ("mtn_br", "mtn_br.png"),
    ("knife_goblin", "knife_goblin.png"),
    ("goblin_scout", "goblin_scout.png"),
    ("floor_volcanic", "floor_volcanic.png"),
    ("wall_volcanic", "wall_volcanic.png"),
    ("steam_vent", "steam_vent.png"),
    ("cinder_hound", "cinder_hound.png"),
    ("obsidian_sentinel", "obsidian_sentinel.png"),
    ("sulfur_bat", "sulfur_bat.png"),
    ("magma_weaver", "magma_weaver.png"),
];

// --- Chroma key ---------------------------------------------------------------

/// White, flat grey or magenta backdrop pixel.
pub fn is_background_pixel(r: u8, g: u8, b: u8) -> bool {
    let white = r > 240 && g > 240 && b > 240;
    let grey = r > 150
        && r < 240
        && r.abs_diff(g) < 3
        && g.abs_diff(b) < 3
        && r.abs_diff(b) < 3;
    let magenta = r > 250 && g < 5 && b > 250;
    white || grey || magenta
}

/// Zero the alpha of every backdrop pixel in an RGBA buffer. Returns how many
/// pixels were keyed out.
pub fn apply_chroma_key(rgba: &mut [u8]) -> usize {
    let mut keyed = 0;
    for px in rgba.chunks_exact_mut(4) {
        if is_background_pixel(px[0], px[1], px[2]) {
            px[3] = 0;
            keyed += 1;
        }
    }
    keyed
}

/// Ground tiles are drawn opaque; everything else gets keyed.
pub fn needs_transparency(key: &str) -> bool {
    !(key == "floor" || key.contains("wall") || key.contains("grass"))
}

pub fn versioned_url(base: &str, file: &str, version: u64) -> String {
    format!("{base}{file}?v={version}")
}

// --- Store --------------------------------------------------------------------

#[derive(Default)]
struct Slots {
    ready: HashMap<String, HtmlCanvasElement>,
    pending: HashSet<String>,
    failed: HashSet<String>,
}

/// Shared handle to every loaded sprite. Clones point at the same cache.
#[derive(Clone)]
pub struct AssetStore {
    base: String,
    version: u64,
    slots: Rc<RefCell<Slots>>,
}

impl AssetStore {
    pub fn new(image_base: &str) -> Self {
        Self {
            base: image_base.to_string(),
            version: js_sys::Date::now() as u64,
            slots: Rc::new(RefCell::new(Slots::default())),
        }
    }

    pub fn preload(&self) -> Result<()> {
        for (key, file) in MANIFEST {
            self.request(key, file)?;
        }
        Ok(())
    }

    /// Start loading `key` unless it is loaded, loading, or known to fail.
    pub fn request(&self, key: &str, file: &str) -> Result<()> {
        {
            let mut slots = self.slots.borrow_mut();
            if slots.ready.contains_key(key)
                || slots.pending.contains(key)
                || slots.failed.contains(key)
            {
                return Ok(());
            }
            slots.pending.insert(key.to_string());
        }

        let img = HtmlImageElement::new()?;
        img.set_cross_origin(Some("anonymous"));

        let onload = {
            let slots = self.slots.clone();
            let img = img.clone();
            let key = key.to_string();
            Closure::wrap(Box::new(move || {
                let mut slots = slots.borrow_mut();
                slots.pending.remove(&key);
                match bake(&img, needs_transparency(&key)) {
                    Ok(canvas) => {
                        slots.ready.insert(key.clone(), canvas);
                    }
                    Err(err) => {
                        console::warn!("sprite processing failed", key.clone(), err.to_string());
                        slots.failed.insert(key.clone());
                    }
                }
            }) as Box<dyn FnMut()>)
        };
        let onerror = {
            let slots = self.slots.clone();
            let key = key.to_string();
            let url = versioned_url(&self.base, file, self.version);
            Closure::wrap(Box::new(move || {
                let mut slots = slots.borrow_mut();
                slots.pending.remove(&key);
                if slots.failed.insert(key.clone()) {
                    console::warn!("sprite failed to load", key.clone(), url.clone());
                }
            }) as Box<dyn FnMut()>)
        };
        img.set_onload(Some(onload.as_ref().unchecked_ref()));
        img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onload.forget();
        onerror.forget();
        img.set_src(&versioned_url(&self.base, file, self.version));
        Ok(())
    }

    /// Lazily fetch portraits named by the server that the manifest lacks.
    pub fn request_npc_assets(&self, npcs: &[Npc]) {
        for npc in npcs {
            let (Some(file), Some(key)) = (npc.asset.as_deref(), npc_asset_key(npc)) else {
                continue;
            };
            if let Err(err) = self.request(key, file) {
                console::warn!("could not queue sprite", key.to_string(), err.to_string());
            }
        }
    }

    pub fn image(&self, key: &str) -> Option<HtmlCanvasElement> {
        self.slots.borrow().ready.get(key).cloned()
    }

    pub fn loaded_count(&self) -> usize {
        self.slots.borrow().ready.len()
    }
}

impl SpriteSource for AssetStore {
    fn has(&self, key: &str) -> bool {
        self.slots.borrow().ready.contains_key(key)
    }
}

/// Copy a decoded image onto its own canvas, keying out the backdrop if asked.
fn bake(img: &HtmlImageElement, key_out: bool) -> Result<HtmlCanvasElement> {
    let (w, h) = (img.natural_width(), img.natural_height());
    if w == 0 || h == 0 {
        return Err(ClientError::Js("image has no pixels".into()));
    }
    let document = web_sys::window()
        .ok_or(ClientError::NoWindow)?
        .document()
        .ok_or(ClientError::NoDocument)?;
    let canvas: HtmlCanvasElement = document
        .create_element("canvas")?
        .dyn_into()
        .map_err(|_| ClientError::cast("canvas"))?;
    canvas.set_width(w);
    canvas.set_height(h);
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| ClientError::Js("no 2d context".into()))?
        .dyn_into()
        .map_err(|_| ClientError::cast("2d context"))?;
    ctx.draw_image_with_html_image_element(img, 0.0, 0.0)?;
    if key_out {
        let mut pixels = ctx.get_image_data(0.0, 0.0, w as f64, h as f64)?.data().0;
        apply_chroma_key(&mut pixels);
        let keyed = ImageData::new_with_u8_clamped_array_and_sh(Clamped(pixels.as_slice()), w, h)?;
        ctx.put_image_data(&keyed, 0.0, 0.0)?;
    }
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backdrop_colours_are_detected() {
        assert!(is_background_pixel(255, 255, 255));
        assert!(is_background_pixel(241, 241, 241));
        assert!(!is_background_pixel(240, 255, 255));
        assert!(is_background_pixel(200, 201, 202));
        assert!(!is_background_pixel(200, 203, 200));
        assert!(!is_background_pixel(150, 150, 150));
        assert!(!is_background_pixel(240, 240, 240));
        assert!(is_background_pixel(255, 0, 255));
        assert!(!is_background_pixel(255, 5, 255));
        assert!(!is_background_pixel(30, 120, 40));
    }

    #[test]
    fn chroma_key_only_touches_alpha_of_backdrop() {
        let mut buf = vec![
            255, 255, 255, 255, //
            10, 20, 30, 255, //
            255, 0, 255, 200, //
        ];
        assert_eq!(apply_chroma_key(&mut buf), 2);
        assert_eq!(buf, vec![255, 255, 255, 0, 10, 20, 30, 255, 255, 0, 255, 0]);
    }

    #[test]
    fn ground_tiles_stay_opaque() {
        assert!(!needs_transparency("floor"));
        assert!(!needs_transparency("wall_volcanic"));
        assert!(!needs_transparency("grass"));
        assert!(needs_transparency("floor_wood"));
        assert!(needs_transparency("skeleton"));
    }

    #[test]
    fn manifest_keys_are_unique() {
        let keys: HashSet<&str> = MANIFEST.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys.len(), MANIFEST.len());
        assert_eq!(versioned_url("/static/img/", "floor.png", 7), "/static/img/floor.png?v=7");
    }
}

//! Canvas renderer. Frame planning lives in [`frame`]; this module only owns the
//! canvas, keeps it sized to the window, and replays draw ops onto it.

pub mod camera;
pub mod fog;
pub mod frame;
pub mod sprites;

use crate::assets::AssetStore;
use crate::error::{ClientError, Result};
use crate::state::GameState;
use camera::{Camera, Zoom};
use frame::{DrawOp, FrameParams, plan_frame};
use std::f64::consts::TAU;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

pub struct Renderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    base_tile: f64,
    vision_radius: i32,
    camera: Option<Camera>,
}

impl Renderer {
    /// Attach to the canvas with `canvas_id`, creating a full-window one if the
    /// page does not have it.
    pub fn attach(canvas_id: &str, base_tile: f64, vision_radius: i32) -> Result<Self> {
        let window = web_sys::window().ok_or(ClientError::NoWindow)?;
        let doc = window.document().ok_or(ClientError::NoDocument)?;
        let canvas: HtmlCanvasElement = match doc.get_element_by_id(canvas_id) {
            Some(el) => el.dyn_into().map_err(|_| ClientError::cast(canvas_id))?,
            None => {
                let c: HtmlCanvasElement = doc
                    .create_element("canvas")?
                    .dyn_into()
                    .map_err(|_| ClientError::cast("canvas"))?;
                c.set_id(canvas_id);
                c.set_attribute("style", "position:fixed; left:0; top:0; z-index:0;")?;
                doc.body().ok_or(ClientError::NoDocument)?.append_child(&c)?;
                c
            }
        };
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| ClientError::Js("no 2d context".into()))?
            .dyn_into()
            .map_err(|_| ClientError::cast("2d context"))?;
        Ok(Self {
            canvas,
            ctx,
            base_tile,
            vision_radius,
            camera: None,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Camera of the last drawn frame; `None` until a state with a player has
    /// been rendered.
    pub fn camera(&self) -> Option<Camera> {
        self.camera
    }

    fn fit_to_window(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as u32;
        let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as u32;
        if w > 0 && (self.canvas.width() != w || self.canvas.height() != h) {
            self.canvas.set_width(w);
            self.canvas.set_height(h);
        }
    }

    pub fn draw(&mut self, state: &GameState, zoom: Zoom, assets: &AssetStore) {
        self.fit_to_window();
        let params = FrameParams {
            width: self.canvas.width() as f64,
            height: self.canvas.height() as f64,
            zoom,
            base_tile: self.base_tile,
            vision_radius: self.vision_radius,
        };
        let mut rng = js_sys::Math::random;
        let frame = plan_frame(state, &params, assets, &mut rng);
        self.ctx.set_image_smoothing_enabled(false);
        for op in &frame.ops {
            self.exec(op, &params, assets);
        }
        self.camera = frame.camera;
    }

    fn exec(&self, op: &DrawOp, params: &FrameParams, assets: &AssetStore) {
        let ctx = &self.ctx;
        match op {
            DrawOp::Clear { color } => {
                ctx.set_fill_style_str(color);
                ctx.fill_rect(0.0, 0.0, params.width, params.height);
            }
            DrawOp::FillRect { x, y, w, h, color } => {
                ctx.set_fill_style_str(color);
                ctx.fill_rect(*x, *y, *w, *h);
            }
            DrawOp::StrokeRect {
                x,
                y,
                w,
                h,
                color,
                line_width,
            } => {
                ctx.set_stroke_style_str(color);
                ctx.set_line_width(*line_width);
                ctx.stroke_rect(*x, *y, *w, *h);
            }
            DrawOp::FillCircle { cx, cy, r, color } => {
                ctx.set_fill_style_str(color);
                ctx.begin_path();
                ctx.arc(*cx, *cy, *r, 0.0, TAU).ok();
                ctx.fill();
            }
            DrawOp::Sprite { key, x, y, size } => {
                if let Some(img) = assets.image(key) {
                    ctx.draw_image_with_html_canvas_element_and_dw_and_dh(&img, *x, *y, *size, *size)
                        .ok();
                }
            }
            DrawOp::Text {
                text,
                x,
                y,
                font_px,
                color,
            } => {
                ctx.set_fill_style_str(color);
                ctx.set_font(&format!("{font_px}px Arial"));
                ctx.set_text_align("center");
                ctx.fill_text(text, *x, *y).ok();
                ctx.set_text_align("start");
            }
        }
    }
}

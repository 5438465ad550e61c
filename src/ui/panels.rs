//! Floating panels: drag by `.drag-handle`, collapse with `.minimize-btn`.

use crate::error::Result;
use gloo::events::EventListener;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, MouseEvent};

/// Pointer-drag bookkeeping for one panel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Drag {
    start: Option<(f64, f64)>,
    origin: (f64, f64),
}

impl Drag {
    pub fn begin(&mut self, pointer: (f64, f64), panel_origin: (f64, f64)) {
        self.start = Some(pointer);
        self.origin = panel_origin;
    }

    /// Panel `(left, top)` for the pointer at `pointer`, while dragging.
    pub fn position(&self, pointer: (f64, f64)) -> Option<(f64, f64)> {
        let (sx, sy) = self.start?;
        Some((self.origin.0 + pointer.0 - sx, self.origin.1 + pointer.1 - sy))
    }

    /// Returns whether a drag was in progress.
    pub fn end(&mut self) -> bool {
        self.start.take().is_some()
    }

    pub fn active(&self) -> bool {
        self.start.is_some()
    }
}

/// Saved `(left, top)` of a minimised panel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Restore {
    left: String,
    top: String,
}

/// Top of a collapsed panel so it rests on the window's bottom edge.
pub fn docked_top(window_height: f64, panel_height: f64) -> f64 {
    (window_height - panel_height).max(0.0)
}

fn px(v: f64) -> String {
    format!("{v}px")
}

fn style_px(el: &HtmlElement, prop: &str) -> Option<f64> {
    el.style()
        .get_property_value(prop)
        .ok()?
        .trim_end_matches("px")
        .parse()
        .ok()
}

pub fn install_draggables(doc: &Document) -> Result<()> {
    let panels = doc.query_selector_all(".draggable-panel")?;
    for i in 0..panels.length() {
        if let Some(panel) = panels.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) {
            make_draggable(doc, panel)?;
        }
    }
    Ok(())
}

fn make_draggable(doc: &Document, panel: HtmlElement) -> Result<()> {
    let Some(handle) = panel
        .query_selector(".drag-handle")?
        .and_then(|h| h.dyn_into::<HtmlElement>().ok())
    else {
        return Ok(());
    };
    let drag = Rc::new(RefCell::new(Drag::default()));

    {
        let (drag, panel, grip) = (drag.clone(), panel.clone(), handle.clone());
        EventListener::new(&handle, "mousedown", move |event| {
            let Some(evt) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let rect = panel.get_bounding_client_rect();
            let style = panel.style();
            // Anchor on left/top before moving.
            let right = style.get_property_value("right").unwrap_or_default();
            if !right.is_empty() && right != "auto" {
                style.set_property("width", &px(rect.width())).ok();
                style.set_property("right", "auto").ok();
                style.set_property("left", &px(rect.left())).ok();
            }
            let transform = style.get_property_value("transform").unwrap_or_default();
            if !transform.is_empty() && transform != "none" {
                style.set_property("transform", "none").ok();
                style.set_property("left", &px(rect.left())).ok();
                style.set_property("top", &px(rect.top())).ok();
            }
            let origin = (
                style_px(&panel, "left").unwrap_or(rect.left()),
                style_px(&panel, "top").unwrap_or(rect.top()),
            );
            drag.borrow_mut()
                .begin((f64::from(evt.client_x()), f64::from(evt.client_y())), origin);
            grip.style().set_property("cursor", "grabbing").ok();
            if let Some(body) = super::document().and_then(|d| d.body()) {
                body.style().set_property("user-select", "none").ok();
            }
        })
        .forget();
    }

    {
        let (drag, panel) = (drag.clone(), panel.clone());
        EventListener::new(doc, "mousemove", move |event| {
            let Some(evt) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let pointer = (f64::from(evt.client_x()), f64::from(evt.client_y()));
            if let Some((left, top)) = drag.borrow().position(pointer) {
                let style = panel.style();
                style.set_property("left", &px(left)).ok();
                style.set_property("top", &px(top)).ok();
            }
        })
        .forget();
    }

    {
        let (drag, grip) = (drag.clone(), handle.clone());
        EventListener::new(doc, "mouseup", move |_| {
            if drag.borrow_mut().end() {
                grip.style().set_property("cursor", "move").ok();
                if let Some(body) = super::document().and_then(|d| d.body()) {
                    body.style().remove_property("user-select").ok();
                }
            }
        })
        .forget();
    }

    if let Some(button) = handle
        .query_selector(".minimize-btn")?
        .and_then(|b| b.dyn_into::<HtmlElement>().ok())
    {
        install_minimize(panel, button);
    }
    Ok(())
}

fn install_minimize(panel: HtmlElement, button: HtmlElement) {
    let restore = Rc::new(RefCell::new(Restore::default()));
    let target = button.clone();
    EventListener::new(&target, "click", move |event| {
        event.stop_propagation();
        let Some(content) = panel
            .query_selector(".panel-content")
            .ok()
            .flatten()
            .or_else(|| panel.query_selector("#log-content").ok().flatten())
            .and_then(|c| c.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        let style = panel.style();
        let collapsed = content.style().get_property_value("display").ok().as_deref() == Some("none");
        if collapsed {
            content.style().set_property("display", "block").ok();
            button.set_text_content(Some("_"));
            style.set_property("height", "auto").ok();
            let saved = restore.borrow();
            if !saved.top.is_empty() {
                style.set_property("top", &saved.top).ok();
            }
            if !saved.left.is_empty() {
                style.set_property("left", &saved.left).ok();
            }
        } else {
            let rect = panel.get_bounding_client_rect();
            let or_rect = |prop: &str, fallback: f64| {
                style
                    .get_property_value(prop)
                    .ok()
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| px(fallback))
            };
            *restore.borrow_mut() = Restore {
                left: or_rect("left", rect.left()),
                top: or_rect("top", rect.top()),
            };
            content.style().set_property("display", "none").ok();
            button.set_text_content(Some("□"));
            style.set_property("height", "auto").ok();
            let window_height = web_sys::window()
                .and_then(|w| w.inner_height().ok())
                .and_then(|h| h.as_f64())
                .unwrap_or(0.0);
            let top = docked_top(window_height, f64::from(panel.offset_height()));
            style.set_property("top", &px(top)).ok();
        }
    })
    .forget();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_tracks_pointer_delta() {
        let mut d = Drag::default();
        assert_eq!(d.position((5.0, 5.0)), None);
        d.begin((100.0, 100.0), (20.0, 30.0));
        assert!(d.active());
        assert_eq!(d.position((110.0, 90.0)), Some((30.0, 20.0)));
        assert!(d.end());
        assert!(!d.end());
        assert_eq!(d.position((110.0, 90.0)), None);
    }

    #[test]
    fn docking_never_goes_above_top() {
        assert_eq!(docked_top(800.0, 40.0), 760.0);
        assert_eq!(docked_top(30.0, 40.0), 0.0);
    }
}

//! Keyboard, wheel and click input. The pure parts (key mapping, move throttle,
//! click resolution) are separate from the listeners that feed them.

use crate::app;
use crate::error::Result;
use crate::render::camera::Camera;
use crate::state::Position;
use gloo::events::{EventListener, EventListenerOptions};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent};

pub const MOVE_INTERVAL_MS: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(Direction::North),
            "ArrowDown" => Some(Direction::South),
            "ArrowLeft" => Some(Direction::West),
            "ArrowRight" => Some(Direction::East),
            k if k.eq_ignore_ascii_case("w") => Some(Direction::North),
            k if k.eq_ignore_ascii_case("s") => Some(Direction::South),
            k if k.eq_ignore_ascii_case("a") => Some(Direction::West),
            k if k.eq_ignore_ascii_case("d") => Some(Direction::East),
            _ => None,
        }
    }

    /// Step along the dominant axis of `(dx, dy)`; ties go horizontal.
    pub fn toward(dx: f64, dy: f64) -> Option<Self> {
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        Some(if dx.abs() >= dy.abs() {
            if dx > 0.0 { Direction::East } else { Direction::West }
        } else if dy > 0.0 {
            Direction::South
        } else {
            Direction::North
        })
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }
}

/// Typing into a form control must not move the player.
pub fn is_text_entry(tag_name: &str) -> bool {
    tag_name.eq_ignore_ascii_case("input") || tag_name.eq_ignore_ascii_case("textarea")
}

/// Rate limit for move requests: one per interval, and never while the
/// previous request is still in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveThrottle {
    interval_ms: f64,
    last_ms: Option<f64>,
    in_flight: bool,
}

impl Default for MoveThrottle {
    fn default() -> Self {
        Self::new(MOVE_INTERVAL_MS)
    }
}

impl MoveThrottle {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_ms: None,
            in_flight: false,
        }
    }

    /// Claim the slot for a new move at `now_ms`.
    pub fn try_begin(&mut self, now_ms: f64) -> bool {
        if self.in_flight {
            return false;
        }
        if let Some(last) = self.last_ms {
            if now_ms - last < self.interval_ms {
                return false;
            }
        }
        self.last_ms = Some(now_ms);
        self.in_flight = true;
        true
    }

    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    OwnTile,
    Step(Direction),
}

/// Resolve a canvas-local click against the player's tile.
pub fn resolve_click(camera: &Camera, player: &Position, x: f64, y: f64) -> ClickOutcome {
    if camera.tile_at(x, y) == (player.x, player.y) {
        return ClickOutcome::OwnTile;
    }
    let (cx, cy) = camera.tile_centre(player.x, player.y);
    match Direction::toward(x - cx, y - cy) {
        Some(dir) => ClickOutcome::Step(dir),
        None => ClickOutcome::OwnTile,
    }
}

fn typing_target(evt: &KeyboardEvent) -> bool {
    evt.target()
        .and_then(|t| t.dyn_into::<Element>().ok())
        .is_some_and(|el| is_text_entry(&el.tag_name()))
}

/// Install keyboard, wheel and click listeners. They live for the page.
pub fn attach(canvas: &HtmlCanvasElement) -> Result<()> {
    let window = web_sys::window().ok_or(crate::error::ClientError::NoWindow)?;
    let doc = window
        .document()
        .ok_or(crate::error::ClientError::NoDocument)?;

    // Movement keys
    {
        let closure = Closure::wrap(Box::new(move |evt: KeyboardEvent| {
            if typing_target(&evt) {
                return;
            }
            if let Some(dir) = Direction::from_key(&evt.key()) {
                evt.prevent_default();
                app::request_move(dir);
            }
        }) as Box<dyn FnMut(_)>);
        doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Wheel zoom; must be non-passive to stop the page scrolling.
    EventListener::new_with_options(
        &doc,
        "wheel",
        EventListenerOptions::enable_prevent_default(),
        move |event| {
            let Some(evt) = event.dyn_ref::<WheelEvent>() else {
                return;
            };
            if evt.ctrl_key() {
                return;
            }
            evt.prevent_default();
            app::zoom_wheel(evt.delta_y());
        },
    )
    .forget();

    // Click to step
    {
        let target = canvas.clone();
        let closure = Closure::wrap(Box::new(move |evt: MouseEvent| {
            if evt.button() != 0 {
                return;
            }
            let rect = target.get_bounding_client_rect();
            let x = evt.client_x() as f64 - rect.left();
            let y = evt.client_y() as f64 - rect.top();
            app::click_map(x, y);
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_directions() {
        assert_eq!(Direction::from_key("w"), Some(Direction::North));
        assert_eq!(Direction::from_key("W"), Some(Direction::North));
        assert_eq!(Direction::from_key("ArrowLeft"), Some(Direction::West));
        assert_eq!(Direction::from_key("D"), Some(Direction::East));
        assert_eq!(Direction::from_key("ArrowDown"), Some(Direction::South));
        assert_eq!(Direction::from_key("q"), None);
        assert_eq!(Direction::from_key("Enter"), None);
    }

    #[test]
    fn form_controls_swallow_keys() {
        assert!(is_text_entry("INPUT"));
        assert!(is_text_entry("textarea"));
        assert!(!is_text_entry("CANVAS"));
    }

    #[test]
    fn throttle_spacing_and_in_flight_guard() {
        let mut t = MoveThrottle::default();
        assert!(t.try_begin(0.0));
        assert!(!t.try_begin(500.0));
        t.finish();
        assert!(t.try_begin(500.0));
        t.finish();
        assert!(!t.try_begin(550.0));
        assert!(t.try_begin(600.0));
        assert!(t.in_flight());
    }

    #[test]
    fn dominant_axis_wins() {
        assert_eq!(Direction::toward(10.0, 3.0), Some(Direction::East));
        assert_eq!(Direction::toward(-2.0, -9.0), Some(Direction::North));
        assert_eq!(Direction::toward(5.0, -5.0), Some(Direction::East));
        assert_eq!(Direction::toward(0.0, 0.0), None);
    }

    #[test]
    fn clicks_resolve_against_player_tile() {
        let cam = Camera::follow(4, 4, 640.0, 480.0, 64.0);
        let me = Position::new(4, 4, 0);
        assert_eq!(resolve_click(&cam, &me, 320.0, 240.0), ClickOutcome::OwnTile);
        assert_eq!(resolve_click(&cam, &me, 330.0, 180.0), ClickOutcome::Step(Direction::North));
        assert_eq!(resolve_click(&cam, &me, 600.0, 250.0), ClickOutcome::Step(Direction::East));
        assert_eq!(resolve_click(&cam, &me, 300.0, 470.0), ClickOutcome::Step(Direction::South));
    }

    #[test]
    fn deltas() {
        assert_eq!(Direction::North.delta(), (0, -1));
    }

    #[test]
    fn log_names_match_wire_names() {
        for dir in [Direction::North, Direction::South, Direction::East, Direction::West] {
            let wire = serde_json::to_value(dir).unwrap();
            assert_eq!(wire.as_str(), Some(dir.as_str()));
        }
    }
}

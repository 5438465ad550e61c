//! Centre-screen banner (`#turn-notification`). Popups are shown one at a
//! time in the order they were requested.

use super::by_id;
use gloo::timers::future::TimeoutFuture;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

pub const BANNER_ID: &str = "turn-notification";
pub const DEFAULT_DURATION_MS: u32 = 1500;
pub const FADE_MS: u32 = 300;
pub const GAP_MS: u32 = 150;
const FADE_IN_DELAY_MS: u32 = 10;
const POLL_MS: u32 = 50;

#[derive(Clone, Debug, PartialEq)]
pub struct Popup {
    pub title: String,
    /// Trusted markup from the server.
    pub content: String,
    pub color: String,
    pub duration_ms: u32,
}

impl Popup {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            color: "rgba(0, 0, 0, 0.8)".into(),
            duration_ms: DEFAULT_DURATION_MS,
        }
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn duration(mut self, ms: u32) -> Self {
        self.duration_ms = ms;
        self
    }

    /// Time the banner occupies the screen, fade-out included.
    pub fn on_screen_ms(&self) -> u32 {
        self.duration_ms + FADE_MS
    }
}

type Done = Rc<Cell<bool>>;

/// FIFO of pending popups plus whether a drain task is running.
#[derive(Debug, Default)]
pub struct PopupQueue {
    pending: VecDeque<(Popup, Done)>,
    draining: bool,
}

impl PopupQueue {
    /// Queue `popup`. Returns its completion flag and whether the caller must
    /// start draining.
    pub fn push(&mut self, popup: Popup) -> (Done, bool) {
        let done = Rc::new(Cell::new(false));
        self.pending.push_back((popup, done.clone()));
        let start = !self.draining;
        self.draining = true;
        (done, start)
    }

    /// Next popup, or `None` (and the drain stops) when empty.
    pub fn next(&mut self) -> Option<(Popup, Done)> {
        let next = self.pending.pop_front();
        if next.is_none() {
            self.draining = false;
        }
        next
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

thread_local! {
    static QUEUE: RefCell<PopupQueue> = RefCell::new(PopupQueue::default());
}

/// Show `popup` after everything queued before it; resolves once it is gone.
pub async fn show(popup: Popup) {
    let (done, start) = QUEUE.with(|q| q.borrow_mut().push(popup));
    if start {
        wasm_bindgen_futures::spawn_local(drain());
    }
    while !done.get() {
        TimeoutFuture::new(POLL_MS).await;
    }
}

async fn drain() {
    while let Some((popup, done)) = QUEUE.with(|q| q.borrow_mut().next()) {
        display(&popup).await;
        done.set(true);
        TimeoutFuture::new(GAP_MS).await;
    }
}

async fn display(popup: &Popup) {
    let Some(el) = by_id(BANNER_ID) else {
        return;
    };
    if !popup.title.is_empty() {
        if let Ok(Some(t)) = el.query_selector("#turn-title") {
            t.set_text_content(Some(&popup.title));
        }
    }
    if !popup.content.is_empty() {
        if let Ok(Some(c)) = el.query_selector("#turn-content") {
            c.set_inner_html(&popup.content);
        }
    }
    let style = el.style();
    style.set_property("background-color", &popup.color).ok();
    style.set_property("display", "block").ok();
    TimeoutFuture::new(FADE_IN_DELAY_MS).await;
    style.set_property("opacity", "1").ok();
    TimeoutFuture::new(popup.duration_ms).await;
    style.set_property("opacity", "0").ok();
    TimeoutFuture::new(FADE_MS).await;
    style.set_property("display", "none").ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_fifo_and_tracks_draining() {
        let mut q = PopupQueue::default();
        let (_, start) = q.push(Popup::new("A", ""));
        assert!(start);
        let (_, start) = q.push(Popup::new("B", ""));
        assert!(!start);
        assert_eq!(q.len(), 2);
        assert_eq!(q.next().map(|(p, _)| p.title), Some("A".into()));
        assert_eq!(q.next().map(|(p, _)| p.title), Some("B".into()));
        assert!(q.next().is_none());
        let (_, start) = q.push(Popup::new("C", ""));
        assert!(start);
    }

    #[test]
    fn builder_defaults() {
        let p = Popup::new("ACQUIRED", "Rusty Dagger")
            .color("rgba(0, 100, 0, 0.8)")
            .duration(2000);
        assert_eq!(p.duration_ms, 2000);
        assert_eq!(p.on_screen_ms(), 2300);
        assert_eq!(Popup::new("x", "y").duration_ms, DEFAULT_DURATION_MS);
    }
}

//! Client configuration. Defaults match the stock server layout; any field can
//! be overridden from `localStorage` for debugging against another host.

const KEY_API_BASE: &str = "dungeon.api_base";
const KEY_IMAGE_BASE: &str = "dungeon.image_base";
const KEY_AUDIO_BASE: &str = "dungeon.audio_base";
const KEY_POLL_MS: &str = "dungeon.poll_ms";
const KEY_TILE_SIZE: &str = "dungeon.tile_size";
const KEY_VISION_RADIUS: &str = "dungeon.vision_radius";

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub api_base: String,
    pub image_base: String,
    pub audio_base: String,
    pub poll_interval_ms: u32,
    pub base_tile_size: f64,
    pub vision_radius: i32,
    pub canvas_id: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            image_base: "/static/img/".into(),
            audio_base: "static/audio/".into(),
            poll_interval_ms: 500,
            base_tile_size: 64.0,
            vision_radius: 7,
            canvas_id: "map-canvas".into(),
        }
    }
}

impl ClientConfig {
    /// Apply overrides from a key lookup. Blank or unparsable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        if let Some(v) = get(KEY_API_BASE) {
            self.api_base = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get(KEY_IMAGE_BASE) {
            self.image_base = with_trailing_slash(v);
        }
        if let Some(v) = get(KEY_AUDIO_BASE) {
            self.audio_base = with_trailing_slash(v);
        }
        if let Some(v) = get(KEY_POLL_MS).and_then(|v| v.parse::<u32>().ok()) {
            self.poll_interval_ms = v.max(100);
        }
        if let Some(v) = get(KEY_TILE_SIZE).and_then(|v| v.parse::<f64>().ok()) {
            if v.is_finite() && v >= 8.0 {
                self.base_tile_size = v;
            }
        }
        if let Some(v) = get(KEY_VISION_RADIUS).and_then(|v| v.parse::<i32>().ok()) {
            if v > 0 {
                self.vision_radius = v;
            }
        }
        self
    }

    /// Defaults overlaid with whatever `localStorage` holds.
    pub fn load() -> Self {
        Self::default().with_overrides(read_storage)
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }
}

fn with_trailing_slash(mut s: String) -> String {
    if !s.ends_with('/') {
        s.push('/');
    }
    s
}

fn read_storage(key: &str) -> Option<String> {
    let window = web_sys::window()?;
    let storage = window.local_storage().ok()??;
    storage.get_item(key).ok()?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let cfg = ClientConfig::default().with_overrides(|_| None);
        assert_eq!(cfg, ClientConfig::default());
        assert_eq!(cfg.poll_interval_ms, 500);
        assert_eq!(cfg.api_url("/api/state"), "/api/state");
    }

    #[test]
    fn overrides_are_applied_and_normalized() {
        let cfg = ClientConfig::default().with_overrides(lookup(&[
            ("dungeon.api_base", "http://localhost:5000/"),
            ("dungeon.image_base", "/img"),
            ("dungeon.poll_ms", " 250 "),
            ("dungeon.vision_radius", "9"),
        ]));
        assert_eq!(cfg.api_url("/api/move"), "http://localhost:5000/api/move");
        assert_eq!(cfg.image_base, "/img/");
        assert_eq!(cfg.poll_interval_ms, 250);
        assert_eq!(cfg.vision_radius, 9);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let cfg = ClientConfig::default().with_overrides(lookup(&[
            ("dungeon.poll_ms", "fast"),
            ("dungeon.tile_size", "2"),
            ("dungeon.vision_radius", "-1"),
            ("dungeon.audio_base", "   "),
        ]));
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn poll_interval_has_a_floor() {
        let cfg = ClientConfig::default().with_overrides(lookup(&[("dungeon.poll_ms", "10")]));
        assert_eq!(cfg.poll_interval_ms, 100);
    }
}

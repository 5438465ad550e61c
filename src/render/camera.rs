//! Zoom level and the player-locked camera.

pub const ZOOM_MIN: f64 = 0.5;
pub const ZOOM_MAX: f64 = 3.0;
pub const ZOOM_STEP: f64 = 0.1;

/// Map zoom factor, always within `ZOOM_MIN..=ZOOM_MAX`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Zoom(f64);

impl Default for Zoom {
    fn default() -> Self {
        Zoom(1.0)
    }
}

impl Zoom {
    pub fn new(value: f64) -> Self {
        if !value.is_finite() {
            return Self::default();
        }
        // Snap to one decimal so repeated wheel steps don't drift.
        Zoom(((value * 10.0).round() / 10.0).clamp(ZOOM_MIN, ZOOM_MAX))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Apply one wheel notch: negative delta zooms in, positive zooms out.
    pub fn wheel(self, delta_y: f64) -> Self {
        if delta_y < 0.0 {
            Zoom::new(self.0 + ZOOM_STEP)
        } else if delta_y > 0.0 {
            Zoom::new(self.0 - ZOOM_STEP)
        } else {
            self
        }
    }

    pub fn shows_grid(self) -> bool {
        self.0 > 0.6
    }

    pub fn shows_name_tags(self) -> bool {
        self.0 > 0.8
    }

    pub fn name_font_px(self) -> f64 {
        (12.0 * self.0).max(10.0)
    }
}

pub fn tile_size(base: f64, zoom: Zoom) -> f64 {
    (base * zoom.value()).round()
}

/// Screen mapping for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub tile: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Camera {
    /// Centre the view on tile `(px, py)`.
    pub fn follow(px: i32, py: i32, width: f64, height: f64, tile: f64) -> Self {
        Self {
            tile,
            offset_x: width / 2.0 - px as f64 * tile - tile / 2.0,
            offset_y: height / 2.0 - py as f64 * tile - tile / 2.0,
            width,
            height,
        }
    }

    /// Pixel origin of tile `(x, y)`, rounded to whole pixels.
    pub fn origin(&self, x: i32, y: i32) -> (f64, f64) {
        (
            (self.offset_x + x as f64 * self.tile).round(),
            (self.offset_y + y as f64 * self.tile).round(),
        )
    }

    pub fn is_on_screen(&self, (ox, oy): (f64, f64)) -> bool {
        !(ox < -self.tile || oy < -self.tile || ox > self.width || oy > self.height)
    }

    /// Tile under canvas-local pixel `(x, y)`.
    pub fn tile_at(&self, x: f64, y: f64) -> (i32, i32) {
        (
            ((x - self.offset_x) / self.tile).floor() as i32,
            ((y - self.offset_y) / self.tile).floor() as i32,
        )
    }

    /// Canvas-local centre of tile `(x, y)`.
    pub fn tile_centre(&self, x: i32, y: i32) -> (f64, f64) {
        (
            self.offset_x + x as f64 * self.tile + self.tile / 2.0,
            self.offset_y + y as f64 * self.tile + self.tile / 2.0,
        )
    }

    /// Top-left of the player sprite, which always sits mid-canvas.
    pub fn player_origin(&self) -> (f64, f64) {
        (
            self.width / 2.0 - self.tile / 2.0,
            self.height / 2.0 - self.tile / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_clamps_and_steps() {
        let mut z = Zoom::default();
        for _ in 0..40 {
            z = z.wheel(-120.0);
        }
        assert_eq!(z.value(), ZOOM_MAX);
        for _ in 0..40 {
            z = z.wheel(53.0);
        }
        assert_eq!(z.value(), ZOOM_MIN);
        assert_eq!(Zoom::new(1.0).wheel(0.0).value(), 1.0);
        assert_eq!(Zoom::new(f64::NAN), Zoom::default());
    }

    #[test]
    fn zoom_thresholds() {
        assert!(!Zoom::new(0.6).shows_grid());
        assert!(Zoom::new(0.7).shows_grid());
        assert!(!Zoom::new(0.8).shows_name_tags());
        assert!(Zoom::new(0.9).shows_name_tags());
        assert_eq!(Zoom::new(0.5).name_font_px(), 10.0);
        assert_eq!(Zoom::new(2.0).name_font_px(), 24.0);
    }

    #[test]
    fn tile_size_rounds() {
        assert_eq!(tile_size(64.0, Zoom::new(1.0)), 64.0);
        assert_eq!(tile_size(64.0, Zoom::new(1.1)), 70.0);
        assert_eq!(tile_size(64.0, Zoom::new(0.5)), 32.0);
    }

    #[test]
    fn camera_centres_player_tile() {
        let cam = Camera::follow(10, 5, 800.0, 600.0, 64.0);
        assert_eq!(cam.offset_x, 400.0 - 640.0 - 32.0);
        assert_eq!(cam.offset_y, 300.0 - 320.0 - 32.0);
        assert_eq!(cam.origin(10, 5), cam.player_origin());
        assert_eq!(cam.tile_centre(10, 5), (400.0, 300.0));
        assert_eq!(cam.tile_at(400.0, 300.0), (10, 5));
        assert_eq!(cam.tile_at(400.0 + 33.0, 300.0), (11, 5));
    }

    #[test]
    fn culling_bounds() {
        let cam = Camera::follow(0, 0, 640.0, 480.0, 64.0);
        assert!(cam.is_on_screen((-64.0, 0.0)));
        assert!(!cam.is_on_screen((-65.0, 0.0)));
        assert!(cam.is_on_screen((640.0, 480.0)));
        assert!(!cam.is_on_screen((641.0, 0.0)));
        assert!(!cam.is_on_screen((0.0, 481.0)));
    }
}

//! Frame composition. `plan_frame` turns a game state into an ordered list of
//! draw operations without touching the canvas, so the whole pipeline can be
//! checked off-browser.

use super::camera::{Camera, Zoom, tile_size};
use super::fog;
use super::sprites::{
    EnemyLook, GRASS_UNDERLAY, SpriteSource, TileStyle, enemy_look, npc_sprite, secret_sprite_key,
    tile_style,
};
use crate::state::{GameState, Position, TileMap};

pub const BACKGROUND: &str = "#050505";
pub const FOG_OVERLAY: &str = "rgba(0,0,0,0.7)";
pub const GRID_LINE: &str = "#111";

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Clear {
        color: &'static str,
    },
    FillRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: &'static str,
    },
    StrokeRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: &'static str,
        line_width: f64,
    },
    FillCircle {
        cx: f64,
        cy: f64,
        r: f64,
        color: &'static str,
    },
    Sprite {
        key: String,
        x: f64,
        y: f64,
        size: f64,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
        font_px: f64,
        color: &'static str,
    },
}

/// Fixed inputs for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameParams {
    pub width: f64,
    pub height: f64,
    pub zoom: Zoom,
    pub base_tile: f64,
    pub vision_radius: i32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub camera: Option<Camera>,
    pub ops: Vec<DrawOp>,
}

struct Painter {
    ops: Vec<DrawOp>,
    tile: f64,
}

impl Painter {
    fn fill(&mut self, (x, y): (f64, f64), color: &'static str) {
        self.ops.push(DrawOp::FillRect {
            x,
            y,
            w: self.tile,
            h: self.tile,
            color,
        });
    }

    fn sprite(&mut self, key: &str, (x, y): (f64, f64)) {
        self.ops.push(DrawOp::Sprite {
            key: key.to_string(),
            x,
            y,
            size: self.tile,
        });
    }
}

/// Compose one frame. `rng` yields values in `0.0..1.0` and only drives the
/// void starfield.
pub fn plan_frame(
    state: &GameState,
    params: &FrameParams,
    sprites: &impl SpriteSource,
    rng: &mut dyn FnMut() -> f64,
) -> Frame {
    let mut p = Painter {
        ops: vec![DrawOp::Clear { color: BACKGROUND }],
        tile: tile_size(params.base_tile, params.zoom),
    };
    let (Some(player), Some(world)) = (state.player.as_ref(), state.world.as_ref()) else {
        return Frame {
            camera: None,
            ops: p.ops,
        };
    };
    let me = player.xyz;
    let cam = Camera::follow(me.x, me.y, params.width, params.height, p.tile);
    let map = &world.map;

    draw_tiles(&mut p, &cam, map, &me, params, sprites, rng);

    let known_here = |pos: &Position| pos.same_level(&me) && map.contains(pos);
    let radius = params.vision_radius;

    for corpse in state.corpses.iter().filter(|c| known_here(&c.xyz)) {
        let at = cam.origin(corpse.xyz.x, corpse.xyz.y);
        if sprites.has("bones") {
            p.sprite("bones", at);
        } else {
            p.ops.push(DrawOp::FillCircle {
                cx: at.0 + p.tile / 2.0,
                cy: at.1 + p.tile / 2.0,
                r: p.tile / 4.0,
                color: "#ccc",
            });
        }
    }

    for secret in &world.secrets {
        let Some(pos) = secret.xyz.filter(|pos| known_here(pos)) else {
            continue;
        };
        let at = cam.origin(pos.x, pos.y);
        let key = secret_sprite_key(secret);
        if sprites.has(key) {
            p.sprite(key, at);
        } else {
            let inset = (p.tile - 16.0).max(0.0);
            p.ops.push(DrawOp::FillRect {
                x: at.0 + 8.0,
                y: at.1 + 8.0,
                w: inset,
                h: inset,
                color: "#8b4513",
            });
            p.ops.push(DrawOp::StrokeRect {
                x: at.0 + 8.0,
                y: at.1 + 8.0,
                w: inset,
                h: inset,
                color: "#d2691e",
                line_width: 2.0,
            });
        }
    }

    for npc in world
        .npcs
        .iter()
        .filter(|n| known_here(&n.xyz) && fog::in_sight(&me, &n.xyz, radius))
    {
        let at = cam.origin(npc.xyz.x, npc.xyz.y);
        match npc_sprite(npc, sprites) {
            Some(key) => p.sprite(key, at),
            None => p.fill(at, "blue"),
        }
        if params.zoom.shows_name_tags() {
            p.ops.push(DrawOp::Text {
                text: npc.name.clone(),
                x: at.0 + p.tile / 2.0,
                y: at.1 - 5.0,
                font_px: params.zoom.name_font_px(),
                color: "white",
            });
        }
    }

    for enemy in world
        .enemies
        .iter()
        .filter(|e| known_here(&e.xyz) && fog::in_sight(&me, &e.xyz, radius))
    {
        let at = cam.origin(enemy.xyz.x, enemy.xyz.y);
        match enemy_look(enemy, sprites) {
            EnemyLook::Sprite(key) => p.sprite(key, at),
            EnemyLook::Square(color) => p.fill(at, color),
        }
        if enemy.is_injured() {
            let frac = enemy.hp_fraction().unwrap_or(0.0);
            p.ops.push(DrawOp::FillRect {
                x: at.0,
                y: at.1 - 6.0,
                w: p.tile,
                h: 4.0,
                color: "#500",
            });
            p.ops.push(DrawOp::FillRect {
                x: at.0,
                y: at.1 - 6.0,
                w: p.tile * frac,
                h: 4.0,
                color: "#f00",
            });
        }
    }

    let at = cam.player_origin();
    if sprites.has("player") {
        p.sprite("player", at);
    } else {
        p.ops.push(DrawOp::FillRect {
            x: at.0 + p.tile / 4.0,
            y: at.1 + p.tile / 4.0,
            w: p.tile / 2.0,
            h: p.tile / 2.0,
            color: "cyan",
        });
    }

    Frame {
        camera: Some(cam),
        ops: p.ops,
    }
}

fn draw_tiles(
    p: &mut Painter,
    cam: &Camera,
    map: &TileMap,
    me: &Position,
    params: &FrameParams,
    sprites: &impl SpriteSource,
    rng: &mut dyn FnMut() -> f64,
) {
    let tile = p.tile;
    for (pos, kind) in map.on_level(me.z) {
        let at = cam.origin(pos.x, pos.y);
        if !cam.is_on_screen(at) {
            continue;
        }
        match tile_style(kind, sprites) {
            TileStyle::Underlaid { sprite } => {
                p.fill(at, GRASS_UNDERLAY);
                if let Some(key) = sprite {
                    p.sprite(key, at);
                }
            }
            TileStyle::Sprite(key) => p.sprite(key, at),
            TileStyle::Void => {
                p.fill(at, "#110022");
                if rng() > 0.9 {
                    let (sx, sy) = (rng() * tile, rng() * tile);
                    p.ops.push(DrawOp::FillRect {
                        x: at.0 + sx,
                        y: at.1 + sy,
                        w: 1.0,
                        h: 1.0,
                        color: "#fff",
                    });
                }
            }
            TileStyle::Herb => {
                p.fill(at, GRASS_UNDERLAY);
                p.ops.push(DrawOp::FillCircle {
                    cx: at.0 + tile * 0.5,
                    cy: at.1 + tile * 0.5,
                    r: tile * 0.2,
                    color: "#ff69b4",
                });
            }
            TileStyle::Lava => p.fill(at, "#cf1020"),
            TileStyle::Street => {
                p.fill(at, "#5d4037");
                p.ops.push(DrawOp::FillRect {
                    x: at.0 + 5.0,
                    y: at.1 + 5.0,
                    w: 4.0,
                    h: 4.0,
                    color: "#4e342e",
                });
            }
            TileStyle::Flat(color) => p.fill(at, color),
        }
        if fog::is_remembered(me, pos, params.vision_radius) {
            p.fill(at, FOG_OVERLAY);
        }
        if params.zoom.shows_grid() {
            p.ops.push(DrawOp::StrokeRect {
                x: at.0,
                y: at.1,
                w: tile,
                h: tile,
                color: GRID_LINE,
                line_width: 1.0,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn params(zoom: f64) -> FrameParams {
        FrameParams {
            width: 640.0,
            height: 480.0,
            zoom: Zoom::new(zoom),
            base_tile: 64.0,
            vision_radius: 7,
        }
    }

    fn state(json: &str) -> GameState {
        GameState::from_json(json).unwrap()
    }

    fn no_sprites() -> HashSet<&'static str> {
        HashSet::new()
    }

    fn never() -> impl FnMut() -> f64 {
        || 0.0
    }

    #[test]
    fn empty_state_only_clears() {
        let frame = plan_frame(&GameState::default(), &params(1.0), &no_sprites(), &mut never());
        assert_eq!(frame.ops, vec![DrawOp::Clear { color: BACKGROUND }]);
        assert!(frame.camera.is_none());
    }

    #[test]
    fn player_is_drawn_last_at_centre() {
        let s = state(r#"{"player":{"xyz":[3,3,0]},"world":{"map":{"3,3,0":"floor"}}}"#);
        let frame = plan_frame(&s, &params(1.0), &HashSet::from(["player"]), &mut never());
        assert_eq!(
            frame.ops.last(),
            Some(&DrawOp::Sprite {
                key: "player".into(),
                x: 288.0,
                y: 208.0,
                size: 64.0
            })
        );
    }

    #[test]
    fn far_tiles_get_fog_and_other_levels_are_skipped() {
        let s = state(
            r#"{"player":{"xyz":[0,0,0]},
                "world":{"map":{"0,0,0":"floor","4,4,0":"floor","1,0,1":"floor"}}}"#,
        );
        let frame = plan_frame(&s, &params(0.5), &no_sprites(), &mut never());
        let fog: Vec<_> = frame
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::FillRect { color, .. } if *color == FOG_OVERLAY))
            .collect();
        assert_eq!(fog.len(), 1);
        let floors = frame
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::FillRect { color: "#444", .. }))
            .count();
        assert_eq!(floors, 2);
        assert!(!frame.ops.iter().any(|op| matches!(op, DrawOp::StrokeRect { .. })));
    }

    #[test]
    fn off_screen_tiles_are_culled() {
        let s = state(r#"{"player":{"xyz":[0,0,0]},"world":{"map":{"50,0,0":"floor"}}}"#);
        let frame = plan_frame(&s, &params(1.0), &no_sprites(), &mut never());
        assert!(!frame.ops.iter().any(|op| matches!(op, DrawOp::FillRect { color: "#444", .. })));
    }

    #[test]
    fn void_star_depends_on_rng() {
        let s = state(r#"{"player":{"xyz":[0,0,0]},"world":{"map":{"0,0,0":"void"}}}"#);
        let quiet = plan_frame(&s, &params(1.0), &no_sprites(), &mut never());
        assert!(!quiet.ops.iter().any(|op| matches!(op, DrawOp::FillRect { w, .. } if *w == 1.0)));
        let mut hot = || 0.95;
        let starry = plan_frame(&s, &params(1.0), &no_sprites(), &mut hot);
        assert!(starry.ops.iter().any(|op| matches!(op, DrawOp::FillRect { color: "#fff", w, .. } if *w == 1.0)));
    }

    #[test]
    fn entities_need_known_tiles_and_sight() {
        let s = state(
            r#"{"player":{"xyz":[0,0,0]},
                "world":{"map":{"0,0,0":"floor","1,0,0":"floor","9,0,0":"floor"},
                         "enemies":[{"xyz":[1,0,0],"name":"Goblin","hp":2,"max_hp":4},
                                    {"xyz":[9,0,0],"name":"Far Goblin","hp":4,"max_hp":4},
                                    {"xyz":[2,0,0],"name":"Unknown Tile","hp":4,"max_hp":4}],
                         "secrets":[{"id":"s","name":"chest","xyz":[1,0,0]},{"id":"t","name":"hidden"}]},
                "corpses":[{"xyz":[1,0,0]},{"xyz":[5,5,0]}]}"#,
        );
        let frame = plan_frame(&s, &params(1.0), &no_sprites(), &mut never());
        let greens = frame
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::FillRect { color: "green", .. }))
            .count();
        assert_eq!(greens, 1);
        let bar = frame
            .ops
            .iter()
            .find(|op| matches!(op, DrawOp::FillRect { color: "#f00", .. }));
        assert!(matches!(bar, Some(DrawOp::FillRect { w, h, .. }) if *w == 32.0 && *h == 4.0));
        let discs = frame
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::FillCircle { color: "#ccc", .. }))
            .count();
        assert_eq!(discs, 1);
        let boxes = frame
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::FillRect { color: "#8b4513", .. }))
            .count();
        assert_eq!(boxes, 1);
    }

    #[test]
    fn layer_order_is_tiles_corpses_secrets_npcs_enemies_player() {
        let s = state(
            r#"{"player":{"xyz":[0,0,0]},
                "world":{"map":{"0,0,0":"floor","1,0,0":"floor"},
                         "npcs":[{"xyz":[1,0,0],"name":"Elara","asset":"elara.png"}],
                         "enemies":[{"xyz":[1,0,0],"name":"Wolf","hp":1,"max_hp":1}],
                         "secrets":[{"id":1,"name":"crate","xyz":[1,0,0]}]},
                "corpses":[{"xyz":[1,0,0]}]}"#,
        );
        let sprites = HashSet::from(["floor", "bones", "crate", "elara", "wolf", "player"]);
        let frame = plan_frame(&s, &params(1.0), &sprites, &mut never());
        let keys: Vec<&str> = frame
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Sprite { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(keys, ["floor", "floor", "bones", "crate", "elara", "wolf", "player"]);
        assert!(frame
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::Text { text, .. } if text == "Elara")));
    }
}

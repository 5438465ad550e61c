//! Distance metrics used for fog of war and reach checks. All of them work on
//! the x/y plane; callers compare z-levels separately.

use crate::state::Position;

pub fn manhattan(a: &Position, b: &Position) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

pub fn chebyshev(a: &Position, b: &Position) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

pub fn euclidean(a: &Position, b: &Position) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Inside the player's current sight.
pub fn in_sight(player: &Position, other: &Position, radius: i32) -> bool {
    manhattan(player, other) <= radius
}

/// Seen before but outside current sight; drawn dimmed.
pub fn is_remembered(player: &Position, tile: &Position, radius: i32) -> bool {
    !in_sight(player, tile, radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_agree_on_simple_cases() {
        let o = Position::new(0, 0, 0);
        let p = Position::new(3, -4, 0);
        assert_eq!(manhattan(&o, &p), 7);
        assert_eq!(chebyshev(&o, &p), 4);
        assert_eq!(euclidean(&o, &p), 5.0);
    }

    #[test]
    fn fog_threshold_is_inclusive() {
        let o = Position::new(0, 0, 0);
        assert!(in_sight(&o, &Position::new(4, 3, 0), 7));
        assert!(is_remembered(&o, &Position::new(4, 4, 0), 7));
        assert!(!is_remembered(&o, &o, 7));
    }
}

//! Isometric projection and small vector helpers shared by the path walker
//! and combat kite (spec §4.3, §4.6).

use crate::world::GridPos;

/// Grid unit to world unit ratio (spec §4.3, GLOSSARY: "conversion to world
/// units is a fixed ratio ≈10.87" ≈ 250/23).
pub const GRID_TO_WORLD_RATIO: f32 = 250.0 / 23.0;

/// Convert a grid-space delta to an isometric screen angle in degrees.
/// `atan2((dx+dy)/2, dx-dy)`.
pub fn screen_angle_deg(dx: f32, dy: f32) -> f32 {
    ((dx + dy) / 2.0).atan2(dx - dy).to_degrees()
}

/// Magnitude of a move packet for a given grid delta, clamped to
/// `max_move_distance`.
pub fn move_distance(grid_delta_mag: f32, max_move_distance: f32) -> f32 {
    (grid_delta_mag * GRID_TO_WORLD_RATIO).min(max_move_distance)
}

/// Compute `(screen_angle_deg, distance_units)` for a move from `from` to
/// `to`, clamped by `max_move_distance`.
pub fn move_towards(from: GridPos, to: GridPos, max_move_distance: f32) -> (f32, f32) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let mag = (dx * dx + dy * dy).sqrt();
    let angle = screen_angle_deg(dx, dy);
    let distance = move_distance(mag, max_move_distance);
    (angle, distance)
}

/// The angle (radians, grid space) from `center` to `point`.
pub fn angle_of(center: GridPos, point: GridPos) -> f32 {
    (point.y - center.y).atan2(point.x - center.x)
}

/// A point at `radius` and `angle_rad` (grid-space radians) around `center`.
pub fn point_on_ring(center: GridPos, angle_rad: f32, radius: f32) -> GridPos {
    GridPos::new(center.x + radius * angle_rad.cos(), center.y + radius * angle_rad.sin())
}

/// 2D dot product of unit vectors derived from `a` and `b`.
pub fn dot(a: (f32, f32), b: (f32, f32)) -> f32 {
    a.0 * b.0 + a.1 * b.1
}

/// Normalize a 2D vector; returns `(0,0)` for a zero-length input.
pub fn normalize(v: (f32, f32)) -> (f32, f32) {
    let mag = (v.0 * v.0 + v.1 * v.1).sqrt();
    if mag < f32::EPSILON {
        (0.0, 0.0)
    } else {
        (v.0 / mag, v.1 / mag)
    }
}

pub fn sub(a: GridPos, b: GridPos) -> (f32, f32) {
    (a.x - b.x, a.y - b.y)
}

/// Unit direction from `from` to `to`, run through the isometric projection
/// (spec §4.6 dodge-burst `(dx,dy)` deltas).
pub fn iso_unit_delta(from: GridPos, to: GridPos) -> (f32, f32) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    normalize((dx - dy, (dx + dy) / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_distance_clamps_to_max() {
        assert_eq!(move_distance(1000.0, 40.0), 40.0);
    }

    #[test]
    fn screen_angle_zero_delta_is_zero() {
        assert_eq!(screen_angle_deg(0.0, 0.0), 0.0);
    }

    #[test]
    fn normalize_zero_vector_is_zero() {
        assert_eq!(normalize((0.0, 0.0)), (0.0, 0.0));
    }

    #[test]
    fn dot_of_identical_unit_vectors_is_one() {
        let v = normalize((3.0, 4.0));
        assert!((dot(v, v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn iso_unit_delta_is_unit_length() {
        let from = GridPos::new(0.0, 0.0);
        let to = GridPos::new(30.0, -10.0);
        let (dx, dy) = iso_unit_delta(from, to);
        assert!(((dx * dx + dy * dy).sqrt() - 1.0).abs() < 1e-5);
    }
}

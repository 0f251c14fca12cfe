//! Planar geometry on (lng, lat) degrees.
//!
//! Distances are Euclidean in degree space. Angles are in degrees, measured
//! counter-clockwise from east: 0 = east, 90 = north.

use crate::models::Position;

/// Length of a single drone move in degrees.
pub const STEP: f64 = 0.00015;

/// Spacing between the allowed compass headings.
pub const ANGLE_INCREMENT_DEG: f64 = 22.5;

/// Number of allowed headings (16-point compass rose).
pub const HEADING_COUNT: usize = 16;

/// Pseudo-angle meaning "stay in place".
pub const HOVER_ANGLE_DEG: f64 = 999.0;

/// Euclidean distance between two positions.
pub fn distance(a: Position, b: Position) -> f64 {
    (b.lng - a.lng).hypot(b.lat - a.lat)
}

/// Two positions are close when they are less than one move apart.
pub fn is_close(a: Position, b: Position) -> bool {
    distance(a, b) < STEP
}

/// Number of whole moves needed to cover the straight line between two points.
pub fn steps_between(a: Position, b: Position, step: f64) -> u64 {
    let d = distance(a, b);
    if !d.is_finite() {
        return u64::MAX;
    }
    (d / step).ceil() as u64
}

/// Bearing from `from` to `to` in degrees, normalized to `[0, 360)`.
pub fn bearing_deg(from: Position, to: Position) -> f64 {
    normalize_deg((to.lat - from.lat).atan2(to.lng - from.lng).to_degrees())
}

/// Wrap an angle into `[0, 360)`.
pub fn normalize_deg(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Index (0..16) of the allowed heading closest to `angle`.
pub fn heading_index(angle: f64) -> usize {
    let slot = (normalize_deg(angle) / ANGLE_INCREMENT_DEG).round() as usize;
    slot % HEADING_COUNT
}

/// Heading index shifted by `offset` increments, wrapping around the rose.
pub fn offset_heading(index: usize, offset: i32) -> usize {
    (index as i32 + offset).rem_euclid(HEADING_COUNT as i32) as usize
}

pub fn heading_angle(index: usize) -> f64 {
    (index % HEADING_COUNT) as f64 * ANGLE_INCREMENT_DEG
}

/// Move `step` degrees from `from` along the heading with the given index.
pub fn step_along(from: Position, index: usize, step: f64) -> Position {
    let rad = heading_angle(index).to_radians();
    Position::new(from.lng + step * rad.cos(), from.lat + step * rad.sin())
}

/// Next position after one move at `angle`.
///
/// # Arguments
/// * `start` - Current position
/// * `angle` - One of the 16 allowed headings, or [`HOVER_ANGLE_DEG`]
///
/// # Returns
/// `None` when the angle is not an allowed heading.
pub fn next_position(start: Position, angle: f64) -> Option<Position> {
    if angle == HOVER_ANGLE_DEG {
        return Some(start);
    }
    if !angle.is_finite() || !(0.0..360.0).contains(&angle) {
        return None;
    }
    let slots = angle / ANGLE_INCREMENT_DEG;
    if (slots - slots.round()).abs() > 1e-9 {
        return None;
    }
    Some(step_along(start, slots.round() as usize, STEP))
}

/// Number of moves in a waypoint sequence: one per segment.
pub fn path_moves(path: &[Position]) -> u64 {
    path.len().saturating_sub(1) as u64
}

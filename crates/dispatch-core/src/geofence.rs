//! Point-in-polygon tests over closed rings.

use crate::models::{Position, Region};
use thiserror::Error;

/// Cross-product tolerance for treating a point as lying on an edge.
const EDGE_EPSILON: f64 = 1e-12;

/// A polygon that cannot be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidPolygon {
    #[error("polygon needs at least 3 distinct vertices plus the closing vertex, got {0} distinct")]
    TooFewVertices(usize),
    #[error("polygon ring is not closed (first vertex differs from last)")]
    OpenRing,
}

/// Check that `vertices` describe a closed ring with at least 3 distinct corners.
pub fn validate_ring(vertices: &[Position]) -> Result<(), InvalidPolygon> {
    if vertices.len() < 4 {
        return Err(InvalidPolygon::TooFewVertices(distinct_count(vertices)));
    }
    if vertices.first() != vertices.last() {
        return Err(InvalidPolygon::OpenRing);
    }
    let distinct = distinct_count(&vertices[..vertices.len() - 1]);
    if distinct < 3 {
        return Err(InvalidPolygon::TooFewVertices(distinct));
    }
    Ok(())
}

fn distinct_count(vertices: &[Position]) -> usize {
    let mut seen: Vec<Position> = Vec::with_capacity(vertices.len());
    for vertex in vertices {
        if !seen.contains(vertex) {
            seen.push(*vertex);
        }
    }
    seen.len()
}

/// Whether `point` lies inside or on the boundary of the polygon.
pub fn point_in_polygon(point: Position, vertices: &[Position]) -> Result<bool, InvalidPolygon> {
    validate_ring(vertices)?;
    Ok(contains_point(point, vertices))
}

/// Whether `point` lies inside the named region.
pub fn is_in_region(point: Position, region: &Region) -> Result<bool, InvalidPolygon> {
    point_in_polygon(point, &region.vertices)
}

/// Even-odd ray cast with an explicit boundary check. The ring must already be valid.
pub(crate) fn contains_point(point: Position, vertices: &[Position]) -> bool {
    if vertices
        .windows(2)
        .any(|edge| on_segment(point, edge[0], edge[1]))
    {
        return true;
    }

    // Ray casting: count crossings of a ray cast towards +lng
    let mut inside = false;
    let n = vertices.len();
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (vertices[i].lng, vertices[i].lat);
        let (xj, yj) = (vertices[j].lng, vertices[j].lat);

        if ((yi > point.lat) != (yj > point.lat))
            && (point.lng < (xj - xi) * (point.lat - yi) / (yj - yi) + xi)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

fn on_segment(p: Position, a: Position, b: Position) -> bool {
    let cross = (b.lng - a.lng) * (p.lat - a.lat) - (b.lat - a.lat) * (p.lng - a.lng);
    if cross.abs() > EDGE_EPSILON {
        return false;
    }
    p.lng >= a.lng.min(b.lng) - EDGE_EPSILON
        && p.lng <= a.lng.max(b.lng) + EDGE_EPSILON
        && p.lat >= a.lat.min(b.lat) - EDGE_EPSILON
        && p.lat <= a.lat.max(b.lat) + EDGE_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Position> {
        vec![
            Position::new(0.0, 0.0),
            Position::new(0.0, 1.0),
            Position::new(1.0, 1.0),
            Position::new(1.0, 0.0),
            Position::new(0.0, 0.0),
        ]
    }

    #[test]
    fn point_inside_square() {
        assert_eq!(point_in_polygon(Position::new(0.5, 0.5), &square()), Ok(true));
    }

    #[test]
    fn point_outside_square() {
        assert_eq!(point_in_polygon(Position::new(2.0, 2.0), &square()), Ok(false));
    }

    #[test]
    fn point_on_edge_counts_as_inside() {
        assert_eq!(point_in_polygon(Position::new(1.0, 0.5), &square()), Ok(true));
        assert_eq!(point_in_polygon(Position::new(0.5, 0.0), &square()), Ok(true));
        assert_eq!(point_in_polygon(Position::new(1.0, 1.0), &square()), Ok(true));
    }

    #[test]
    fn three_vertices_is_rejected() {
        let triangle = vec![
            Position::new(0.0, 0.0),
            Position::new(1.0, 1.0),
            Position::new(0.0, 0.0),
        ];
        assert!(matches!(
            point_in_polygon(Position::new(0.5, 0.5), &triangle),
            Err(InvalidPolygon::TooFewVertices(_))
        ));
    }

    #[test]
    fn open_ring_is_rejected() {
        let open = vec![
            Position::new(0.0, 0.0),
            Position::new(1.0, 1.0),
            Position::new(1.0, 2.0),
            Position::new(2.0, 4.0),
            Position::new(4.0, 5.0),
        ];
        assert_eq!(
            point_in_polygon(Position::new(0.5, 0.5), &open),
            Err(InvalidPolygon::OpenRing)
        );
    }

    #[test]
    fn repeated_corners_do_not_count_as_distinct() {
        let degenerate = vec![
            Position::new(0.0, 0.0),
            Position::new(1.0, 1.0),
            Position::new(1.0, 1.0),
            Position::new(0.0, 0.0),
        ];
        assert_eq!(
            validate_ring(&degenerate),
            Err(InvalidPolygon::TooFewVertices(2))
        );
    }

    #[test]
    fn concave_polygon_notch_is_outside() {
        // U shape opening north
        let u_shape = vec![
            Position::new(0.0, 0.0),
            Position::new(3.0, 0.0),
            Position::new(3.0, 3.0),
            Position::new(2.0, 3.0),
            Position::new(2.0, 1.0),
            Position::new(1.0, 1.0),
            Position::new(1.0, 3.0),
            Position::new(0.0, 3.0),
            Position::new(0.0, 0.0),
        ];
        assert_eq!(point_in_polygon(Position::new(1.5, 2.0), &u_shape), Ok(false));
        assert_eq!(point_in_polygon(Position::new(0.5, 2.0), &u_shape), Ok(true));
        assert_eq!(point_in_polygon(Position::new(1.5, 0.5), &u_shape), Ok(true));
    }
}

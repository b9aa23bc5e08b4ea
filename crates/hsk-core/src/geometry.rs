//! Edge paths and the cut-stroke intersection test.
//!
//! Edges are tested against the path they are actually drawn with, so an
//! orthogonal or curved edge is only cut where the stroke crosses its
//! visible route, never along the straight chord between its endpoints.

use kurbo::{Affine, BezPath, Line, Point};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How an edge is routed between its two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EdgeStyle {
    /// Straight segment.
    Direct,
    /// Horizontal-biased cubic curve.
    Bezier,
    /// Vertical–horizontal–vertical polyline turning at mid-height.
    #[default]
    Orthogonal,
}

impl EdgeStyle {
    /// Tag used in saved files.
    pub fn code(self) -> u8 {
        match self {
            EdgeStyle::Direct => 1,
            EdgeStyle::Bezier => 2,
            EdgeStyle::Orthogonal => 3,
        }
    }

    /// Unknown tags fall back to orthogonal routing.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => EdgeStyle::Direct,
            2 => EdgeStyle::Bezier,
            _ => EdgeStyle::Orthogonal,
        }
    }
}

impl Serialize for EdgeStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for EdgeStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(EdgeStyle::from_code(u8::deserialize(deserializer)?))
    }
}

/// Node-local → scene transform. Local coordinates are centred on the node,
/// so rotation (clockwise, degrees) and scale pivot on the node centre.
pub fn node_transform(position: Point, rotation_deg: f64, scale: f64) -> Affine {
    Affine::translate(position.to_vec2())
        * Affine::rotate(rotation_deg.to_radians())
        * Affine::scale(scale)
}

/// Build the drawn path of an edge from `source` to `destination`.
pub fn edge_path(style: EdgeStyle, source: Point, destination: Point) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(source);
    match style {
        EdgeStyle::Direct => path.line_to(destination),
        EdgeStyle::Bezier => {
            let dist = (destination.x - source.x).abs() * 0.5;
            path.curve_to(
                Point::new(source.x + dist, source.y),
                Point::new(destination.x - dist, destination.y),
                destination,
            );
        }
        EdgeStyle::Orthogonal => {
            let y_turn = (source.y + destination.y) / 2.0;
            path.line_to(Point::new(source.x, y_turn));
            path.line_to(Point::new(destination.x, y_turn));
            path.line_to(destination);
        }
    }
    path
}

/// Whether the segment `p1 → p2` crosses `path` anywhere.
pub fn segment_crosses_path(path: &BezPath, p1: Point, p2: Point) -> bool {
    if p1 == p2 {
        return false;
    }
    let cut = Line::new(p1, p2);
    path.segments().any(|seg| !seg.intersect_line(cut).is_empty())
}

/// Whether any consecutive pair of the polyline `points` crosses `path`.
pub fn polyline_crosses_path(path: &BezPath, points: &[Point]) -> bool {
    points
        .windows(2)
        .any(|pair| segment_crosses_path(path, pair[0], pair[1]))
}

//! Glyph outlines as contours of edge segments.
//!
//! A decoded glyph is a [`Shape`](struct.Shape.html): an ordered set of
//! closed [`Contour`](struct.Contour.html)s, each an ordered sequence of
//! [`EdgeSegment`](enum.EdgeSegment.html)s. Coordinates are 64-bit floats in
//! the font's em-unit coordinate system, y-up. The `glyf` decoder only emits
//! `Linear` and `Quadratic` edges; `Cubic` exists for downstream consumers
//! and survives affine transformation like the others.

/// Absolute tolerance used when testing points for coincidence.
pub const COINCIDENT_TOLERANCE: f64 = 1e-10;

/// A point or vector in the em-unit coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

/// A piece of a contour: a line segment or a Bézier curve.
///
/// The first point of each variant is the start of the segment and the last
/// point its end; the points between are control points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeSegment {
    Linear(Vec2, Vec2),
    Quadratic(Vec2, Vec2, Vec2),
    Cubic(Vec2, Vec2, Vec2, Vec2),
}

/// A closed loop of edges.
///
/// The end point of each edge coincides with the start point of the next,
/// and the end of the last edge with the start of the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    pub edges: Vec<EdgeSegment>,
}

/// A whole glyph outline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    pub contours: Vec<Contour>,
}

/// Row-major affine transform.
///
/// Maps `(x, y)` to `(a·x + c·y + dx, b·x + d·y + dy)`, the composite glyph
/// component convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub dx: f64,
    pub dy: f64,
}

/// A decoded `glyf` point: an absolute position plus its on-curve flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPoint {
    pub point: Vec2,
    pub on_curve: bool,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Vec2 {
        Vec2 { x, y }
    }

    pub fn midpoint(self, other: Vec2) -> Vec2 {
        Vec2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Componentwise equality within an absolute tolerance.
    pub fn approx_eq(self, other: Vec2, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl EdgeSegment {
    pub fn start(&self) -> Vec2 {
        match *self {
            EdgeSegment::Linear(p0, _) => p0,
            EdgeSegment::Quadratic(p0, _, _) => p0,
            EdgeSegment::Cubic(p0, _, _, _) => p0,
        }
    }

    pub fn end(&self) -> Vec2 {
        match *self {
            EdgeSegment::Linear(_, p1) => p1,
            EdgeSegment::Quadratic(_, _, p2) => p2,
            EdgeSegment::Cubic(_, _, _, p3) => p3,
        }
    }

    pub fn transform(&self, t: &Transform) -> EdgeSegment {
        match *self {
            EdgeSegment::Linear(p0, p1) => EdgeSegment::Linear(t.apply(p0), t.apply(p1)),
            EdgeSegment::Quadratic(p0, p1, p2) => {
                EdgeSegment::Quadratic(t.apply(p0), t.apply(p1), t.apply(p2))
            }
            EdgeSegment::Cubic(p0, p1, p2, p3) => {
                EdgeSegment::Cubic(t.apply(p0), t.apply(p1), t.apply(p2), t.apply(p3))
            }
        }
    }

    /// True when every point of the segment coincides within `tolerance`.
    fn is_degenerate(&self, tolerance: f64) -> bool {
        let p0 = self.start();
        match *self {
            EdgeSegment::Linear(_, p1) => p0.approx_eq(p1, tolerance),
            EdgeSegment::Quadratic(_, p1, p2) => {
                p0.approx_eq(p1, tolerance) && p0.approx_eq(p2, tolerance)
            }
            EdgeSegment::Cubic(_, p1, p2, p3) => {
                p0.approx_eq(p1, tolerance)
                    && p0.approx_eq(p2, tolerance)
                    && p0.approx_eq(p3, tolerance)
            }
        }
    }
}

impl Contour {
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Whether the end of the last edge returns to the start of the first
    /// within `tolerance`. Empty contours count as closed.
    pub fn is_closed(&self, tolerance: f64) -> bool {
        match (self.edges.first(), self.edges.last()) {
            (Some(first), Some(last)) => last.end().approx_eq(first.start(), tolerance),
            _ => true,
        }
    }

    /// This contour with `t` applied to every edge.
    pub fn transform(mut self, t: &Transform) -> Contour {
        for edge in &mut self.edges {
            *edge = edge.transform(t);
        }
        self
    }
}

impl Shape {
    pub fn new(contours: Vec<Contour>) -> Shape {
        Shape { contours }
    }

    /// A shape with no contours, produced for empty glyphs such as a space.
    pub fn empty() -> Shape {
        Shape::default()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.iter().all(Contour::is_empty)
    }

    /// The axis-aligned box containing every edge point of the shape, as
    /// `(min, max)` corners, or `None` for an empty shape.
    ///
    /// Control points are included, so the box can exceed the curves
    /// themselves; distance-field generators padding a render grid want the
    /// conservative extent.
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        let mut bounds: Option<(Vec2, Vec2)> = None;
        for contour in &self.contours {
            for edge in &contour.edges {
                let points: &[Vec2] = match edge {
                    EdgeSegment::Linear(p0, p1) => &[*p0, *p1],
                    EdgeSegment::Quadratic(p0, p1, p2) => &[*p0, *p1, *p2],
                    EdgeSegment::Cubic(p0, p1, p2, p3) => &[*p0, *p1, *p2, *p3],
                };
                for p in points {
                    bounds = Some(match bounds {
                        None => (*p, *p),
                        Some((min, max)) => (
                            Vec2::new(min.x.min(p.x), min.y.min(p.y)),
                            Vec2::new(max.x.max(p.x), max.y.max(p.y)),
                        ),
                    });
                }
            }
        }
        bounds
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        dx: 0.0,
        dy: 0.0,
    };

    pub fn translate(dx: f64, dy: f64) -> Transform {
        Transform {
            dx,
            dy,
            ..Transform::IDENTITY
        }
    }

    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.dx,
            self.b * p.x + self.d * p.y + self.dy,
        )
    }
}

impl GlyphPoint {
    pub fn new(point: Vec2, on_curve: bool) -> GlyphPoint {
        GlyphPoint { point, on_curve }
    }
}

/// Build one closed contour from a `glyf` point sequence.
///
/// TrueType stores a contour as a cyclic run of on- and off-curve points.
/// Traversal starts at the first on-curve point; a contour made entirely of
/// off-curve points starts at the implied midpoint of its first two points.
/// Consecutive off-curve points imply an on-curve point midway between them.
/// The closing edge returns to the start: a quadratic when an off-curve
/// control is pending and not already coincident with the walk position, a
/// line when the walk stops short of the start.
///
/// A degenerate sequence (fewer than two distinct positions) produces an
/// empty contour.
pub fn build_contour(points: &[GlyphPoint]) -> Contour {
    let mut contour = Contour::default();

    // Visit every point once, beginning just after the traversal origin. A
    // real on-curve start point is not revisited; a synthesized start leaves
    // every point to visit, with the first point of the slice coming last.
    let (start, skip, take) = match points.iter().position(|p| p.on_curve) {
        Some(index) => (points[index].point, index + 1, index),
        None => match points {
            [] | [_] => return contour,
            [first, second, ..] => (first.point.midpoint(second.point), 1, 1),
        },
    };
    let sequence = points.iter().skip(skip).chain(points.iter().take(take));

    let mut cur = start;
    let mut ctrl: Option<Vec2> = None;
    for p in sequence {
        if p.on_curve {
            let edge = match ctrl.take() {
                Some(c) => EdgeSegment::Quadratic(cur, c, p.point),
                None => EdgeSegment::Linear(cur, p.point),
            };
            if push_edge(&mut contour.edges, edge) {
                cur = p.point;
            }
        } else {
            if let Some(c) = ctrl {
                let mid = c.midpoint(p.point);
                if push_edge(&mut contour.edges, EdgeSegment::Quadratic(cur, c, mid)) {
                    cur = mid;
                }
            }
            ctrl = Some(p.point);
        }
    }

    if let Some(c) = ctrl {
        // A pending control coincident with the walk position degenerates to
        // the plain linear close below.
        if !c.approx_eq(cur, COINCIDENT_TOLERANCE) {
            if push_edge(&mut contour.edges, EdgeSegment::Quadratic(cur, c, start)) {
                cur = start;
            }
        }
    }
    if !cur.approx_eq(start, COINCIDENT_TOLERANCE) {
        push_edge(&mut contour.edges, EdgeSegment::Linear(cur, start));
    }

    contour
}

/// Append `edge` unless it is degenerate. Returns whether it was appended.
fn push_edge(edges: &mut Vec<EdgeSegment>, edge: EdgeSegment) -> bool {
    if edge.is_degenerate(COINCIDENT_TOLERANCE) {
        false
    } else {
        edges.push(edge);
        true
    }
}

use super::PlacementError;
use super::select::Representative;
use crate::style::{LabelPlacement, PlacementMode};
use crate::text_metrics::GlyphRun;
use geo::{AffineTransform, Centroid, Coord, EuclideanLength, LineString, Polygon, Rect};

/// Fraction of the arc length at which a line label sits. Clamped away from
/// the exact endpoints so the enclosing segment is always well defined.
const LINE_PLACEMENT_FRACTION: f64 = 0.5;
const LINE_FRACTION_MIN: f64 = 0.01;
const LINE_FRACTION_MAX: f64 = 0.99;

/// The placement of one glyph run: rotate about the run's baseline origin,
/// then translate into screen space. `anchor` is the world point the label
/// was attached to (used to center shield graphics).
#[derive(Debug, Clone, Copy)]
pub struct LabelTransform {
    pub tx: f64,
    pub ty: f64,
    pub rotation_deg: f64,
    pub anchor: Coord<f64>,
}

impl LabelTransform {
    pub fn to_affine(&self) -> AffineTransform<f64> {
        let theta = self.rotation_deg.to_radians();
        let (sin, cos) = theta.sin_cos();
        AffineTransform::new(cos, -sin, self.tx, sin, cos, self.ty)
    }

    /// Axis-aligned bounds of a local rect after this transform.
    pub fn transformed_bounds(&self, local: &Rect<f64>) -> Rect<f64> {
        let affine = self.to_affine();
        let corners = [
            affine.apply(Coord {
                x: local.min().x,
                y: local.min().y,
            }),
            affine.apply(Coord {
                x: local.max().x,
                y: local.min().y,
            }),
            affine.apply(Coord {
                x: local.max().x,
                y: local.max().y,
            }),
            affine.apply(Coord {
                x: local.min().x,
                y: local.max().y,
            }),
        ];
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for corner in corners {
            min_x = min_x.min(corner.x);
            min_y = min_y.min(corner.y);
            max_x = max_x.max(corner.x);
            max_y = max_y.max(corner.y);
        }
        Rect::new((min_x, min_y), (max_x, max_y))
    }

    /// SVG applies transform lists right to left: rotate about the local
    /// origin first, then translate.
    pub fn svg_transform(&self) -> String {
        if self.rotation_deg == 0.0 {
            format!("translate({:.2} {:.2})", self.tx, self.ty)
        } else {
            format!(
                "translate({:.2} {:.2}) rotate({:.2})",
                self.tx, self.ty, self.rotation_deg
            )
        }
    }
}

/// Build the placement transform for a representative geometry.
pub fn build_transform(
    representative: &Representative,
    placement: &LabelPlacement,
    run: &GlyphRun,
) -> Result<LabelTransform, PlacementError> {
    match representative {
        Representative::Point(point) => Ok(point_transform(point.0, placement, run)),
        Representative::Line(line) => line_transform(line, placement, run),
        Representative::Poly(polygon) => {
            let anchor = polygon_anchor(polygon)?;
            Ok(point_transform(anchor, placement, run))
        }
    }
}

/// Anchor-relative placement at a fixed point. When a line-mode style is
/// reduced onto a point (or a polygon centroid), the perpendicular offset
/// still applies as a vertical shift.
fn point_transform(at: Coord<f64>, placement: &LabelPlacement, run: &GlyphRun) -> LabelTransform {
    let (anchor_x, anchor_y) = placement.anchor;
    let (dx, mut dy) = placement.displacement;
    if placement.mode == PlacementMode::Line {
        dy -= placement.perpendicular_offset;
    }
    let width = run.width;
    let height = run.height();
    LabelTransform {
        // Displacement y is up; screen y is down.
        tx: at.x + dx - width * anchor_x,
        ty: at.y - dy + height * anchor_y - run.descent,
        rotation_deg: normalize_rotation(placement.rotation),
        anchor: at,
    }
}

/// Place along a line: anchor at the arc-length midpoint, rotated to the
/// local tangent. A point-mode style reduced onto a line keeps its own
/// rotation instead of the tangent.
fn line_transform(
    line: &LineString<f64>,
    placement: &LabelPlacement,
    run: &GlyphRun,
) -> Result<LabelTransform, PlacementError> {
    let (at, tangent_deg) = point_along(line, LINE_PLACEMENT_FRACTION)?;
    let effective = if placement.mode == PlacementMode::Line {
        LabelPlacement {
            anchor: (0.5, 0.5),
            rotation: tangent_deg,
            ..placement.clone()
        }
    } else {
        placement.clone()
    };
    Ok(point_transform(at, &effective, run))
}

/// Walk the line to the given arc-length fraction; returns the coordinate
/// there and the enclosing segment's tangent angle in degrees (screen
/// space, clockwise positive).
fn point_along(
    line: &LineString<f64>,
    fraction: f64,
) -> Result<(Coord<f64>, f64), PlacementError> {
    if line.0.len() < 2 {
        return Err(PlacementError::NoAnchor);
    }
    let total = line.euclidean_length();
    if total <= 0.0 {
        return Err(PlacementError::NoAnchor);
    }
    let mut remaining = total * fraction.clamp(LINE_FRACTION_MIN, LINE_FRACTION_MAX);
    for pair in line.0.windows(2) {
        let dx = pair[1].x - pair[0].x;
        let dy = pair[1].y - pair[0].y;
        let segment = (dx * dx + dy * dy).sqrt();
        if segment <= 0.0 {
            continue;
        }
        if remaining <= segment {
            let alpha = remaining / segment;
            let at = Coord {
                x: pair[0].x + dx * alpha,
                y: pair[0].y + dy * alpha,
            };
            return Ok((at, dy.atan2(dx).to_degrees()));
        }
        remaining -= segment;
    }
    // Accumulated floating error walked past the final segment.
    let last = line.0[line.0.len() - 1];
    let prev = line.0[line.0.len() - 2];
    let angle = (last.y - prev.y).atan2(last.x - prev.x).to_degrees();
    Ok((last, angle))
}

/// Centroid with fallbacks: polygon centroid, exterior-ring centroid, first
/// exterior coordinate.
fn polygon_anchor(polygon: &Polygon<f64>) -> Result<Coord<f64>, PlacementError> {
    if let Some(centroid) = polygon.centroid() {
        return Ok(centroid.0);
    }
    if let Some(centroid) = polygon.exterior().centroid() {
        return Ok(centroid.0);
    }
    polygon
        .exterior()
        .0
        .first()
        .copied()
        .ok_or(PlacementError::NoAnchor)
}

fn normalize_rotation(rotation: f64) -> f64 {
    if rotation.is_finite() { rotation } else { 0.0 }
}

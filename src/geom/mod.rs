pub(crate) mod clip;
pub(crate) mod merge;

pub use clip::{clip_lines, clip_polygon};
pub use merge::merge_line_network;

use geo::{Geometry, LineString, Point, Polygon, Rect};

/// Broad geometry class used to dispatch placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeomKind {
    Point,
    Line,
    Poly,
}

/// Classify a geometry by its placement family. Collections take the class
/// of their first member; empty collections have no class.
pub fn kind(geometry: &Geometry<f64>) -> Option<GeomKind> {
    match geometry {
        Geometry::Point(_) | Geometry::MultiPoint(_) => Some(GeomKind::Point),
        Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
            Some(GeomKind::Line)
        }
        Geometry::Polygon(_)
        | Geometry::MultiPolygon(_)
        | Geometry::Rect(_)
        | Geometry::Triangle(_) => Some(GeomKind::Poly),
        Geometry::GeometryCollection(gc) => gc.0.first().and_then(kind),
    }
}

/// All point components of the given geometries, in input order.
pub fn collect_points(geometries: &[Geometry<f64>]) -> Vec<Point<f64>> {
    let mut points = Vec::new();
    for geometry in geometries {
        push_points(geometry, &mut points);
    }
    points
}

fn push_points(geometry: &Geometry<f64>, out: &mut Vec<Point<f64>>) {
    match geometry {
        Geometry::Point(p) => out.push(*p),
        Geometry::MultiPoint(mp) => out.extend(mp.0.iter().copied()),
        Geometry::GeometryCollection(gc) => {
            for member in &gc.0 {
                push_points(member, out);
            }
        }
        _ => {}
    }
}

/// All line components, including polygon boundary rings, in input order.
pub fn collect_lines(geometries: &[Geometry<f64>]) -> Vec<LineString<f64>> {
    let mut lines = Vec::new();
    for geometry in geometries {
        push_lines(geometry, &mut lines);
    }
    lines
}

fn push_lines(geometry: &Geometry<f64>, out: &mut Vec<LineString<f64>>) {
    match geometry {
        Geometry::Line(l) => out.push(LineString::from(vec![l.start, l.end])),
        Geometry::LineString(ls) => out.push(ls.clone()),
        Geometry::MultiLineString(mls) => out.extend(mls.0.iter().cloned()),
        Geometry::Polygon(p) => push_rings(p, out),
        Geometry::MultiPolygon(mp) => {
            for p in &mp.0 {
                push_rings(p, out);
            }
        }
        Geometry::Rect(r) => push_rings(&r.to_polygon(), out),
        Geometry::Triangle(t) => push_rings(&t.to_polygon(), out),
        Geometry::GeometryCollection(gc) => {
            for member in &gc.0 {
                push_lines(member, out);
            }
        }
        Geometry::Point(_) | Geometry::MultiPoint(_) => {}
    }
}

fn push_rings(polygon: &Polygon<f64>, out: &mut Vec<LineString<f64>>) {
    out.push(polygon.exterior().clone());
    out.extend(polygon.interiors().iter().cloned());
}

/// All polygon components, in input order.
pub fn collect_polygons(geometries: &[Geometry<f64>]) -> Vec<Polygon<f64>> {
    let mut polygons = Vec::new();
    for geometry in geometries {
        push_polygons(geometry, &mut polygons);
    }
    polygons
}

fn push_polygons(geometry: &Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(p) => out.push(p.clone()),
        Geometry::MultiPolygon(mp) => out.extend(mp.0.iter().cloned()),
        Geometry::Rect(r) => out.push(r.to_polygon()),
        Geometry::Triangle(t) => out.push(t.to_polygon()),
        Geometry::GeometryCollection(gc) => {
            for member in &gc.0 {
                push_polygons(member, out);
            }
        }
        _ => {}
    }
}

/// Drop interior rings. Fit sampling measures distance to the shell only.
pub fn strip_holes(polygon: &Polygon<f64>) -> Polygon<f64> {
    Polygon::new(polygon.exterior().clone(), Vec::new())
}

/// Grow (or with a negative pad, shrink) a rect on all four sides.
pub fn inflate(rect: &Rect<f64>, pad: f64) -> Rect<f64> {
    if pad == 0.0 {
        return *rect;
    }
    Rect::new(
        (rect.min().x - pad, rect.min().y - pad),
        (rect.max().x + pad, rect.max().y + pad),
    )
}

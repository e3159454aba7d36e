use super::PlacementError;
use crate::geom::{
    self, GeomKind, clip_lines, clip_polygon, collect_lines, collect_points, collect_polygons,
    merge_line_network,
};
use geo::{Area, EuclideanLength, Geometry, Intersects, LineString, Point, Polygon};

/// The single geometry a label anchors on, chosen from the (possibly
/// grouped) geometries of one cache item.
#[derive(Debug, Clone)]
pub enum Representative {
    Point(Point<f64>),
    Line(LineString<f64>),
    Poly(Polygon<f64>),
}

/// Pick the representative geometry for a label. The placement family is
/// decided once, from the first geometry; all members of the group then
/// contribute candidates of that family.
pub fn representative(
    geometries: &[Geometry<f64>],
    display: &Polygon<f64>,
) -> Result<Representative, PlacementError> {
    let first = geometries.first().ok_or(PlacementError::NoRepresentative)?;
    match geom::kind(first) {
        Some(GeomKind::Point) => point_representative(geometries, display),
        Some(GeomKind::Line) => line_representative(geometries, display),
        Some(GeomKind::Poly) => polygon_representative(geometries, display),
        None => Err(PlacementError::NoRepresentative),
    }
}

/// First on-screen point wins. No distance-based tie-break is applied; with
/// several on-screen members of a group the choice is simply input order.
fn point_representative(
    geometries: &[Geometry<f64>],
    display: &Polygon<f64>,
) -> Result<Representative, PlacementError> {
    collect_points(geometries)
        .into_iter()
        .find(|point| point.intersects(display))
        .map(Representative::Point)
        .ok_or(PlacementError::NoRepresentative)
}

/// Merge the group's fragments into continuous paths, clip them to the
/// display, and label the longest surviving path.
fn line_representative(
    geometries: &[Geometry<f64>],
    display: &Polygon<f64>,
) -> Result<Representative, PlacementError> {
    let merged = merge_line_network(collect_lines(geometries));
    clip_lines(merged, display)
        .into_iter()
        .filter(|line| line.0.len() >= 2)
        .max_by(|a, b| a.euclidean_length().total_cmp(&b.euclidean_length()))
        .filter(|line| line.euclidean_length() > 0.0)
        .map(Representative::Line)
        .ok_or(PlacementError::NoRepresentative)
}

/// Clip each polygon to the display and label the largest surviving part.
fn polygon_representative(
    geometries: &[Geometry<f64>],
    display: &Polygon<f64>,
) -> Result<Representative, PlacementError> {
    collect_polygons(geometries)
        .iter()
        .flat_map(|polygon| clip_polygon(polygon, display).0)
        .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
        .filter(|polygon| polygon.unsigned_area() > 0.0)
        .map(Representative::Poly)
        .ok_or(PlacementError::NoRepresentative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Rect, line_string, polygon};

    fn display() -> Polygon<f64> {
        Rect::new((0.0, 0.0), (100.0, 100.0)).to_polygon()
    }

    #[test]
    fn first_on_screen_point_is_chosen() {
        let geometries = vec![
            Geometry::Point(Point::new(-50.0, -50.0)),
            Geometry::Point(Point::new(30.0, 30.0)),
            Geometry::Point(Point::new(50.0, 50.0)),
        ];
        let rep = representative(&geometries, &display()).unwrap();
        match rep {
            Representative::Point(p) => {
                assert_eq!(p, Point::new(30.0, 30.0));
            }
            other => panic!("expected point, got {other:?}"),
        }
    }

    #[test]
    fn all_points_off_screen_is_an_error() {
        let geometries = vec![Geometry::Point(Point::new(-50.0, -50.0))];
        assert!(matches!(
            representative(&geometries, &display()),
            Err(PlacementError::NoRepresentative)
        ));
    }

    #[test]
    fn fragmented_line_group_yields_one_merged_path() {
        let geometries = vec![
            Geometry::LineString(line_string![(x: 10.0, y: 50.0), (x: 40.0, y: 50.0)]),
            Geometry::LineString(line_string![(x: 40.0, y: 50.0), (x: 90.0, y: 50.0)]),
        ];
        let rep = representative(&geometries, &display()).unwrap();
        match rep {
            Representative::Line(line) => {
                assert!((line.euclidean_length() - 80.0).abs() < 1e-6);
            }
            other => panic!("expected line, got {other:?}"),
        }
    }

    #[test]
    fn longest_clipped_segment_wins() {
        let geometries = vec![
            Geometry::LineString(line_string![(x: 10.0, y: 10.0), (x: 30.0, y: 10.0)]),
            // Long line, but mostly off screen.
            Geometry::LineString(line_string![(x: 95.0, y: 90.0), (x: 400.0, y: 90.0)]),
        ];
        let rep = representative(&geometries, &display()).unwrap();
        match rep {
            Representative::Line(line) => {
                assert!((line.euclidean_length() - 20.0).abs() < 1e-6);
            }
            other => panic!("expected line, got {other:?}"),
        }
    }

    #[test]
    fn largest_clipped_polygon_part_wins() {
        let small: Polygon<f64> = polygon![
            (x: 10.0, y: 10.0), (x: 40.0, y: 10.0), (x: 40.0, y: 40.0), (x: 10.0, y: 40.0), (x: 10.0, y: 10.0),
        ];
        // Much larger on paper, but clipped down to a 10x10 corner.
        let huge: Polygon<f64> = polygon![
            (x: 90.0, y: 90.0), (x: 400.0, y: 90.0), (x: 400.0, y: 400.0), (x: 90.0, y: 400.0), (x: 90.0, y: 90.0),
        ];
        let geometries = vec![Geometry::Polygon(huge), Geometry::Polygon(small)];
        let rep = representative(&geometries, &display()).unwrap();
        match rep {
            Representative::Poly(p) => {
                assert!((p.unsigned_area() - 900.0).abs() < 1e-6);
            }
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn empty_group_has_no_representative() {
        assert!(matches!(
            representative(&[], &display()),
            Err(PlacementError::NoRepresentative)
        ));
    }
}

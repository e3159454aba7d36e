use super::select::Representative;
use crate::geom::strip_holes;
use geo::{BoundingRect, EuclideanDistance, Point, Polygon, Rect};

/// Candidates scoring below this are not painted.
pub const FIT_THRESHOLD: f64 = 0.7;

const FIT_SAMPLES: usize = 10;

/// How well the label's bounding box represents the geometry underneath.
///
/// Point and line representatives always score 1.0; only polygon labels can
/// sprawl past their geometry. For polygons the score is sampled, not
/// exact: ten points along the horizontal center line of the label bounds,
/// each counted when it sits within one glyph-height of the hole-free
/// polygon.
pub fn goodness_of_fit(representative: &Representative, bounds: &Rect<f64>) -> f64 {
    match representative {
        Representative::Point(_) | Representative::Line(_) => 1.0,
        Representative::Poly(polygon) => polygon_fit(polygon, bounds),
    }
}

fn polygon_fit(polygon: &Polygon<f64>, bounds: &Rect<f64>) -> f64 {
    let width = bounds.width();
    let height = bounds.height();
    if width <= 0.0 || height <= 0.0 {
        return 0.0;
    }
    let shell = strip_holes(polygon);
    // A collapsed ring cannot answer distance queries meaningfully.
    if shell.exterior().0.len() < 4 {
        return envelope_overlap(polygon, bounds);
    }

    let center_y = (bounds.min().y + bounds.max().y) / 2.0;
    let mut hits = 0usize;
    for i in 0..FIT_SAMPLES {
        let x = bounds.min().x + width * (i as f64 + 0.5) / FIT_SAMPLES as f64;
        let sample = Point::new(x, center_y);
        if sample.euclidean_distance(&shell) < height {
            hits += 1;
        }
    }
    hits as f64 / FIT_SAMPLES as f64
}

/// Coarse fallback: how much of the label envelope the geometry envelope
/// covers.
fn envelope_overlap(polygon: &Polygon<f64>, bounds: &Rect<f64>) -> f64 {
    let Some(env) = polygon.bounding_rect() else {
        return 0.0;
    };
    let x0 = bounds.min().x.max(env.min().x);
    let y0 = bounds.min().y.max(env.min().y);
    let x1 = bounds.max().x.min(env.max().x);
    let y1 = bounds.max().y.min(env.max().y);
    let overlap = (x1 - x0).max(0.0) * (y1 - y0).max(0.0);
    let area = bounds.width() * bounds.height();
    if area <= 0.0 { 0.0 } else { overlap / area }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, line_string, polygon};

    #[test]
    fn points_and_lines_always_fit() {
        let bounds = Rect::new((0.0, 0.0), (100.0, 12.0));
        let point = Representative::Point(Point::new(3.0, 3.0));
        let line = Representative::Line(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)]);
        assert_eq!(goodness_of_fit(&point, &bounds), 1.0);
        assert_eq!(goodness_of_fit(&line, &bounds), 1.0);
    }

    #[test]
    fn label_inside_a_large_polygon_scores_full() {
        let poly: Polygon<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 200.0, y: 0.0), (x: 200.0, y: 100.0), (x: 0.0, y: 100.0), (x: 0.0, y: 0.0),
        ];
        let bounds = Rect::new((50.0, 45.0), (150.0, 57.0));
        let score = goodness_of_fit(&Representative::Poly(poly), &bounds);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn label_hanging_off_a_small_polygon_scores_low() {
        // The polygon covers only the left tenth of a wide label.
        let poly: Polygon<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 20.0, y: 0.0), (x: 20.0, y: 20.0), (x: 0.0, y: 20.0), (x: 0.0, y: 0.0),
        ];
        let bounds = Rect::new((0.0, 4.0), (300.0, 16.0));
        let score = goodness_of_fit(&Representative::Poly(poly), &bounds);
        assert!(score < FIT_THRESHOLD, "score {score}");
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn score_is_a_tenth_per_sample() {
        // Polygon spans half the label width; the right-half samples are
        // beyond one glyph-height (12px) of the shell.
        let poly: Polygon<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 40.0), (x: 0.0, y: 40.0), (x: 0.0, y: 0.0),
        ];
        let bounds = Rect::new((0.0, 14.0), (200.0, 26.0));
        let score = goodness_of_fit(&Representative::Poly(poly), &bounds);
        assert!((score * 10.0).fract().abs() < 1e-9);
        assert!(score > 0.4 && score < 0.8, "score {score}");
    }

    #[test]
    fn holes_do_not_reduce_the_score() {
        let with_hole: Polygon<f64> = polygon![
            exterior: [
                (x: 0.0, y: 0.0), (x: 200.0, y: 0.0), (x: 200.0, y: 100.0), (x: 0.0, y: 100.0), (x: 0.0, y: 0.0),
            ],
            interiors: [[
                (x: 80.0, y: 40.0), (x: 120.0, y: 40.0), (x: 120.0, y: 60.0), (x: 80.0, y: 60.0), (x: 80.0, y: 40.0),
            ]],
        ];
        let bounds = Rect::new((50.0, 44.0), (150.0, 56.0));
        let score = goodness_of_fit(&Representative::Poly(with_hole), &bounds);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn degenerate_polygon_falls_back_to_envelope_overlap() {
        let sliver = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (10.0, 10.0), (0.0, 0.0)]),
            vec![],
        );
        let bounds = Rect::new((0.0, 0.0), (10.0, 10.0));
        let score = goodness_of_fit(&Representative::Poly(sliver), &bounds);
        assert!((0.0..=1.0).contains(&score));
    }
}

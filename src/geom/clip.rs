// Viewport clipping. Boolean operations on invalid or nearly-degenerate
// polygons can panic deep inside the overlay algorithm; a label is never
// worth aborting a render pass, so those failures fall back to the
// unclipped input and let the off-display check sort it out.

use geo::{BooleanOps, LineString, MultiLineString, MultiPolygon, Polygon};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Clip a set of lines to the display polygon. On an overlay failure the
/// input is returned unclipped.
pub fn clip_lines(lines: Vec<LineString<f64>>, clip: &Polygon<f64>) -> Vec<LineString<f64>> {
    let multi = MultiLineString(lines);
    match catch_unwind(AssertUnwindSafe(|| clip.clip(&multi, false))) {
        Ok(clipped) => clipped.0,
        Err(_) => {
            log::debug!("line clip failed; keeping unclipped geometry");
            multi.0
        }
    }
}

/// Exact intersection of one polygon with the display polygon. An overlay
/// failure yields the unclipped polygon; an empty result is a genuine
/// "nothing on screen" answer and is returned as such.
pub fn clip_polygon(polygon: &Polygon<f64>, clip: &Polygon<f64>) -> MultiPolygon<f64> {
    match catch_unwind(AssertUnwindSafe(|| clip.intersection(polygon))) {
        Ok(clipped) => clipped,
        Err(_) => {
            log::debug!("polygon clip failed; keeping unclipped geometry");
            MultiPolygon(vec![polygon.clone()])
        }
    }
}

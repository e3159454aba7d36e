use crate::geom::inflate;
use geo::{Intersects, Rect};

/// Bounding rectangles of every label (and shield) accepted so far in the
/// current paint pass. Rectangles are stored pre-inflated by their own
/// label's margin, so a later candidate only needs its own inflation before
/// the intersection test.
#[derive(Debug, Default)]
pub struct PlacedBounds {
    rects: Vec<Rect<f64>>,
}

impl PlacedBounds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Does `candidate`, grown by `space` pixels on every side, touch any
    /// previously recorded rectangle?
    pub fn collides(&self, candidate: &Rect<f64>, space: f64) -> bool {
        let inflated = inflate(candidate, space.max(0.0));
        self.rects.iter().any(|placed| inflated.intersects(placed))
    }

    pub fn record(&mut self, bounds: Rect<f64>, space: f64) {
        self.rects.push(inflate(&bounds, space.max(0.0)));
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

pub(crate) mod fit;
pub(crate) mod overlap;
pub(crate) mod select;
pub(crate) mod transform;

pub use fit::{FIT_THRESHOLD, goodness_of_fit};
pub use overlap::PlacedBounds;
pub use select::{Representative, representative};
pub use transform::{LabelTransform, build_transform};

use crate::cache::LabelCacheItem;
use crate::style::TextSymbolizer;
use crate::text_metrics::{GlyphRun, shape_text};
use geo::{Intersects, Polygon, Rect};
use thiserror::Error;

/// Why one label was skipped. Rejections are ordinary outcomes of the paint
/// pass, not failures of the pass itself; the scheduler maps every variant
/// to "skip and continue".
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("label text produced no visible glyphs")]
    EmptyGlyphRun,
    #[error("no geometry of the label intersects the display area")]
    NoRepresentative,
    #[error("no anchor point could be derived for the geometry")]
    NoAnchor,
    #[error("label bounds fall outside the display area")]
    OffDisplay,
    #[error("label bounds collide with an already placed label")]
    Collision,
    #[error("goodness of fit {0:.2} is below the acceptance threshold")]
    PoorFit(f64),
}

/// One accepted label, ready to paint and to record for collision checks.
#[derive(Debug, Clone)]
pub struct PlacedLabel {
    pub text: String,
    pub symbolizer: TextSymbolizer,
    pub run: GlyphRun,
    pub transform: LabelTransform,
    /// Transformed glyph bounds, before any space-around inflation.
    pub bounds: Rect<f64>,
    pub shield_bounds: Option<Rect<f64>>,
    pub goodness: f64,
}

impl PlacedLabel {
    /// The margin every collision test and record uses for this label.
    pub fn collision_space(&self, space_around: i32) -> f64 {
        space_around as f64 + self.symbolizer.halo_radius()
    }
}

/// Run the full placement pipeline for one cache item: shape the text, pick
/// the representative geometry, build the transform, then gate on display
/// membership, collisions and goodness of fit.
pub fn place_label(
    item: &LabelCacheItem,
    display_poly: &Polygon<f64>,
    display_rect: &Rect<f64>,
    placed: &PlacedBounds,
) -> Result<PlacedLabel, PlacementError> {
    let symbolizer = &item.symbolizer;
    let run = shape_text(&item.text, &symbolizer.font.family, symbolizer.font.size);
    if run.width <= 0.0 || run.height() <= 0.0 {
        return Err(PlacementError::EmptyGlyphRun);
    }

    let representative = select::representative(&item.geometries, display_poly)?;
    let transform = build_transform(&representative, &symbolizer.placement, &run)?;
    let bounds = transform.transformed_bounds(&run.bounds());

    let shield_bounds = symbolizer.shield.as_ref().map(|shield| {
        let half = shield.size / 2.0;
        Rect::new(
            (transform.anchor.x - half, transform.anchor.y - half),
            (transform.anchor.x + half, transform.anchor.y + half),
        )
    });

    // The full footprint, shield included, must touch the display.
    let footprint = match &shield_bounds {
        Some(shield) => union_rect(&bounds, shield),
        None => bounds,
    };
    if !footprint.intersects(display_rect) {
        return Err(PlacementError::OffDisplay);
    }

    if item.space_around >= 0 {
        let space = item.space_around as f64 + symbolizer.halo_radius();
        if placed.collides(&bounds, space) {
            return Err(PlacementError::Collision);
        }
        if let Some(shield) = &shield_bounds {
            if placed.collides(shield, space) {
                return Err(PlacementError::Collision);
            }
        }
    }

    let goodness = goodness_of_fit(&representative, &bounds);
    if goodness < FIT_THRESHOLD {
        return Err(PlacementError::PoorFit(goodness));
    }

    Ok(PlacedLabel {
        text: item.text.clone(),
        symbolizer: symbolizer.clone(),
        run,
        transform,
        bounds,
        shield_bounds,
        goodness,
    })
}

fn union_rect(a: &Rect<f64>, b: &Rect<f64>) -> Rect<f64> {
    Rect::new(
        (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
        (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
    )
}

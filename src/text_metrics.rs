use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use geo::Rect;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Mutex;
use ttf_parser::{Face, GlyphId, OutlineBuilder};

static TEXT_SHAPER: Lazy<Mutex<TextShaper>> = Lazy::new(|| Mutex::new(TextShaper::new()));

// Used when no face resolves for a family, or for glyphs a face lacks.
// Keeps shaping deterministic on systems with no fonts installed.
const FALLBACK_ADVANCE_RATIO: f64 = 0.56;
const FALLBACK_ASCENT_RATIO: f64 = 0.8;
const FALLBACK_DESCENT_RATIO: f64 = 0.2;

/// A shaped, unplaced run of glyphs: total advance, vertical metrics and
/// (when a face was available) the combined outline as SVG path data.
/// Local coordinates put the baseline at y = 0 with y growing downward;
/// the run starts at x = 0.
#[derive(Debug, Clone)]
pub struct GlyphRun {
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
    pub path: Option<String>,
}

impl GlyphRun {
    pub fn height(&self) -> f64 {
        self.ascent + self.descent
    }

    /// Pixel bounds of the run in its local coordinate frame.
    pub fn bounds(&self) -> Rect<f64> {
        Rect::new((0.0, -self.ascent), (self.width.max(0.0), self.descent))
    }
}

/// Shape `text` in the requested family and size. Always succeeds: when no
/// face matches, synthetic metrics stand in and `path` is `None`.
pub fn shape_text(text: &str, font_family: &str, font_size: f64) -> GlyphRun {
    if text.is_empty() || font_size <= 0.0 {
        return GlyphRun {
            width: 0.0,
            ascent: 0.0,
            descent: 0.0,
            path: None,
        };
    }
    let normalized = text.replace('\t', "    ");
    match TEXT_SHAPER.lock() {
        Ok(mut guard) => guard.shape(&normalized, font_family, font_size),
        Err(_) => fallback_run(&normalized, font_size),
    }
}

fn fallback_run(text: &str, font_size: f64) -> GlyphRun {
    let count = text.chars().filter(|c| *c != '\n').count() as f64;
    GlyphRun {
        width: count * font_size * FALLBACK_ADVANCE_RATIO,
        ascent: font_size * FALLBACK_ASCENT_RATIO,
        descent: font_size * FALLBACK_DESCENT_RATIO,
        path: None,
    }
}

struct TextShaper {
    db: Database,
    loaded_system_fonts: bool,
    cache: HashMap<String, Option<FontFace>>,
}

impl TextShaper {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            cache: HashMap::new(),
        }
    }

    fn shape(&mut self, text: &str, font_family: &str, font_size: f64) -> GlyphRun {
        let family_key = normalize_family_key(font_family);
        if !self.cache.contains_key(&family_key) {
            let face = self.load_face(font_family);
            self.cache.insert(family_key.clone(), face);
        }
        match self.cache.get_mut(&family_key).and_then(|f| f.as_mut()) {
            Some(face) => face.shape(text, font_size),
            None => fallback_run(text, font_size),
        }
    }

    fn load_face(&mut self, font_family: &str) -> Option<FontFace> {
        #[derive(Clone, Copy)]
        enum FamilyToken {
            Generic(fontdb::Family<'static>),
            Name(usize),
        }

        let mut names: Vec<String> = Vec::new();
        let mut order: Vec<FamilyToken> = Vec::new();
        for part in font_family.split(',') {
            let raw = part.trim().trim_matches('"').trim_matches('\'');
            if raw.is_empty() {
                continue;
            }
            let lower = raw.to_ascii_lowercase();
            match lower.as_str() {
                "serif" => order.push(FamilyToken::Generic(Family::Serif)),
                "sans-serif" => order.push(FamilyToken::Generic(Family::SansSerif)),
                "monospace" => order.push(FamilyToken::Generic(Family::Monospace)),
                "cursive" => order.push(FamilyToken::Generic(Family::Cursive)),
                "fantasy" => order.push(FamilyToken::Generic(Family::Fantasy)),
                "system-ui" | "-apple-system" | "ui-sans-serif" => {
                    order.push(FamilyToken::Generic(Family::SansSerif))
                }
                "ui-monospace" => order.push(FamilyToken::Generic(Family::Monospace)),
                _ => {
                    let idx = names.len();
                    names.push(raw.to_string());
                    order.push(FamilyToken::Name(idx));
                }
            }
        }
        if order.is_empty() {
            order.push(FamilyToken::Generic(Family::SansSerif));
        }

        let mut families: Vec<Family<'_>> = Vec::with_capacity(order.len());
        for token in order {
            match token {
                FamilyToken::Generic(family) => families.push(family),
                FamilyToken::Name(idx) => families.push(Family::Name(names[idx].as_str())),
            }
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        let mut loaded: Option<FontFace> = None;
        self.db.with_face_data(id, |data, index| {
            let bytes = data.to_vec();
            loaded = FontFace::new(bytes, index);
        });
        loaded
    }
}

struct FontFace {
    _data: Vec<u8>,
    face: Face<'static>,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    glyph_cache: HashMap<char, Option<u16>>,
    advance_cache: HashMap<u16, u16>,
}

impl FontFace {
    fn new(data: Vec<u8>, index: u32) -> Option<Self> {
        let parsed = Face::parse(&data, index).ok()?;
        // The face borrows `data`, which lives and dies with this struct
        // and is never mutated after parse.
        let face = unsafe { std::mem::transmute::<Face<'_>, Face<'static>>(parsed) };
        let units_per_em = face.units_per_em().max(1);
        let ascender = face.ascender();
        let descender = face.descender();
        Some(Self {
            _data: data,
            face,
            units_per_em,
            ascender,
            descender,
            glyph_cache: HashMap::new(),
            advance_cache: HashMap::new(),
        })
    }

    fn shape(&mut self, text: &str, font_size: f64) -> GlyphRun {
        let scale = font_size / self.units_per_em as f64;
        let fallback_advance = font_size * FALLBACK_ADVANCE_RATIO;

        let mut pen_x = 0.0f64;
        let mut outline = PathSink::new(scale);

        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let glyph = if let Some(cached) = self.glyph_cache.get(&ch) {
                *cached
            } else {
                let glyph = self.face.glyph_index(ch).map(|id| id.0);
                self.glyph_cache.insert(ch, glyph);
                glyph
            };

            let Some(glyph_id) = glyph else {
                pen_x += fallback_advance;
                continue;
            };

            outline.set_pen(pen_x);
            let _ = self.face.outline_glyph(GlyphId(glyph_id), &mut outline);

            let advance = if let Some(value) = self.advance_cache.get(&glyph_id) {
                *value
            } else {
                let value = self.face.glyph_hor_advance(GlyphId(glyph_id)).unwrap_or(0);
                self.advance_cache.insert(glyph_id, value);
                value
            };
            if advance == 0 {
                pen_x += fallback_advance;
            } else {
                pen_x += advance as f64 * scale;
            }
        }

        GlyphRun {
            width: pen_x.max(0.0),
            ascent: self.ascender.max(0) as f64 * scale,
            descent: -(self.descender.min(0) as f64) * scale,
            path: outline.finish(),
        }
    }
}

/// Accumulates glyph outlines into one SVG path, translating each glyph by
/// the pen position and flipping font-space y (up) into screen-space y
/// (down).
struct PathSink {
    d: String,
    scale: f64,
    pen_x: f64,
}

impl PathSink {
    fn new(scale: f64) -> Self {
        Self {
            d: String::new(),
            scale,
            pen_x: 0.0,
        }
    }

    fn set_pen(&mut self, pen_x: f64) {
        self.pen_x = pen_x;
    }

    fn finish(self) -> Option<String> {
        if self.d.is_empty() {
            None
        } else {
            Some(self.d.trim_end().to_string())
        }
    }

    fn tx(&self, x: f32) -> f64 {
        self.pen_x + x as f64 * self.scale
    }

    fn ty(&self, y: f32) -> f64 {
        -(y as f64) * self.scale
    }
}

impl OutlineBuilder for PathSink {
    fn move_to(&mut self, x: f32, y: f32) {
        let _ = write!(self.d, "M {:.2} {:.2} ", self.tx(x), self.ty(y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let _ = write!(self.d, "L {:.2} {:.2} ", self.tx(x), self.ty(y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let _ = write!(
            self.d,
            "Q {:.2} {:.2} {:.2} {:.2} ",
            self.tx(x1),
            self.ty(y1),
            self.tx(x),
            self.ty(y)
        );
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let _ = write!(
            self.d,
            "C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} ",
            self.tx(x1),
            self.ty(y1),
            self.tx(x2),
            self.ty(y2),
            self.tx(x),
            self.ty(y)
        );
    }

    fn close(&mut self) {
        self.d.push_str("Z ");
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_shapes_to_nothing() {
        let run = shape_text("", "sans-serif", 12.0);
        assert_eq!(run.width, 0.0);
        assert_eq!(run.height(), 0.0);
    }

    #[test]
    fn width_grows_with_text_length() {
        let short = shape_text("Main", "sans-serif", 12.0);
        let long = shape_text("Main Street Extension", "sans-serif", 12.0);
        assert!(long.width > short.width);
        assert!(short.width > 0.0);
    }

    #[test]
    fn metrics_scale_with_font_size() {
        let small = shape_text("Label", "sans-serif", 10.0);
        let large = shape_text("Label", "sans-serif", 20.0);
        assert!(large.width > small.width);
        assert!(large.height() > small.height());
    }

    #[test]
    fn bounds_sit_on_the_baseline() {
        let run = shape_text("Anchor", "sans-serif", 14.0);
        let bounds = run.bounds();
        assert!(bounds.min().y <= 0.0);
        assert!(bounds.max().y >= 0.0);
        assert!((bounds.width() - run.width).abs() < 1e-9);
    }

    #[test]
    fn fallback_metrics_are_deterministic() {
        let run = fallback_run("abcd", 10.0);
        assert_eq!(run.width, 4.0 * 10.0 * FALLBACK_ADVANCE_RATIO);
        assert_eq!(run.ascent, 8.0);
        assert_eq!(run.descent, 2.0);
        assert!(run.path.is_none());
    }
}

use crate::place::PlacedLabel;
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

#[cfg(feature = "png")]
use crate::config::RenderConfig;

/// A 2D paint surface accumulating one render pass as an SVG document.
/// Paint order per label: shield, halo, glyph fill.
pub struct SvgCanvas {
    width: f64,
    height: f64,
    theme: Theme,
    body: String,
}

impl SvgCanvas {
    pub fn new(width: f64, height: f64, theme: Theme) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            theme,
            body: String::new(),
        }
    }

    pub fn paint_label(&mut self, label: &PlacedLabel) {
        let symbolizer = &label.symbolizer;

        if let (Some(bounds), Some(shield)) = (&label.shield_bounds, &symbolizer.shield) {
            self.body.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"3\" ry=\"3\" fill=\"{}\"/>",
                bounds.min().x,
                bounds.min().y,
                bounds.width(),
                bounds.height(),
                shield.fill
            ));
        }

        let transform = label.transform.svg_transform();
        match &label.run.path {
            Some(d) => {
                // Halo first: a stroke twice the halo radius wide, so the
                // visible rim around the fill is one radius thick.
                if let Some(halo) = &symbolizer.halo {
                    if halo.radius > 0.0 {
                        self.body.push_str(&format!(
                            "<g transform=\"{transform}\"><path d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.2}\" stroke-linejoin=\"round\"/></g>",
                            halo.color,
                            halo.radius * 2.0
                        ));
                    }
                }
                self.body.push_str(&format!(
                    "<g transform=\"{transform}\"><path d=\"{d}\" fill=\"{}\"/></g>",
                    symbolizer.fill
                ));
            }
            None => {
                // No outline available for this face; emit a text element
                // with the same transform and metrics-derived position.
                let halo_attrs = symbolizer
                    .halo
                    .as_ref()
                    .filter(|halo| halo.radius > 0.0)
                    .map(|halo| {
                        format!(
                            " paint-order=\"stroke\" stroke=\"{}\" stroke-width=\"{:.2}\" stroke-linejoin=\"round\"",
                            halo.color,
                            halo.radius * 2.0
                        )
                    })
                    .unwrap_or_default();
                self.body.push_str(&format!(
                    "<text transform=\"{transform}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\"{halo_attrs}>{}</text>",
                    escape_xml(&symbolizer.font.family),
                    symbolizer.font.size,
                    symbolizer.fill,
                    escape_xml(&label.text)
                ));
            }
        }
    }

    /// Assemble the final SVG document.
    pub fn finish(self) -> String {
        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">",
            self.width, self.height, self.width, self.height
        ));
        svg.push_str(&format!(
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            self.theme.background
        ));
        svg.push_str(&self.body);
        svg.push_str("</svg>");
        svg
    }
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.default_size =
        usvg::Size::from_wh(render_cfg.width as f32, render_cfg.height as f32)
            .unwrap_or(usvg::Size::from_wh(800.0, 600.0).unwrap());

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::place::{LabelTransform, PlacedLabel};
    use crate::style::{Expression, Halo, TextSymbolizer};
    use crate::text_metrics::GlyphRun;
    use geo::{Coord, Rect};

    fn sample_label(text: &str) -> PlacedLabel {
        let mut symbolizer = TextSymbolizer::new(Expression::literal(text));
        symbolizer.halo = Some(Halo {
            color: "#FFFFFF".to_string(),
            radius: 1.5,
        });
        let run = GlyphRun {
            width: 40.0,
            ascent: 10.0,
            descent: 3.0,
            path: None,
        };
        PlacedLabel {
            text: text.to_string(),
            symbolizer,
            bounds: Rect::new((10.0, 10.0), (50.0, 23.0)),
            shield_bounds: None,
            goodness: 1.0,
            transform: LabelTransform {
                tx: 10.0,
                ty: 20.0,
                rotation_deg: 0.0,
                anchor: Coord { x: 30.0, y: 16.0 },
            },
            run,
        }
    }

    #[test]
    fn finished_document_is_well_formed() {
        let mut canvas = SvgCanvas::new(200.0, 100.0, Theme::light());
        canvas.paint_label(&sample_label("Riverside & Park"));
        let svg = canvas.finish();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Riverside &amp; Park"));
        assert!(svg.contains("paint-order=\"stroke\""));
    }

    #[test]
    fn outline_labels_paint_halo_then_fill() {
        let mut label = sample_label("Elm");
        label.run.path = Some("M 0 0 L 10 0".to_string());
        let mut canvas = SvgCanvas::new(200.0, 100.0, Theme::light());
        canvas.paint_label(&label);
        let svg = canvas.finish();
        let halo_at = svg.find("stroke-width=\"3.00\"").expect("halo stroke");
        let fill_at = svg.rfind("fill=\"#333333\"").expect("fill path");
        assert!(halo_at < fill_at);
        assert!(!svg.contains("<text"));
    }
}

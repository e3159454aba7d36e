//! JSON scene input for the demo renderer: a list of layers, each carrying
//! one text symbolizer and GeoJSON-style features.

use crate::style::{
    Expression, Feature, FontSpec, Halo, LabelPlacement, PlacementMode, ShieldGraphic,
    TextSymbolizer,
};
use crate::theme::Theme;
use anyhow::{Context, Result};
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    pub layers: Vec<SceneLayer>,
}

#[derive(Debug, Deserialize)]
pub struct SceneLayer {
    pub id: String,
    pub symbolizer: SymbolizerSpec,
    #[serde(default)]
    pub features: Vec<FeatureSpec>,
}

#[derive(Debug, Deserialize)]
pub struct FeatureSpec {
    #[serde(default)]
    pub properties: HashMap<String, Value>,
    pub geometry: GeometrySpec,
}

impl FeatureSpec {
    pub fn to_feature(&self) -> Feature {
        Feature {
            attributes: self.properties.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum GeometrySpec {
    Point { coordinates: [f64; 2] },
    MultiPoint { coordinates: Vec<[f64; 2]> },
    LineString { coordinates: Vec<[f64; 2]> },
    MultiLineString { coordinates: Vec<Vec<[f64; 2]>> },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

fn coord(pair: &[f64; 2]) -> Coord<f64> {
    Coord {
        x: pair[0],
        y: pair[1],
    }
}

fn line(coords: &[[f64; 2]]) -> LineString<f64> {
    LineString::from(coords.iter().map(coord).collect::<Vec<_>>())
}

fn polygon(rings: &[Vec<[f64; 2]>]) -> Polygon<f64> {
    let exterior = rings
        .first()
        .map(|r| line(r))
        .unwrap_or_else(|| LineString::new(Vec::new()));
    let interiors = rings.iter().skip(1).map(|r| line(r)).collect();
    Polygon::new(exterior, interiors)
}

impl GeometrySpec {
    pub fn to_geometry(&self) -> Geometry<f64> {
        match self {
            GeometrySpec::Point { coordinates } => Geometry::Point(Point::from(coord(coordinates))),
            GeometrySpec::MultiPoint { coordinates } => Geometry::MultiPoint(MultiPoint(
                coordinates.iter().map(|c| Point::from(coord(c))).collect(),
            )),
            GeometrySpec::LineString { coordinates } => Geometry::LineString(line(coordinates)),
            GeometrySpec::MultiLineString { coordinates } => Geometry::MultiLineString(
                MultiLineString(coordinates.iter().map(|c| line(c)).collect()),
            ),
            GeometrySpec::Polygon { coordinates } => Geometry::Polygon(polygon(coordinates)),
            GeometrySpec::MultiPolygon { coordinates } => Geometry::MultiPolygon(MultiPolygon(
                coordinates.iter().map(|rings| polygon(rings)).collect(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ExpressionSpec {
    Property { property: String },
    Literal(Value),
}

impl ExpressionSpec {
    pub fn to_expression(&self) -> Expression {
        match self {
            ExpressionSpec::Property { property } => Expression::Property(property.clone()),
            ExpressionSpec::Literal(value) => Expression::Literal(value.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SymbolizerSpec {
    pub label: ExpressionSpec,
    #[serde(default)]
    pub priority: Option<ExpressionSpec>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub fill: Option<String>,
    #[serde(default)]
    pub halo_radius: Option<f64>,
    #[serde(default)]
    pub halo_color: Option<String>,
    #[serde(default)]
    pub placement: Option<String>,
    #[serde(default)]
    pub anchor: Option<[f64; 2]>,
    #[serde(default)]
    pub displacement: Option<[f64; 2]>,
    #[serde(default)]
    pub rotation: Option<f64>,
    #[serde(default)]
    pub perpendicular_offset: Option<f64>,
    #[serde(default)]
    pub shield_size: Option<f64>,
    #[serde(default)]
    pub shield_fill: Option<String>,
    #[serde(default)]
    pub options: HashMap<String, String>,
}

/// Resolve a symbolizer spec against the theme's defaults.
pub fn resolve_symbolizer(spec: &SymbolizerSpec, theme: &Theme) -> TextSymbolizer {
    let mut placement = LabelPlacement::default();
    if let Some(mode) = &spec.placement {
        placement.mode = match mode.as_str() {
            "line" => PlacementMode::Line,
            _ => PlacementMode::Point,
        };
    }
    if let Some([x, y]) = spec.anchor {
        placement.anchor = (x, y);
    }
    if let Some([x, y]) = spec.displacement {
        placement.displacement = (x, y);
    }
    if let Some(rotation) = spec.rotation {
        placement.rotation = rotation;
    }
    if let Some(offset) = spec.perpendicular_offset {
        placement.perpendicular_offset = offset;
    }

    let halo = spec
        .halo_radius
        .filter(|radius| *radius > 0.0)
        .map(|radius| Halo {
            radius,
            color: spec
                .halo_color
                .clone()
                .unwrap_or_else(|| theme.halo_color.clone()),
        });

    let shield = spec
        .shield_size
        .filter(|size| *size > 0.0)
        .map(|size| ShieldGraphic {
            size,
            fill: spec
                .shield_fill
                .clone()
                .unwrap_or_else(|| "#888888".to_string()),
        });

    TextSymbolizer {
        label: spec.label.to_expression(),
        priority: spec.priority.as_ref().map(|p| p.to_expression()),
        font: FontSpec {
            family: spec
                .font_family
                .clone()
                .unwrap_or_else(|| theme.font_family.clone()),
            size: spec.font_size.unwrap_or(theme.font_size),
        },
        fill: spec.fill.clone().unwrap_or_else(|| theme.text_color.clone()),
        halo,
        placement,
        shield,
        options: spec.options.clone(),
    }
}

pub fn parse_scene(input: &str) -> Result<Scene> {
    serde_json::from_str(input).context("invalid scene JSON")
}

pub fn load_scene(path: &Path) -> Result<Scene> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scene {}", path.display()))?;
    parse_scene(&contents)
}

use serde_json::Value;
use std::collections::HashMap;

/// One feature's attribute set, as handed over by the data-store layer.
#[derive(Debug, Clone, Default)]
pub struct Feature {
    pub attributes: HashMap<String, Value>,
}

impl Feature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// A style expression evaluated once per feature. Only the two forms the
/// labeling engine consumes are modeled: a literal value and an attribute
/// lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    Property(String),
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn property(name: &str) -> Self {
        Expression::Property(name.to_string())
    }

    /// Literal expressions never vary per feature; grouped items only
    /// accumulate priority when the expression is non-literal.
    pub fn is_literal(&self) -> bool {
        matches!(self, Expression::Literal(_))
    }

    pub fn evaluate(&self, feature: &Feature) -> Option<Value> {
        match self {
            Expression::Literal(value) => Some(value.clone()),
            Expression::Property(name) => feature.get(name).cloned(),
        }
    }

    pub fn evaluate_string(&self, feature: &Feature) -> Option<String> {
        match self.evaluate(feature)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn evaluate_number(&self, feature: &Feature) -> Option<f64> {
        match self.evaluate(feature)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f64,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Halo {
    pub color: String,
    pub radius: f64,
}

/// A graphic painted underneath the label text (a highway shield, for
/// example). Modeled as a filled square centered on the anchor point.
#[derive(Debug, Clone, PartialEq)]
pub struct ShieldGraphic {
    pub size: f64,
    pub fill: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMode {
    Point,
    Line,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub mode: PlacementMode,
    /// Anchor within the glyph bounds, (0, 0) bottom-left to (1, 1) top-right.
    pub anchor: (f64, f64),
    /// Pixel displacement, positive y is up.
    pub displacement: (f64, f64),
    /// Rotation in degrees, clockwise in screen space.
    pub rotation: f64,
    pub perpendicular_offset: f64,
}

impl Default for LabelPlacement {
    fn default() -> Self {
        Self {
            mode: PlacementMode::Point,
            anchor: (0.5, 0.5),
            displacement: (0.0, 0.0),
            rotation: 0.0,
            perpendicular_offset: 0.0,
        }
    }
}

/// The slice of a text symbolizer the labeling engine consumes.
#[derive(Debug, Clone)]
pub struct TextSymbolizer {
    pub label: Expression,
    pub priority: Option<Expression>,
    pub font: FontSpec,
    pub fill: String,
    pub halo: Option<Halo>,
    pub placement: LabelPlacement,
    pub shield: Option<ShieldGraphic>,
    /// Raw vendor options, resolved once per symbolizer via
    /// [`LabelOptions::resolve`].
    pub options: HashMap<String, String>,
}

impl TextSymbolizer {
    pub fn new(label: Expression) -> Self {
        Self {
            label,
            priority: None,
            font: FontSpec::default(),
            fill: "#333333".to_string(),
            halo: None,
            placement: LabelPlacement::default(),
            shield: None,
            options: HashMap::new(),
        }
    }

    pub fn with_option(mut self, name: &str, value: &str) -> Self {
        self.options.insert(name.to_string(), value.to_string());
        self
    }

    pub fn halo_radius(&self) -> f64 {
        self.halo.as_ref().map(|h| h.radius).unwrap_or(0.0)
    }
}

pub const OPTION_GROUP: &str = "group";
pub const OPTION_SPACE_AROUND: &str = "spaceAround";

/// Vendor options resolved into a typed struct. Unparsable values fall back
/// to the defaults rather than failing the feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelOptions {
    pub group: bool,
    pub space_around: i32,
}

impl LabelOptions {
    pub fn resolve(options: &HashMap<String, String>) -> Self {
        let group = options
            .get(OPTION_GROUP)
            .map(|raw| {
                matches!(
                    raw.trim().to_ascii_lowercase().as_str(),
                    "yes" | "true" | "1"
                )
            })
            .unwrap_or(false);
        let space_around = options
            .get(OPTION_SPACE_AROUND)
            .and_then(|raw| raw.trim().parse::<i32>().ok())
            .unwrap_or(0);
        Self {
            group,
            space_around,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_option_accepts_boolean_spellings() {
        for raw in ["yes", "true", "1", "TRUE", " Yes "] {
            let mut options = HashMap::new();
            options.insert(OPTION_GROUP.to_string(), raw.to_string());
            assert!(LabelOptions::resolve(&options).group, "raw = {raw:?}");
        }
        for raw in ["no", "false", "0", "maybe", ""] {
            let mut options = HashMap::new();
            options.insert(OPTION_GROUP.to_string(), raw.to_string());
            assert!(!LabelOptions::resolve(&options).group, "raw = {raw:?}");
        }
    }

    #[test]
    fn space_around_falls_back_on_parse_failure() {
        let mut options = HashMap::new();
        options.insert(OPTION_SPACE_AROUND.to_string(), "12".to_string());
        assert_eq!(LabelOptions::resolve(&options).space_around, 12);

        options.insert(OPTION_SPACE_AROUND.to_string(), "-3".to_string());
        assert_eq!(LabelOptions::resolve(&options).space_around, -3);

        options.insert(OPTION_SPACE_AROUND.to_string(), "wide".to_string());
        assert_eq!(LabelOptions::resolve(&options).space_around, 0);

        assert_eq!(LabelOptions::resolve(&HashMap::new()).space_around, 0);
    }

    #[test]
    fn expressions_evaluate_against_features() {
        let feature = Feature::new().with("name", "Main St").with("rank", 250);

        assert_eq!(
            Expression::property("name").evaluate_string(&feature),
            Some("Main St".to_string())
        );
        assert_eq!(
            Expression::property("rank").evaluate_number(&feature),
            Some(250.0)
        );
        assert_eq!(Expression::property("missing").evaluate(&feature), None);
        assert_eq!(
            Expression::literal("fixed").evaluate_string(&feature),
            Some("fixed".to_string())
        );
        assert!(Expression::literal(5).is_literal());
        assert!(!Expression::property("rank").is_literal());
    }

    #[test]
    fn numeric_strings_parse_as_priorities() {
        let feature = Feature::new().with("p", "17.5");
        assert_eq!(
            Expression::property("p").evaluate_number(&feature),
            Some(17.5)
        );
        let bad = Feature::new().with("p", "tall");
        assert_eq!(Expression::property("p").evaluate_number(&bad), None);
    }
}

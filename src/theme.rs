use serde::{Deserialize, Serialize};

/// Default colors and font for rendered label output. Symbolizers carry
/// their own style; the theme fills the gaps when a scene omits one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f64,
    pub text_color: String,
    pub halo_color: String,
    pub background: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    pub fn light() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            text_color: "#1C2430".to_string(),
            halo_color: "#FFFFFF".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            text_color: "#E8ECF2".to_string(),
            halo_color: "#14181E".to_string(),
            background: "#14181E".to_string(),
        }
    }
}

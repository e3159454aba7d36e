use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PRIORITY: f64 = 1000.0;

/// Tunables of the placement engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Priority assigned when a symbolizer has no priority expression or
    /// its evaluation fails.
    pub default_priority: f64,
    /// Current rendering scale denominator; labels carrying a scale range
    /// outside it are skipped. `None` disables the check.
    pub scale_denominator: Option<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_priority: DEFAULT_PRIORITY,
            scale_denominator: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: Theme,
    pub engine: EngineConfig,
    pub render: RenderConfig,
}

/// Load a JSON config file; `None` yields the defaults. Unknown fields are
/// ignored, missing fields fall back per struct.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&contents)?;
    Ok(config)
}

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod geom;
pub mod place;
pub mod render;
pub mod scene;
pub mod style;
pub mod text_metrics;
pub mod theme;

pub use cache::{CacheError, CancelToken, LabelCache, LabelCacheItem, ScaleRange};
pub use place::{PlacedLabel, PlacementError};

#[cfg(feature = "cli")]
pub use cli::run;

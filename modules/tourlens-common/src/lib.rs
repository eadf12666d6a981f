pub mod config;
pub mod error;
pub mod fields;
pub mod quality;
pub mod types;

pub use config::{AliasConfig, EventRegistry, FeedConfig, PipelineConfig, QualityThresholds, RateConfig};
pub use error::TourlensError;
pub use fields::*;
pub use quality::*;
pub use types::*;

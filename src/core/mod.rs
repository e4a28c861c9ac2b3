pub mod cache;
pub mod campaigns;
pub mod config;
pub mod error;

pub use cache::{global_cache, ModelCache};
pub use campaigns::{CampaignMetadata, CampaignTable};
pub use config::{
    LexiconConfig, ModelsConfig, ModernBertConfig, ModernBertSize, PipelineConfig,
    DEFAULT_TEXT_COLUMN,
};
pub use error::{PipelineError, Result};

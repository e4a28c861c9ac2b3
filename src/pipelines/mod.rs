//! The pipeline stages, in run order.
//!
//! 1. [`extract`] unions the comment exports of a folder.
//! 2. [`enrich`] derives campaign, timing, length and locality attributes.
//! 3. [`sentiment_analysis`] scores every comment with one model.
//! 4. [`compare`] optionally runs several models side by side.

pub mod compare;
pub mod enrich;
pub mod extract;
pub mod sentiment_analysis;

pub use compare::{compare_file, compare_models, ComparisonOptions, ComparisonResult};
pub use enrich::{enrich, enrich_file, EnrichmentReport};
pub use extract::{extract_comments, extract_to_file, process_folder};
pub use sentiment_analysis::{score_file, LoadedModel, ModelRegistry, SentimentModel};

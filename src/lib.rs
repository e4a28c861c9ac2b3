//! Comment extraction, enrichment and sentiment scoring for promotional
//! video campaigns.
//!
//! The crate turns a folder of per-video comment exports into a single
//! enriched sheet and scores every comment's sentiment:
//!
//! ```rust,no_run
//! use comment_sentiment::core::{CampaignTable, PipelineConfig};
//! use comment_sentiment::models::builtin_registry;
//! use comment_sentiment::pipelines::{enrich_file, extract_to_file, score_file};
//!
//! let config = PipelineConfig::load("config/config.yaml")?;
//! extract_to_file(&config.input_folder, &config.raw_comments_file)?;
//!
//! let campaigns = CampaignTable::load(&config.campaigns_file)?;
//! enrich_file(
//!     &config.raw_comments_file,
//!     &config.processed_comments_file,
//!     &campaigns,
//!     &config.ip_address_file,
//! )?;
//!
//! let model = builtin_registry(&config.models).load(&config.scoring_model)?;
//! score_file(
//!     &config.processed_comments_file,
//!     &config.sentiment_output_file,
//!     &config.text_column,
//!     &model,
//! )?;
//! # Ok::<(), comment_sentiment::core::PipelineError>(())
//! ```

pub mod core;
pub mod loaders;
pub mod models;
pub mod pipelines;
pub mod record;
pub mod table;
pub mod utils;

pub use core::{PipelineConfig, PipelineError, Result};
pub use record::CommentRecord;
pub use table::{Cell, Table};

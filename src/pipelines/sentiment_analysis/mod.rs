//! Sentiment scoring.
//!
//! Models are registered in a [`ModelRegistry`] under a name and loaded on
//! demand. Whatever shape a model predicts in (a scalar probability, a
//! label with a confidence, or per-sentence class distributions) is reduced
//! to a single positive-sentiment score in [0, 1].
//!
//! ```rust,no_run
//! use comment_sentiment::models::builtin_registry;
//! use comment_sentiment::pipelines::sentiment_analysis::score_file;
//! use comment_sentiment::core::ModelsConfig;
//!
//! let mut registry = builtin_registry(&ModelsConfig::default());
//! let model = registry.load("lexicon")?;
//! score_file("in.xlsx", "out.xlsx", "评论内容", &model)?;
//! # Ok::<(), comment_sentiment::core::PipelineError>(())
//! ```

pub mod model;
pub mod output;
pub mod pipeline;
pub mod registry;

pub use model::SentimentModel;
pub use output::{ClassProbabilities, LabeledScore, SentenceScores, SentimentOutput, POSITIVE_LABEL};
pub use pipeline::{score_file, score_table, ScoringSummary};
pub use registry::{LoadedModel, ModelRegistry, Scorer};

//! Built-in sentiment models.

pub mod lexicon;
pub mod modernbert;

pub use lexicon::{LexiconHits, LexiconModel};
pub use modernbert::{ModernBertClassifier, ModernBertSentenceSentiment, ModernBertSentiment};

use crate::core::ModelsConfig;
use crate::pipelines::sentiment_analysis::ModelRegistry;
use crate::utils::DeviceRequest;

pub const LEXICON: &str = "lexicon";
pub const MODERNBERT: &str = "modernbert";
pub const MODERNBERT_SENTENCES: &str = "modernbert-sentences";

/// Names of the models [`builtin_registry`] registers, in registration order.
pub const BUILTIN_MODELS: [&str; 3] = [LEXICON, MODERNBERT, MODERNBERT_SENTENCES];

/// Registry holding every built-in model. Nothing is loaded until a model is
/// requested from it.
pub fn builtin_registry(config: &ModelsConfig) -> ModelRegistry {
    let mut registry = ModelRegistry::new();

    let lexicon = config.lexicon.clone();
    registry.register(LEXICON, move || {
        LexiconModel::from_files(
            lexicon.positive_words.as_deref(),
            lexicon.negative_words.as_deref(),
        )
    });

    let modernbert = config.modernbert.clone();
    registry.register(MODERNBERT, move || {
        ModernBertSentiment::new(modernbert.size, DeviceRequest::from_cpu_flag(modernbert.cpu))
    });

    let modernbert = config.modernbert.clone();
    registry.register(MODERNBERT_SENTENCES, move || {
        ModernBertSentenceSentiment::new(
            modernbert.size,
            DeviceRequest::from_cpu_flag(modernbert.cpu),
        )
    });

    registry
}

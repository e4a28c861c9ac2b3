//! Run configuration loaded from `config/config.yaml`.
//!
//! Every key except `input_folder` has a default, so a minimal file only
//! needs to name the folder holding the comment exports.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::{PipelineError, Result};

/// Default column holding the comment text.
pub const DEFAULT_TEXT_COLUMN: &str = "评论内容";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_folder: PathBuf,
    pub raw_comments_file: PathBuf,
    pub processed_comments_file: PathBuf,
    pub sentiment_output_file: PathBuf,
    pub ip_address_file: PathBuf,
    pub campaigns_file: PathBuf,
    pub text_column: String,
    pub scoring_model: String,
    pub run_model_comparison: bool,
    /// `None` or `0` scores every row.
    pub comparison_sample_size: Option<usize>,
    pub comparison_seed: Option<u64>,
    pub comparison_output_file: PathBuf,
    pub compare_models: Vec<String>,
    pub models: ModelsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_folder: PathBuf::new(),
            raw_comments_file: PathBuf::from("所有评论汇总.xlsx"),
            processed_comments_file: PathBuf::from("处理后的评论汇总.xlsx"),
            sentiment_output_file: PathBuf::from("comments_with_sentiment.xlsx"),
            ip_address_file: PathBuf::from("ip_addresses.xlsx"),
            campaigns_file: PathBuf::from("config/campaigns.yaml"),
            text_column: DEFAULT_TEXT_COLUMN.to_string(),
            scoring_model: "lexicon".to_string(),
            run_model_comparison: false,
            comparison_sample_size: Some(100),
            comparison_seed: None,
            comparison_output_file: PathBuf::from("模型对比结果.xlsx"),
            compare_models: vec![
                "lexicon".to_string(),
                "modernbert".to_string(),
                "modernbert-sentences".to_string(),
            ],
            models: ModelsConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.input_folder.as_os_str().is_empty() {
            return Err(PipelineError::Config("input_folder is required".into()));
        }
        if self.text_column.trim().is_empty() {
            return Err(PipelineError::Config("text_column must not be empty".into()));
        }
        Ok(())
    }
}

/// Per-model settings for the built-in sentiment models.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub lexicon: LexiconConfig,
    pub modernbert: ModernBertConfig,
}

/// Word lists for the lexicon model. Missing paths fall back to the
/// lists compiled into the binary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    pub positive_words: Option<PathBuf>,
    pub negative_words: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModernBertConfig {
    pub size: ModernBertSize,
    pub cpu: bool,
}

/// Available ModernBERT sentiment checkpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModernBertSize {
    #[default]
    Base,
    Large,
}

impl std::fmt::Display for ModernBertSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ModernBertSize::Base => "modernbert-base",
            ModernBertSize::Large => "modernbert-large",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_takes_defaults() {
        let config = PipelineConfig::from_yaml("input_folder: data/exports\n").unwrap();
        assert_eq!(config.input_folder, PathBuf::from("data/exports"));
        assert_eq!(config.text_column, "评论内容");
        assert_eq!(config.comparison_sample_size, Some(100));
        assert!(!config.run_model_comparison);
        assert_eq!(config.models.modernbert.size, ModernBertSize::Base);
    }

    #[test]
    fn nested_model_settings_parse() {
        let yaml = r#"
input_folder: exports
run_model_comparison: true
comparison_sample_size: ~
compare_models: [lexicon]
models:
  modernbert:
    size: large
    cpu: true
"#;
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert!(config.run_model_comparison);
        assert_eq!(config.comparison_sample_size, None);
        assert_eq!(config.compare_models, vec!["lexicon".to_string()]);
        assert_eq!(config.models.modernbert.size, ModernBertSize::Large);
        assert!(config.models.modernbert.cpu);
    }

    #[test]
    fn missing_input_folder_is_rejected() {
        let err = PipelineConfig::from_yaml("run_model_comparison: true\n").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}

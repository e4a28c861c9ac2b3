//! ModernBERT multilingual sentiment classifiers.
//!
//! Two registry entries share one set of weights: [`ModernBertSentiment`]
//! classifies the whole comment, [`ModernBertSentenceSentiment`] classifies
//! each sentence and keeps the full class distribution.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::modernbert::{
    ClassifierConfig, ClassifierPooling, Config, ModernBertForSequenceClassification,
};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use crate::core::{global_cache, ModernBertSize};
use crate::loaders::{load_first_available, HfLoader, TokenizerLoader};
use crate::pipelines::sentiment_analysis::{
    ClassProbabilities, LabeledScore, SentenceScores, SentimentModel,
};
use crate::utils::{device_key, DeviceRequest};

const MAX_SEQUENCE_LENGTH: usize = 512;
const SENTENCE_DELIMITERS: &[char] = &['。', '！', '？', '!', '?', '；', ';', '\n'];

pub fn model_id(size: ModernBertSize) -> &'static str {
    match size {
        ModernBertSize::Base => "clapAI/modernBERT-base-multilingual-sentiment",
        ModernBertSize::Large => "clapAI/modernBERT-large-multilingual-sentiment",
    }
}

/// Sequence classifier with its tokenizer and label table.
pub struct ModernBertClassifier {
    model: ModernBertForSequenceClassification,
    tokenizer: Tokenizer,
    device: Device,
    /// Class index → lowercased label.
    labels: Vec<String>,
}

impl ModernBertClassifier {
    pub fn load(size: ModernBertSize, device: Device) -> anyhow::Result<Self> {
        let repo = model_id(size);
        info!("loading {repo} on {:?}", device.location());

        let config_path = HfLoader::new(repo, "config.json").load()?;
        let weights_path = load_first_available(repo, &["model.safetensors", "pytorch_model.bin"])?;
        let mut tokenizer = TokenizerLoader::new(repo, "tokenizer.json").load()?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(anyhow::Error::msg)?;

        let config_content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let mut config: Config = serde_json::from_str(&config_content)
            .context("failed to parse ModernBERT config")?;
        let id2label = label_table(&config_content)?;
        let labels = ordered_labels(&id2label)?;

        let pooling = config
            .classifier_config
            .as_ref()
            .map(|c| c.classifier_pooling)
            .unwrap_or(ClassifierPooling::MEAN);
        config.classifier_config = Some(ClassifierConfig {
            label2id: id2label
                .iter()
                .map(|(id, label)| (label.clone(), id.clone()))
                .collect(),
            id2label,
            classifier_pooling: pooling,
        });

        let dtype = DType::F32;
        let vb = match weights_path.extension().and_then(|ext| ext.to_str()) {
            // SAFETY: the Hub cache file is not modified while mapped.
            Some("safetensors") => unsafe {
                VarBuilder::from_mmaped_safetensors(&[&weights_path], dtype, &device)?
            },
            Some("bin") => VarBuilder::from_pth(&weights_path, dtype, &device)?,
            _ => bail!("unsupported weight file format: {}", weights_path.display()),
        };
        let model = ModernBertForSequenceClassification::load(vb, &config)?;

        Ok(Self {
            model,
            tokenizer,
            device,
            labels,
        })
    }

    /// Load through the process-wide model cache so every registry entry
    /// backed by this checkpoint shares the same weights.
    pub fn shared(size: ModernBertSize, device: DeviceRequest) -> anyhow::Result<Arc<Self>> {
        let device = device.resolve()?;
        let key = format!("{}@{}", model_id(size), device_key(&device));
        global_cache().get_or_create(&key, || Self::load(size, device))
    }

    /// Class distribution for one text.
    pub fn classify(&self, text: &str) -> anyhow::Result<ClassProbabilities> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("tokenization error: {e}"))?;
        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let output = self.model.forward(&input_ids, &attention_mask)?;
        let values = output.squeeze(0)?.to_dtype(DType::F32)?.to_vec1::<f32>()?;
        if values.len() != self.labels.len() {
            bail!(
                "classifier returned {} classes, expected {}",
                values.len(),
                self.labels.len()
            );
        }
        Ok(self
            .labels
            .iter()
            .cloned()
            .zip(to_probabilities(&values))
            .collect())
    }

    /// Most likely label and its probability.
    pub fn predict_label(&self, text: &str) -> anyhow::Result<LabeledScore> {
        let probabilities = self.classify(text)?;
        probabilities
            .into_iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(label, score)| LabeledScore { label, score })
            .ok_or_else(|| anyhow!("classifier has no labels"))
    }
}

/// Whole-comment classification reduced to the argmax label.
#[derive(Clone)]
pub struct ModernBertSentiment {
    classifier: Arc<ModernBertClassifier>,
}

impl ModernBertSentiment {
    pub fn new(size: ModernBertSize, device: DeviceRequest) -> anyhow::Result<Self> {
        Ok(Self {
            classifier: ModernBertClassifier::shared(size, device)?,
        })
    }
}

impl SentimentModel for ModernBertSentiment {
    type Output = LabeledScore;

    fn predict(&self, text: &str) -> anyhow::Result<LabeledScore> {
        self.classifier.predict_label(text)
    }
}

/// Per-sentence class distributions.
#[derive(Clone)]
pub struct ModernBertSentenceSentiment {
    classifier: Arc<ModernBertClassifier>,
}

impl ModernBertSentenceSentiment {
    pub fn new(size: ModernBertSize, device: DeviceRequest) -> anyhow::Result<Self> {
        Ok(Self {
            classifier: ModernBertClassifier::shared(size, device)?,
        })
    }
}

impl SentimentModel for ModernBertSentenceSentiment {
    type Output = SentenceScores;

    fn predict(&self, text: &str) -> anyhow::Result<SentenceScores> {
        split_sentences(text)
            .into_iter()
            .map(|sentence| self.classifier.classify(sentence))
            .collect::<anyhow::Result<Vec<_>>>()
            .map(SentenceScores)
    }
}

/// Split on Chinese and Western sentence terminators. Text without any
/// terminator is a single sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let sentences: Vec<&str> = text
        .split(SENTENCE_DELIMITERS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if sentences.is_empty() && !text.trim().is_empty() {
        vec![text.trim()]
    } else {
        sentences
    }
}

/// Classifier heads may return either logits or an already normalized
/// distribution. Only the former gets a softmax.
pub fn to_probabilities(values: &[f32]) -> Vec<f32> {
    let sum: f32 = values.iter().sum();
    if values.iter().all(|v| *v >= 0.0) && (sum - 1.0).abs() < 1e-3 {
        return values.to_vec();
    }
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = values.iter().map(|v| (v - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

fn label_table(config_content: &str) -> anyhow::Result<HashMap<String, String>> {
    #[derive(serde::Deserialize)]
    struct RawLabels {
        id2label: HashMap<String, String>,
    }
    let raw: RawLabels =
        serde_json::from_str(config_content).context("config has no id2label table")?;
    Ok(raw.id2label)
}

fn ordered_labels(id2label: &HashMap<String, String>) -> anyhow::Result<Vec<String>> {
    (0..id2label.len())
        .map(|i| {
            id2label
                .get(&i.to_string())
                .map(|label| label.to_lowercase())
                .ok_or_else(|| anyhow!("id2label has no entry for class {i}"))
        })
        .collect()
}

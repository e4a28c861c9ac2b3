use anyhow::anyhow;
use tracing::{info, warn};

use super::model::SentimentModel;
use super::output::SentimentOutput;
use crate::core::{PipelineError, Result};

/// A model reduced to its scoring function.
pub type Scorer = Box<dyn Fn(&str) -> anyhow::Result<f32>>;

type Loader = Box<dyn FnOnce() -> anyhow::Result<Scorer>>;

struct Registration {
    name: String,
    shape: &'static str,
    loader: Loader,
}

/// Named sentiment models whose loading is deferred until requested.
///
/// Each registration fixes the model's output adapter, so a loaded model
/// never needs to inspect the shape of a prediction at scoring time.
#[derive(Default)]
pub struct ModelRegistry {
    registrations: Vec<Registration>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `loader` under `name`. A later registration with the same
    /// name replaces the earlier one.
    pub fn register<M, F>(&mut self, name: impl Into<String>, loader: F) -> &mut Self
    where
        M: SentimentModel + 'static,
        F: FnOnce() -> anyhow::Result<M> + 'static,
    {
        let name = name.into();
        self.registrations.retain(|r| r.name != name);
        self.registrations.push(Registration {
            name,
            shape: <M::Output as SentimentOutput>::SHAPE,
            loader: Box::new(move || {
                let model = loader()?;
                let scorer: Scorer = Box::new(move |text| model.predict(text)?.positive_score());
                Ok(scorer)
            }),
        });
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.registrations.iter().map(|r| r.name.as_str()).collect()
    }

    /// Load one model, consuming its registration.
    pub fn load(&mut self, name: &str) -> Result<LoadedModel> {
        let position = self
            .registrations
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| PipelineError::UnknownModel(name.to_string()))?;
        let registration = self.registrations.remove(position);

        info!(
            "loading sentiment model '{}' ({} output)",
            registration.name, registration.shape
        );
        match (registration.loader)() {
            Ok(scorer) => Ok(LoadedModel {
                name: registration.name,
                scorer,
            }),
            Err(source) => Err(PipelineError::ModelLoad {
                name: registration.name,
                source,
            }),
        }
    }

    /// Load every requested model independently. Models that are unknown or
    /// fail to load are logged and left out of the result.
    pub fn load_available<S: AsRef<str>>(mut self, names: &[S]) -> Vec<LoadedModel> {
        let mut loaded = Vec::with_capacity(names.len());
        for name in names {
            match self.load(name.as_ref()) {
                Ok(model) => loaded.push(model),
                Err(e) => warn!("{e}"),
            }
        }
        info!(
            "{} of {} sentiment models available",
            loaded.len(),
            names.len()
        );
        loaded
    }
}

/// A loaded sentiment model, ready to score text.
pub struct LoadedModel {
    name: String,
    scorer: Scorer,
}

impl LoadedModel {
    pub fn new(name: impl Into<String>, scorer: Scorer) -> Self {
        Self {
            name: name.into(),
            scorer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Score `text`, clamping the result to [0, 1].
    pub fn try_score(&self, text: &str) -> anyhow::Result<f32> {
        let score = (self.scorer)(text)?;
        if score.is_nan() {
            return Err(anyhow!("model produced NaN"));
        }
        Ok(score.clamp(0.0, 1.0))
    }

    /// Score `text`, logging and swallowing failures.
    pub fn score(&self, text: &str) -> Option<f32> {
        match self.try_score(text) {
            Ok(score) => Some(score),
            Err(e) => {
                warn!("model '{}' failed on '{}': {e}", self.name, preview(text));
                None
            }
        }
    }
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn preview(text: &str) -> String {
    const PREVIEW_CHARS: usize = 30;
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::sentiment_analysis::LabeledScore;
    use anyhow::bail;

    struct Constant(f32);

    impl SentimentModel for Constant {
        type Output = f32;

        fn predict(&self, _text: &str) -> anyhow::Result<f32> {
            Ok(self.0)
        }
    }

    struct Labeler;

    impl SentimentModel for Labeler {
        type Output = LabeledScore;

        fn predict(&self, text: &str) -> anyhow::Result<LabeledScore> {
            if text.is_empty() {
                bail!("empty input");
            }
            Ok(LabeledScore::new("negative", 0.8))
        }
    }

    #[test]
    fn failed_loads_are_omitted() {
        let mut registry = ModelRegistry::new();
        registry
            .register("ok", || Ok(Constant(0.7)))
            .register("broken", || -> anyhow::Result<Constant> { bail!("no weights") });

        let loaded = registry.load_available(&["ok", "broken", "missing"]);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name(), "ok");
    }

    #[test]
    fn load_reports_unknown_and_failing_models() {
        let mut registry = ModelRegistry::new();
        registry.register("broken", || -> anyhow::Result<Constant> { bail!("no weights") });
        assert!(matches!(
            registry.load("nope"),
            Err(PipelineError::UnknownModel(_))
        ));
        assert!(matches!(
            registry.load("broken"),
            Err(PipelineError::ModelLoad { .. })
        ));
    }

    #[test]
    fn scores_are_adapted_and_clamped() {
        let mut registry = ModelRegistry::new();
        registry
            .register("labeler", || Ok(Labeler))
            .register("hot", || Ok(Constant(1.5)))
            .register("nan", || Ok(Constant(f32::NAN)));
        let models = registry.load_available(&["labeler", "hot", "nan"]);

        let labeled = models[0].score("还行").unwrap();
        assert!((labeled - 0.2).abs() < 1e-6);
        assert_eq!(models[0].score(""), None);
        assert_eq!(models[1].score("x"), Some(1.0));
        assert_eq!(models[2].score("x"), None);
    }
}

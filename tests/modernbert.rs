#![cfg(feature = "integration")]

// Downloads the ModernBERT sentiment checkpoint from the Hugging Face Hub.

use comment_sentiment::core::{ModelsConfig, ModernBertConfig};
use comment_sentiment::models::{builtin_registry, MODERNBERT, MODERNBERT_SENTENCES};

fn cpu_config() -> ModelsConfig {
    ModelsConfig {
        modernbert: ModernBertConfig {
            cpu: true,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn whole_comment_and_sentence_scores() -> anyhow::Result<()> {
    let models = builtin_registry(&cpu_config()).load_available(&[MODERNBERT, MODERNBERT_SENTENCES]);
    assert_eq!(models.len(), 2);

    for model in &models {
        let positive = model.try_score("风景太美了，强烈推荐大家去看看")?;
        let negative = model.try_score("太失望了，完全是骗人的")?;
        assert!(positive > negative, "{}: {positive} <= {negative}", model.name());
    }
    Ok(())
}

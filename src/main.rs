use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use comment_sentiment::core::{CampaignTable, PipelineConfig};
use comment_sentiment::models::builtin_registry;
use comment_sentiment::pipelines::{
    compare_file, enrich_file, extract_to_file, score_file, ComparisonOptions,
};
use comment_sentiment::utils::log_stage;

#[derive(Parser, Debug)]
#[command(name = "comment-sentiment")]
#[command(about = "Extract, enrich and score promotional-video comments", long_about = None)]
struct Cli {
    /// Path to the YAML run configuration
    #[arg(short, long, default_value = "config/config.yaml")]
    config: PathBuf,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => {
            info!("all stages finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("pipeline aborted: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = PipelineConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let campaigns = CampaignTable::load(&config.campaigns_file).with_context(|| {
        format!(
            "failed to load campaign metadata from {}",
            config.campaigns_file.display()
        )
    })?;
    info!(
        "loaded metadata for {} campaigns from {}",
        campaigns.len(),
        config.campaigns_file.display()
    );

    log_stage("stage 1: extract comments");
    extract_to_file(&config.input_folder, &config.raw_comments_file)
        .context("comment extraction failed")?;

    log_stage("stage 2: enrich comments");
    enrich_file(
        &config.raw_comments_file,
        &config.processed_comments_file,
        &campaigns,
        &config.ip_address_file,
    )
    .context("comment enrichment failed")?;

    log_stage("stage 3: sentiment scoring");
    let model = builtin_registry(&config.models)
        .load(&config.scoring_model)
        .context("scoring model unavailable")?;
    score_file(
        &config.processed_comments_file,
        &config.sentiment_output_file,
        &config.text_column,
        &model,
    )
    .context("sentiment scoring failed")?;

    if config.run_model_comparison {
        log_stage("stage 4: model comparison");
        let models = builtin_registry(&config.models).load_available(&config.compare_models);
        let options = ComparisonOptions {
            text_column: config.text_column.clone(),
            sample_size: config.comparison_sample_size,
            seed: config.comparison_seed,
        };
        compare_file(
            &config.processed_comments_file,
            &config.comparison_output_file,
            &models,
            &options,
        )
        .context("model comparison failed")?;
    }
    Ok(())
}

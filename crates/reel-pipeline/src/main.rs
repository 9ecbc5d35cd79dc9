//! reelgen: turn a topic into a narrated short video.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use reel_media::FfmpegEngine;
use reel_models::{AssetSize, BudgetPolicy, Orientation};
use reel_pipeline::{decider_for, init_tracing, Pipeline, PipelineConfig, Providers};
use reel_providers::VoiceSelector;

#[derive(Parser, Debug)]
#[command(name = "reelgen")]
#[command(about = "Generate a narrated stock-footage video from a topic", long_about = None)]
struct Args {
    /// Topic of the video
    topic: String,

    /// Accept the first timeline without prompting
    #[arg(short, long)]
    yes: bool,

    /// RNG seed for a reproducible timeline
    #[arg(long, env = "REEL_SEED")]
    seed: Option<u64>,

    /// Number of script paragraphs
    #[arg(short, long)]
    paragraphs: Option<usize>,

    /// landscape, portrait or square
    #[arg(long)]
    orientation: Option<Orientation>,

    /// Stock media size: small, medium or large
    #[arg(long)]
    size: Option<AssetSize>,

    /// per_paragraph or fixed_zero
    #[arg(long)]
    budget_policy: Option<BudgetPolicy>,

    /// Voice ID, or "random"
    #[arg(long)]
    voice: Option<String>,

    /// Parent directory for run output
    #[arg(short = 'w', long)]
    work_dir: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(paragraphs) = self.paragraphs {
            config.paragraphs = paragraphs;
        }
        if let Some(orientation) = self.orientation {
            config.orientation = orientation;
        }
        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(policy) = self.budget_policy {
            config.composition.budget_policy = policy;
        }
        if let Some(voice) = &self.voice {
            config.voice = VoiceSelector::parse(voice);
        }
        if let Some(work_dir) = &self.work_dir {
            config.work_dir = work_dir.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    let mut config = PipelineConfig::from_env();
    args.apply(&mut config);
    info!("Pipeline config: {:?}", config);

    FfmpegEngine::check_available().context("FFmpeg is required to render")?;

    let media = Arc::new(FfmpegEngine::new(config.render_settings()));
    let providers = Providers::from_env().context("Failed to configure providers")?;
    let pipeline = Pipeline::new(config, providers, media)?;

    let mut decider = decider_for(args.yes);
    let outcome = match pipeline.run(&args.topic, decider.as_mut()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Run failed: {}", e);
            return Err(e.into());
        }
    };

    if !outcome.report.degradations.is_empty() {
        println!(
            "Finished with {} degradation(s), see {}",
            outcome.report.degradations.len(),
            outcome
                .artifact
                .with_file_name("report.json")
                .display()
        );
    }
    println!("{}", outcome.artifact.display());
    Ok(())
}

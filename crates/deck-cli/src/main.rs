use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use dental_deck_core::classify::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use dental_deck_core::{Classifier, OpenAiConfig, OpenAiVision, ProcessOptions, ProcessResult};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(name = "dental-deck", version, about = "Classify dental photographs and build a treatment report deck")]
struct Cli {
    /// JSON file holding an array of image paths
    image_list: PathBuf,

    /// Directory that receives treatment_report.pptx
    output_dir: PathBuf,

    /// Vision model name
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    api_base: String,

    /// API key for the classification service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

fn read_image_list(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read image list {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("image list {} is not a JSON array of paths", path.display()))
}

fn run(cli: Cli) -> anyhow::Result<ProcessResult> {
    let image_paths = read_image_list(&cli.image_list)?;
    if cli.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set, every image will be classified as unknown");
    }

    let classifier = Classifier::new(OpenAiVision::new(OpenAiConfig {
        api_key: cli.api_key,
        model: cli.model,
        base_url: cli.api_base,
    }));
    let options = ProcessOptions { image_paths, output_dir: cli.output_dir };

    let pb = ProgressBar::new(options.image_paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}/{len} {msg}")
            .context("invalid progress template")?,
    );

    let result = dental_deck_core::process(&options, &classifier, &|stage, current, _total, message| {
        // classify reports the index just finished; render reports the total
        let pos = if stage == "classify" { current + 1 } else { current };
        pb.set_position(pos);
        pb.set_message(format!("{}: {}", stage, message));
    });
    pb.finish_and_clear();

    let summary = result?;
    tracing::info!(
        processed = summary.images_processed,
        skipped = summary.images_skipped,
        "Presentation saved to: {}",
        summary.output_path.display()
    );
    Ok(summary.into())
}

/// Any failure before or while writing the deck becomes the error line.
fn outcome(cli: Cli) -> ProcessResult {
    run(cli).unwrap_or_else(|e| {
        tracing::error!("{:#}", e);
        ProcessResult::error(format!("{:#}", e))
    })
}

fn main() -> ExitCode {
    // Load .env before clap reads the environment
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = outcome(cli);

    // stdout carries exactly one line
    match serde_json::to_string(&result) {
        Ok(line) => println!("{}", line),
        Err(e) => {
            tracing::error!("cannot serialize result: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

//! urlscan - Command line entry point

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use urlscan_core::constants::{APP_NAME, APP_VERSION, DEFAULT_SAMPLES, DEFAULT_SEED};
use urlscan_core::logic::dataset;
use urlscan_core::logic::model::{training, Classifier, ModelStore, StoredModel, TrainingConfig};
use urlscan_core::{UrlAnalyzer, UrlFeatureExtractor};

#[derive(Parser)]
#[command(name = APP_NAME, version = APP_VERSION, about = "URL maliciousness risk scoring")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a URL and print the JSON report
    Analyze {
        url: String,
        /// Skip DNS, page fetch and stats probes
        #[arg(long)]
        offline: bool,
    },
    /// Export the synthetic training set as CSV
    GenerateDataset {
        #[arg(long, default_value_t = DEFAULT_SAMPLES)]
        samples: usize,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        #[arg(long, default_value = "url_security_training_data.csv")]
        output: PathBuf,
    },
    /// Train and persist the model
    Train {
        /// Retrain even if a model is already stored
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze { url, offline } => analyze(&url, offline),
        Command::GenerateDataset { samples, seed, output } => generate_dataset(samples, seed, &output),
        Command::Train { force } => train(force),
    }
}

fn analyze(url: &str, offline: bool) -> Result<()> {
    let extractor = if offline {
        UrlFeatureExtractor::offline()
    } else {
        UrlFeatureExtractor::from_env().context("Failed to build HTTP client")?
    };
    let analyzer = UrlAnalyzer::new(extractor, Arc::new(Classifier::from_env()));

    let report = analyzer.analyze(url)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn generate_dataset(samples: usize, seed: u64, output: &Path) -> Result<()> {
    log::info!("Generating {} samples (seed {})", samples, seed);
    let data = dataset::generate(samples, seed);
    dataset::write_csv(&data, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Dataset saved to {}", output.display());
    println!("  legitimate: {}", data.count(dataset::Label::Legitimate));
    println!("  malicious:  {}", data.count(dataset::Label::Malicious));
    Ok(())
}

fn train(force: bool) -> Result<()> {
    let store = ModelStore::from_env();

    if !force {
        match store.load() {
            Ok(Some(stored)) => {
                println!(
                    "Model already stored at {} ({} trees, saved {}). Use --force to retrain.",
                    store.path().display(),
                    stored.forest.trees.len(),
                    stored.saved_at
                );
                return Ok(());
            }
            Ok(None) => {}
            Err(e) => log::warn!("Stored model unreadable, retraining: {}", e),
        }
    }

    let (forest, report) = training::train(&TrainingConfig::default()).context("Training failed")?;
    println!("{}", report);

    store
        .save(&StoredModel::new(forest, Some(report)))
        .with_context(|| format!("Failed to save model to {}", store.path().display()))?;
    println!("Model saved to {}", store.path().display());
    Ok(())
}

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::data::loader::load_and_clean;
use crate::output::{save_processed, PersistOptions};
use crate::vectorize::{build_and_save_tfidf, VectorizeOptions, DEFAULT_MAX_FEATURES};

/// Clean a labeled humor-detection corpus and save it for training.
#[derive(Parser, Debug)]
#[command(name = "humor-prep", version, about)]
pub struct Cli {
    /// Input CSV; must contain a `text` column
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "data/processed")]
    pub outdir: PathBuf,

    /// Skip the TF-IDF stage (faster)
    #[arg(long)]
    pub no_vectorize: bool,

    /// Also save the cleaned table as UTF-8 CSV
    #[arg(long)]
    pub save_csv: bool,

    /// Filename prefix for every output file
    #[arg(long, default_value = "colbert_humor")]
    pub name: String,

    /// Maximum TF-IDF vocabulary size (at least 1)
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_FEATURES,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_features: usize,
}

impl Cli {
    pub fn persist_options(&self) -> PersistOptions {
        PersistOptions {
            outdir: self.outdir.clone(),
            name: self.name.clone(),
            save_csv: self.save_csv,
        }
    }

    pub fn vectorize_options(&self) -> VectorizeOptions {
        VectorizeOptions {
            outdir: self.outdir.clone(),
            name: self.name.clone(),
            max_features: self.max_features,
        }
    }

    /// Loader → persister → optional vectorizer, stopping at the first error.
    pub fn run(&self) -> Result<()> {
        log::info!("Loading {}", self.input.display());
        let dataset = load_and_clean(&self.input)?;
        log::info!("Rows after cleaning: {}", dataset.len());

        let meta = save_processed(&dataset, &self.persist_options())?;
        log::info!("Saved files:\n{}", serde_json::to_string_pretty(&meta)?);

        if self.no_vectorize {
            return Ok(());
        }

        log::info!("Building TF-IDF (this can take a while)...");
        let summary = build_and_save_tfidf(&dataset.texts(), &self.vectorize_options())?;
        log::info!(
            "TF-IDF saved: {} x {} matrix\n{}",
            summary.shape.0,
            summary.shape.1,
            serde_json::to_string_pretty(&summary)?
        );
        Ok(())
    }
}

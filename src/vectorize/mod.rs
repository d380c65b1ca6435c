//! TF-IDF stage.
//!
//! ```text
//!   text_clean ──▶ TfidfVectorizer (1-2 grams, English stop words)
//!                      │
//!                      ├──▶ <name>_tfidf.joblib  (fitted vectorizer)
//!                      └──▶ <name>_tfidf.npz     (CSR matrix)
//! ```
//!
//! The fitting code and the `.npz` writer only exist with the `tfidf`
//! feature; without it, asking for vectorization is an error.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

#[cfg(feature = "tfidf")]
pub mod npz;
#[cfg(feature = "tfidf")]
pub mod stopwords;
#[cfg(feature = "tfidf")]
pub mod tfidf;

/// Vocabulary cap used when none is given.
pub const DEFAULT_MAX_FEATURES: usize = 20_000;

#[derive(Debug, Clone)]
pub struct VectorizeOptions {
    pub outdir: PathBuf,
    pub name: String,
    pub max_features: usize,
}

/// Where the artifacts went and the matrix shape (rows, cols).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VectorizeSummary {
    pub vectorizer: PathBuf,
    pub matrix: PathBuf,
    pub shape: (usize, usize),
}

/// Fit TF-IDF over `texts`, then persist the vectorizer and the matrix.
#[cfg(feature = "tfidf")]
pub fn build_and_save_tfidf<S: AsRef<str>>(
    texts: &[S],
    opts: &VectorizeOptions,
) -> Result<VectorizeSummary> {
    use anyhow::Context;

    let mut vectorizer = tfidf::TfidfVectorizer::new()
        .with_max_features(opts.max_features)
        .with_ngram_range(1, 2)
        .with_stop_words_english();
    let matrix = vectorizer.fit_transform(texts)?;

    std::fs::create_dir_all(&opts.outdir)
        .with_context(|| format!("creating output directory {}", opts.outdir.display()))?;
    let vec_path = opts.outdir.join(format!("{}_tfidf.joblib", opts.name));
    let mat_path = opts.outdir.join(format!("{}_tfidf.npz", opts.name));

    vectorizer.save(&vec_path)?;
    npz::write_npz(&matrix, &mat_path)
        .with_context(|| format!("writing {}", mat_path.display()))?;

    Ok(VectorizeSummary {
        vectorizer: vec_path,
        matrix: mat_path,
        shape: matrix.shape(),
    })
}

#[cfg(not(feature = "tfidf"))]
pub fn build_and_save_tfidf<S: AsRef<str>>(
    _texts: &[S],
    _opts: &VectorizeOptions,
) -> Result<VectorizeSummary> {
    Err(crate::error::PipelineError::VectorizerUnavailable.into())
}

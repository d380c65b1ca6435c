use thiserror::Error;

/// Domain failures raised by the pipeline stages.
///
/// I/O and codec errors are not listed here; they travel as `anyhow::Error`
/// with context attached at the call site.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input table lacks a required column.
    #[error("input file must contain a '{0}' column")]
    MissingColumn(&'static str),

    /// Every token was filtered out, so no TF-IDF vocabulary could be built.
    #[error("empty vocabulary; perhaps the documents only contain stop words")]
    EmptyVocabulary,

    /// Vectorization was requested but the binary was built without it.
    #[error("TF-IDF support not compiled in (rebuild with the `tfidf` feature or pass --no-vectorize)")]
    VectorizerUnavailable,
}

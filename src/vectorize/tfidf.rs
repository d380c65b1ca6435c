use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{ensure, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::stopwords::is_english_stop_word;
use crate::error::PipelineError;

/// Two or more word characters between word boundaries.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token regex"));

// ---------------------------------------------------------------------------
// CsrMatrix – compressed sparse rows
// ---------------------------------------------------------------------------

/// Documents x terms matrix in CSR layout.
///
/// Row `i` owns `indices[indptr[i]..indptr[i + 1]]` (column ids, ascending)
/// and the matching slice of `data`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    pub n_rows: usize,
    pub n_cols: usize,
    pub indptr: Vec<i32>,
    pub indices: Vec<i32>,
    pub data: Vec<f64>,
}

impl CsrMatrix {
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Column ids and values of one row.
    pub fn row(&self, i: usize) -> (&[i32], &[f64]) {
        let start = self.indptr[i] as usize;
        let end = self.indptr[i + 1] as usize;
        (&self.indices[start..end], &self.data[start..end])
    }

    /// Value at (`row`, `col`), zero when not stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let (cols, vals) = self.row(row);
        cols.binary_search(&(col as i32))
            .map(|pos| vals[pos])
            .unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// TfidfVectorizer
// ---------------------------------------------------------------------------

/// Bag-of-terms vectorizer with smoothed IDF weights and L2-normalized rows.
///
/// After [`fit`](Self::fit) the vocabulary maps each kept term to its column;
/// columns are in lexicographic term order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    max_features: Option<usize>,
    ngram_range: (usize, usize),
    english_stop_words: bool,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self {
            max_features: None,
            ngram_range: (1, 1),
            english_stop_words: false,
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
        }
    }

    /// Keep at most `max_features` terms, the most frequent across the corpus.
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    /// Emit every n-gram with `min_n <= n <= max_n`.
    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        let min_n = min_n.max(1);
        self.ngram_range = (min_n, max_n.max(min_n));
        self
    }

    /// Drop English stop words before n-grams are formed.
    pub fn with_stop_words_english(mut self) -> Self {
        self.english_stop_words = true;
        self
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    /// Split a document into the terms this vectorizer counts.
    pub fn analyze(&self, doc: &str) -> Vec<String> {
        let lowered = doc.to_lowercase();
        let tokens: Vec<&str> = TOKEN_RE
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|t| !(self.english_stop_words && is_english_stop_word(t)))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    fn term_counts(&self, doc: &str) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for term in self.analyze(doc) {
            *counts.entry(term).or_insert(0) += 1;
        }
        counts
    }

    /// Learn the vocabulary and IDF weights.
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<()> {
        let per_doc: Vec<HashMap<String, usize>> =
            documents.iter().map(|d| self.term_counts(d.as_ref())).collect();
        self.fit_counts(&per_doc)
    }

    fn fit_counts(&mut self, per_doc: &[HashMap<String, usize>]) -> Result<()> {
        ensure!(self.max_features != Some(0), "max_features must be at least 1");

        let mut corpus_freq: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for counts in per_doc {
            for (term, &count) in counts {
                *corpus_freq.entry(term.as_str()).or_insert(0) += count;
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }
        if corpus_freq.is_empty() {
            return Err(PipelineError::EmptyVocabulary.into());
        }

        let mut ranked: Vec<(&str, usize)> = corpus_freq.into_iter().collect();
        if let Some(limit) = self.max_features {
            if ranked.len() > limit {
                log::debug!("Pruning vocabulary from {} to {limit} terms", ranked.len());
                ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
                ranked.truncate(limit);
            }
        }
        let mut kept: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        kept.sort_unstable();

        let n_docs = per_doc.len() as f64;
        self.idf = kept
            .iter()
            .map(|term| {
                let df = doc_freq[term] as f64;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        self.vocabulary = kept
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term.to_string(), idx))
            .collect();
        Ok(())
    }

    /// Weight documents with the fitted vocabulary.  Unknown terms are ignored.
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Result<CsrMatrix> {
        let per_doc: Vec<HashMap<String, usize>> =
            documents.iter().map(|d| self.term_counts(d.as_ref())).collect();
        self.transform_counts(&per_doc)
    }

    fn transform_counts(&self, per_doc: &[HashMap<String, usize>]) -> Result<CsrMatrix> {
        let mut indptr = Vec::with_capacity(per_doc.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);

        for counts in per_doc {
            let mut row: Vec<(usize, f64)> = counts
                .iter()
                .filter_map(|(term, &count)| {
                    self.vocabulary
                        .get(term)
                        .map(|&col| (col, count as f64 * self.idf[col]))
                })
                .collect();
            row.sort_unstable_by_key(|&(col, _)| col);

            let norm = row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
            for (col, value) in row {
                indices.push(csr_index(col)?);
                data.push(if norm > 0.0 { value / norm } else { value });
            }
            indptr.push(csr_index(indices.len())?);
        }

        Ok(CsrMatrix {
            n_rows: per_doc.len(),
            n_cols: self.vocabulary.len(),
            indptr,
            indices,
            data,
        })
    }

    /// Fit on `documents` and return their weighted matrix.
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<CsrMatrix> {
        let per_doc: Vec<HashMap<String, usize>> =
            documents.iter().map(|d| self.term_counts(d.as_ref())).collect();
        self.fit_counts(&per_doc)?;
        self.transform_counts(&per_doc)
    }

    /// Dump the fitted vectorizer.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(self).context("serializing vectorizer")?;
        fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
    }

    /// Load a vectorizer written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        bincode::deserialize(&bytes).context("decoding vectorizer")
    }
}

/// CSR offsets and column ids are stored as 32-bit integers.
fn csr_index(n: usize) -> Result<i32> {
    i32::try_from(n).with_context(|| format!("{n} does not fit a 32-bit sparse matrix index"))
}

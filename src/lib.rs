//! Clean a labeled text corpus, persist it as Parquet/bincode/CSV and
//! optionally derive a TF-IDF matrix from it.

pub mod cli;
pub mod data;
pub mod error;
pub mod output;
pub mod vectorize;

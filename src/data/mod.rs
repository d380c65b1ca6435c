//! Data layer: row types, text normalization, label coercion and loading.
//!
//! Architecture:
//! ```text
//!   .csv / .tsv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → rows of nullable strings
//!   └──────────┘
//!        │   text  ─▶ text::normalize_text  ─▶ text_clean
//!        │   humor ─▶ label::LabelParse     ─▶ label
//!        ▼
//!   ┌────────────────┐
//!   │ CleanedDataset │  non-empty rows, re-indexed from zero
//!   └────────────────┘
//! ```

pub mod label;
pub mod loader;
pub mod model;
pub mod text;

use serde::{Deserialize, Serialize};

/// Name of the required free-text column.
pub const TEXT_COLUMN: &str = "text";
/// Name of the optional source column the label is derived from.
pub const HUMOR_COLUMN: &str = "humor";
/// Derived columns appended to every cleaned dataset, in this order.
pub const LABEL_COLUMN: &str = "label";
pub const TEXT_CLEAN_COLUMN: &str = "text_clean";

// ---------------------------------------------------------------------------
// Record – one row of the source CSV
// ---------------------------------------------------------------------------

/// A raw input row.  Cells line up with the header; an empty field is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub cells: Vec<Option<String>>,
}

impl Record {
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.cells.get(idx).and_then(|c| c.as_deref())
    }
}

// ---------------------------------------------------------------------------
// CleanedRecord / CleanedDataset – output of the loader
// ---------------------------------------------------------------------------

/// A retained row: the source cells plus the two derived columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedRecord {
    /// Source cells, aligned with [`CleanedDataset::columns`].
    pub cells: Vec<Option<String>>,
    /// 0/1 when the `humor` cell could be mapped, otherwise unset.
    pub label: Option<u8>,
    /// Normalized text, never empty.
    pub text_clean: String,
}

/// The full cleaned table.  Row order is the input order with empty rows
/// removed, so row `i` is simply `rows[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedDataset {
    /// Source column names in header order (derived columns excluded).
    pub columns: Vec<String>,
    pub rows: Vec<CleanedRecord>,
}

impl CleanedDataset {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All output column names: source columns, then `label`, `text_clean`.
    pub fn output_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .cloned()
            .chain([LABEL_COLUMN.to_string(), TEXT_CLEAN_COLUMN.to_string()])
            .collect()
    }

    /// The `text_clean` column, in row order.
    pub fn texts(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.text_clean.as_str()).collect()
    }

    /// Index of a source column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

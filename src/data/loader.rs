use std::path::Path;

use anyhow::{bail, Context, Result};

use super::label::LabelParse;
use super::model::{
    CleanedDataset, CleanedRecord, Record, HUMOR_COLUMN, LABEL_COLUMN, TEXT_CLEAN_COLUMN,
    TEXT_COLUMN,
};
use super::text::normalize_text;
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a labeled corpus and clean it.
///
/// * `text` is required; a file without it fails before anything is written.
/// * `humor`, when present, is coerced to a 0/1 `label`; when absent every
///   label is unset.
/// * Rows whose normalized text is empty are dropped.
pub fn load_and_clean(path: &Path) -> Result<CleanedDataset> {
    let (columns, records) = read_table(path)?;

    let text_idx = columns
        .iter()
        .position(|h| h == TEXT_COLUMN)
        .ok_or(PipelineError::MissingColumn(TEXT_COLUMN))?;
    let humor_idx = columns.iter().position(|h| h == HUMOR_COLUMN);
    if humor_idx.is_none() {
        log::info!("No '{HUMOR_COLUMN}' column; labels left unset");
    }

    // Derived columns overwrite same-named source columns.
    let keep: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, h)| *h != LABEL_COLUMN && *h != TEXT_CLEAN_COLUMN)
        .map(|(i, _)| i)
        .collect();

    let n_input = records.len();
    let mut unmapped = 0usize;
    let mut rows = Vec::with_capacity(n_input);

    for record in records {
        let text_clean = normalize_text(record.get(text_idx));
        if text_clean.is_empty() {
            continue;
        }

        let label = match humor_idx {
            Some(idx) => {
                let parsed = LabelParse::from_cell(record.get(idx));
                if parsed == LabelParse::Unset {
                    unmapped += 1;
                }
                parsed.label()
            }
            None => None,
        };

        let mut cells = record.cells;
        let cells = keep
            .iter()
            .map(|&i| cells.get_mut(i).and_then(Option::take))
            .collect();
        rows.push(CleanedRecord {
            cells,
            label,
            text_clean,
        });
    }

    log::debug!("Dropped {} rows with empty text", n_input - rows.len());
    if unmapped > 0 {
        log::debug!("{unmapped} retained rows have an unrecognized '{HUMOR_COLUMN}' value");
    }

    let columns = keep.iter().map(|&i| columns[i].clone()).collect();
    Ok(CleanedDataset { columns, rows })
}

// ---------------------------------------------------------------------------
// Delimited reader
// ---------------------------------------------------------------------------

/// Read a delimited file into a header and string rows.  Dispatch by
/// extension: `.tsv`/`.tab` are tab separated, everything else is CSV.
///
/// Short rows are accepted and their missing trailing cells read as null;
/// a row with more fields than the header is an error.
fn read_table(path: &Path) -> Result<(Vec<String>, Vec<Record>)> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let delimiter = match ext.as_str() {
        "tsv" | "tab" => b'\t',
        _ => b',',
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() > headers.len() {
            bail!(
                "CSV row {row_no}: expected {} fields, saw {}",
                headers.len(),
                record.len()
            );
        }
        let cells = record
            .iter()
            .map(|v| (!v.is_empty()).then(|| v.to_string()))
            .collect();
        records.push(Record { cells });
    }

    Ok((headers, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_input(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn cleans_and_labels_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(
            dir.path(),
            "in.csv",
            "text,humor\n\"Check this out!! http://x.co <b>NOW</b>\",True\nplain words,false\n",
        );

        let ds = load_and_clean(&path).unwrap();
        assert_eq!(ds.columns, ["text", "humor"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[0].text_clean, "check this out!! now");
        assert_eq!(ds.rows[0].label, Some(1));
        assert_eq!(ds.rows[1].label, Some(0));
        assert_eq!(ds.rows[1].cells[1].as_deref(), Some("false"));
    }

    #[test]
    fn empty_text_rows_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(
            dir.path(),
            "in.csv",
            "text,humor\n,True\nkeep me,False\n\"  <p></p> \",true\nsecond,true\n",
        );

        let ds = load_and_clean(&path).unwrap();
        assert_eq!(ds.len(), 4 - 2);
        assert_eq!(ds.texts(), ["keep me", "second"]);
        assert!(ds.rows.iter().all(|r| !r.text_clean.trim().is_empty()));
    }

    #[test]
    fn missing_humor_leaves_labels_unset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), "in.csv", "id,text\n1,hello\n2,world\n");

        let ds = load_and_clean(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.rows.iter().all(|r| r.label.is_none()));
    }

    #[test]
    fn unrecognized_humor_is_unset_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), "in.csv", "text,humor\na joke,maybe\nanother,\n");

        let ds = load_and_clean(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[0].label, None);
        assert_eq!(ds.rows[1].label, None);
    }

    #[test]
    fn missing_text_column_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), "in.csv", "body,humor\nhello,True\n");

        let err = load_and_clean(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingColumn("text"))
        ));
    }

    #[test]
    fn source_label_column_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), "in.csv", "label,text,humor\nx,hi,true\n");

        let ds = load_and_clean(&path).unwrap();
        assert_eq!(ds.columns, ["text", "humor"]);
        assert_eq!(ds.rows[0].cells.len(), 2);
        assert_eq!(ds.rows[0].label, Some(1));
    }

    #[test]
    fn short_rows_read_missing_cells_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(
            dir.path(),
            "in.csv",
            "text,humor,source\nhello there,True,web\nno label here\n",
        );

        let ds = load_and_clean(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[0].label, Some(1));
        assert_eq!(ds.rows[1].text_clean, "no label here");
        assert_eq!(ds.rows[1].label, None);
        assert_eq!(ds.rows[1].cells, [Some("no label here".to_string()), None, None]);
    }

    #[test]
    fn rows_longer_than_header_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), "in.csv", "text,humor\nhi,True,extra\n");

        let err = load_and_clean(&path).unwrap_err();
        assert!(format!("{err:#}").contains("expected 2 fields, saw 3"));
    }

    #[test]
    fn tab_separated_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), "in.tsv", "text\thumor\nhi, there\tTrue\n");

        let ds = load_and_clean(&path).unwrap();
        assert_eq!(ds.rows[0].text_clean, "hi there");
        assert_eq!(ds.rows[0].label, Some(1));
    }
}

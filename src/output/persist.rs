use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::parquet_io::write_parquet;
use crate::data::model::CleanedDataset;

/// Where and how to persist a cleaned dataset.
#[derive(Debug, Clone)]
pub struct PersistOptions {
    pub outdir: PathBuf,
    /// Filename prefix shared by every artifact.
    pub name: String,
    /// Also write `<name>.csv`.
    pub save_csv: bool,
}

/// Summary of one persist run, also written as `<name>_meta.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub n_rows: usize,
    pub parquet: PathBuf,
    pub pickle: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv: Option<PathBuf>,
}

impl Metadata {
    /// Paths of the data files written, in write order.
    pub fn files(&self) -> Vec<&Path> {
        let mut files = vec![self.parquet.as_path(), self.pickle.as_path()];
        files.extend(self.csv.as_deref());
        files
    }
}

/// Write the dataset to every configured format and return the metadata.
///
/// Files are written one after another; if a write fails the error is
/// returned and anything already on disk stays there.
pub fn save_processed(ds: &CleanedDataset, opts: &PersistOptions) -> Result<Metadata> {
    fs::create_dir_all(&opts.outdir)
        .with_context(|| format!("creating output directory {}", opts.outdir.display()))?;

    let parquet = opts.outdir.join(format!("{}.parquet", opts.name));
    let pickle = opts.outdir.join(format!("{}.pkl", opts.name));

    write_parquet(ds, &parquet).with_context(|| format!("writing {}", parquet.display()))?;
    write_pickle(ds, &pickle).with_context(|| format!("writing {}", pickle.display()))?;

    let csv = if opts.save_csv {
        let path = opts.outdir.join(format!("{}.csv", opts.name));
        write_csv(ds, &path).with_context(|| format!("writing {}", path.display()))?;
        Some(path)
    } else {
        None
    };

    let meta = Metadata {
        n_rows: ds.len(),
        parquet,
        pickle,
        csv,
    };
    let meta_path = opts.outdir.join(format!("{}_meta.json", opts.name));
    let json = serde_json::to_string_pretty(&meta).context("serializing metadata")?;
    fs::write(&meta_path, json).with_context(|| format!("writing {}", meta_path.display()))?;

    Ok(meta)
}

// ---------------------------------------------------------------------------
// Object dump (.pkl)
// ---------------------------------------------------------------------------

fn write_pickle(ds: &CleanedDataset, path: &Path) -> Result<()> {
    let bytes = bincode::serialize(ds).context("serializing dataset")?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Load a dataset previously dumped to `<name>.pkl`.
pub fn load_pickle(path: &Path) -> Result<CleanedDataset> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    bincode::deserialize(&bytes).context("decoding dataset")
}

// ---------------------------------------------------------------------------
// CSV (.csv)
// ---------------------------------------------------------------------------

/// UTF-8, header row, no index column.  Null cells and unset labels are
/// written as empty fields.
fn write_csv(ds: &CleanedDataset, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(ds.output_columns())?;

    for row in &ds.rows {
        let label = row.label.map(|l| l.to_string()).unwrap_or_default();
        let record = row
            .cells
            .iter()
            .map(|c| c.as_deref().unwrap_or(""))
            .chain([label.as_str(), row.text_clean.as_str()]);
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CleanedRecord;
    use crate::output::load_parquet;

    fn sample() -> CleanedDataset {
        CleanedDataset {
            columns: vec!["text".into(), "humor".into()],
            rows: vec![
                CleanedRecord {
                    cells: vec![Some("Why, hello!".into()), Some("True".into())],
                    label: Some(1),
                    text_clean: "why hello!".into(),
                },
                CleanedRecord {
                    cells: vec![Some("tax forms".into()), Some("unknown".into())],
                    label: None,
                    text_clean: "tax forms".into(),
                },
            ],
        }
    }

    fn opts(outdir: PathBuf, save_csv: bool) -> PersistOptions {
        PersistOptions {
            outdir,
            name: "corpus".into(),
            save_csv,
        }
    }

    #[test]
    fn writes_files_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let outdir = dir.path().join("nested/out");
        let meta = save_processed(&sample(), &opts(outdir.clone(), false)).unwrap();

        assert_eq!(meta.n_rows, 2);
        assert_eq!(meta.parquet, outdir.join("corpus.parquet"));
        assert_eq!(meta.pickle, outdir.join("corpus.pkl"));
        assert!(meta.csv.is_none());
        assert!(meta.files().iter().all(|p| p.exists()));
        assert!(!outdir.join("corpus.csv").exists());

        let json = fs::read_to_string(outdir.join("corpus_meta.json")).unwrap();
        let on_disk: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(on_disk, meta);
        assert!(!json.contains("\"csv\""));
    }

    #[test]
    fn parquet_and_pickle_agree() {
        let dir = tempfile::tempdir().unwrap();
        let ds = sample();
        let meta = save_processed(&ds, &opts(dir.path().to_path_buf(), false)).unwrap();

        let from_parquet = load_parquet(&meta.parquet).unwrap();
        let from_pickle = load_pickle(&meta.pickle).unwrap();
        assert_eq!(from_parquet, from_pickle);
        assert_eq!(from_pickle, ds);
    }

    #[test]
    fn optional_csv_has_no_index_column() {
        let dir = tempfile::tempdir().unwrap();
        let meta = save_processed(&sample(), &opts(dir.path().to_path_buf(), true)).unwrap();

        let csv_path = meta.csv.clone().unwrap();
        let content = fs::read_to_string(&csv_path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("text,humor,label,text_clean"));
        assert_eq!(lines.next(), Some("\"Why, hello!\",True,1,why hello!"));
        assert_eq!(lines.next(), Some("tax forms,unknown,,tax forms"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn write_failure_is_propagated() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, b"x").unwrap();

        let err = save_processed(&sample(), &opts(blocker.join("out"), false)).unwrap_err();
        assert!(format!("{err:#}").contains("creating output directory"));
    }
}

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Int64Type, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use crate::data::model::{CleanedDataset, CleanedRecord, LABEL_COLUMN, TEXT_CLEAN_COLUMN};

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Build a single record batch holding the whole dataset.
///
/// Schema: one nullable `Utf8` per source column, `label` as nullable
/// `Int64`, `text_clean` as non-null `Utf8`.
pub fn to_record_batch(ds: &CleanedDataset) -> Result<RecordBatch> {
    let mut fields: Vec<Field> = ds
        .columns
        .iter()
        .map(|name| Field::new(name, DataType::Utf8, true))
        .collect();
    fields.push(Field::new(LABEL_COLUMN, DataType::Int64, true));
    fields.push(Field::new(TEXT_CLEAN_COLUMN, DataType::Utf8, false));
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(ds.columns.len() + 2);
    for col_idx in 0..ds.columns.len() {
        let values: Vec<Option<&str>> = ds
            .rows
            .iter()
            .map(|r| r.cells[col_idx].as_deref())
            .collect();
        columns.push(Arc::new(StringArray::from(values)));
    }
    let labels: Vec<Option<i64>> = ds.rows.iter().map(|r| r.label.map(i64::from)).collect();
    columns.push(Arc::new(Int64Array::from(labels)));
    columns.push(Arc::new(StringArray::from(ds.texts())));

    RecordBatch::try_new(schema, columns).context("building record batch")
}

/// Write the dataset as a Parquet file.
pub fn write_parquet(ds: &CleanedDataset, path: &Path) -> Result<()> {
    let batch = to_record_batch(ds)?;
    if log::log_enabled!(log::Level::Debug) && batch.num_rows() > 0 {
        let preview = batch.slice(0, batch.num_rows().min(5));
        log::debug!("First rows:\n{}", pretty_format_batches(&[preview])?);
    }

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by [`write_parquet`] back into a dataset.
///
/// Every column other than `label` and `text_clean` must be `Utf8` and is
/// treated as a source column, in schema order.
pub fn load_parquet(path: &Path) -> Result<CleanedDataset> {
    let file = File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let label_idx = schema
        .index_of(LABEL_COLUMN)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{LABEL_COLUMN}' column"))?;
    let text_idx = schema
        .index_of(TEXT_CLEAN_COLUMN)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{TEXT_CLEAN_COLUMN}' column"))?;
    let source_cols: Vec<(usize, String)> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != label_idx && *i != text_idx)
        .map(|(i, f)| (i, f.name().clone()))
        .collect();

    let reader = builder.build().context("building parquet reader")?;
    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let labels = batch
            .column(label_idx)
            .as_primitive_opt::<Int64Type>()
            .context("'label' column is not Int64")?;
        let texts = batch
            .column(text_idx)
            .as_string_opt::<i32>()
            .context("'text_clean' column is not Utf8")?;
        let sources = source_cols
            .iter()
            .map(|(idx, name)| {
                batch
                    .column(*idx)
                    .as_string_opt::<i32>()
                    .with_context(|| format!("column '{name}' is not Utf8"))
            })
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            let label = if labels.is_null(row) {
                None
            } else {
                match labels.value(row) {
                    v @ (0 | 1) => Some(v as u8),
                    other => bail!("Row {row}: label {other} is not 0/1"),
                }
            };
            let cells = sources
                .iter()
                .map(|col| (!col.is_null(row)).then(|| col.value(row).to_string()))
                .collect();
            rows.push(CleanedRecord {
                cells,
                label,
                text_clean: texts.value(row).to_string(),
            });
        }
    }

    let columns = source_cols.into_iter().map(|(_, name)| name).collect();
    Ok(CleanedDataset { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CleanedDataset {
        CleanedDataset {
            columns: vec!["text".into(), "humor".into()],
            rows: vec![
                CleanedRecord {
                    cells: vec![Some("Ha HA".into()), Some("True".into())],
                    label: Some(1),
                    text_clean: "ha ha".into(),
                },
                CleanedRecord {
                    cells: vec![Some("meh".into()), None],
                    label: None,
                    text_clean: "meh".into(),
                },
            ],
        }
    }

    #[test]
    fn record_batch_schema() {
        let batch = to_record_batch(&sample()).unwrap();
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, ["text", "humor", "label", "text_clean"]);
        assert_eq!(schema.field(2).data_type(), &DataType::Int64);
        assert_eq!(batch.num_rows(), 2);
        assert!(batch.column(1).is_null(1));
        assert!(batch.column(2).is_null(1));
    }

    #[test]
    fn parquet_reads_back_same_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.parquet");
        let ds = sample();
        write_parquet(&ds, &path).unwrap();
        assert_eq!(load_parquet(&path).unwrap(), ds);
    }

    #[test]
    fn empty_dataset_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.parquet");
        let ds = CleanedDataset {
            columns: vec!["text".into()],
            rows: Vec::new(),
        };
        write_parquet(&ds, &path).unwrap();
        assert_eq!(load_parquet(&path).unwrap(), ds);
    }
}

use super::DataSource;
use anyhow::{anyhow, bail, Context, Result};
use arrow::array::{Array, LargeStringArray, StringArray};
use arrow::record_batch::RecordBatch;
use parquet::arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ProjectionMask};
use std::path::PathBuf;

/// Streams one string column of a Parquet file as owned `String`s, row by row.
///
/// Only the requested column is decoded. Null cells come out as empty strings
/// so row positions are preserved.
///
/// # Example
/// ```ignore
/// // WikiText rows live in the "text" column
/// let source = ParquetSource::new("train-00000-of-00001.parquet", "text", 1024);
/// for line in source.stream()? {
///     let line: String = line?;
/// }
/// ```
pub struct ParquetSource {
    path: PathBuf,
    column: String,
    batch_size: usize,
}

impl ParquetSource {
    /// Creates a new Parquet text reader.
    ///
    /// # Arguments
    /// - `path`: Path to Parquet file
    /// - `column`: Name of the string column to read
    /// - `batch_size`: Rows decoded per RecordBatch
    pub fn new(path: impl Into<PathBuf>, column: impl Into<String>, batch_size: usize) -> Self {
        Self {
            path: path.into(),
            column: column.into(),
            batch_size: batch_size.max(1),
        }
    }
}

impl DataSource<String> for ParquetSource {
    /// Stream rows of the text column.
    ///
    /// # Errors
    /// 1. Yields per-batch errors for corrupt row groups.
    /// 2. Fails immediately if:
    /// - File does not exist or is not a valid Parquet
    /// - The column does not exist
    fn stream(&self) -> Result<Box<dyn Iterator<Item = Result<String>>>> {
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("Failed to open Parquet file: {}", self.path.display()))?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .with_context(|| format!("Not a valid Parquet file: {}", self.path.display()))?
            .with_batch_size(self.batch_size);

        let field_index = builder.schema().index_of(&self.column).map_err(|_| {
            let available: Vec<_> = builder
                .schema()
                .fields()
                .iter()
                .map(|f| f.name().to_string())
                .collect();
            anyhow!(
                "Column '{}' not found in {}. Available: {:?}",
                self.column,
                self.path.display(),
                available
            )
        })?;

        // Decode only the text column
        let projection_mask = ProjectionMask::roots(builder.parquet_schema(), [field_index]);
        let reader = builder.with_projection(projection_mask).build()?;

        let column = self.column.clone();
        Ok(Box::new(reader.flat_map(move |batch| {
            let rows = batch
                .map_err(anyhow::Error::from)
                .and_then(|batch| text_rows(&batch, &column));
            match rows {
                Ok(rows) => rows.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            }
        })))
    }
}

fn text_rows(batch: &RecordBatch, column: &str) -> Result<Vec<String>> {
    let array = batch
        .column_by_name(column)
        .ok_or_else(|| anyhow!("Column '{}' missing from record batch", column))?;

    if let Some(strings) = array.as_any().downcast_ref::<StringArray>() {
        return Ok(strings
            .iter()
            .map(|s| s.unwrap_or_default().to_string())
            .collect());
    }
    if let Some(strings) = array.as_any().downcast_ref::<LargeStringArray>() {
        return Ok(strings
            .iter()
            .map(|s| s.unwrap_or_default().to_string())
            .collect());
    }
    bail!(
        "Column '{}' has type {:?}, expected a string column",
        column,
        array.data_type()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::{
        array::{ArrayRef, Int32Array},
        datatypes::{DataType, Field, Schema},
    };
    use parquet::arrow::arrow_writer::ArrowWriter;
    use std::{fs::File, sync::Arc};
    use tempfile::NamedTempFile;

    // Writes a two-column file: "id" (int) and "text" (nullable string)
    fn write_text_parquet(rows: Vec<Option<&str>>) -> NamedTempFile {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("text", DataType::Utf8, true),
        ]));
        let ids: ArrayRef = Arc::new(Int32Array::from((0..rows.len() as i32).collect::<Vec<_>>()));
        let text: ArrayRef = Arc::new(StringArray::from(rows));
        let batch = RecordBatch::try_new(schema.clone(), vec![ids, text]).unwrap();

        let tmp = NamedTempFile::new().unwrap();
        {
            let file = File::create(tmp.path()).unwrap();
            let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
            writer.write(&batch).unwrap();
            writer.close().unwrap();
        }
        tmp
    }

    #[test]
    fn test_parquet_text_column_streaming() -> Result<()> {
        let tmp = write_text_parquet(vec![Some(" = Valkyria = "), None, Some("Senjō no")]);

        // batch_size smaller than the row count exercises multiple batches
        let source = ParquetSource::new(tmp.path(), "text", 2);
        let rows = source.read_all()?;

        assert_eq!(rows, vec![" = Valkyria = ", "", "Senjō no"]);
        Ok(())
    }

    #[test]
    fn test_parquet_missing_column_error() {
        let tmp = write_text_parquet(vec![Some("a")]);
        let source = ParquetSource::new(tmp.path(), "sentence", 16);
        let err = source.stream().err().unwrap();
        assert!(err.to_string().contains("sentence"));
    }

    #[test]
    fn test_parquet_non_string_column_error() {
        let tmp = write_text_parquet(vec![Some("a")]);
        let source = ParquetSource::new(tmp.path(), "id", 16);
        assert!(source.read_all().is_err());
    }

    #[test]
    fn test_parquet_file_missing_error() {
        let src = ParquetSource::new("no_such.parquet", "text", 16);
        assert!(src.stream().is_err());
    }
}

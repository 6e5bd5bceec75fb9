//! Arrow CSV reading with declared column types, and typed column access.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use tracing::debug;

use crate::StoreError;

/// Read a headed CSV file into RecordBatches.
///
/// Columns named in `typed` are parsed with their declared type; every other
/// column gets `fallback(name)`. Empty cells become nulls.
pub fn read_csv(
    path: &Path,
    typed: &Schema,
    fallback: impl Fn(&str) -> DataType,
) -> Result<Vec<RecordBatch>, StoreError> {
    if !path.exists() {
        return Err(StoreError::FileNotFound(path.to_path_buf()));
    }

    // Header only: column names and order come from the file itself.
    let (header, _) = Format::default()
        .with_header(true)
        .infer_schema(File::open(path)?, Some(0))?;

    let fields: Vec<Field> = header
        .fields()
        .iter()
        .map(|f| {
            let data_type = typed
                .field_with_name(f.name())
                .map(|t| t.data_type().clone())
                .unwrap_or_else(|_| fallback(f.name()));
            Field::new(f.name(), data_type, true)
        })
        .collect();

    let reader = ReaderBuilder::new(Arc::new(Schema::new(fields)))
        .with_header(true)
        .build(File::open(path)?)?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;

    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    debug!(path = %path.display(), rows, "read csv");
    Ok(batches)
}

/// Every column not otherwise declared is read as text.
pub(crate) fn utf8(_: &str) -> DataType {
    DataType::Utf8
}

/// Typed, name-based access to the columns of one batch.
pub(crate) struct Columns<'a> {
    batch: &'a RecordBatch,
    file: &'a Path,
}

impl<'a> Columns<'a> {
    pub(crate) fn new(batch: &'a RecordBatch, file: &'a Path) -> Self {
        Self { batch, file }
    }

    pub(crate) fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub(crate) fn has(&self, name: &str) -> bool {
        self.batch.column_by_name(name).is_some()
    }

    fn required(&self, name: &str) -> Result<&'a ArrayRef, StoreError> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| StoreError::MissingColumn {
                file: self.file.to_path_buf(),
                column: name.to_string(),
            })
    }

    fn type_error(&self, name: &str, expected: &'static str) -> StoreError {
        StoreError::ColumnType {
            file: self.file.to_path_buf(),
            column: name.to_string(),
            expected,
        }
    }

    pub(crate) fn null_error(&self, name: &str, row: usize) -> StoreError {
        StoreError::NullValue {
            file: self.file.to_path_buf(),
            column: name.to_string(),
            row,
        }
    }

    pub(crate) fn dates(&self, name: &str) -> Result<Vec<Option<NaiveDate>>, StoreError> {
        let col = self.required(name)?;
        let arr = col
            .as_any()
            .downcast_ref::<Date32Array>()
            .ok_or_else(|| self.type_error(name, "a date"))?;
        Ok((0..arr.len())
            .map(|i| {
                if arr.is_null(i) {
                    None
                } else {
                    arr.value_as_date(i)
                }
            })
            .collect())
    }

    /// Date column, or all-null when the file does not have it.
    pub(crate) fn dates_or_null(&self, name: &str) -> Result<Vec<Option<NaiveDate>>, StoreError> {
        if !self.has(name) {
            return Ok(vec![None; self.num_rows()]);
        }
        self.dates(name)
    }

    /// Non-null dates; a null anywhere is an error.
    pub(crate) fn required_dates(&self, name: &str) -> Result<Vec<NaiveDate>, StoreError> {
        self.dates(name)?
            .into_iter()
            .enumerate()
            .map(|(row, d)| d.ok_or_else(|| self.null_error(name, row)))
            .collect()
    }

    pub(crate) fn ints(&self, name: &str) -> Result<Vec<Option<i64>>, StoreError> {
        let col = self.required(name)?;
        let arr = col
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| self.type_error(name, "an integer"))?;
        Ok(arr.iter().collect())
    }

    /// Integer column, or all-zero when the file does not have it.
    pub(crate) fn ints_or_zero(&self, name: &str) -> Result<Vec<u64>, StoreError> {
        if !self.has(name) {
            return Ok(vec![0; self.num_rows()]);
        }
        Ok(self
            .ints(name)?
            .into_iter()
            .map(|v| v.and_then(|n| u64::try_from(n).ok()).unwrap_or(0))
            .collect())
    }

    pub(crate) fn floats(&self, name: &str) -> Result<Vec<Option<f64>>, StoreError> {
        let col = self.required(name)?;
        let arr = col
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| self.type_error(name, "a float"))?;
        Ok(arr.iter().map(|v| v.filter(|f| f.is_finite())).collect())
    }

    pub(crate) fn strings(&self, name: &str) -> Result<Vec<Option<&'a str>>, StoreError> {
        let col = self.required(name)?;
        let arr = col
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| self.type_error(name, "text"))?;
        Ok(arr.iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn missing_file_errors() {
        let result = read_csv(Path::new("/nonexistent/file.csv"), &Schema::empty(), utf8);
        assert!(matches!(result, Err(StoreError::FileNotFound(_))));
    }

    #[test]
    fn declared_types_and_text_fallback() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            "t.csv",
            "date,state,pop\n2021-08-01,Johor,3781000\n2021-08-02,,\n",
        );
        let schema = Schema::new(vec![
            Field::new("date", DataType::Date32, true),
            Field::new("pop", DataType::Int64, true),
        ]);
        let batches = read_csv(&path, &schema, utf8).unwrap();
        let cols = Columns::new(&batches[0], &path);

        let dates = cols.required_dates("date").unwrap();
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2021, 8, 2).unwrap());
        assert_eq!(cols.ints("pop").unwrap(), vec![Some(3_781_000), None]);
        assert_eq!(cols.strings("state").unwrap()[0], Some("Johor"));
    }

    #[test]
    fn wrong_type_and_missing_column() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write(tmp.path(), "t.csv", "date,pop\n2021-08-01,1\n");
        let batches = read_csv(&path, &Schema::empty(), utf8).unwrap();
        let cols = Columns::new(&batches[0], &path);

        assert!(matches!(cols.ints("pop"), Err(StoreError::ColumnType { .. })));
        assert!(matches!(
            cols.ints("age"),
            Err(StoreError::MissingColumn { .. })
        ));
        assert_eq!(cols.ints_or_zero("age").unwrap(), vec![0]);
        assert_eq!(cols.dates_or_null("date_dose3").unwrap(), vec![None]);
    }
}

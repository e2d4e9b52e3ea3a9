pub mod jsonl;
pub mod parquet;

pub use jsonl::JsonlSource;
pub use parquet::ParquetSource;

use anyhow::Result;

/// A `DataSource` streams raw records of type `T` from a downloaded dataset file.
///
/// Records come out in file order, one per Parquet row or JSON line.
pub trait DataSource<T> {
    fn stream(&self) -> Result<Box<dyn Iterator<Item = Result<T>>>>;

    /// Drains the whole stream into memory, failing on the first bad record.
    fn read_all(&self) -> Result<Vec<T>> {
        self.stream()?.collect()
    }
}

use super::DataSource;
use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
};

/// A document record carrying a `text` field, as found in C4 shards.
/// Extra fields (`timestamp`, `url`, ...) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TextRecord {
    pub text: String,
}

/// A line-by-line JSONL reader with typed (`T: DeserializeOwned`) parsing.
///
/// Files ending in `.gz` are decompressed on the fly.
///
/// # Example
/// ```ignore
/// let source = JsonlSource::new("c4-train.00000-of-01024.json.gz");
/// for record in source.stream_records::<TextRecord>()? {
///     println!("{}", record?.text);
/// }
/// ```
pub struct JsonlSource {
    path: PathBuf,
}

impl JsonlSource {
    /// Creates a new reader for a JSONL (or gzipped JSONL) file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_gzip(&self) -> bool {
        self.path.extension().and_then(|e| e.to_str()) == Some("gz")
    }

    /// Streams lines as Rust types.
    ///
    /// # Errors
    /// - Fails if the file cannot be opened or any line is invalid JSON for `T`.
    /// - Includes line numbers in errors (e.g., "Invalid JSON at line 3").
    pub fn stream_records<T: DeserializeOwned + 'static>(
        &self,
    ) -> Result<Box<dyn Iterator<Item = Result<T>>>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let reader: Box<dyn BufRead> = if self.is_gzip() {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        let path = self.path.clone();
        let iter = reader
            .lines()
            .enumerate()
            .filter_map(move |(line_num, line)| {
                let line = match line {
                    Ok(l) if l.trim().is_empty() => return None, // Skip blanks
                    Ok(l) => l,
                    Err(e) => {
                        return Some(Err(e).with_context(|| {
                            format!("Error reading {} at line {}", path.display(), line_num + 1)
                        }))
                    }
                };
                Some(
                    serde_json::from_str::<T>(&line)
                        .with_context(|| format!("Invalid JSON at line {}", line_num + 1)),
                )
            });
        Ok(Box::new(iter))
    }
}

// Documents as plain strings, the shape the corpus loaders consume
impl DataSource<String> for JsonlSource {
    fn stream(&self) -> Result<Box<dyn Iterator<Item = Result<String>>>> {
        Ok(Box::new(
            self.stream_records::<TextRecord>()?
                .map(|record| record.map(|r| r.text)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    #[test]
    fn test_jsonl_source_streams_text_records() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, r#"{{"text": "foo", "url": "https://a"}}"#)?;
        writeln!(file)?;
        writeln!(file, r#"{{"text": "bar", "url": "https://b"}}"#)?;

        let source = JsonlSource::new(file.path());
        assert_eq!(source.read_all()?, vec!["foo".to_string(), "bar".to_string()]);
        Ok(())
    }

    #[test]
    fn test_gzipped_jsonl_is_decompressed() -> Result<()> {
        let file = Builder::new().suffix(".json.gz").tempfile()?;
        {
            let mut encoder = GzEncoder::new(File::create(file.path())?, Compression::default());
            writeln!(encoder, r#"{{"text": "Beginners BBQ Class", "timestamp": "2019"}}"#)?;
            writeln!(encoder, r#"{{"text": "Discussion in Windows 10"}}"#)?;
            encoder.finish()?;
        }

        let source = JsonlSource::new(file.path());
        let docs = source.read_all()?;
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0], "Beginners BBQ Class");
        Ok(())
    }

    #[test]
    fn test_invalid_line_reports_line_number() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, r#"{{"text": "ok"}}"#)?;
        writeln!(file, r#"{{"body": "no text field"}}"#)?;

        let err = JsonlSource::new(file.path()).read_all().unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
        Ok(())
    }
}

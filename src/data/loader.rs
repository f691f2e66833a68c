// ============================================================
// Layer 4 — Dataset Loader
// ============================================================
// Reads comma-delimited sentiment records into RawSamples.
//
// Record layout (at least 4 fields):
//
//   id , text , selected_text , label
//   0    1      2               3
//
//   - field[1] is the text; one layer of surrounding double
//     quotes is removed and "" escapes are unescaped
//   - field[3] is the label; exact match against
//     "positive" / "negative" / "neutral", anything else
//     becomes DEFAULT_CATEGORY
//
// Commas inside a quoted text are NOT treated specially; the
// line is split on every comma. That shifts the label column
// for such rows; they either fail the field-count check or
// fall back to the default label.
//
// Bad rows are skipped with a warning; they never fail the
// load. Only real I/O errors propagate, and nothing here
// retries. The caller decides whether to try again.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use std::io::BufRead;
use std::path::Path;

use crate::domain::sentiment::{Category, RawSample};
use crate::error::{Result, SentimentError};

/// Fewer fields than this and the record is rejected
pub const MIN_FIELDS: usize = 4;
pub const TEXT_FIELD: usize = 1;
pub const LABEL_FIELD: usize = 3;

/// Label given to records whose label string is not recognised
pub const DEFAULT_CATEGORY: Category = Category::Neutral;

/// Loads CSV-style sentiment datasets.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvLoader {
    /// Skip the first line as a header row
    has_header: bool,
}

impl CsvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Read a dataset file without blocking the async runtime.
    pub async fn load_file(&self, path: impl AsRef<Path>) -> Result<Vec<RawSample>> {
        let path  = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            tracing::warn!("Cannot read dataset '{}': {}", path.display(), e);
            e
        })?;
        let samples = self.read(bytes.as_slice())?;
        tracing::info!("Loaded {} samples from '{}'", samples.len(), path.display());
        Ok(samples)
    }

    /// Parse an in-memory dataset. Never fails.
    pub fn parse(&self, content: &str) -> Vec<RawSample> {
        // reading from a byte slice cannot hit an I/O error
        self.read(content.as_bytes()).unwrap_or_default()
    }

    /// Read records from any buffered reader.
    pub fn read<R: BufRead>(&self, reader: R) -> Result<Vec<RawSample>> {
        let mut samples = Vec::new();
        let mut skipped = 0usize;

        for (i, line) in reader.split(b'\n').enumerate() {
            let line_no = i + 1;
            let bytes   = line?;

            if self.has_header && line_no == 1 {
                continue;
            }

            let line = match String::from_utf8(bytes) {
                Ok(l)  => l,
                Err(_) => {
                    tracing::warn!("Skipping line {}: not valid UTF-8", line_no);
                    skipped += 1;
                    continue;
                }
            };
            let line = line.trim_end_matches('\r');

            if line.trim().is_empty() {
                continue;
            }

            match parse_record(line, line_no) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    tracing::warn!("Skipping: {}", e);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            tracing::info!("Skipped {} malformed records", skipped);
        }
        Ok(samples)
    }
}

/// Parse one non-empty line into a sample.
///
/// Split by hand rather than with the `csv` crate: a quoted comma must
/// still split the line, which a real CSV reader would not do.
pub fn parse_record(line: &str, line_no: usize) -> Result<RawSample> {
    let fields: Vec<&str> = line.split(',').collect();

    if fields.len() < MIN_FIELDS {
        return Err(SentimentError::MalformedRecord {
            line:   line_no,
            reason: format!("expected at least {MIN_FIELDS} fields, found {}", fields.len()),
        });
    }

    let text  = unquote(fields[TEXT_FIELD]);
    let label = unquote(fields[LABEL_FIELD]);
    let label = Category::from_label(&label).unwrap_or_else(|| {
        tracing::debug!("Line {}: unknown label '{}', using {}", line_no, label, DEFAULT_CATEGORY);
        DEFAULT_CATEGORY
    });

    Ok(RawSample::new(text, label))
}

/// Trim, strip one layer of surrounding double quotes, unescape "".
fn unquote(field: &str) -> String {
    let field = field.trim();
    match field.strip_prefix('"').and_then(|f| f.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None        => field.to_string(),
    }
}

// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a CSV file to tensor batches:
//
//   train.csv
//       │
//       ▼
//   CsvLoader         → parses records, skips malformed rows
//       │
//       ▼
//   Preprocessor      → normalises whitespace, optional lowercase
//       │
//       ▼
//   TextEncoder       → fixed-length hashed feature vector
//       │
//       ▼
//   SentimentDataset  → implements Burn's Dataset trait
//       │
//       ▼
//   SentimentBatcher  → stacks samples into tensor batches
//
// The same Preprocessor + TextEncoder pair runs on the query
// text at inference time.
//
// Reference: Burn Book §4 (Datasets)

/// Parses comma-delimited sentiment records
pub mod loader;

/// Normalises raw text and splits it into tokens
pub mod preprocessor;

/// Hashes tokens into a fixed-length feature vector
pub mod encoder;

/// Encoded samples; implements Burn's Dataset trait
pub mod dataset;

/// Builds feature / target tensors for one batch
pub mod batcher;

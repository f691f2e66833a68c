// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust types and traits for the core concepts:
// categories, label sets, the decision rule, and the seams
// the engine talks to.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Category, LabelSet, RawSample
pub mod sentiment;

// Threshold / argmax decision rule
pub mod decision;

// SentimentModel and ModelTrainer seams
pub mod traits;

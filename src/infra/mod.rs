// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-backed concerns shared by training and inference:
//
//   checkpoint.rs — ModelStore: saves and loads a trained
//                   model (architecture + encoder config as
//                   JSON, parameters as full-precision MPK)
//
//   metrics.rs    — Per-epoch loss / accuracy appended to a
//                   CSV file in the model directory
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model persistence
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each:
// training a model into a directory, or classifying text.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// JSON configuration for the whole pipeline
pub mod config;

// The training workflow
pub mod train_use_case;

// The classification workflow
pub mod predict_use_case;

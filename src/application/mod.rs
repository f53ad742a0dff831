// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal
// (training a model or translating a sentence).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Picks the concrete Burn backend from ComputeDevice
//   - Otherwise only workflow coordination

/// The training workflow
pub mod train_use_case;

/// The single-sentence translation workflow
pub mod translate_use_case;

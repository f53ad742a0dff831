// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits describing translation:
// token sequences, decoding hypotheses, per-position
// log-probability tables, and the two seams the rest of the
// system is written against (the sequence model and the
// text codec).
//
// Rules for this layer:
//   - NO Burn tensors in any signature (masks cross the seam
//     as plain boolean grids, see mask::Mask)
//   - NO file I/O
//   - Only plain structs, enums, and traits

// Special token ids, padding and target shifting
pub mod sequence;

// Per-position log-probabilities returned by one decode pass
pub mod log_probs;

// Attention mask grid (attendable cells)
pub mod mask;

// Beam-search hypothesis value type
pub mod hypothesis;

// SequenceModel and TextCodec seams
pub mod traits;

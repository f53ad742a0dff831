// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence and reporting used by several other layers:
//
//   checkpoint.rs      — named checkpoints (model, optimizer,
//                        best loss, TrainConfig) via Burn's
//                        NamedMpkGzFileRecorder
//
//   tokenizer_store.rs — per-language tokenizers; builds a
//                        word-level tokenizer from a vocabulary
//                        file when no JSON exists, and
//                        implements TextCodec for Tokenizer
//
//   metrics.rs         — per-epoch CSV log and elapsed-time
//                        formatting
//
// Reference: Burn Book §5 (Checkpointing)

/// Model + optimizer checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer loading, building and TextCodec impl
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;

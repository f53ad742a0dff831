// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From parallel text files to batched tensors:
//
//   src/<split>.txt + trg/<split>.txt
//       │
//       ▼
//   ParallelCorpus      → aligned sentence pairs
//       │
//       ▼
//   TextCodec           → token ids (source / target tokenizer)
//       │
//       ▼
//   TranslationSample   → padded src / trg_input / trg_output
//       │
//       ▼
//   TranslationDataset  → Burn's Dataset trait
//       │
//       ▼
//   TranslationBatcher  → tensors + attention masks
//       │
//       ▼
//   DataLoader          → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Vocabulary files (one token per line)
pub mod vocab;

/// Line-aligned source/target text files
pub mod corpus;

/// Implements Burn's Dataset trait for sentence pairs
pub mod dataset;

/// Implements Burn's Batcher trait, masks included
pub mod batcher;

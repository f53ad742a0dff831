// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn tensor code lives here (the batcher in Layer 4 is the
// one other place that builds tensors).
//
//   mask.rs        — encoder / decoder attention masks
//   model.rs       — encoder-decoder Transformer:
//                    • source / target token embeddings
//                    • learned positional embeddings
//                    • encoder self-attention blocks
//                    • decoder causal self-attention + cross-attention
//                    • ReLU feed-forward, post-norm residuals
//                    • output projection + log-softmax
//   init.rs        — Xavier-uniform parameter initialisation
//   greedy.rs      — greedy decoding
//   beam.rs        — beam search decoding
//   inferencer.rs  — encode + decoder dispatch for one sentence
//   trainer.rs     — training / validation loops, epoch driver
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Attention masks shared by training and decoding
pub mod mask;

/// Transformer encoder-decoder architecture
pub mod model;

/// Xavier-uniform initialisation as a ModuleMapper
pub mod init;

/// Greedy decoder
pub mod greedy;

/// Beam search decoder
pub mod beam;

/// Inference engine
pub mod inferencer;

/// Training loop with validation and checkpointing
pub mod trainer;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The decoders and the inference engine are written against
// these traits, never against Burn or the tokenizers crate.
//
//   SequenceModel → implemented by Seq2SeqTransformer<B>
//                   (and by scripted stubs in tests)
//   TextCodec     → implemented by tokenizers::Tokenizer

use anyhow::Result;

use crate::domain::{log_probs::LogProbs, mask::Mask};

// ─── SequenceModel ────────────────────────────────────────────────────────────
/// An encoder-decoder that maps token ids to per-position
/// log-probabilities over the target vocabulary.
///
/// Every id slice passed in has exactly `max_seq_len` entries.
/// Calls are synchronous: the result is complete when returned.
pub trait SequenceModel {
    /// Encoder output kept alive for the whole decode.
    type Memory;

    fn encode(&self, src_ids: &[u32], src_mask: &Mask) -> Result<Self::Memory>;

    /// One decoder pass over the full target buffer.
    fn decode_step(
        &self,
        trg_ids:  &[u32],
        memory:   &Self::Memory,
        src_mask: &Mask,
        trg_mask: &Mask,
    ) -> Result<LogProbs>;
}

// ─── TextCodec ────────────────────────────────────────────────────────────────
/// Text ↔ token id conversion for one language.
pub trait TextCodec {
    fn encode_ids(&self, text: &str) -> Result<Vec<u32>>;

    /// Special tokens are dropped from the output text.
    fn decode_text(&self, ids: &[u32]) -> Result<String>;
}

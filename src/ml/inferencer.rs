// ============================================================
// Layer 5 — Inferencer
// ============================================================
// One sentence in, one translation out:
//
//   text → src ids → pad/truncate to L → encoder mask
//        → encode → greedy | beam → trg ids → text
//
// Generic over SequenceModel, so the burn model and the
// scripted test models go through the same path.

use anyhow::Result;

use crate::domain::{
    sequence::{pad_or_truncate, DecodeMethod, SpecialTokens},
    traits::{SequenceModel, TextCodec},
};
use crate::ml::{beam::BeamDecoder, greedy::GreedyDecoder, mask::MaskBuilder};

pub struct Inferencer<M: SequenceModel> {
    model:     M,
    masks:     MaskBuilder,
    tokens:    SpecialTokens,
    beam_size: usize,
}

impl<M: SequenceModel> Inferencer<M> {
    pub fn new(model: M, max_seq_len: usize, tokens: SpecialTokens, beam_size: usize) -> Self {
        Self {
            model,
            masks: MaskBuilder::new(max_seq_len, tokens.pad),
            tokens,
            beam_size,
        }
    }

    /// Target ids for already tokenised source ids.
    pub fn translate_ids(&self, src_ids: &[u32], method: DecodeMethod) -> Result<Vec<u32>> {
        let src_input = pad_or_truncate(src_ids, self.masks.max_seq_len(), self.tokens.pad);
        let src_mask  = self.masks.encoder_mask(&src_input);
        let memory    = self.model.encode(&src_input, &src_mask)?;

        let output = match method {
            DecodeMethod::Greedy => GreedyDecoder::new(&self.model, &self.masks, self.tokens)
                .decode(&memory, &src_mask)?,
            DecodeMethod::Beam => BeamDecoder::new(&self.model, &self.masks, self.tokens, self.beam_size)
                .decode(&memory, &src_mask)?,
        };
        tracing::debug!("{:?} decode produced {} ids", method, output.len());
        Ok(output)
    }

    pub fn translate(
        &self,
        sentence: &str,
        src:      &impl TextCodec,
        trg:      &impl TextCodec,
        method:   DecodeMethod,
    ) -> Result<String> {
        let src_ids = src.encode_ids(sentence)?;
        let trg_ids = self.translate_ids(&src_ids, method)?;
        trg.decode_text(&trg_ids)
    }
}

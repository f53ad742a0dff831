// ============================================================
// Layer 5 — Beam Search Decoder
// ============================================================
// Keeps `beam_size` partial translations and grows them one
// position at a time.
//
// Per position:
//   for each hypothesis, lowest key first:
//     finished   → copied into the next beam as-is (one slot)
//     unfinished → one decode pass, top-`beam_size` candidates,
//                  one child per candidate; an eos child is
//                  length-normalised and marked finished
//   next beam = children sorted by key, duplicates removed,
//               first `beam_size` kept
//   stop early once every kept hypothesis is finished
//
// Positions run over 0..L-1, so a hypothesis never holds more
// than L tokens (sos included).

use anyhow::{anyhow, Result};

use crate::domain::{
    hypothesis::BeamHypothesis,
    sequence::{pad_or_truncate, SpecialTokens},
    traits::SequenceModel,
};
use crate::ml::mask::{Mask, MaskBuilder};

/// Result of one beam search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Lowest-key hypothesis of the final beam
    pub best:      BeamHypothesis,
    /// Positions actually expanded; fewer than L-1 after an early stop
    pub positions: usize,
}

pub struct BeamDecoder<'a, M: SequenceModel> {
    model:     &'a M,
    masks:     &'a MaskBuilder,
    tokens:    SpecialTokens,
    beam_size: usize,
}

impl<'a, M: SequenceModel> BeamDecoder<'a, M> {
    pub fn new(model: &'a M, masks: &'a MaskBuilder, tokens: SpecialTokens, beam_size: usize) -> Self {
        Self { model, masks, tokens, beam_size: beam_size.max(1) }
    }

    /// Best hypothesis after the search, with its final score.
    pub fn search(&self, memory: &M::Memory, src_mask: &Mask) -> Result<SearchOutcome> {
        let len = self.masks.max_seq_len();
        let mut beam = vec![BeamHypothesis::start(self.tokens.sos); self.beam_size];
        let mut positions = 0;

        for pos in 0..len.saturating_sub(1) {
            let mut candidates = Vec::with_capacity(self.beam_size * self.beam_size);

            for hyp in &beam {
                if hyp.finished {
                    candidates.push(hyp.clone());
                    continue;
                }

                let trg_ids   = pad_or_truncate(&hyp.tokens, len, self.tokens.pad);
                let trg_mask  = self.masks.decoder_mask(&trg_ids);
                let log_probs = self.model.decode_step(&trg_ids, memory, src_mask, &trg_mask)?;

                for (id, log_prob) in log_probs.top_k(pos, self.beam_size) {
                    let child = hyp.extend(id, log_prob);
                    candidates.push(if id == self.tokens.eos { child.finish() } else { child });
                }
            }

            beam = prune(candidates, self.beam_size);
            positions += 1;
            let finished = beam.iter().filter(|h| h.finished).count();
            tracing::debug!(
                "beam pos {}: {} kept, {} finished, best score {:.4}",
                pos, beam.len(), finished, beam[0].score
            );

            if finished == beam.len() {
                break;
            }
        }

        let best = beam
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("beam search ended with an empty beam"))?;
        Ok(SearchOutcome { best, positions })
    }

    /// Output ids without the leading sos and the trailing eos.
    pub fn decode(&self, memory: &M::Memory, src_mask: &Mask) -> Result<Vec<u32>> {
        let mut ids = self.search(memory, src_mask)?.best.tokens;
        if ids.last() == Some(&self.tokens.eos) {
            ids.pop();
        }
        Ok(ids.split_off(1))
    }
}

/// Lowest keys first, identical token sequences kept once.
fn prune(mut candidates: Vec<BeamHypothesis>, beam_size: usize) -> Vec<BeamHypothesis> {
    candidates.sort();
    candidates.dedup_by(|a, b| a.tokens == b.tokens);
    candidates.truncate(beam_size);
    candidates
}

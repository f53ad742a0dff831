// ============================================================
// Layer 5 — Greedy Decoder
// ============================================================
// One token per step, always the single most probable one.
//
//   buffer = [sos, pad, pad, ..., pad]        (length L)
//   step i: decode the whole buffer, read argmax at position i,
//           write it at i+1 (if there is room), stop on eos
//
// At most L decode passes, at most L-1 returned ids.

use anyhow::Result;

use crate::domain::{sequence::SpecialTokens, traits::SequenceModel};
use crate::ml::mask::{Mask, MaskBuilder};

pub struct GreedyDecoder<'a, M: SequenceModel> {
    model:  &'a M,
    masks:  &'a MaskBuilder,
    tokens: SpecialTokens,
}

impl<'a, M: SequenceModel> GreedyDecoder<'a, M> {
    pub fn new(model: &'a M, masks: &'a MaskBuilder, tokens: SpecialTokens) -> Self {
        Self { model, masks, tokens }
    }

    /// Output ids after sos, including the eos if one was emitted.
    pub fn decode(&self, memory: &M::Memory, src_mask: &Mask) -> Result<Vec<u32>> {
        let len = self.masks.max_seq_len();
        let mut buffer = vec![self.tokens.pad; len];
        buffer[0] = self.tokens.sos;
        let mut cur_len = 1usize;

        for i in 0..len {
            let trg_mask  = self.masks.decoder_mask(&buffer);
            let log_probs = self.model.decode_step(&buffer, memory, src_mask, &trg_mask)?;
            let next_id   = log_probs.argmax(i);

            if i < len - 1 {
                buffer[i + 1] = next_id;
                cur_len += 1;
            }

            tracing::debug!("greedy step {}: emitted {}", i, next_id);

            if next_id == self.tokens.eos {
                break;
            }
        }

        let decoded = if buffer[len - 1] == self.tokens.pad {
            buffer[1..cur_len].to_vec()
        } else {
            buffer[1..].to_vec()
        };
        Ok(decoded)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::testing::{a_then_eos, ScriptedModel};

    fn run(model: &ScriptedModel, len: usize) -> Vec<u32> {
        let masks    = MaskBuilder::new(len, 0);
        let src      = vec![3u32; len];
        let src_mask = masks.encoder_mask(&src);
        let memory   = model.encode(&src, &src_mask).unwrap();
        GreedyDecoder::new(model, &masks, SpecialTokens::default())
            .decode(&memory, &src_mask)
            .unwrap()
    }

    #[test]
    fn test_a_then_eos_scenario() {
        let model = a_then_eos();
        assert_eq!(run(&model, 5), vec![3, 2]);
        assert_eq!(model.decode_calls(), 2);
    }

    #[test]
    fn test_never_emitting_eos_returns_l_minus_one_tokens() {
        let model = ScriptedModel::new(5, |_| vec![(4, -0.1)]);
        let out   = run(&model, 5);
        assert_eq!(out, vec![4, 4, 4, 4]);
        assert_eq!(model.decode_calls(), 5);
    }

    #[test]
    fn test_eos_on_last_writable_step_fills_buffer() {
        // a, a, a, eos → the eos lands in the final slot
        let model = ScriptedModel::new(5, |prefix| {
            if prefix.len() < 4 { vec![(3, -0.1)] } else { vec![(2, -0.1)] }
        });
        assert_eq!(run(&model, 5), vec![3, 3, 3, 2]);
    }

    #[test]
    fn test_is_deterministic() {
        let model = ScriptedModel::new(5, |prefix| {
            let last = *prefix.last().unwrap();
            vec![(3 + (last % 2), -0.3), (2, -0.9)]
        });
        let first = run(&model, 6);
        for _ in 0..3 {
            assert_eq!(run(&model, 6), first);
        }
        assert!(first.len() <= 5);
    }
}

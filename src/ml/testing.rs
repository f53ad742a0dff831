// Test doubles for the SequenceModel seam.

use anyhow::Result;
use std::cell::Cell;

use crate::domain::{
    log_probs::LogProbs,
    sequence::SpecialTokens,
    traits::{SequenceModel, TextCodec},
};
use crate::domain::mask::Mask;

/// Log-probability assigned to tokens a rule does not mention.
pub const UNLIKELY: f32 = -20.0;

type Rule = Box<dyn Fn(&[u32]) -> Vec<(u32, f32)>>;

/// Decoder stub whose next-token distribution at position `i`
/// depends only on the visible prefix `trg_ids[..=i]`.
pub struct ScriptedModel {
    vocab_size:   usize,
    rule:         Rule,
    decode_calls: Cell<usize>,
}

impl ScriptedModel {
    /// `rule(prefix)` lists (id, log-prob) pairs; every other id gets `UNLIKELY`.
    pub fn new(vocab_size: usize, rule: impl Fn(&[u32]) -> Vec<(u32, f32)> + 'static) -> Self {
        Self { vocab_size, rule: Box::new(rule), decode_calls: Cell::new(0) }
    }

    pub fn decode_calls(&self) -> usize {
        self.decode_calls.get()
    }
}

impl SequenceModel for ScriptedModel {
    type Memory = ();

    fn encode(&self, _src_ids: &[u32], _src_mask: &Mask) -> Result<()> {
        Ok(())
    }

    fn decode_step(
        &self,
        trg_ids:   &[u32],
        _memory:   &(),
        _src_mask: &Mask,
        _trg_mask: &Mask,
    ) -> Result<LogProbs> {
        self.decode_calls.set(self.decode_calls.get() + 1);
        let positions = trg_ids.len();
        let mut values = vec![UNLIKELY; positions * self.vocab_size];
        for pos in 0..positions {
            for (id, lp) in (self.rule)(&trg_ids[..=pos]) {
                values[pos * self.vocab_size + id as usize] = lp;
            }
        }
        LogProbs::new(values, positions, self.vocab_size)
    }
}

// Scenario vocabulary: pad=0, sos=1, eos=2, "a"=3, "b"=4
pub const VOCAB: [&str; 5] = ["<pad>", "<s>", "</s>", "a", "b"];

/// Predicts "a" right after sos, then eos.
pub fn a_then_eos() -> ScriptedModel {
    ScriptedModel::new(VOCAB.len(), |prefix| {
        if prefix.len() == 1 {
            vec![(3, -0.05)]
        } else {
            vec![(2, -0.05)]
        }
    })
}

/// Space-split codec over a fixed word list; id = index,
/// unknown words map to unk, control ids are dropped on decode.
pub struct WordCodec {
    words:  Vec<&'static str>,
    tokens: SpecialTokens,
}

impl WordCodec {
    pub fn new(words: &[&'static str]) -> Self {
        Self { words: words.to_vec(), tokens: SpecialTokens::default() }
    }
}

impl TextCodec for WordCodec {
    fn encode_ids(&self, text: &str) -> Result<Vec<u32>> {
        Ok(text
            .split_whitespace()
            .map(|w| self.words.iter().position(|v| *v == w).map_or(self.tokens.unk, |i| i as u32))
            .collect())
    }

    fn decode_text(&self, ids: &[u32]) -> Result<String> {
        Ok(ids
            .iter()
            .filter(|&&id| !self.tokens.is_control(id))
            .map(|&id| self.words[id as usize])
            .collect::<Vec<_>>()
            .join(" "))
    }
}

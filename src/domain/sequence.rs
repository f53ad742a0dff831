// ============================================================
// Layer 3 — Token Sequences
// ============================================================
// Every sequence the model sees has exactly `max_seq_len`
// positions. Content shorter than that is right-padded with
// the pad id, longer content is cut.
//
// Target side (teacher forcing):
//   trg_input  = [sos] ids...        (what the decoder reads)
//   trg_output = ids... [eos]        (what it must predict)
//
// Example with L=6, ids=[7, 8]:
//   trg_input  = [1, 7, 8, 0, 0, 0]
//   trg_output = [7, 8, 2, 0, 0, 0]

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::TranslatorError;

/// Reserved ids shared by both vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokens {
    pub pad: u32,
    pub sos: u32,
    pub eos: u32,
    pub unk: u32,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self { pad: 0, sos: 1, eos: 2, unk: 3 }
    }
}

impl SpecialTokens {
    /// True for pad, sos and eos (the ids a decoder strips).
    pub fn is_control(&self, id: u32) -> bool {
        id == self.pad || id == self.sos || id == self.eos
    }
}

/// Right-pad with `pad` up to `max_len`, or truncate to `max_len`.
pub fn pad_or_truncate(ids: &[u32], max_len: usize, pad: u32) -> Vec<u32> {
    let mut out: Vec<u32> = ids.iter().copied().take(max_len).collect();
    out.resize(max_len, pad);
    out
}

/// Build the (decoder input, decoder target) pair for one target sentence.
pub fn shift_target(ids: &[u32], max_len: usize, tokens: &SpecialTokens) -> (Vec<u32>, Vec<u32>) {
    let mut input = Vec::with_capacity(ids.len() + 1);
    input.push(tokens.sos);
    input.extend_from_slice(ids);

    let mut output = Vec::with_capacity(ids.len() + 1);
    output.extend_from_slice(ids);
    output.push(tokens.eos);

    (
        pad_or_truncate(&input, max_len, tokens.pad),
        pad_or_truncate(&output, max_len, tokens.pad),
    )
}

// ─── Decoding Method ─────────────────────────────────────────────────────────
/// Search strategy selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMethod {
    Greedy,
    Beam,
}

impl FromStr for DecodeMethod {
    type Err = TranslatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greedy" => Ok(Self::Greedy),
            "beam"   => Ok(Self::Beam),
            other    => Err(TranslatorError::InvalidDecodeMethod(other.to_string())),
        }
    }
}

// ============================================================
// Layer 3 — Log-Probability Table
// ============================================================
// One decode pass produces a distribution over the target
// vocabulary for every position: a [positions, vocab] table
// stored row-major. Decoders only ever look at one row.
//
// Ordering rule shared by argmax and top_k:
//   higher log-probability first, ties → lower token id.
// With that rule argmax(pos) == top_k(pos, 1)[0], which is
// what makes beam search with a width of 1 match greedy.

use anyhow::{bail, Result};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct LogProbs {
    positions:  usize,
    vocab_size: usize,
    values:     Vec<f32>,
}

impl LogProbs {
    pub fn new(values: Vec<f32>, positions: usize, vocab_size: usize) -> Result<Self> {
        if values.len() != positions * vocab_size {
            bail!(
                "log-prob table has {} values, expected {} positions x {} vocab",
                values.len(), positions, vocab_size
            );
        }
        Ok(Self { positions, vocab_size, values })
    }

    pub fn positions(&self) -> usize { self.positions }

    pub fn vocab_size(&self) -> usize { self.vocab_size }

    /// Distribution at one position.
    ///
    /// # Panics
    /// Panics if `pos >= positions`.
    pub fn row(&self, pos: usize) -> &[f32] {
        assert!(pos < self.positions, "position {pos} out of range ({})", self.positions);
        let start = pos * self.vocab_size;
        &self.values[start..start + self.vocab_size]
    }

    /// Most probable token id at `pos`.
    pub fn argmax(&self, pos: usize) -> u32 {
        self.row(pos)
            .iter()
            .enumerate()
            .fold((0usize, f32::NEG_INFINITY), |best, (id, &lp)| {
                if lp > best.1 { (id, lp) } else { best }
            })
            .0 as u32
    }

    /// The `k` most probable (id, log-prob) pairs at `pos`, best first.
    pub fn top_k(&self, pos: usize, k: usize) -> Vec<(u32, f32)> {
        let mut ranked: Vec<(u32, f32)> = self.row(pos)
            .iter()
            .enumerate()
            .map(|(id, &lp)| (id as u32, lp))
            .collect();
        ranked.sort_by(|a, b| match b.1.total_cmp(&a.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            other           => other,
        });
        ranked.truncate(k);
        ranked
    }
}

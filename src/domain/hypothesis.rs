// ============================================================
// Layer 3 — Beam Hypothesis
// ============================================================
// A partial translation kept by beam search.
//
// `score` holds the NEGATED cumulative log-probability, so a
// smaller score means a more probable hypothesis and the beam
// behaves like a min-priority queue: the lowest key is read
// first.
//
// Hypotheses are values. Expanding one never touches it; it
// returns a fresh hypothesis with a longer token list. Once
// finished (eos emitted) the score has been divided by the
// token count and the hypothesis is only ever copied.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct BeamHypothesis {
    /// Last emitted token id
    pub last_token: u32,

    /// Negated log-probability sum (length-normalised once finished)
    pub score: f32,

    /// Every id decoded so far, starting with sos
    pub tokens: Vec<u32>,

    pub finished: bool,
}

impl BeamHypothesis {
    /// The decode-step-0 hypothesis: just sos, score 0.
    pub fn start(sos: u32) -> Self {
        Self { last_token: sos, score: 0.0, tokens: vec![sos], finished: false }
    }

    /// Child hypothesis that appends `id` emitted with `log_prob`.
    pub fn extend(&self, id: u32, log_prob: f32) -> Self {
        let mut tokens = Vec::with_capacity(self.tokens.len() + 1);
        tokens.extend_from_slice(&self.tokens);
        tokens.push(id);
        Self {
            last_token: id,
            score:      self.score - log_prob,
            tokens,
            finished:   false,
        }
    }

    /// Close the hypothesis: divide the score by its token count.
    pub fn finish(mut self) -> Self {
        self.score /= self.tokens.len() as f32;
        self.finished = true;
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}

// Ordering is by priority key only, with the token list as a
// deterministic tie-break. PartialEq stays structural.
impl Eq for BeamHypothesis {}

impl PartialOrd for BeamHypothesis {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BeamHypothesis {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.tokens.cmp(&other.tokens))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;
    use std::cmp::Reverse;

    #[test]
    fn test_extend_accumulates_negated_log_prob() {
        let root  = BeamHypothesis::start(1);
        let child = root.extend(5, -0.5).extend(6, -0.25);
        assert_eq!(child.tokens, vec![1, 5, 6]);
        assert_eq!(child.last_token, 6);
        assert!((child.score - 0.75).abs() < 1e-6);
        // parent is untouched
        assert_eq!(root.tokens, vec![1]);
        assert_eq!(root.score, 0.0);
    }

    #[test]
    fn test_finish_normalises_once_by_length() {
        let h = BeamHypothesis::start(1).extend(5, -0.6).extend(2, -0.3).finish();
        assert!(h.finished);
        assert!((h.score - 0.9 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_min_heap_pops_most_probable() {
        let root = BeamHypothesis::start(1);
        let mut heap = BinaryHeap::new();
        heap.push(Reverse(root.extend(3, -2.0)));
        heap.push(Reverse(root.extend(4, -0.1)));
        heap.push(Reverse(root.extend(5, -1.0)));
        assert_eq!(heap.pop().unwrap().0.last_token, 4);
    }
}

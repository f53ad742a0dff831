// ============================================================
// Layer 3 — Attention Mask Grid
// ============================================================
// A [batch, rows, cols] grid of ATTENDABLE cells, row-major.
// Encoder masks have one row per sequence; decoder masks are
// square. Built by ml::mask::MaskBuilder.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    batch:      usize,
    rows:       usize,
    cols:       usize,
    attendable: Vec<bool>,
}

impl Mask {
    pub fn new(batch: usize, rows: usize, cols: usize, attendable: Vec<bool>) -> Self {
        debug_assert_eq!(attendable.len(), batch * rows * cols);
        Self { batch, rows, cols, attendable }
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.batch, self.rows, self.cols]
    }

    pub fn cells(&self) -> &[bool] {
        &self.attendable
    }

    pub fn is_attendable(&self, b: usize, i: usize, j: usize) -> bool {
        self.attendable[(b * self.rows + i) * self.cols + j]
    }

    pub fn attendable_count(&self) -> usize {
        self.attendable.iter().filter(|&&a| a).count()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexing_is_row_major() {
        let mask = Mask::new(2, 1, 3, vec![true, false, false, false, true, true]);
        assert_eq!(mask.shape(), [2, 1, 3]);
        assert!(mask.is_attendable(0, 0, 0));
        assert!(!mask.is_attendable(0, 0, 2));
        assert!(mask.is_attendable(1, 0, 1));
        assert_eq!(mask.attendable_count(), 3);
    }
}

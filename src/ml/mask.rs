// ============================================================
// Layer 5 — Attention Masks
// ============================================================
// Builds the masks shared by training and decoding.
//
//   encoder mask  [B, 1, L]   j attendable ⇔ src[j] != pad
//   decoder mask  [B, L, L]   (i, j) attendable ⇔ j <= i
//                                               ∧ trg[j] != pad
//
// The causal half of the decoder mask is the same L×L
// lower-triangular grid for every call, so the builder
// computes it once.
//
// A Mask stores ATTENDABLE cells. Burn's attention marks the
// opposite (true = blocked), so MaskTensorExt inverts.

use burn::prelude::*;

pub use crate::domain::mask::Mask;

// ─── Burn conversions ─────────────────────────────────────────────────────────
/// Turns a domain mask into the boolean tensors burn attention takes.
pub trait MaskTensorExt {
    /// [B, rows, cols] tensor with `true` on blocked cells (burn `mask_attn`).
    fn to_blocked_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 3, Bool>;

    /// [B, cols] key-padding tensor with `true` on pad keys (burn `mask_pad`).
    ///
    /// Only meaningful for single-row (encoder) masks.
    fn to_padding_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2, Bool>;
}

impl MaskTensorExt for Mask {
    fn to_blocked_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 3, Bool> {
        let blocked: Vec<bool> = self.cells().iter().map(|&a| !a).collect();
        Tensor::from_data(TensorData::new(blocked, self.shape()), device)
    }

    fn to_padding_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2, Bool> {
        let [batch, rows, cols] = self.shape();
        debug_assert_eq!(rows, 1, "padding tensors come from encoder masks");
        self.to_blocked_tensor::<B>(device).reshape([batch, cols])
    }
}

// ─── MaskBuilder ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct MaskBuilder {
    max_seq_len: usize,
    pad_id:      u32,
    /// Row-major L×L lower-triangular-inclusive grid
    causal:      Vec<bool>,
}

impl MaskBuilder {
    pub fn new(max_seq_len: usize, pad_id: u32) -> Self {
        let causal = (0..max_seq_len)
            .flat_map(|i| (0..max_seq_len).map(move |j| j <= i))
            .collect();
        Self { max_seq_len, pad_id, causal }
    }

    pub fn max_seq_len(&self) -> usize { self.max_seq_len }

    pub fn encoder_mask(&self, ids: &[u32]) -> Mask {
        self.encoder_mask_batch(&[ids])
    }

    pub fn encoder_mask_batch<S: AsRef<[u32]>>(&self, rows: &[S]) -> Mask {
        let l = self.max_seq_len;
        let mut attendable = Vec::with_capacity(rows.len() * l);
        for ids in rows {
            let ids = ids.as_ref();
            debug_assert_eq!(ids.len(), l, "sequences must be padded to max_seq_len");
            attendable.extend(ids.iter().map(|&id| id != self.pad_id));
        }
        Mask::new(rows.len(), 1, l, attendable)
    }

    pub fn decoder_mask(&self, ids: &[u32]) -> Mask {
        self.decoder_mask_batch(&[ids])
    }

    /// Padding mask of each row AND the shared causal grid.
    pub fn decoder_mask_batch<S: AsRef<[u32]>>(&self, rows: &[S]) -> Mask {
        let l = self.max_seq_len;
        let mut attendable = Vec::with_capacity(rows.len() * l * l);
        for ids in rows {
            let ids = ids.as_ref();
            debug_assert_eq!(ids.len(), l, "sequences must be padded to max_seq_len");
            for i in 0..l {
                let causal_row = &self.causal[i * l..(i + 1) * l];
                attendable.extend(
                    causal_row.iter().zip(ids).map(|(&c, &id)| c && id != self.pad_id),
                );
            }
        }
        Mask::new(rows.len(), l, l, attendable)
    }
}

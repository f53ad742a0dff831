// ============================================================
// Layer 4 — Translation Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec of
// TranslationSamples into tensors, masks included.
//
//   Input:  N samples, every field of length L
//   Output: TranslationBatch
//     src_input, trg_input, trg_output   [N, L]   Int
//     src_pad                            [N, L]   Bool, true on pad keys
//     trg_attn                           [N, L, L] Bool, true where blocked
//
// Masks are built here, with the same MaskBuilder the decoders
// use, so training and inference share one mask protocol.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TranslationSample;
use crate::ml::mask::{MaskBuilder, MaskTensorExt};

/// [rows, L] Int tensor from equal-length id rows.
pub fn ids_tensor<B: Backend, S: AsRef<[u32]>>(rows: &[S], device: &B::Device) -> Tensor<B, 2, Int> {
    let seq_len = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
    // Burn Int tensors are built from i64 here; u32 ids always fit.
    let flat: Vec<i64> = rows
        .iter()
        .flat_map(|r| r.as_ref().iter().map(|&x| x as i64))
        .collect();
    Tensor::from_data(TensorData::new(flat, [rows.len(), seq_len]), device)
}

// ─── TranslationBatch ─────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TranslationBatch<B: Backend> {
    pub src_input:  Tensor<B, 2, Int>,
    pub trg_input:  Tensor<B, 2, Int>,
    pub trg_output: Tensor<B, 2, Int>,
    pub src_pad:    Tensor<B, 2, Bool>,
    pub trg_attn:   Tensor<B, 3, Bool>,
}

// ─── TranslationBatcher ───────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct TranslationBatcher<B: Backend> {
    pub device: B::Device,
    masks:      MaskBuilder,
}

impl<B: Backend> TranslationBatcher<B> {
    pub fn new(device: B::Device, masks: MaskBuilder) -> Self {
        Self { device, masks }
    }
}

impl<B: Backend> Batcher<B, TranslationSample, TranslationBatch<B>> for TranslationBatcher<B> {
    fn batch(&self, items: Vec<TranslationSample>, _device: &B::Device) -> TranslationBatch<B> {
        let src: Vec<&[u32]> = items.iter().map(|s| s.src_input.as_slice()).collect();
        let trg: Vec<&[u32]> = items.iter().map(|s| s.trg_input.as_slice()).collect();
        let out: Vec<&[u32]> = items.iter().map(|s| s.trg_output.as_slice()).collect();

        TranslationBatch {
            src_input:  ids_tensor(&src, &self.device),
            trg_input:  ids_tensor(&trg, &self.device),
            trg_output: ids_tensor(&out, &self.device),
            src_pad:    self.masks.encoder_mask_batch(&src).to_padding_tensor(&self.device),
            trg_attn:   self.masks.decoder_mask_batch(&trg).to_blocked_tensor(&self.device),
        }
    }
}

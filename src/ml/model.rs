use anyhow::{anyhow, Result};
use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation,
};

use crate::data::batcher::ids_tensor;
use crate::domain::{log_probs::LogProbs, traits::SequenceModel};
use crate::ml::mask::{Mask, MaskTensorExt};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    pub src_vocab_size: usize,
    pub trg_vocab_size: usize,
    pub max_seq_len:    usize,
    pub d_model:        usize,
    pub num_heads:      usize,
    pub num_layers:     usize,
    pub d_ff:           usize,
    pub dropout:        f64,
}

impl Seq2SeqConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2SeqTransformer<B> {
        let src_embedding      = EmbeddingConfig::new(self.src_vocab_size, self.d_model).init(device);
        let trg_embedding      = EmbeddingConfig::new(self.trg_vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let encoder_layers = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let decoder_layers = (0..self.num_layers)
            .map(|_| self.build_decoder_block(device))
            .collect();
        let output_linear = LinearConfig::new(self.d_model, self.trg_vocab_size).init(device);
        let dropout       = DropoutConfig::new(self.dropout).init();
        Seq2SeqTransformer {
            src_embedding, trg_embedding, position_embedding,
            encoder_layers, decoder_layers, output_linear, dropout,
            max_seq_len: self.max_seq_len,
        }
    }

    fn attention<B: Backend>(&self, device: &B::Device) -> MultiHeadAttention<B> {
        MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device)
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        EncoderBlock {
            self_attn:   self.attention(device),
            ffn_linear1: LinearConfig::new(self.d_model, self.d_ff).init(device),
            ffn_linear2: LinearConfig::new(self.d_ff, self.d_model).init(device),
            norm1:       LayerNormConfig::new(self.d_model).init(device),
            norm2:       LayerNormConfig::new(self.d_model).init(device),
            dropout:     DropoutConfig::new(self.dropout).init(),
        }
    }

    fn build_decoder_block<B: Backend>(&self, device: &B::Device) -> DecoderBlock<B> {
        DecoderBlock {
            self_attn:   self.attention(device),
            cross_attn:  self.attention(device),
            ffn_linear1: LinearConfig::new(self.d_model, self.d_ff).init(device),
            ffn_linear2: LinearConfig::new(self.d_ff, self.d_model).init(device),
            norm1:       LayerNormConfig::new(self.d_model).init(device),
            norm2:       LayerNormConfig::new(self.d_model).init(device),
            norm3:       LayerNormConfig::new(self.d_model).init(device),
            dropout:     DropoutConfig::new(self.dropout).init(),
        }
    }
}

// ─── Encoder Block ────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// src_pad: [batch, seq_len], true on pad keys
    pub fn forward(&self, x: Tensor<B, 3>, src_pad: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_output = self.self_attn
            .forward(MhaInput::self_attn(x.clone()).mask_pad(src_pad))
            .context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            activation::relu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

// ─── Decoder Block ────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub cross_attn:  MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub norm3:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> DecoderBlock<B> {
    /// trg_attn: [batch, seq_len, seq_len], true where attention is blocked
    pub fn forward(
        &self,
        x:        Tensor<B, 3>,
        memory:   Tensor<B, 3>,
        src_pad:  Tensor<B, 2, Bool>,
        trg_attn: Tensor<B, 3, Bool>,
    ) -> Tensor<B, 3> {
        let self_ctx = self.self_attn
            .forward(MhaInput::self_attn(x.clone()).mask_attn(trg_attn))
            .context;
        let x = self.norm1.forward(x + self.dropout.forward(self_ctx));

        let cross_ctx = self.cross_attn
            .forward(MhaInput::new(x.clone(), memory.clone(), memory).mask_pad(src_pad))
            .context;
        let x = self.norm2.forward(x + self.dropout.forward(cross_ctx));

        let ffn_out = self.ffn_linear2.forward(
            activation::relu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm3.forward(x + self.dropout.forward(ffn_out))
    }
}

// ─── Encoder-Decoder ──────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Seq2SeqTransformer<B: Backend> {
    pub src_embedding:      Embedding<B>,
    pub trg_embedding:      Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub encoder_layers:     Vec<EncoderBlock<B>>,
    pub decoder_layers:     Vec<DecoderBlock<B>>,
    pub output_linear:      Linear<B>,
    pub dropout:            Dropout,
    pub max_seq_len:        usize,
}

impl<B: Backend> Seq2SeqTransformer<B> {
    pub fn device(&self) -> B::Device {
        self.output_linear.weight.val().device()
    }

    fn embed(&self, ids: Tensor<B, 2, Int>, table: &Embedding<B>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = ids.dims();
        let tok_emb = table.forward(ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        self.dropout.forward(tok_emb + pos_emb)
    }

    /// src: [batch, seq_len] → memory: [batch, seq_len, d_model]
    pub fn forward_encoder(&self, src: Tensor<B, 2, Int>, src_pad: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let mut x = self.embed(src, &self.src_embedding);
        for layer in &self.encoder_layers {
            x = layer.forward(x, src_pad.clone());
        }
        x
    }

    /// trg: [batch, seq_len] → log-probs: [batch, seq_len, trg_vocab]
    pub fn forward_decoder(
        &self,
        trg:      Tensor<B, 2, Int>,
        memory:   Tensor<B, 3>,
        src_pad:  Tensor<B, 2, Bool>,
        trg_attn: Tensor<B, 3, Bool>,
    ) -> Tensor<B, 3> {
        let mut x = self.embed(trg, &self.trg_embedding);
        for layer in &self.decoder_layers {
            x = layer.forward(x, memory.clone(), src_pad.clone(), trg_attn.clone());
        }
        activation::log_softmax(self.output_linear.forward(x), 2)
    }

    pub fn forward(
        &self,
        src:      Tensor<B, 2, Int>,
        trg:      Tensor<B, 2, Int>,
        src_pad:  Tensor<B, 2, Bool>,
        trg_attn: Tensor<B, 3, Bool>,
    ) -> Tensor<B, 3> {
        let memory = self.forward_encoder(src, src_pad.clone());
        self.forward_decoder(trg, memory, src_pad, trg_attn)
    }

    /// Teacher-forced forward pass and its mean NLL loss.
    pub fn forward_loss(
        &self,
        src:          Tensor<B, 2, Int>,
        trg_input:    Tensor<B, 2, Int>,
        trg_output:   Tensor<B, 2, Int>,
        src_pad:      Tensor<B, 2, Bool>,
        trg_attn:     Tensor<B, 3, Bool>,
        ignore_index: Option<u32>,
    ) -> Tensor<B, 1> {
        let log_probs = self.forward(src, trg_input, src_pad, trg_attn);
        nll_loss(log_probs, trg_output, ignore_index)
    }
}

/// Mean negative log-likelihood of `targets` under `log_probs`.
///
/// Targets equal to `ignore_index` are left out of both the sum
/// and the count.
pub fn nll_loss<B: Backend>(
    log_probs:    Tensor<B, 3>,
    targets:      Tensor<B, 2, Int>,
    ignore_index: Option<u32>,
) -> Tensor<B, 1> {
    let [batch_size, seq_len, vocab] = log_probs.dims();
    let n = batch_size * seq_len;

    let targets = targets.reshape([n, 1]);
    let picked  = log_probs
        .reshape([n, vocab])
        .gather(1, targets.clone())
        .reshape([n]);

    match ignore_index {
        None => picked.mean().neg(),
        Some(ignored) => {
            let keep  = targets.reshape([n]).equal_elem(ignored as i64).bool_not().float();
            let count = keep.clone().sum().clamp_min(1.0);
            (picked * keep).sum().neg() / count
        }
    }
}

// ─── SequenceModel seam ───────────────────────────────────────────────────────
// Single-sentence inference: every call is a batch of one.
impl<B: Backend> SequenceModel for Seq2SeqTransformer<B> {
    type Memory = Tensor<B, 3>;

    fn encode(&self, src_ids: &[u32], src_mask: &Mask) -> Result<Self::Memory> {
        let device = self.device();
        let src    = ids_tensor::<B, _>(&[src_ids], &device);
        Ok(self.forward_encoder(src, src_mask.to_padding_tensor(&device)))
    }

    fn decode_step(
        &self,
        trg_ids:  &[u32],
        memory:   &Self::Memory,
        src_mask: &Mask,
        trg_mask: &Mask,
    ) -> Result<LogProbs> {
        let device    = self.device();
        let trg       = ids_tensor::<B, _>(&[trg_ids], &device);
        let log_probs = self.forward_decoder(
            trg,
            memory.clone(),
            src_mask.to_padding_tensor(&device),
            trg_mask.to_blocked_tensor(&device),
        );

        let [_, positions, vocab] = log_probs.dims();
        let values = log_probs
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("cannot read decoder output: {e:?}"))?;
        LogProbs::new(values, positions, vocab)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::mask::MaskBuilder;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tiny_config() -> Seq2SeqConfig {
        Seq2SeqConfig::new(7, 5, 6, 16, 2, 1, 32, 0.0)
    }

    #[test]
    fn test_decode_step_returns_normalised_rows() {
        let device = Default::default();
        let model: Seq2SeqTransformer<TestBackend> = tiny_config().init(&device);
        let masks  = MaskBuilder::new(6, 0);

        let src      = [4u32, 5, 6, 0, 0, 0];
        let src_mask = masks.encoder_mask(&src);
        let memory   = model.encode(&src, &src_mask).unwrap();
        assert_eq!(memory.dims(), [1, 6, 16]);

        let trg       = [1u32, 3, 0, 0, 0, 0];
        let log_probs = model
            .decode_step(&trg, &memory, &src_mask, &masks.decoder_mask(&trg))
            .unwrap();
        assert_eq!(log_probs.positions(), 6);
        assert_eq!(log_probs.vocab_size(), 5);

        for pos in 0..6 {
            let total: f32 = log_probs.row(pos).iter().map(|lp| lp.exp()).sum();
            assert!((total - 1.0).abs() < 1e-4, "row {pos} sums to {total}");
        }
    }

    #[test]
    fn test_all_pad_source_does_not_crash() {
        let device = Default::default();
        let model: Seq2SeqTransformer<TestBackend> = tiny_config().init(&device);
        let masks  = MaskBuilder::new(6, 0);

        let src      = [0u32; 6];
        let src_mask = masks.encoder_mask(&src);
        let memory   = model.encode(&src, &src_mask).unwrap();
        let trg      = [0u32; 6];
        let out      = model.decode_step(&trg, &memory, &src_mask, &masks.decoder_mask(&trg));
        assert!(out.is_ok());
    }

    #[test]
    fn test_nll_loss_ignores_index() {
        let device = Default::default();
        // one sentence, two positions, vocab of three
        let log_probs = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(vec![
                -0.5f32, -1.0, -2.0,
                -3.0,    -0.1, -4.0,
            ], [1, 2, 3]),
            &device,
        );
        let targets = Tensor::<TestBackend, 2, Int>::from_data(
            TensorData::new(vec![0i64, 1], [1, 2]),
            &device,
        );

        let all: f32 = nll_loss(log_probs.clone(), targets.clone(), None)
            .into_scalar().elem::<f32>();
        assert!((all - 0.3).abs() < 1e-5);

        // target 1 ignored → only the -0.5 term remains
        let kept: f32 = nll_loss(log_probs, targets, Some(1))
            .into_scalar().elem::<f32>();
        assert!((kept - 0.5).abs() < 1e-5);
    }
}

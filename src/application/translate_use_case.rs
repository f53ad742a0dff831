// ============================================================
// Layer 2 — TranslateUseCase
// ============================================================
// Translates one sentence with a saved checkpoint:
//
//   Step 1: Check the checkpoint exists        (fail fast)
//   Step 2: Read its TrainConfig               (Layer 6 - infra)
//   Step 3: Load both tokenizers               (Layer 6 - infra)
//   Step 4: Rebuild the model, load weights    (Layer 5 - ml)
//   Step 5: Encode + decode                    (Layer 5 - ml)

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu},
    prelude::*,
};
use tokenizers::Tokenizer;

use crate::application::train_use_case::{ComputeDevice, TrainConfig};
use crate::domain::sequence::DecodeMethod;
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::{ensure_fits, TokenizerStore},
};
use crate::ml::{
    inferencer::Inferencer,
    model::{Seq2SeqConfig, Seq2SeqTransformer},
};

#[derive(Debug, Clone)]
pub struct TranslateRequest {
    pub checkpoint_dir: String,
    pub model_name:     String,
    pub input:          String,
    pub method:         DecodeMethod,
    /// Overrides the tokenizer dir stored in the checkpoint config
    pub tokenizer_dir:  Option<String>,
    /// Overrides the beam size stored in the checkpoint config
    pub beam_size:      Option<usize>,
    pub device:         ComputeDevice,
}

pub struct TranslateUseCase {
    request: TranslateRequest,
}

impl TranslateUseCase {
    pub fn new(request: TranslateRequest) -> Self {
        Self { request }
    }

    pub fn execute(&self) -> Result<String> {
        let req  = &self.request;
        let ckpt = CheckpointManager::new(&req.checkpoint_dir);

        // ── Step 1 + 2: Checkpoint config ─────────────────────────────────────
        ckpt.require(&req.model_name)?;
        let cfg = ckpt.load_config(&req.model_name)?;

        // ── Step 3: Tokenizers ────────────────────────────────────────────────
        let tok_dir = req.tokenizer_dir.as_deref().unwrap_or(&cfg.tokenizer_dir);
        let store   = TokenizerStore::new(tok_dir);
        let src_tok = store.load_or_build(&cfg.src_prefix, &cfg.special_tokens)?;
        let trg_tok = store.load_or_build(&cfg.trg_prefix, &cfg.special_tokens)?;
        ensure_fits(&src_tok, &cfg.src_prefix, cfg.src_vocab_size)?;
        ensure_fits(&trg_tok, &cfg.trg_prefix, cfg.trg_vocab_size)?;

        // ── Step 4 + 5: Model on the chosen backend ───────────────────────────
        match req.device {
            ComputeDevice::Cpu => {
                self.translate_with::<NdArray>(&cfg, &ckpt, &src_tok, &trg_tok, NdArrayDevice::default())
            }
            ComputeDevice::Wgpu => {
                self.translate_with::<Wgpu>(&cfg, &ckpt, &src_tok, &trg_tok, WgpuDevice::default())
            }
        }
    }

    fn translate_with<B: Backend>(
        &self,
        cfg:     &TrainConfig,
        ckpt:    &CheckpointManager,
        src_tok: &Tokenizer,
        trg_tok: &Tokenizer,
        device:  B::Device,
    ) -> Result<String> {
        let req = &self.request;

        let model_cfg = Seq2SeqConfig { dropout: 0.0, ..cfg.model_config() };
        let model: Seq2SeqTransformer<B> = model_cfg.init(&device);
        let model = ckpt.load_model(&req.model_name, model, &device)?;

        let beam_size  = req.beam_size.unwrap_or(cfg.beam_size);
        let inferencer = Inferencer::new(model, cfg.max_seq_len, cfg.special_tokens, beam_size);
        let output     = inferencer.translate(&req.input, src_tok, trg_tok, req.method)?;

        tracing::info!("Translated with {:?} decoding", req.method);
        Ok(output)
    }
}

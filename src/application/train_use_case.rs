// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the configuration
//   Step 2: Read vocabularies, size the model       (Layer 6 - infra)
//   Step 3: Load or build both tokenizers           (Layer 6 - infra)
//   Step 4: Tokenise train / valid splits           (Layer 4 - data)
//   Step 5: Pick the backend for the device         (this layer)
//   Step 6: Run the training loop                   (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use burn::backend::{
    ndarray::NdArrayDevice,
    wgpu::WgpuDevice,
    Autodiff, NdArray, Wgpu,
};
use serde::{Deserialize, Serialize};

use crate::data::{corpus::ParallelCorpus, dataset::TranslationDataset};
use crate::domain::sequence::SpecialTokens;
use crate::error::TranslatorError;
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::{ensure_fits, TokenizerStore},
};
use crate::ml::{model::Seq2SeqConfig, trainer::run_training};

pub const TRAIN_SPLIT: &str = "train";
pub const VALID_SPLIT: &str = "valid";

// ─── Compute Device ──────────────────────────────────────────────────────────
/// Where tensors live. Cpu → NdArray, Wgpu → the default GPU adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeDevice {
    #[default]
    Cpu,
    Wgpu,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Saved next to every checkpoint so inference can rebuild the
// same model and find the same tokenizers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub data_dir:       String,
    pub tokenizer_dir:  String,
    pub src_prefix:     String,
    pub trg_prefix:     String,
    pub checkpoint_dir: String,
    pub max_seq_len:    usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub d_model:        usize,
    pub num_heads:      usize,
    pub num_layers:     usize,
    pub d_ff:           usize,
    pub dropout:        f64,
    pub beam_size:      usize,
    /// Filled from the vocabulary files at training time
    pub src_vocab_size: usize,
    pub trg_vocab_size: usize,
    pub special_tokens: SpecialTokens,
    /// Target id left out of the loss; None scores every position
    pub ignore_index:   Option<u32>,
    pub seed:           u64,
    pub device:         ComputeDevice,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:       "data".to_string(),
            tokenizer_dir:  "data/sp".to_string(),
            src_prefix:     "src_sp".to_string(),
            trg_prefix:     "trg_sp".to_string(),
            checkpoint_dir: "saved_model".to_string(),
            max_seq_len:    200,
            batch_size:     80,
            epochs:         10,
            lr:             1e-4,
            d_model:        512,
            num_heads:      8,
            num_layers:     6,
            d_ff:           2048,
            dropout:        0.1,
            beam_size:      8,
            src_vocab_size: 0,
            trg_vocab_size: 0,
            special_tokens: SpecialTokens::default(),
            ignore_index:   None,
            seed:           42,
            device:         ComputeDevice::Cpu,
        }
    }
}

impl TrainConfig {
    pub fn model_config(&self) -> Seq2SeqConfig {
        Seq2SeqConfig::new(
            self.src_vocab_size, self.trg_vocab_size, self.max_seq_len,
            self.d_model, self.num_heads, self.num_layers, self.d_ff, self.dropout,
        )
    }

    pub fn validate(&self) -> Result<(), TranslatorError> {
        let fail = |msg: String| Err(TranslatorError::InvalidConfig(msg));
        if self.max_seq_len < 2 {
            return fail(format!("max_seq_len must be at least 2, got {}", self.max_seq_len));
        }
        if self.num_heads == 0 || self.d_model % self.num_heads != 0 {
            return fail(format!(
                "d_model ({}) must be divisible by num_heads ({})",
                self.d_model, self.num_heads
            ));
        }
        if self.batch_size == 0 {
            return fail("batch_size must be positive".to_string());
        }
        if self.beam_size == 0 {
            return fail("beam_size must be positive".to_string());
        }
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
    /// Checkpoint name to continue from
    resume: Option<String>,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig, resume: Option<String>) -> Self {
        Self { config, resume }
    }

    /// Returns the best validation loss reached.
    pub fn execute(&self) -> Result<f64> {
        // ── Step 1: Validate ──────────────────────────────────────────────────
        let mut cfg = self.config.clone();
        cfg.validate()?;

        // Fail fast on a bad resume name, before any data is read.
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);
        if let Some(name) = &self.resume {
            ckpt.require(name)?;
        }

        // ── Step 2: Vocabularies ──────────────────────────────────────────────
        let store     = TokenizerStore::new(&cfg.tokenizer_dir);
        let src_vocab = store.load_vocabulary(&cfg.src_prefix)?;
        let trg_vocab = store.load_vocabulary(&cfg.trg_prefix)?;
        if src_vocab.is_empty() || trg_vocab.is_empty() {
            return Err(TranslatorError::InvalidConfig("empty vocabulary".to_string()).into());
        }
        cfg.src_vocab_size = src_vocab.len();
        cfg.trg_vocab_size = trg_vocab.len();
        tracing::info!(
            "The size of src vocab is {} and that of trg vocab is {}",
            cfg.src_vocab_size, cfg.trg_vocab_size
        );

        // ── Step 3: Tokenizers ────────────────────────────────────────────────
        let src_tok = store.load_or_build(&cfg.src_prefix, &cfg.special_tokens)?;
        let trg_tok = store.load_or_build(&cfg.trg_prefix, &cfg.special_tokens)?;
        ensure_fits(&src_tok, &cfg.src_prefix, cfg.src_vocab_size)?;
        ensure_fits(&trg_tok, &cfg.trg_prefix, cfg.trg_vocab_size)?;

        // ── Step 4: Datasets ──────────────────────────────────────────────────
        let corpus = ParallelCorpus::new(&cfg.data_dir);
        let train  = corpus.load_split(TRAIN_SPLIT, &src_tok, &trg_tok, cfg.max_seq_len, &cfg.special_tokens)?;
        let valid  = corpus.load_split(VALID_SPLIT, &src_tok, &trg_tok, cfg.max_seq_len, &cfg.special_tokens)?;
        let train  = TranslationDataset::new(train);
        let valid  = TranslationDataset::new(valid);

        // ── Step 5 + 6: Backend + training loop ───────────────────────────────
        let resume = self.resume.as_deref();
        tracing::info!("Training on {:?}", cfg.device);
        match cfg.device {
            ComputeDevice::Cpu => run_training::<Autodiff<NdArray>>(
                &cfg, train, valid, ckpt, resume, NdArrayDevice::default(),
            ),
            ComputeDevice::Wgpu => run_training::<Autodiff<Wgpu>>(
                &cfg, train, valid, ckpt, resume, WgpuDevice::default(),
            ),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.max_seq_len, 200);
        assert_eq!(cfg.beam_size, 8);
        assert_eq!(cfg.checkpoint_dir, "saved_model");
        assert_eq!(cfg.ignore_index, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_heads() {
        let cfg = TrainConfig { d_model: 10, num_heads: 4, ..TrainConfig::default() };
        assert!(matches!(cfg.validate(), Err(TranslatorError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let cfg: TrainConfig = serde_json::from_str(r#"{"d_model": 64, "device": "wgpu"}"#).unwrap();
        assert_eq!(cfg.d_model, 64);
        assert_eq!(cfg.device, ComputeDevice::Wgpu);
        assert_eq!(cfg.num_layers, 6);
    }

    #[test]
    fn test_end_to_end_on_tiny_corpus() {
        let dir  = tempfile::tempdir().unwrap();
        let root = dir.path();
        let vocab = "<pad>\t0\n<s>\t0\n</s>\t0\n<unk>\t0\nhello\t0\nworld\t0\n";
        fs::create_dir_all(root.join("sp")).unwrap();
        fs::write(root.join("sp/src_sp.vocab"), vocab).unwrap();
        fs::write(root.join("sp/trg_sp.vocab"), vocab).unwrap();
        for side in ["src", "trg"] {
            fs::create_dir_all(root.join(side)).unwrap();
            fs::write(root.join(side).join("train.txt"), "hello world\nworld\n").unwrap();
            fs::write(root.join(side).join("valid.txt"), "hello\n").unwrap();
        }

        let cfg = TrainConfig {
            data_dir:       root.display().to_string(),
            tokenizer_dir:  root.join("sp").display().to_string(),
            checkpoint_dir: root.join("ckpt").display().to_string(),
            max_seq_len: 5, batch_size: 2, epochs: 1,
            d_model: 8, num_heads: 2, num_layers: 1, d_ff: 16, dropout: 0.0,
            ..TrainConfig::default()
        };

        let best = TrainUseCase::new(cfg, None).execute().unwrap();
        assert!(best.is_finite());

        let saved = CheckpointManager::new(root.join("ckpt"))
            .load_config(crate::infra::checkpoint::BEST)
            .unwrap();
        assert_eq!(saved.src_vocab_size, 6);
        assert_eq!(saved.trg_vocab_size, 6);
    }

    #[test]
    fn test_reused_tokenizer_must_fit_the_vocabulary() {
        let dir  = tempfile::tempdir().unwrap();
        let root = dir.path();
        let sp   = root.join("sp");
        fs::create_dir_all(&sp).unwrap();
        let small = "<pad>\t0\n<s>\t0\n</s>\t0\n<unk>\t0\nhello\t0\n";
        fs::write(sp.join("src_sp.vocab"), small).unwrap();
        fs::write(sp.join("trg_sp.vocab"), small).unwrap();

        // src_sp.json left over from a larger vocabulary
        let store = TokenizerStore::new(&sp);
        let large = crate::data::vocab::Vocabulary::parse(
            "<pad>\t0\n<s>\t0\n</s>\t0\n<unk>\t0\nhello\t0\nworld\t0\nagain\t0\n",
        );
        store.build_and_save("src_sp", &large, &SpecialTokens::default()).unwrap();

        let cfg = TrainConfig {
            data_dir:       root.display().to_string(),
            tokenizer_dir:  sp.display().to_string(),
            checkpoint_dir: root.join("ckpt").display().to_string(),
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg, None).execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TranslatorError>(),
            Some(TranslatorError::InvalidConfig(msg)) if msg.contains("src_sp")
        ));
        assert!(!root.join("ckpt").exists());
    }

    #[test]
    fn test_unknown_resume_name_fails_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            checkpoint_dir: dir.path().display().to_string(),
            // nothing exists here; only the checkpoint check may fail
            tokenizer_dir:  "/nonexistent".to_string(),
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg, Some("missing".to_string())).execute().unwrap_err();
        assert!(err.downcast_ref::<TranslatorError>().is_some());
    }
}

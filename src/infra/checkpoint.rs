// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Named checkpoints under one directory. Training only ever
// writes the `best_ckpt` slot, and only when validation loss
// strictly improves on the best seen so far.
//
//   saved_model/
//     best_ckpt/
//       model.mpk.gz    ← model record
//       optim.mpk.gz    ← Adam moments
//       state.json      ← { best_loss, epoch }
//       config.json     ← TrainConfig used to build the model
//
// Records use NamedMpkGzFileRecorder at full precision so a
// reload restores the exact f32 values that were saved.
// Writes are not transactional: a crash mid-save can leave a
// slot with mixed files.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    module::AutodiffModule,
    optim::Optimizer,
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::application::train_use_case::TrainConfig;
use crate::error::TranslatorError;
use crate::ml::model::Seq2SeqTransformer;

/// The slot training saves to.
pub const BEST: &str = "best_ckpt";

type CkptRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckpointState {
    pub best_loss: f64,
    pub epoch:     usize,
}

pub struct CheckpointManager {
    dir:       PathBuf,
    best_loss: f64,
}

impl CheckpointManager {
    /// The directory is created on the first save, not here.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), best_loss: f64::MAX }
    }

    pub fn dir(&self) -> &Path { &self.dir }

    pub fn best_loss(&self) -> f64 { self.best_loss }

    pub fn slot(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn is_improvement(&self, val_loss: f64) -> bool {
        val_loss < self.best_loss
    }

    /// Path of an existing checkpoint, or `CheckpointNotFound`.
    pub fn require(&self, name: &str) -> Result<PathBuf> {
        let slot = self.slot(name);
        if !slot.is_dir() {
            return Err(TranslatorError::CheckpointNotFound {
                name: name.to_string(),
                dir:  self.dir.clone(),
            }.into());
        }
        Ok(slot)
    }

    pub fn load_config(&self, name: &str) -> Result<TrainConfig> {
        let path = self.require(name)?.join("config.json");
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn load_state(&self, name: &str) -> Result<CheckpointState> {
        let path = self.require(name)?.join("state.json");
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read checkpoint state from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Restore model weights only (inference).
    pub fn load_model<B: Backend>(
        &self,
        name:   &str,
        model:  Seq2SeqTransformer<B>,
        device: &B::Device,
    ) -> Result<Seq2SeqTransformer<B>> {
        let path = self.require(name)?.join("model");
        let record = CkptRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load model record '{}'", path.display()))?;
        tracing::info!("Loaded model weights from '{}'", self.slot(name).display());
        Ok(model.load_record(record))
    }

    /// Restore model, optimizer state and best loss (resumed training).
    ///
    /// Fails with `CheckpointNotFound` before anything is read.
    pub fn load_training<B, O>(
        &mut self,
        name:   &str,
        model:  Seq2SeqTransformer<B>,
        optim:  O,
        device: &B::Device,
    ) -> Result<(Seq2SeqTransformer<B>, O, CheckpointState)>
    where
        B: AutodiffBackend,
        O: Optimizer<Seq2SeqTransformer<B>, B>,
        Seq2SeqTransformer<B>: AutodiffModule<B>,
    {
        let slot  = self.require(name)?;
        let model = self.load_model(name, model, device)?;

        let optim_path = slot.join("optim");
        let optim_record: O::Record = CkptRecorder::new()
            .load(optim_path.clone(), device)
            .with_context(|| format!("Cannot load optimizer record '{}'", optim_path.display()))?;
        let optim = optim.load_record(optim_record);

        let state = self.load_state(name)?;
        self.best_loss = state.best_loss;
        tracing::info!(
            "Resumed '{}' at epoch {} (best loss {:.4})",
            name, state.epoch, state.best_loss
        );
        Ok((model, optim, state))
    }

    /// Save to `best_ckpt` iff `val_loss < best_loss`. Returns whether it saved.
    pub fn save_if_improved<B, O>(
        &mut self,
        val_loss: f64,
        epoch:    usize,
        cfg:      &TrainConfig,
        model:    &Seq2SeqTransformer<B>,
        optim:    &O,
    ) -> Result<bool>
    where
        B: AutodiffBackend,
        O: Optimizer<Seq2SeqTransformer<B>, B>,
        Seq2SeqTransformer<B>: AutodiffModule<B>,
    {
        if !self.is_improvement(val_loss) {
            return Ok(false);
        }

        let slot = self.slot(BEST);
        fs::create_dir_all(&slot)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", slot.display()))?;

        let recorder = CkptRecorder::new();
        recorder
            .record(model.clone().into_record(), slot.join("model"))
            .with_context(|| format!("Failed to save model to '{}'", slot.display()))?;
        recorder
            .record(optim.to_record(), slot.join("optim"))
            .with_context(|| format!("Failed to save optimizer to '{}'", slot.display()))?;

        self.best_loss = val_loss;
        let state = CheckpointState { best_loss: val_loss, epoch };
        fs::write(slot.join("state.json"), serde_json::to_string_pretty(&state)?)
            .with_context(|| "Failed to write state.json")?;
        fs::write(slot.join("config.json"), serde_json::to_string_pretty(cfg)?)
            .with_context(|| "Failed to write config.json")?;

        tracing::debug!("Saved '{}' at epoch {} (loss {:.4})", BEST, epoch, val_loss);
        Ok(true)
    }
}

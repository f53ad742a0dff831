// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop using Burn's DataLoader and Adam.
//
//   TrainingLoop     one pass over the training loader:
//                    forward → NLL → backward → Adam step
//   ValidationLoop   same forward pass on the inner backend,
//                    no gradients, no update
//   run_training     epoch driver: init or resume, train,
//                    validate, checkpoint on improvement
//
// Key Burn insight:
//   - Training uses B (Autodiff<..>) for gradients
//   - model.valid() returns the model on B::InnerBackend
//   - the validation batcher must also use B::InnerBackend
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{TranslationBatch, TranslationBatcher},
    dataset::TranslationDataset,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{format_elapsed, EpochMetrics, MetricsLogger},
};
use crate::ml::{init::XavierUniform, mask::MaskBuilder, model::Seq2SeqTransformer};

#[derive(Debug, Clone, Copy)]
pub struct EpochSummary {
    /// Mean batch loss; NaN when the loader was empty
    pub mean_loss: f64,
    pub batches:   usize,
    pub elapsed:   Duration,
}

fn mean(sum: f64, n: usize) -> f64 {
    if n > 0 { sum / n as f64 } else { f64::NAN }
}

// ─── TrainingLoop ─────────────────────────────────────────────────────────────
pub struct TrainingLoop<B: AutodiffBackend> {
    loader:       Arc<dyn DataLoader<B, TranslationBatch<B>>>,
    num_batches:  usize,
    lr:           f64,
    ignore_index: Option<u32>,
}

impl<B: AutodiffBackend> TrainingLoop<B> {
    pub fn new(
        dataset:      TranslationDataset,
        batcher:      TranslationBatcher<B>,
        batch_size:   usize,
        seed:         u64,
        lr:           f64,
        ignore_index: Option<u32>,
    ) -> Self {
        let num_batches = dataset.sample_count().div_ceil(batch_size);
        let loader = DataLoaderBuilder::new(batcher)
            .batch_size(batch_size)
            .shuffle(seed)
            .num_workers(1)
            .build(dataset);
        Self { loader, num_batches, lr, ignore_index }
    }

    pub fn run_epoch<O>(
        &self,
        epoch:     usize,
        mut model: Seq2SeqTransformer<B>,
        optim:     &mut O,
    ) -> (Seq2SeqTransformer<B>, EpochSummary)
    where
        O: Optimizer<Seq2SeqTransformer<B>, B>,
        Seq2SeqTransformer<B>: AutodiffModule<B>,
    {
        let start    = Instant::now();
        let interval = (self.num_batches / 4).max(1);
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in self.loader.iter() {
            let loss = model.forward_loss(
                batch.src_input,
                batch.trg_input,
                batch.trg_output,
                batch.src_pad,
                batch.trg_attn,
                self.ignore_index,
            );

            loss_sum += loss.clone().into_scalar().elem::<f64>();
            batches  += 1;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(self.lr, model, grads);

            if batches % interval == 0 || batches == self.num_batches {
                tracing::info!(
                    "Epoch {}: {:.0}% done - avg loss so far {:.4}, elapsed {}",
                    epoch,
                    100.0 * batches as f64 / self.num_batches.max(1) as f64,
                    loss_sum / batches as f64,
                    format_elapsed(start.elapsed()),
                );
            }
        }

        let summary = EpochSummary { mean_loss: mean(loss_sum, batches), batches, elapsed: start.elapsed() };
        (model, summary)
    }
}

// ─── ValidationLoop ───────────────────────────────────────────────────────────
pub struct ValidationLoop<B: Backend> {
    loader:       Arc<dyn DataLoader<B, TranslationBatch<B>>>,
    ignore_index: Option<u32>,
}

impl<B: Backend> ValidationLoop<B> {
    pub fn new(
        dataset:      TranslationDataset,
        batcher:      TranslationBatcher<B>,
        batch_size:   usize,
        ignore_index: Option<u32>,
    ) -> Self {
        let loader = DataLoaderBuilder::new(batcher)
            .batch_size(batch_size)
            .num_workers(1)
            .build(dataset);
        Self { loader, ignore_index }
    }

    /// `model` should come from `valid()` so dropout is off.
    pub fn run_validation(&self, model: &Seq2SeqTransformer<B>) -> EpochSummary {
        let start = Instant::now();
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in self.loader.iter() {
            let loss = model.forward_loss(
                batch.src_input,
                batch.trg_input,
                batch.trg_output,
                batch.src_pad,
                batch.trg_attn,
                self.ignore_index,
            );
            loss_sum += loss.into_scalar().elem::<f64>();
            batches  += 1;
        }

        EpochSummary { mean_loss: mean(loss_sum, batches), batches, elapsed: start.elapsed() }
    }
}

// ─── Epoch Driver ─────────────────────────────────────────────────────────────
/// Runs `cfg.epochs` epochs and returns the best validation loss.
///
/// With `resume`, model, optimizer and best loss come from that
/// checkpoint and epoch numbering continues after it. Otherwise the
/// model starts from Xavier-uniform weights.
pub fn run_training<B: AutodiffBackend>(
    cfg:          &TrainConfig,
    train_data:   TranslationDataset,
    valid_data:   TranslationDataset,
    mut ckpt:     CheckpointManager,
    resume:       Option<&str>,
    device:       B::Device,
) -> Result<f64> {
    B::seed(&device, cfg.seed);

    // ── Build model + Adam ────────────────────────────────────────────────────
    let model: Seq2SeqTransformer<B> = cfg.model_config().init(&device);
    let optim = AdamConfig::new()
        .with_epsilon(1e-8)
        .init::<B, Seq2SeqTransformer<B>>();

    let (mut model, mut optim, first_epoch) = match resume {
        Some(name) => {
            let (model, optim, state) = ckpt.load_training(name, model, optim, &device)?;
            (model, optim, state.epoch + 1)
        }
        None => {
            tracing::info!("Initializing the model (Xavier uniform)");
            (model.map(&mut XavierUniform::new()), optim, 1)
        }
    };
    tracing::info!(
        "Model ready: {} layers, d_model={}, vocab {} → {}",
        cfg.num_layers, cfg.d_model, cfg.src_vocab_size, cfg.trg_vocab_size
    );

    // ── Loaders ───────────────────────────────────────────────────────────────
    let masks = MaskBuilder::new(cfg.max_seq_len, cfg.special_tokens.pad);
    let training = TrainingLoop::new(
        train_data,
        TranslationBatcher::<B>::new(device.clone(), masks.clone()),
        cfg.batch_size, cfg.seed, cfg.lr, cfg.ignore_index,
    );
    let validation = ValidationLoop::new(
        valid_data,
        TranslationBatcher::<B::InnerBackend>::new(device.clone(), masks),
        cfg.batch_size, cfg.ignore_index,
    );
    let metrics = MetricsLogger::new(ckpt.dir())?;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let last_epoch = first_epoch + cfg.epochs - 1;
    for epoch in first_epoch..=last_epoch {
        let (trained, train) = training.run_epoch(epoch, model, &mut optim);
        model = trained;
        tracing::info!(
            "Epoch {}/{} | train loss {:.4} | {} batches in {}",
            epoch, last_epoch, train.mean_loss, train.batches, format_elapsed(train.elapsed)
        );

        let valid = validation.run_validation(&model.valid());
        let saved = ckpt.save_if_improved(valid.mean_loss, epoch, cfg, &model, &optim)?;
        if saved {
            tracing::info!("Current best checkpoint saved to '{}'", ckpt.dir().display());
        }
        tracing::info!(
            "Epoch {}/{} | valid loss {:.4} | best {:.4} | {}",
            epoch, last_epoch, valid.mean_loss, ckpt.best_loss(), format_elapsed(valid.elapsed)
        );

        metrics.log(&EpochMetrics {
            epoch,
            train_loss:       train.mean_loss,
            val_loss:         valid.mean_loss,
            best_loss:        ckpt.best_loss(),
            checkpoint_saved: saved,
        })?;
    }

    tracing::info!("Training finished");
    Ok(ckpt.best_loss())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::corpus::make_sample;
    use crate::data::dataset::TranslationSample;
    use crate::infra::checkpoint::BEST;
    use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};

    type TrainBackend = Autodiff<NdArray>;

    fn tiny_cfg() -> TrainConfig {
        TrainConfig {
            max_seq_len: 6, batch_size: 2, epochs: 2, lr: 1e-2,
            d_model: 16, num_heads: 2, num_layers: 1, d_ff: 32, dropout: 0.0,
            src_vocab_size: 8, trg_vocab_size: 8,
            ..TrainConfig::default()
        }
    }

    fn samples() -> Vec<TranslationSample> {
        let tokens = TrainConfig::default().special_tokens;
        vec![
            make_sample(&[4, 5], &[6], 6, &tokens),
            make_sample(&[5, 4], &[7], 6, &tokens),
            make_sample(&[4, 4, 5], &[6, 7], 6, &tokens),
        ]
    }

    #[test]
    fn test_epoch_visits_every_batch_and_learns() {
        let cfg    = tiny_cfg();
        let device = NdArrayDevice::default();
        let masks  = MaskBuilder::new(cfg.max_seq_len, 0);
        let training = TrainingLoop::new(
            TranslationDataset::new(samples()),
            TranslationBatcher::<TrainBackend>::new(device.clone(), masks),
            cfg.batch_size, cfg.seed, cfg.lr, None,
        );

        let mut model: Seq2SeqTransformer<TrainBackend> = cfg.model_config().init(&device);
        let mut optim = AdamConfig::new().init::<TrainBackend, Seq2SeqTransformer<TrainBackend>>();

        let (trained, first) = training.run_epoch(1, model, &mut optim);
        model = trained;
        assert_eq!(first.batches, 2);
        assert!(first.mean_loss.is_finite());

        let mut last = first;
        for epoch in 2..=40 {
            let (trained, summary) = training.run_epoch(epoch, model, &mut optim);
            model = trained;
            last  = summary;
        }
        assert!(last.mean_loss < first.mean_loss, "{} !< {}", last.mean_loss, first.mean_loss);
    }

    #[test]
    fn test_validation_matches_forward_loss() {
        let cfg    = tiny_cfg();
        let device = NdArrayDevice::default();
        let model: Seq2SeqTransformer<NdArray> = cfg.model_config().init(&device);
        let validation = ValidationLoop::new(
            TranslationDataset::new(samples()),
            TranslationBatcher::<NdArray>::new(device.clone(), MaskBuilder::new(cfg.max_seq_len, 0)),
            8, None,
        );

        let summary = validation.run_validation(&model);
        assert_eq!(summary.batches, 1);
        assert!(summary.mean_loss > 0.0);
        // no update happens, so a second pass gives the same loss
        let again = validation.run_validation(&model);
        assert!((summary.mean_loss - again.mean_loss).abs() < 1e-6);
    }

    #[test]
    fn test_run_training_writes_best_checkpoint_and_metrics() {
        let dir    = tempfile::tempdir().unwrap();
        let cfg    = tiny_cfg();
        let ckpt   = CheckpointManager::new(dir.path());
        let best   = run_training::<TrainBackend>(
            &cfg,
            TranslationDataset::new(samples()),
            TranslationDataset::new(samples()),
            ckpt,
            None,
            Default::default(),
        ).unwrap();

        assert!(best.is_finite());
        assert!(dir.path().join(BEST).join("model.mpk.gz").exists());
        assert!(dir.path().join(BEST).join("optim.mpk.gz").exists());
        let csv = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 1 + cfg.epochs);

        // resuming continues the epoch count from the saved state
        let state = CheckpointManager::new(dir.path()).load_state(BEST).unwrap();
        assert!(state.epoch >= 1);
        run_training::<TrainBackend>(
            &TrainConfig { epochs: 1, ..cfg.clone() },
            TranslationDataset::new(samples()),
            TranslationDataset::new(samples()),
            CheckpointManager::new(dir.path()),
            Some(BEST),
            Default::default(),
        ).unwrap();
        let csv = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        let last_row = csv.lines().last().unwrap().to_string();
        assert!(last_row.starts_with(&format!("{},", state.epoch + 1)));
    }
}

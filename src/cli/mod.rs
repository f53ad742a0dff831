// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, built on clap.
// All work is delegated to Layer 2 (application).
//
//   1. `train`     — trains the model on a parallel corpus
//   2. `translate` — loads a checkpoint and translates a sentence
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, TrainArgs, TranslateArgs};

use crate::application::{
    train_use_case::{TrainConfig, TrainUseCase},
    translate_use_case::{TranslateRequest, TranslateUseCase},
};
use crate::domain::sequence::DecodeMethod;

#[derive(Parser, Debug)]
#[command(
    name = "translator",
    version = "0.1.0",
    about = "Train a transformer encoder-decoder for translation, then translate with greedy or beam search."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)     => run_train(args),
            Commands::Translate(args) => run_translate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training on corpus in: {}", args.data_dir);

    let config   = TrainConfig::from(&args);
    let use_case = TrainUseCase::new(config, args.resume);
    let best     = use_case.execute()?;

    println!("Training finished. Best valid loss: {best:.4}");
    Ok(())
}

fn run_translate(args: TranslateArgs) -> Result<()> {
    // An unknown method is rejected before any checkpoint is touched.
    let method: DecodeMethod = args.decode.parse()?;

    let use_case = TranslateUseCase::new(TranslateRequest {
        checkpoint_dir: args.checkpoint_dir,
        model_name:     args.model,
        input:          args.input.clone(),
        method,
        tokenizer_dir:  args.tokenizer_dir,
        beam_size:      args.beam_size,
        device:         args.device.into(),
    });
    let output = use_case.execute()?;

    println!("Input: {}", args.input);
    println!("Result: {}", output);
    Ok(())
}

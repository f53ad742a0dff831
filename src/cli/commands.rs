// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `translate`, and
// all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::{ComputeDevice, TrainConfig};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the translation model on a parallel corpus
    Train(TrainArgs),

    /// Translate one sentence with a saved checkpoint
    Translate(TranslateArgs),
}

/// Compute device flag, mapped onto the application-layer ComputeDevice
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceArg {
    Cpu,
    Wgpu,
}

impl From<DeviceArg> for ComputeDevice {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Cpu  => ComputeDevice::Cpu,
            DeviceArg::Wgpu => ComputeDevice::Wgpu,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding src/<split>.txt and trg/<split>.txt
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Directory holding <prefix>.vocab and <prefix>.json tokenizer files
    #[arg(long, default_value = "data/sp")]
    pub tokenizer_dir: String,

    #[arg(long, default_value = "src_sp")]
    pub src_prefix: String,

    #[arg(long, default_value = "trg_sp")]
    pub trg_prefix: String,

    /// Where best_ckpt/ and metrics.csv are written
    #[arg(long, default_value = "saved_model")]
    pub checkpoint_dir: String,

    /// Every sequence is padded or cut to this many tokens
    #[arg(long, default_value_t = 200)]
    pub max_seq_len: usize,

    #[arg(long, default_value_t = 80)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Hidden dimension of the transformer
    #[arg(long, default_value_t = 512)]
    pub d_model: usize,

    /// d_model must be divisible by num_heads
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    /// Encoder layers, and the same number of decoder layers
    #[arg(long, default_value_t = 6)]
    pub num_layers: usize,

    #[arg(long, default_value_t = 2048)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Beam width stored with the checkpoint for `translate`
    #[arg(long, default_value_t = 8)]
    pub beam_size: usize,

    /// Target id excluded from the loss (e.g. 0 to skip padding)
    #[arg(long)]
    pub ignore_index: Option<u32>,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = DeviceArg::Cpu)]
    pub device: DeviceArg,

    /// Continue from this checkpoint (e.g. best_ckpt)
    #[arg(long)]
    pub resume: Option<String>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<&TrainArgs> for TrainConfig {
    fn from(a: &TrainArgs) -> Self {
        TrainConfig {
            data_dir:       a.data_dir.clone(),
            tokenizer_dir:  a.tokenizer_dir.clone(),
            src_prefix:     a.src_prefix.clone(),
            trg_prefix:     a.trg_prefix.clone(),
            checkpoint_dir: a.checkpoint_dir.clone(),
            max_seq_len:    a.max_seq_len,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            d_model:        a.d_model,
            num_heads:      a.num_heads,
            num_layers:     a.num_layers,
            d_ff:           a.d_ff,
            dropout:        a.dropout,
            beam_size:      a.beam_size,
            ignore_index:   a.ignore_index,
            seed:           a.seed,
            device:         a.device.into(),
            ..TrainConfig::default()
        }
    }
}

/// All arguments for the `translate` command
#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Checkpoint name under --checkpoint-dir
    #[arg(long)]
    pub model: String,

    /// The sentence to translate
    #[arg(long)]
    pub input: String,

    /// greedy or beam
    #[arg(long)]
    pub decode: String,

    #[arg(long, default_value = "saved_model")]
    pub checkpoint_dir: String,

    /// Overrides the tokenizer dir recorded in the checkpoint
    #[arg(long)]
    pub tokenizer_dir: Option<String>,

    /// Overrides the beam width recorded in the checkpoint
    #[arg(long)]
    pub beam_size: Option<usize>,

    #[arg(long, value_enum, default_value_t = DeviceArg::Cpu)]
    pub device: DeviceArg,
}

// ============================================================
// Typed Errors
// ============================================================
// Conditions callers need to tell apart. Everything else flows
// through anyhow with context attached at the I/O boundary.
// `anyhow::Error::downcast_ref::<TranslatorError>()` recovers
// these from an anyhow chain.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslatorError {
    /// No checkpoint with this name under the checkpoint directory.
    #[error("There is no checkpoint named '{name}' in '{}'.", dir.display())]
    CheckpointNotFound { name: String, dir: PathBuf },

    /// `--decode` was neither `greedy` nor `beam`.
    #[error("Invalid decoding method '{0}'. Choose 'greedy' or 'beam'.")]
    InvalidDecodeMethod(String),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

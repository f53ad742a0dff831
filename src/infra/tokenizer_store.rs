// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// One tokenizer per language, addressed by prefix:
//
//   <dir>/<prefix>.json    HuggingFace tokenizer (preferred)
//   <dir>/<prefix>.vocab   vocabulary, one token per line
//
// When only the vocabulary exists, a word-level tokenizer is
// built from it and saved as JSON next to it. Line index = id,
// so the ids match the embedding table sized from the same file.
//
// In tokenizers 0.15 the trainer API insists on ModelWrapper,
// so the JSON is written by hand and loaded back.

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Map, Value};
use std::{fs, path::PathBuf};
use tokenizers::Tokenizer;

use crate::data::vocab::Vocabulary;
use crate::domain::{sequence::SpecialTokens, traits::TextCodec};
use crate::error::TranslatorError;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn json_path(&self, prefix: &str) -> PathBuf {
        self.dir.join(format!("{prefix}.json"))
    }

    pub fn vocab_path(&self, prefix: &str) -> PathBuf {
        self.dir.join(format!("{prefix}.vocab"))
    }

    pub fn load_vocabulary(&self, prefix: &str) -> Result<Vocabulary> {
        Vocabulary::from_file(self.vocab_path(prefix))
    }

    /// Load `<prefix>.json`, or build it from `<prefix>.vocab`.
    pub fn load_or_build(&self, prefix: &str, tokens: &SpecialTokens) -> Result<Tokenizer> {
        if self.json_path(prefix).exists() {
            tracing::info!("Loading tokenizer '{}'", prefix);
            return self.load(prefix);
        }
        if !self.vocab_path(prefix).exists() {
            bail!(
                "No tokenizer for '{}': neither '{}' nor '{}' exists",
                prefix,
                self.json_path(prefix).display(),
                self.vocab_path(prefix).display(),
            );
        }
        let vocab = self.load_vocabulary(prefix)?;
        tracing::info!("Building word-level tokenizer '{}' from {} entries", prefix, vocab.len());
        self.build_and_save(prefix, &vocab, tokens)
    }

    pub fn load(&self, prefix: &str) -> Result<Tokenizer> {
        let path = self.json_path(prefix);
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))
    }

    pub fn build_and_save(
        &self,
        prefix: &str,
        vocab:  &Vocabulary,
        tokens: &SpecialTokens,
    ) -> Result<Tokenizer> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let path = self.json_path(prefix);
        fs::write(&path, serde_json::to_string_pretty(&tokenizer_json(vocab, tokens))?)
            .with_context(|| format!("Cannot write tokenizer JSON '{}'", path.display()))?;

        tracing::debug!("Tokenizer saved to '{}'", path.display());
        self.load(prefix)
    }
}

/// Every id the tokenizer can emit must index the embedding table.
///
/// A reused `<prefix>.json` is not checked against `<prefix>.vocab`
/// when it is loaded, so callers run this once the model size is known.
pub fn ensure_fits(tokenizer: &Tokenizer, prefix: &str, vocab_size: usize) -> Result<(), TranslatorError> {
    let ids = tokenizer.get_vocab(true).into_values().max().map_or(0, |max| max as usize + 1);
    if ids > vocab_size {
        return Err(TranslatorError::InvalidConfig(format!(
            "tokenizer '{prefix}' emits ids up to {} but the model vocabulary has {vocab_size} entries",
            ids - 1,
        )));
    }
    Ok(())
}

// ── Tokenizer JSON ────────────────────────────────────────────────────────────
// No normalizer and no decoder: decoding joins word tokens with
// single spaces, which is the inverse of the Whitespace split.
fn tokenizer_json(vocab: &Vocabulary, tokens: &SpecialTokens) -> Value {
    let mut entries = Map::new();
    for (id, token) in vocab.tokens().iter().enumerate() {
        // first occurrence wins
        if !entries.contains_key(token) {
            entries.insert(token.clone(), json!(id));
        }
    }

    let mut added_tokens = Vec::new();
    for id in [tokens.pad, tokens.sos, tokens.eos, tokens.unk] {
        if let Some(content) = vocab.token(id) {
            added_tokens.push(json!({
                "id": id, "content": content,
                "single_word": false, "lstrip": false, "rstrip": false,
                "normalized": false, "special": true
            }));
        }
    }

    let unk_token = vocab.token(tokens.unk).unwrap_or("<unk>");

    json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": added_tokens,
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": entries,
            "unk_token": unk_token
        }
    })
}

// ─── TextCodec ────────────────────────────────────────────────────────────────
impl TextCodec for Tokenizer {
    fn encode_ids(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .encode(text, false)
            .map_err(|e| TranslatorError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode_text(&self, ids: &[u32]) -> Result<String> {
        Ok(self
            .decode(ids, true)
            .map_err(|e| TranslatorError::Tokenizer(e.to_string()))?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const VOCAB: &str = "<pad>\t0\n<s>\t0\n</s>\t0\n<unk>\t0\nhello\t-1\nworld\t-2\n";

    fn store_with_vocab() -> (tempfile::TempDir, TokenizerStore) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("trg_sp.vocab"), VOCAB).unwrap();
        let store = TokenizerStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_build_from_vocab_round_trips() {
        let (_dir, store) = store_with_vocab();
        let tok = store.load_or_build("trg_sp", &SpecialTokens::default()).unwrap();

        let ids = tok.encode_ids("hello world").unwrap();
        assert_eq!(ids, vec![4, 5]);
        assert_eq!(tok.decode_text(&ids).unwrap(), "hello world");
    }

    #[test]
    fn test_unknown_word_maps_to_unk_and_specials_are_skipped() {
        let (_dir, store) = store_with_vocab();
        let tok = store.load_or_build("trg_sp", &SpecialTokens::default()).unwrap();

        assert_eq!(tok.encode_ids("hello there").unwrap(), vec![4, 3]);
        assert_eq!(tok.decode_text(&[1, 5, 2, 0]).unwrap(), "world");
    }

    #[test]
    fn test_json_is_saved_and_reused() {
        let (dir, store) = store_with_vocab();
        store.load_or_build("trg_sp", &SpecialTokens::default()).unwrap();
        assert!(store.json_path("trg_sp").exists());

        // vocabulary gone: the saved JSON alone must be enough
        fs::remove_file(dir.path().join("trg_sp.vocab")).unwrap();
        let tok = store.load_or_build("trg_sp", &SpecialTokens::default()).unwrap();
        assert_eq!(tok.encode_ids("world").unwrap(), vec![5]);
    }

    #[test]
    fn test_tokenizer_larger_than_model_vocab_is_rejected() {
        let (dir, store) = store_with_vocab();
        let tok = store.load_or_build("trg_sp", &SpecialTokens::default()).unwrap();
        assert!(ensure_fits(&tok, "trg_sp", 6).is_ok());
        assert!(ensure_fits(&tok, "trg_sp", 10).is_ok());

        // a stale JSON outlives a shrunken vocabulary file
        fs::write(dir.path().join("trg_sp.vocab"), "<pad>\t0\n<s>\t0\n</s>\t0\n<unk>\t0\n").unwrap();
        let stale = store.load_or_build("trg_sp", &SpecialTokens::default()).unwrap();
        let small = store.load_vocabulary("trg_sp").unwrap();
        assert!(matches!(
            ensure_fits(&stale, "trg_sp", small.len()),
            Err(TranslatorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_everything_is_an_error() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        assert!(store.load_or_build("src_sp", &SpecialTokens::default()).is_err());
    }
}

// ============================================================
// Layer 4 — Parallel Corpus
// ============================================================
// A split is two line-aligned text files:
//
//   <data_dir>/src/<split>.txt    one source sentence per line
//   <data_dir>/trg/<split>.txt    its translation, same line
//
// Each pair becomes one TranslationSample:
//   src_input  = pad(src ids)
//   trg_input  = pad([sos] ++ trg ids)
//   trg_output = pad(trg ids ++ [eos])
//
// Pairs where either side is blank are skipped.

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::dataset::TranslationSample;
use crate::domain::{
    sequence::{pad_or_truncate, shift_target, SpecialTokens},
    traits::TextCodec,
};

pub struct ParallelCorpus {
    data_dir: PathBuf,
}

impl ParallelCorpus {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn src_path(&self, split: &str) -> PathBuf {
        self.data_dir.join("src").join(format!("{split}.txt"))
    }

    pub fn trg_path(&self, split: &str) -> PathBuf {
        self.data_dir.join("trg").join(format!("{split}.txt"))
    }

    /// Sentence pairs of one split, in file order.
    pub fn read_pairs(&self, split: &str) -> Result<Vec<(String, String)>> {
        let src_lines = read_lines(&self.src_path(split))?;
        let trg_lines = read_lines(&self.trg_path(split))?;

        if src_lines.len() != trg_lines.len() {
            bail!(
                "Split '{}' is not aligned: {} source lines vs {} target lines",
                split, src_lines.len(), trg_lines.len()
            );
        }

        let total = src_lines.len();
        let pairs: Vec<(String, String)> = src_lines
            .into_iter()
            .zip(trg_lines)
            .filter(|(s, t)| !s.trim().is_empty() && !t.trim().is_empty())
            .collect();

        if pairs.len() < total {
            tracing::debug!("Split '{}': skipped {} blank pairs", split, total - pairs.len());
        }
        Ok(pairs)
    }

    /// Tokenise and pad one split.
    pub fn load_split(
        &self,
        split:       &str,
        src_codec:   &impl TextCodec,
        trg_codec:   &impl TextCodec,
        max_seq_len: usize,
        tokens:      &SpecialTokens,
    ) -> Result<Vec<TranslationSample>> {
        let pairs = self.read_pairs(split)?;

        let mut samples = Vec::with_capacity(pairs.len());
        for (src, trg) in &pairs {
            let src_ids = src_codec.encode_ids(src)?;
            let trg_ids = trg_codec.encode_ids(trg)?;
            samples.push(make_sample(&src_ids, &trg_ids, max_seq_len, tokens));
        }

        tracing::info!("Loaded {} '{}' pairs from '{}'", samples.len(), split, self.data_dir.display());
        Ok(samples)
    }
}

pub fn make_sample(
    src_ids:     &[u32],
    trg_ids:     &[u32],
    max_seq_len: usize,
    tokens:      &SpecialTokens,
) -> TranslationSample {
    let (trg_input, trg_output) = shift_target(trg_ids, max_seq_len, tokens);
    TranslationSample {
        src_input: pad_or_truncate(src_ids, max_seq_len, tokens.pad),
        trg_input,
        trg_output,
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read corpus file '{}'", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::testing::WordCodec;

    fn write_split(dir: &Path, split: &str, src: &str, trg: &str) {
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::create_dir_all(dir.join("trg")).unwrap();
        fs::write(dir.join("src").join(format!("{split}.txt")), src).unwrap();
        fs::write(dir.join("trg").join(format!("{split}.txt")), trg).unwrap();
    }

    #[test]
    fn test_make_sample_pads_every_field() {
        let s = make_sample(&[5, 6], &[7], 4, &SpecialTokens::default());
        assert_eq!(s.src_input,  vec![5, 6, 0, 0]);
        assert_eq!(s.trg_input,  vec![1, 7, 0, 0]);
        assert_eq!(s.trg_output, vec![7, 2, 0, 0]);
    }

    #[test]
    fn test_load_split_skips_blank_pairs() {
        let dir = tempfile::tempdir().unwrap();
        write_split(dir.path(), "train", "x y\n\nx\n", "a\nb\nb a\n");

        let codec  = WordCodec::new(&["<pad>", "<s>", "</s>", "<unk>", "x", "y", "a", "b"]);
        let corpus = ParallelCorpus::new(dir.path());
        let samples = corpus
            .load_split("train", &codec, &codec, 5, &SpecialTokens::default())
            .unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].src_input,  vec![4, 5, 0, 0, 0]);
        assert_eq!(samples[1].trg_output, vec![7, 6, 2, 0, 0]);
    }

    #[test]
    fn test_misaligned_split_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_split(dir.path(), "valid", "one\ntwo\n", "uno\n");
        let err = ParallelCorpus::new(dir.path()).read_pairs("valid").unwrap_err();
        assert!(err.to_string().contains("not aligned"));
    }
}

// ============================================================
// Layer 4 — Vocabulary Files
// ============================================================
// One token per line, tab separated; the first field is the
// surface form, the line index is the id:
//
//   <pad>\t0
//   <s>\t0
//   </s>\t0
//   <unk>\t0
//   ▁the\t-3.21
//
// Only the surface forms are kept. Their count sizes the
// embedding tables and the output projection.

use anyhow::{Context, Result};
use std::{fs, path::Path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<String>,
}

impl Vocabulary {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read vocabulary '{}'", path.display()))?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let tokens = text
            .lines()
            .map(|line| line.split('\t').next().unwrap_or_default().to_string())
            .collect();
        Self { tokens }
    }

    pub fn len(&self) -> usize { self.tokens.len() }

    pub fn is_empty(&self) -> bool { self.tokens.is_empty() }

    pub fn tokens(&self) -> &[String] { &self.tokens }

    pub fn token(&self, id: u32) -> Option<&str> {
        self.tokens.get(id as usize).map(String::as_str)
    }
}

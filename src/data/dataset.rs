use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One tokenised and padded sentence pair. Every field has
/// exactly `max_seq_len` ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationSample {
    pub src_input:  Vec<u32>,
    /// [sos] target...
    pub trg_input:  Vec<u32>,
    /// target... [eos]
    pub trg_output: Vec<u32>,
}

pub struct TranslationDataset {
    samples: Vec<TranslationSample>,
}

impl TranslationDataset {
    pub fn new(samples: Vec<TranslationSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<TranslationSample> for TranslationDataset {
    fn get(&self, index: usize) -> Option<TranslationSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

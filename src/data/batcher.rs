// ============================================================
// Layer 4 — Sentiment Batcher
// ============================================================
// Stacks a mini-batch of EncodedSamples into tensors for one
// optimizer step. Burn's DataLoader calls .batch() with each
// group of `batch_size` samples.
//
//   Input:  N samples, each with F features
//   Output: features [N, F] (scaled by input_scale)
//           targets  [N]    (class index per sample)
//
// The trainer only hands over samples that already have F
// features and a label inside the label set, so the flat buffer
// reshapes straight into [N, F].
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::EncodedSample;
use crate::domain::sentiment::LabelSet;

/// One batch ready for the forward pass.
#[derive(Debug, Clone)]
pub struct SentimentBatch<B: Backend> {
    /// Shape: [batch_size, feature_len]
    pub features: Tensor<B, 2>,

    /// Shape: [batch_size], index into `LabelSet::classes()`
    pub targets: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct SentimentBatcher {
    pub label_set:   LabelSet,
    pub input_scale: f32,
}

impl SentimentBatcher {
    pub fn new(label_set: LabelSet, input_scale: f32) -> Self {
        Self { label_set, input_scale }
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
impl<B: Backend> Batcher<B, EncodedSample, SentimentBatch<B>> for SentimentBatcher {
    fn batch(&self, items: Vec<EncodedSample>, device: &B::Device) -> SentimentBatch<B> {
        let batch_size  = items.len();
        let feature_len = items.first().map_or(0, |s| s.features.len());

        let flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().map(|&x| x * self.input_scale))
            .collect();

        // out-of-set labels were filtered before the dataset was built
        let targets: Vec<i32> = items
            .iter()
            .map(|s| self.label_set.index_of(s.label).map_or(0, |i| i as i32))
            .collect();

        let features = Tensor::<B, 1>::from_floats(flat.as_slice(), device)
            .reshape([batch_size, feature_len]);
        let targets = Tensor::<B, 1, Int>::from_ints(targets.as_slice(), device);

        SentimentBatch { features, targets }
    }
}

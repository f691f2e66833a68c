use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::encoder::TextEncoder;
use crate::domain::sentiment::{Category, RawSample};

/// One encoded training sample.
/// `features.len()` equals the encoder's `feature_len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedSample {
    pub features: Vec<f32>,
    pub label:    Category,
}

impl EncodedSample {
    pub fn new(features: Vec<f32>, label: Category) -> Self {
        Self { features, label }
    }
}

/// Encoded samples in the same order as the raw records they came from.
#[derive(Debug, Clone, Default)]
pub struct SentimentDataset {
    samples: Vec<EncodedSample>,
}

impl SentimentDataset {
    pub fn new(samples: Vec<EncodedSample>) -> Self { Self { samples } }

    /// Index i of the result is raw[i] encoded.
    pub fn encode(raw: &[RawSample], encoder: &TextEncoder) -> Self {
        let samples = raw
            .iter()
            .map(|s| EncodedSample::new(encoder.encode(&s.text), s.label))
            .collect();
        Self { samples }
    }

    pub fn samples(&self) -> &[EncodedSample] { &self.samples }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    pub fn is_empty(&self) -> bool { self.samples.is_empty() }
}

impl Dataset<EncodedSample> for SentimentDataset {
    fn get(&self, index: usize) -> Option<EncodedSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

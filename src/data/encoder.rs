// ============================================================
// Layer 4 — Text Encoder
// ============================================================
// Maps any text to a fixed-length numeric vector.
//
//   "I love this"
//       │  Preprocessor (normalise, optional lowercase, split)
//       ▼
//   ["i", "love", "this"]
//       │  truncate / right-pad with "" to exactly L tokens
//       ▼
//   ["i", "love", "this", "", "", ...]
//       │  h(token) rem_euclid vocab_size
//       ▼
//   [105, 7858, 9070, 0, 0, ...]           (compact, length L)
//   or L one-hot blocks of vocab_size      (one-hot, length L × vocab_size)
//
// h is the 31-multiplier polynomial over UTF-16 code units with
// 32-bit two's-complement wrap-around, so a token hashes the
// same on every platform and in every run.
//
// encode() is total: no input string can make it fail.

use serde::{Deserialize, Serialize};

use crate::data::preprocessor::Preprocessor;
use crate::error::{Result, SentimentError};

/// Sentinel used to right-pad short token sequences. Hashes to 0.
pub const PAD_TOKEN: &str = "";

pub const DEFAULT_SEQUENCE_LENGTH: usize = 100;
pub const DEFAULT_VOCAB_SIZE: usize = 10_000;

/// How each token position becomes numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureScheme {
    /// One value per position: the hashed feature index
    #[default]
    Compact,
    /// One `vocab_size` indicator block per position
    OneHot,
}

/// Fixed once at configuration time and stored with every model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// L, token slots per text
    pub sequence_length: usize,
    pub vocab_size:      usize,
    pub lowercase:       bool,
    pub scheme:          FeatureScheme,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            vocab_size:      DEFAULT_VOCAB_SIZE,
            lowercase:       true,
            scheme:          FeatureScheme::Compact,
        }
    }
}

impl EncoderConfig {
    pub fn new(sequence_length: usize) -> Self {
        Self { sequence_length, ..Self::default() }
    }

    pub fn with_vocab_size(mut self, vocab_size: usize) -> Self {
        self.vocab_size = vocab_size;
        self
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    pub fn with_scheme(mut self, scheme: FeatureScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sequence_length == 0 {
            return Err(SentimentError::InvalidConfig(
                "sequence_length must be at least 1".to_string(),
            ));
        }
        if self.vocab_size == 0 || self.vocab_size > i32::MAX as usize {
            return Err(SentimentError::InvalidConfig(format!(
                "vocab_size must be in 1..={}, got {}",
                i32::MAX,
                self.vocab_size
            )));
        }
        Ok(())
    }

    /// Length of every vector `encode` produces.
    pub fn feature_len(&self) -> usize {
        match self.scheme {
            FeatureScheme::Compact => self.sequence_length,
            FeatureScheme::OneHot  => self.sequence_length * self.vocab_size,
        }
    }

    /// Factor applied to features before the first dense layer,
    /// so compact indices land in [0, 1).
    pub fn input_scale(&self) -> f32 {
        match self.scheme {
            FeatureScheme::Compact => 1.0 / self.vocab_size as f32,
            FeatureScheme::OneHot  => 1.0,
        }
    }
}

/// 31-multiplier polynomial hash with i32 wrap-around.
///
/// `acc = acc * 31 + c` for every UTF-16 code unit `c`,
/// starting from 0. `hash_token("") == 0`.
pub fn hash_token(token: &str) -> i32 {
    token
        .encode_utf16()
        .fold(0i32, |acc, c| acc.wrapping_mul(31).wrapping_add(i32::from(c)))
}

/// Deterministic text → feature-vector encoder.
#[derive(Debug, Clone)]
pub struct TextEncoder {
    config:       EncoderConfig,
    preprocessor: Preprocessor,
}

impl TextEncoder {
    pub fn new(config: EncoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, preprocessor: Preprocessor::new(config.lowercase) })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Exactly `sequence_length` tokens: the first L of the text,
    /// right-padded with `PAD_TOKEN`.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let mut tokens = self.preprocessor.tokens(text);
        tokens.truncate(self.config.sequence_length);
        tokens.resize(self.config.sequence_length, PAD_TOKEN.to_string());
        tokens
    }

    /// Feature index of one token, in `0..vocab_size`.
    pub fn feature_index(&self, token: &str) -> usize {
        // validate() keeps vocab_size within i32
        hash_token(token).rem_euclid(self.config.vocab_size as i32) as usize
    }

    /// Encode one text. Length is always `config.feature_len()`.
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let tokens  = self.tokens(text);
        let indices = tokens.iter().map(|t| self.feature_index(t));

        match self.config.scheme {
            FeatureScheme::Compact => indices.map(|i| i as f32).collect(),
            FeatureScheme::OneHot => {
                let vocab = self.config.vocab_size;
                let mut features = vec![0.0f32; self.config.feature_len()];
                for (pos, index) in indices.enumerate() {
                    features[pos * vocab + index] = 1.0;
                }
                features
            }
        }
    }
}

// ============================================================
// Layer 3 — Decision Policy
// ============================================================
// Turns a model's raw output into one Category.
//
// Two modes:
//   Argmax     — per-class scores, highest wins, ties go to
//                the lowest class index
//   Thresholds — one scalar v against descending cutoffs:
//
//       v >  positive  → Positive
//       v >= neutral   → Neutral
//       v >  negative  → Negative
//       otherwise      → Neutral
//
// The neutral cutoff is inclusive, the other two are strict:
// 0.7 and 0.4 both read as Neutral, 0.1 as the low Neutral
// fallback. NaN fails every comparison and lands in the
// fallback.

use serde::{Deserialize, Serialize};

use crate::domain::sentiment::{Category, LabelSet};
use crate::domain::traits::ModelOutput;
use crate::error::{Result, SentimentError};

/// Ordered cutoffs for the scalar decision rule.
/// Always strictly descending: `positive > neutral > negative`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThresholds")]
pub struct ThresholdTable {
    positive: f32,
    neutral:  f32,
    negative: f32,
}

#[derive(Deserialize)]
struct RawThresholds {
    positive: f32,
    neutral:  f32,
    negative: f32,
}

impl TryFrom<RawThresholds> for ThresholdTable {
    type Error = SentimentError;

    fn try_from(raw: RawThresholds) -> Result<Self> {
        Self::new(raw.positive, raw.neutral, raw.negative)
    }
}

impl ThresholdTable {
    /// Validates the ordering; configurations with overlapping or
    /// reversed bands are rejected instead of being reproduced.
    pub fn new(positive: f32, neutral: f32, negative: f32) -> Result<Self> {
        if ![positive, neutral, negative].iter().all(|c| c.is_finite()) {
            return Err(SentimentError::InvalidConfig(format!(
                "thresholds must be finite, got ({positive}, {neutral}, {negative})"
            )));
        }
        if !(positive > neutral && neutral > negative) {
            return Err(SentimentError::InvalidConfig(format!(
                "thresholds must be strictly descending (positive > neutral > negative), \
                 got ({positive}, {neutral}, {negative})"
            )));
        }
        Ok(Self { positive, neutral, negative })
    }

    pub fn positive(&self) -> f32 { self.positive }
    pub fn neutral(&self)  -> f32 { self.neutral }
    pub fn negative(&self) -> f32 { self.negative }

    /// Bands are checked from the highest cutoff down.
    pub fn classify(&self, v: f32) -> Category {
        if v > self.positive {
            Category::Positive
        } else if v >= self.neutral {
            Category::Neutral
        } else if v > self.negative {
            Category::Negative
        } else {
            Category::Neutral
        }
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self { positive: 0.7, neutral: 0.4, negative: 0.1 }
    }
}

/// Maps raw model output to a Category.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionPolicy {
    /// Scores are read in this class order
    Argmax(LabelSet),
    Thresholds(ThresholdTable),
}

impl DecisionPolicy {
    /// Binary models produce a probability → thresholds.
    /// Ternary models produce per-class scores → argmax.
    pub fn for_label_set(label_set: LabelSet, thresholds: ThresholdTable) -> Self {
        match label_set {
            LabelSet::Binary  => Self::Thresholds(thresholds),
            LabelSet::Ternary => Self::Argmax(label_set),
        }
    }

    pub fn decide(&self, output: &ModelOutput) -> Result<Category> {
        match (self, output) {
            (Self::Thresholds(table), ModelOutput::Probability(v)) => Ok(table.classify(*v)),
            (Self::Argmax(label_set), ModelOutput::Scores(scores)) => {
                let classes = label_set.classes();
                if scores.len() != classes.len() {
                    return Err(SentimentError::PolicyMismatch(format!(
                        "expected {} scores, got {}",
                        classes.len(),
                        scores.len()
                    )));
                }
                Ok(classes[argmax(scores)])
            }
            (Self::Thresholds(_), ModelOutput::Scores(_)) => Err(SentimentError::PolicyMismatch(
                "threshold policy needs a scalar output".to_string(),
            )),
            (Self::Argmax(_), ModelOutput::Probability(_)) => Err(SentimentError::PolicyMismatch(
                "argmax policy needs per-class scores".to_string(),
            )),
        }
    }
}

/// Index of the highest score. Strict `>` keeps the lowest index
/// on ties and never lets NaN take over.
fn argmax(scores: &[f32]) -> usize {
    let mut best = 0;
    for (i, &s) in scores.iter().enumerate().skip(1) {
        if s > scores[best] || scores[best].is_nan() {
            best = i;
        }
    }
    best
}

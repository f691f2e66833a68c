// ============================================================
// Layer 3 — Sentiment Domain Types
// ============================================================
// Category is the label the classifier outputs.
// LabelSet fixes which categories a model is trained on and
// the class index of each one.
// RawSample is one parsed dataset record before encoding.
//
// Classes are nominal. The index order below only exists so
// tensors have a stable column per class.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A nominal sentiment class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Negative,
    Neutral,
    Positive,
}

impl Category {
    /// Exact match against the dataset vocabulary.
    /// Returns None for anything else, including different casing.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "neutral"  => Some(Self::Neutral),
            _          => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Neutral  => "neutral",
            Self::Positive => "positive",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const BINARY:  [Category; 2] = [Category::Negative, Category::Positive];
const TERNARY: [Category; 3] = [Category::Negative, Category::Neutral, Category::Positive];

/// The set of classes a model predicts.
///
/// Binary models emit one probability (sigmoid) for `Positive`;
/// ternary models emit one score per class (softmax).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSet {
    Binary,
    #[default]
    Ternary,
}

impl LabelSet {
    /// Categories in class-index order
    pub fn classes(&self) -> &'static [Category] {
        match self {
            Self::Binary  => &BINARY,
            Self::Ternary => &TERNARY,
        }
    }

    pub fn index_of(&self, category: Category) -> Option<usize> {
        self.classes().iter().position(|&c| c == category)
    }

    /// Width of the network's output layer
    pub fn output_units(&self) -> usize {
        match self {
            Self::Binary  => 1,
            Self::Ternary => 3,
        }
    }
}

/// One dataset record: the raw text and its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSample {
    pub text:  String,
    pub label: Category,
}

impl RawSample {
    pub fn new(text: impl Into<String>, label: Category) -> Self {
        Self { text: text.into(), label }
    }
}

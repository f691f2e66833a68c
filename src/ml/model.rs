// ============================================================
// Layer 5 — Sentiment Network
// ============================================================
// A small feed-forward classifier:
//
//   features [batch, F] ─► Linear(F → hidden) ─► ReLU
//                       ─► Linear(hidden → k) ─► logits [batch, k]
//
//   k = 1 for Binary  (sigmoid / binary cross-entropy)
//   k = 3 for Ternary (softmax / cross-entropy)
//
// SentimentNet is the trainable Burn module. Once a fit has
// finished, its parameters are frozen into TrainedClassifier:
// plain tensors on the inference backend, no autodiff state,
// never mutated again. That is the type the engine shares
// behind an Arc.

use burn::{
    module::Param,
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation,
};

use crate::data::encoder::EncoderConfig;
use crate::domain::sentiment::LabelSet;
use crate::domain::traits::{ModelOutput, SentimentModel};
// Config's derive expands to a bare `Result`, so the crate alias stays qualified here
use crate::error::{self, SentimentError};

pub type InferBackend = burn::backend::NdArray;
pub type InferDevice  = burn::backend::ndarray::NdArrayDevice;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct SentimentNetConfig {
    pub input_size:  usize,
    pub hidden_size: usize,
    pub output_size: usize,
}

impl SentimentNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SentimentNet<B> {
        SentimentNet {
            hidden: LinearConfig::new(self.input_size, self.hidden_size).init(device),
            output: LinearConfig::new(self.hidden_size, self.output_size).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct SentimentNet<B: Backend> {
    pub hidden: Linear<B>,
    pub output: Linear<B>,
}

impl<B: Backend> SentimentNet<B> {
    /// features: [batch, F] → logits: [batch, k]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = activation::relu(self.hidden.forward(features));
        self.output.forward(x)
    }
}

// ─── TrainedClassifier ────────────────────────────────────────────────────────
/// Frozen parameters of a fitted SentimentNet plus the encoder
/// configuration it was trained with.
#[derive(Debug, Clone)]
pub struct TrainedClassifier {
    encoder:       EncoderConfig,
    label_set:     LabelSet,
    hidden_size:   usize,
    hidden_weight: Tensor<InferBackend, 2>,
    hidden_bias:   Tensor<InferBackend, 1>,
    output_weight: Tensor<InferBackend, 2>,
    output_bias:   Tensor<InferBackend, 1>,
    device:        InferDevice,
}

impl TrainedClassifier {
    /// Freeze a network. `net` must already live on the inference
    /// backend (call `.valid()` on an autodiff model first).
    pub fn from_net(
        net:       SentimentNet<InferBackend>,
        encoder:   EncoderConfig,
        label_set: LabelSet,
    ) -> error::Result<Self> {
        let [input_size, hidden_size] = net.hidden.weight.dims();
        let [_, output_size]          = net.output.weight.dims();

        if input_size != encoder.feature_len() || output_size != label_set.output_units() {
            return Err(SentimentError::Checkpoint(format!(
                "network is {input_size} → {output_size}, encoder/label set need {} → {}",
                encoder.feature_len(),
                label_set.output_units()
            )));
        }

        let hidden_bias = net.hidden.bias.as_ref().map(|b| b.val()).ok_or_else(|| {
            SentimentError::Checkpoint("hidden layer has no bias".to_string())
        })?;
        let output_bias = net.output.bias.as_ref().map(|b| b.val()).ok_or_else(|| {
            SentimentError::Checkpoint("output layer has no bias".to_string())
        })?;

        Ok(Self {
            encoder,
            label_set,
            hidden_size,
            hidden_weight: net.hidden.weight.val(),
            hidden_bias,
            output_weight: net.output.weight.val(),
            output_bias,
            device: Default::default(),
        })
    }

    pub fn net_config(&self) -> SentimentNetConfig {
        SentimentNetConfig::new(
            self.encoder.feature_len(),
            self.hidden_size,
            self.label_set.output_units(),
        )
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Rebuild a Burn module holding these parameters, for recording.
    pub fn to_net(&self) -> SentimentNet<InferBackend> {
        let mut net: SentimentNet<InferBackend> = self.net_config().init(&self.device);
        net.hidden.weight = Param::from_tensor(self.hidden_weight.clone());
        net.hidden.bias   = Some(Param::from_tensor(self.hidden_bias.clone()));
        net.output.weight = Param::from_tensor(self.output_weight.clone());
        net.output.bias   = Some(Param::from_tensor(self.output_bias.clone()));
        net
    }

    /// Same computation as `SentimentNet::forward` for one sample.
    fn logits(&self, features: &[f32]) -> Tensor<InferBackend, 2> {
        let scale  = self.encoder.input_scale();
        let scaled: Vec<f32> = features.iter().map(|&x| x * scale).collect();
        let x = Tensor::<InferBackend, 1>::from_floats(scaled.as_slice(), &self.device)
            .reshape([1, features.len()]);

        let h = x.matmul(self.hidden_weight.clone()) + self.hidden_bias.clone().unsqueeze();
        let h = activation::relu(h);
        h.matmul(self.output_weight.clone()) + self.output_bias.clone().unsqueeze()
    }
}

impl SentimentModel for TrainedClassifier {
    fn encoder_config(&self) -> &EncoderConfig {
        &self.encoder
    }

    fn label_set(&self) -> LabelSet {
        self.label_set
    }

    fn score(&self, features: &[f32]) -> error::Result<ModelOutput> {
        let expected = self.encoder.feature_len();
        if features.len() != expected {
            return Err(SentimentError::ShapeMismatch { index: 0, expected, actual: features.len() });
        }

        let logits = self.logits(features);
        let probs  = match self.label_set {
            LabelSet::Binary  => activation::sigmoid(logits),
            LabelSet::Ternary => activation::softmax(logits, 1),
        };
        let values = probs
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| SentimentError::Inference(format!("{e:?}")))?;

        match self.label_set {
            LabelSet::Binary => values
                .first()
                .copied()
                .map(ModelOutput::Probability)
                .ok_or_else(|| SentimentError::Inference("empty model output".to_string())),
            LabelSet::Ternary => Ok(ModelOutput::Scores(values)),
        }
    }
}

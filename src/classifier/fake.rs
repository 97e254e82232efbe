use ndarray::{Array4, Axis};

use super::{Classifier, MODEL_NAME};
use crate::error::PredictError;
use crate::labels::Labels;
use crate::preprocess::Preprocess;

/// Deterministic stand-in for the real network: logits are a fixed mix of
/// the per-channel means of the input.
pub struct FakeClassifier {
    labels: Labels,
    preprocess: Preprocess,
    fail: bool,
}

impl FakeClassifier {
    pub fn new(num_classes: usize) -> Self {
        let names = (0..num_classes).map(|i| format!("class_{}", i)).collect();
        Self {
            labels: Labels::new(names),
            preprocess: Preprocess::default(),
            fail: false,
        }
    }

    pub fn with_labels(labels: Labels) -> Self {
        Self {
            labels,
            preprocess: Preprocess::default(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(10)
        }
    }

    fn num_outputs(&self) -> usize {
        self.labels.len().max(10)
    }
}

impl Classifier for FakeClassifier {
    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn labels(&self) -> &Labels {
        &self.labels
    }

    fn preprocess(&self) -> &Preprocess {
        &self.preprocess
    }

    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>, PredictError> {
        if self.fail {
            return Err(PredictError::InferenceFailed("fake classifier failure".into()));
        }
        let means: Vec<f32> = input
            .axis_iter(Axis(1))
            .map(|channel| channel.mean().unwrap_or(0.0))
            .collect();

        Ok((0..self.num_outputs())
            .map(|i| {
                means
                    .iter()
                    .enumerate()
                    .map(|(c, m)| m * (((i * 31 + c * 17) % 97) as f32 / 97.0 - 0.5))
                    .sum::<f32>()
                    + (i % 7) as f32 * 0.01
            })
            .collect())
    }
}

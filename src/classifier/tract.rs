use std::path::Path;

use ndarray::Array4;
use tract_onnx::prelude::*;

use super::{Classifier, MODEL_NAME};
use crate::error::{PredictError, StartupError};
use crate::labels::Labels;
use crate::preprocess::Preprocess;

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

/// ONNX network executed with tract.
pub struct TractClassifier {
    model: Plan,
    labels: Labels,
    preprocess: Preprocess,
}

impl TractClassifier {
    /// Load, pin the input shape, optimize and plan the network. Done once
    /// at startup; the plan is immutable afterwards.
    pub fn load(model_path: &Path, labels: Labels) -> Result<Self, StartupError> {
        let preprocess = Preprocess::default();
        let [n, c, h, w] = preprocess.input_shape();
        let input_fact = InferenceFact::dt_shape(f32::datum_type(), tvec!(n, c, h, w));

        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .and_then(|m| m.with_input_fact(0, input_fact))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| StartupError::Model {
                path: model_path.to_path_buf(),
                message: format!("{:#}", e),
            })?;

        Ok(Self {
            model,
            labels,
            preprocess,
        })
    }
}

impl Classifier for TractClassifier {
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
        let tensor: Tensor = input.into();
        let outputs = self
            .model
            .run(tvec!(tensor.into()))
            .map_err(|e| PredictError::InferenceFailed(format!("{:#}", e)))?;

        let output = outputs
            .first()
            .ok_or_else(|| PredictError::InferenceFailed("model produced no outputs".into()))?;
        let logits = output
            .to_array_view::<f32>()
            .map_err(|e| PredictError::InferenceFailed(format!("{:#}", e)))?;

        Ok(logits.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_model_file_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let result = TractClassifier::load(&dir.path().join("resnet50.onnx"), Labels::default());
        assert!(matches!(result, Err(StartupError::Model { .. })));
    }

    #[test]
    fn garbage_model_file_fails_startup() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a protobuf").unwrap();
        let result = TractClassifier::load(file.path(), Labels::default());
        assert!(matches!(result, Err(StartupError::Model { .. })));
    }
}

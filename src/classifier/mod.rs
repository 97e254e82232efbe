pub mod tract;

#[cfg(test)]
pub mod fake;

use ndarray::Array4;

use crate::error::PredictError;
use crate::labels::Labels;
use crate::preprocess::Preprocess;

pub use self::tract::TractClassifier;

pub const MODEL_NAME: &str = "resnet50_imagenet";

/// A pretrained image classifier, loaded once and shared read-only by every
/// request.
pub trait Classifier: Send + Sync {
    fn model_name(&self) -> &str;

    fn labels(&self) -> &Labels;

    /// Transform that turns a decoded image into this model's input tensor.
    fn preprocess(&self) -> &Preprocess;

    /// Forward pass over a batch of one, returning one logit per class.
    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>, PredictError>;
}

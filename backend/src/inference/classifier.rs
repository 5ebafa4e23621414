use super::normalizer::ImageTensor;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Failed to load model from {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("Input tensor {actual:?} does not match model input {expected:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("Model expects {0} input, only f32 is supported")]
    UnsupportedInputType(String),
    #[error("Model has {outputs} outputs but {labels} labels are configured")]
    LabelCountMismatch { outputs: usize, labels: usize },
    #[error("Model execution failed: {0}")]
    Runtime(String),
    #[error("Model lock poisoned")]
    Poisoned,
}

/// Opaque image classifier: one score per class for a normalized image.
pub trait Classifier: Send + Sync {
    fn classify(&self, tensor: &ImageTensor) -> Result<Vec<f32>, ClassifierError>;

    /// Number of scores `classify` returns, when the model declares it.
    fn output_len(&self) -> Option<usize> {
        None
    }
}

/// Fails with `ShapeMismatch` unless `tensor` has exactly the `expected` shape.
pub fn check_input_shape(tensor: &ImageTensor, expected: &[usize]) -> Result<(), ClassifierError> {
    if tensor.shape() != expected {
        return Err(ClassifierError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: tensor.shape().to_vec(),
        });
    }
    Ok(())
}

/// Startup check that the model's output width matches the label list.
pub fn check_label_count(
    classifier: &dyn Classifier,
    labels: usize,
) -> Result<(), ClassifierError> {
    match classifier.output_len() {
        Some(outputs) if outputs != labels => {
            Err(ClassifierError::LabelCountMismatch { outputs, labels })
        }
        _ => Ok(()),
    }
}

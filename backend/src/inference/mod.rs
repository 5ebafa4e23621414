pub mod classifier;
pub mod labels;
pub mod normalizer;
pub mod predictor;
pub mod tflite;

use std::path::Path;
use std::sync::Arc;

pub use classifier::{Classifier, ClassifierError, check_label_count};
pub use labels::CLASS_LABELS;
pub use normalizer::{INPUT_SHAPE, ImageTensor, normalize};
pub use predictor::{PredictError, Predictor};

/// Loads the TensorFlow Lite model at `path`.
pub fn load_classifier(path: &Path) -> Result<Arc<dyn Classifier>, ClassifierError> {
    Ok(Arc::new(tflite::TfliteClassifier::load(path, &INPUT_SHAPE)?))
}

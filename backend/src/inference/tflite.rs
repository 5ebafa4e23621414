use std::path::Path;
use std::sync::Mutex;

use tract_core::prelude::*;

use super::classifier::{Classifier, ClassifierError, check_input_shape};
use super::normalizer::ImageTensor;

fn runtime(err: TractError) -> ClassifierError {
    ClassifierError::Runtime(format!("{:#}", err))
}

/// TensorFlow Lite model executed with tract.
pub struct TfliteClassifier {
    plan: Mutex<TypedRunnableModel<TypedModel>>,
    input_shape: Vec<usize>,
    output_len: Option<usize>,
}

impl TfliteClassifier {
    /// Loads and optimizes the flatbuffer at `path`. `fallback_shape` pins the
    /// input when the model leaves a dimension symbolic.
    pub fn load(path: impl AsRef<Path>, fallback_shape: &[usize]) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let model = tract_tflite::tflite()
            .model_for_path(path)
            .map_err(|e| load_error(&source, e))?;

        let classifier = Self::from_model(model, fallback_shape, &source)?;
        log::info!(
            "Loaded TFLite model {} (input {:?}, {} outputs)",
            source,
            classifier.input_shape,
            classifier
                .output_len
                .map_or_else(|| "unknown".to_string(), |n| n.to_string())
        );
        Ok(classifier)
    }

    /// Prepares an already decoded graph. `source` names the model in errors.
    pub fn from_model(
        model: TypedModel,
        fallback_shape: &[usize],
        source: &str,
    ) -> Result<Self, ClassifierError> {
        let input_fact = model.input_fact(0).map_err(|e| load_error(source, e))?.clone();
        if input_fact.datum_type != f32::datum_type() {
            return Err(ClassifierError::UnsupportedInputType(format!(
                "{:?}",
                input_fact.datum_type
            )));
        }

        let model = match input_fact.shape.as_concrete() {
            Some(_) => model,
            None => {
                log::info!(
                    "Model input shape {:?} is not fixed, pinning to {:?}",
                    input_fact.shape,
                    fallback_shape
                );
                pin_input_shape(&model, fallback_shape)
                    .map_err(|e| load_error(source, e))?
                    .ok_or_else(|| ClassifierError::Load {
                        path: source.to_string(),
                        reason: format!(
                            "input {:?} cannot be pinned to {:?}",
                            input_fact.shape, fallback_shape
                        ),
                    })?
            }
        };

        let input_shape = model
            .input_fact(0)
            .ok()
            .and_then(|fact| fact.shape.as_concrete().map(<[usize]>::to_vec))
            .unwrap_or_else(|| fallback_shape.to_vec());

        let plan = model
            .into_optimized()
            .and_then(|optimized| optimized.into_runnable())
            .map_err(|e| load_error(source, e))?;

        let output_len = plan
            .model()
            .output_fact(0)
            .ok()
            .and_then(|fact| fact.shape.as_concrete().map(|dims| dims.iter().product()));

        Ok(Self {
            plan: Mutex::new(plan),
            input_shape,
            output_len,
        })
    }
}

fn load_error(source: &str, err: TractError) -> ClassifierError {
    ClassifierError::Load {
        path: source.to_string(),
        reason: format!("{:#}", err),
    }
}

/// Binds each symbolic input dimension to the matching entry of `shape`.
/// `None` if a fixed dimension disagrees or a dimension is an expression.
fn pin_input_shape(model: &TypedModel, shape: &[usize]) -> TractResult<Option<TypedModel>> {
    let fact = model.input_fact(0)?;
    if fact.shape.len() != shape.len() {
        return Ok(None);
    }

    let mut values = SymbolValues::default();
    for (dim, &want) in fact.shape.iter().zip(shape) {
        match dim {
            TDim::Val(have) if *have == want as i64 => {}
            TDim::Sym(symbol) => values.set(symbol, want as i64),
            _ => return Ok(None),
        }
    }
    model.concretize_dims(&values).map(Some)
}

impl Classifier for TfliteClassifier {
    fn classify(&self, tensor: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
        check_input_shape(tensor, &self.input_shape)?;

        let data = tensor.to_vec();
        let input = Tensor::from_shape::<f32>(tensor.shape(), &data).map_err(runtime)?;
        let outputs = {
            let plan = self.plan.lock().map_err(|_| ClassifierError::Poisoned)?;
            plan.run(tvec!(input.into_tvalue())).map_err(runtime)?
        };

        let output = outputs
            .first()
            .ok_or_else(|| ClassifierError::Runtime("model produced no output".to_string()))?;
        let scores = output.cast_to::<f32>().map_err(runtime)?;
        Ok(scores.as_slice::<f32>().map_err(runtime)?.to_vec())
    }

    fn output_len(&self) -> Option<usize> {
        self.output_len
    }
}

use std::cmp::Ordering as CmpOrdering;
use std::sync::Arc;

use shared::PredictionResult;

use super::classifier::{Classifier, ClassifierError};
use super::normalizer::{INPUT_HEIGHT, INPUT_WIDTH, NormalizeError, normalize};

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("Predicted index {index} is outside the {labels} configured labels")]
    LabelOutOfRange { index: usize, labels: usize },
    #[error("Model returned no scores")]
    EmptyScores,
}

/// Image bytes in, labelled prediction out.
#[derive(Clone)]
pub struct Predictor {
    classifier: Arc<dyn Classifier>,
    labels: Arc<[String]>,
    width: u32,
    height: u32,
}

impl Predictor {
    pub fn new<L, S>(classifier: Arc<dyn Classifier>, labels: L) -> Self
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classifier,
            labels: labels.into_iter().map(Into::into).collect(),
            width: INPUT_WIDTH,
            height: INPUT_HEIGHT,
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn predict(&self, image: &[u8]) -> Result<PredictionResult, PredictError> {
        let tensor = normalize(image, self.width, self.height)?;
        let raw_predictions = self.classifier.classify(&tensor)?;

        let index = argmax(&raw_predictions).ok_or(PredictError::EmptyScores)?;
        let predicted_class = self
            .labels
            .get(index)
            .ok_or(PredictError::LabelOutOfRange {
                index,
                labels: self.labels.len(),
            })?
            .clone();

        Ok(PredictionResult {
            predicted_class,
            confidence: raw_predictions[index],
            raw_predictions,
        })
    }
}

/// Index of the largest score; the first one wins on ties and NaN never wins.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score.partial_cmp(&top) != Some(CmpOrdering::Greater) => {}
            None if score.is_nan() => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

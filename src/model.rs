use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;

pub const PREPROCESSOR_FILE: &str = "preprocessor.json";
pub const CLASSIFIER_FILE: &str = "model.json";

/// Fitted scaling transform applied to raw feature vectors before
/// classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    pub center: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Preprocessor {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path)?;
        let preprocessor: Preprocessor = serde_json::from_str(&raw)?;
        if preprocessor.center.len() != preprocessor.scale.len() {
            return Err(AppError::Inference(format!(
                "preprocessor artifact is inconsistent: {} centers vs {} scales",
                preprocessor.center.len(),
                preprocessor.scale.len()
            )));
        }
        Ok(preprocessor)
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, AppError> {
        if row.len() != self.center.len() {
            return Err(AppError::Inference(format!(
                "preprocessor expects {} features, got {}",
                self.center.len(),
                row.len()
            )));
        }
        Ok(row
            .iter()
            .zip(self.center.iter().zip(&self.scale))
            .map(|(x, (center, scale))| {
                // Zero-variance columns pass through centered.
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - center) / scale
            })
            .collect())
    }
}

/// Fitted logistic classifier; emits label 1 (phishing) or 0 (safe).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classifier {
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl Classifier {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<i64>, AppError> {
        rows.iter()
            .map(|row| {
                if row.len() != self.weights.len() {
                    return Err(AppError::Inference(format!(
                        "classifier expects {} features, got {}",
                        self.weights.len(),
                        row.len()
                    )));
                }
                let z: f64 = self.intercept
                    + row
                        .iter()
                        .zip(&self.weights)
                        .map(|(x, w)| x * w)
                        .sum::<f64>();
                Ok(if sigmoid(z) >= 0.5 { 1 } else { 0 })
            })
            .collect()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Immutable (preprocessor, classifier) pair. Loaded once at startup and
/// shared read-only across requests; `predict` returns one label per input
/// row and wraps either stage's failure as an inference error.
pub struct InferenceModel {
    preprocessor: Preprocessor,
    classifier: Classifier,
}

impl InferenceModel {
    pub fn new(preprocessor: Preprocessor, classifier: Classifier) -> Self {
        Self {
            preprocessor,
            classifier,
        }
    }

    pub fn load(model_dir: &Path) -> Result<Self, AppError> {
        let preprocessor = Preprocessor::load(&model_dir.join(PREPROCESSOR_FILE))?;
        let classifier = Classifier::load(&model_dir.join(CLASSIFIER_FILE))?;
        info!(
            "loaded model artifacts from {} ({} features)",
            model_dir.display(),
            classifier.weights.len()
        );
        Ok(Self::new(preprocessor, classifier))
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<i64>, AppError> {
        let transformed = rows
            .iter()
            .map(|row| self.preprocessor.transform(row))
            .collect::<Result<Vec<_>, _>>()?;
        self.classifier.predict(&transformed)
    }
}

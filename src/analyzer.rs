use uuid::Uuid;

use crate::error::AppError;
use crate::features::FeatureExtractor;
use crate::model::InferenceModel;
use crate::types::{AnalyzeResponse, Verdict};

/// Request path: URL -> feature map -> padded vector -> verdict.
/// Extraction and inference are synchronous and blocking; callers on the
/// async runtime run this on a blocking worker.
pub struct UrlAnalyzer {
    extractor: FeatureExtractor,
    model: InferenceModel,
}

impl UrlAnalyzer {
    pub fn new(extractor: FeatureExtractor, model: InferenceModel) -> Self {
        Self { extractor, model }
    }

    pub fn analyze(&self, url: &str) -> Result<AnalyzeResponse, AppError> {
        if url.trim().is_empty() {
            return Err(AppError::InvalidInput("URL cannot be empty".to_string()));
        }

        let features = self.extractor.extract(url);
        let vector = features.to_model_vector();
        let labels = self.model.predict(std::slice::from_ref(&vector))?;
        let label = labels
            .first()
            .copied()
            .ok_or_else(|| AppError::Inference("model returned no label".to_string()))?;

        Ok(AnalyzeResponse {
            request_id: Uuid::new_v4(),
            url: url.to_string(),
            verdict: Verdict::from_label(label),
            features,
        })
    }
}

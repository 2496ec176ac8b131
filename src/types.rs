use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::FeatureMap;

/// Binary verdict derived from the model's output label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Verdict {
    Phishing,
    Safe,
}

impl Verdict {
    /// Model label 1 means phishing, 0 means safe.
    pub fn from_label(label: i64) -> Self {
        if label == 1 {
            Verdict::Phishing
        } else {
            Verdict::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Phishing => "Phishing",
            Verdict::Safe => "Safe",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub request_id: Uuid,
    pub url: String,
    pub verdict: Verdict,
    pub features: FeatureMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_one_is_phishing() {
        assert_eq!(Verdict::from_label(1), Verdict::Phishing);
        assert_eq!(Verdict::from_label(0), Verdict::Safe);
    }

    #[test]
    fn verdict_serializes_as_plain_string() {
        assert_eq!(
            serde_json::to_string(&Verdict::Phishing).unwrap(),
            "\"Phishing\""
        );
        assert_eq!(serde_json::to_string(&Verdict::Safe).unwrap(), "\"Safe\"");
    }
}

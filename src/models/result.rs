use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// Classification verdict for one piece of media.
///
/// The backend has historically emitted `"Real"` and `"AI-generated"`;
/// both are accepted as aliases of the canonical lowercase values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Verdict {
    #[serde(alias = "Real")]
    Real,
    #[serde(alias = "AI-generated", alias = "fake")]
    Manipulated,
}

/// A finished analysis result as returned by `GET /api/results/{id}`.
///
/// Identity is `id` (the backend's `_id`); the history store dedupes on it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalysisResult {
    #[serde(rename = "_id")]
    #[garde(length(min = 1))]
    pub id: String,

    #[garde(skip)]
    pub label: Verdict,

    /// Model confidence in the verdict.
    #[garde(range(min = 0.0, max = 1.0))]
    pub confidence: f64,

    #[serde(default)]
    #[garde(skip)]
    pub filename: Option<String>,

    /// Relative URL of the analyzed media on the backend.
    #[serde(default)]
    #[garde(skip)]
    pub file_url: Option<String>,

    #[serde(default)]
    #[garde(skip)]
    pub thumbnail_url: Option<String>,

    #[garde(skip)]
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json(confidence: f64) -> String {
        format!(
            r#"{{
                "_id": "r1",
                "label": "AI-generated",
                "confidence": {confidence},
                "filename": "clip.mp4",
                "file_url": "/uploads/clip.mp4",
                "thumbnail_url": null,
                "timestamp": "2025-06-01T12:00:00Z"
            }}"#
        )
    }

    #[test]
    fn deserializes_backend_result_document() {
        let result: AnalysisResult = serde_json::from_str(&sample_json(0.92)).unwrap();
        assert_eq!(result.id, "r1");
        assert_eq!(result.label, Verdict::Manipulated);
        assert!(result.validate().is_ok());
    }

    #[test]
    fn legacy_label_aliases_are_accepted() {
        let real: Verdict = serde_json::from_str("\"Real\"").unwrap();
        assert_eq!(real, Verdict::Real);
        let canonical: Verdict = serde_json::from_str("\"manipulated\"").unwrap();
        assert_eq!(canonical, Verdict::Manipulated);
    }

    #[test]
    fn out_of_range_confidence_fails_validation() {
        let result: AnalysisResult = serde_json::from_str(&sample_json(1.7)).unwrap();
        assert!(result.validate().is_err());
    }
}

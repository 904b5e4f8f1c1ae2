use serde::{Deserialize, Serialize};

/// Body of `POST /process`. `text` is optional here so a missing field is
/// reported as invalid input instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessRequest {
    pub text: Option<String>,
}

/// The triple extracted from a model completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub summary: String,
    pub keywords: Vec<String>,
    pub sentiment: String,
}

/// A completed process request as stored in history and returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub original_text: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub sentiment: String,
}

impl ProcessedRecord {
    pub fn from_analysis(original_text: impl Into<String>, analysis: Analysis) -> Self {
        Self {
            original_text: original_text.into(),
            summary: analysis.summary,
            keywords: analysis.keywords,
            sentiment: analysis.sentiment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_with_wire_field_names() {
        let record = ProcessedRecord::from_analysis(
            "The quick brown fox jumps over the lazy dog.",
            Analysis {
                summary: "A fox jumps over a dog.".to_string(),
                keywords: vec!["fox".to_string(), "dog".to_string(), "jumps".to_string()],
                sentiment: "neutral".to_string(),
            },
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "original_text": "The quick brown fox jumps over the lazy dog.",
                "summary": "A fox jumps over a dog.",
                "keywords": ["fox", "dog", "jumps"],
                "sentiment": "neutral"
            })
        );
    }

    #[test]
    fn test_process_request_missing_text_is_none() {
        let req: ProcessRequest = serde_json::from_str("{}").unwrap();
        assert!(req.text.is_none());
    }
}

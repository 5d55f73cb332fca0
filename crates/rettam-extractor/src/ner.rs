//! Named Entity Recognition (NER) client
//!
//! Talks to a token-classification inference endpoint. Scores come back as
//! 32-bit floats and are widened before they reach the result.

use async_trait::async_trait;
use reqwest::Client;
use rettam_core::{
    normalize_score, Capability, EntityTagger, Result, TaggedEntities, TaggedEntity,
};
use serde::Deserialize;

use crate::client::{InferenceRequest, ModelEndpoint};

/// One prediction as emitted by the token-classification pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct RawTaggedEntity {
    /// Per-token label, or the group label when the server aggregates
    #[serde(alias = "entity_group")]
    pub entity: String,
    pub score: f32,
    #[serde(default)]
    pub index: Option<usize>,
    pub word: String,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
}

/// Normalize raw predictions; aggregated output without indices falls back
/// to the prediction's position in the list.
pub fn normalize_predictions(raw: Vec<RawTaggedEntity>) -> Result<TaggedEntities> {
    let hf_entities = raw
        .into_iter()
        .enumerate()
        .map(|(i, prediction)| {
            Ok(TaggedEntity {
                word: prediction.word,
                entity_label: prediction.entity,
                score: normalize_score(prediction.score, Capability::EntityTagging)?,
                position: prediction.index.unwrap_or(i),
                start: prediction.start,
                end: prediction.end,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TaggedEntities { hf_entities })
}

/// HTTP client for the NER endpoint
pub struct HttpEntityTagger {
    endpoint: ModelEndpoint,
}

impl HttpEntityTagger {
    pub fn new(client: Client, url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            endpoint: ModelEndpoint::new(client, url, Capability::EntityTagging)
                .with_token(api_token),
        }
    }
}

#[async_trait]
impl EntityTagger for HttpEntityTagger {
    async fn tag(&self, text: &str) -> Result<TaggedEntities> {
        let raw: Vec<RawTaggedEntity> = self.endpoint.post(&InferenceRequest { inputs: text }).await?;
        normalize_predictions(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rettam_core::RettamError;
    use serde_json::json;

    #[test]
    fn test_normalize_token_predictions() {
        let raw: Vec<RawTaggedEntity> = serde_json::from_value(json!([
            {"entity": "I-PER", "score": 0.9987, "index": 1, "word": "▁Anna", "start": 0, "end": 4},
            {"entity": "I-LOC", "score": 0.5, "index": 4, "word": "▁Berlin"}
        ]))
        .unwrap();

        let tagged = normalize_predictions(raw).unwrap();
        assert_eq!(tagged.hf_entities.len(), 2);
        assert_eq!(tagged.hf_entities[0].entity_label, "I-PER");
        assert_eq!(tagged.hf_entities[0].start, Some(0));
        assert_eq!(tagged.hf_entities[1].position, 4);
        assert_eq!(tagged.hf_entities[1].score, 0.5);
        // Widened from f32, not re-parsed from decimal text
        assert_eq!(tagged.hf_entities[0].score, f64::from(0.9987_f32));
    }

    #[test]
    fn test_aggregated_predictions_use_list_position() {
        let raw: Vec<RawTaggedEntity> = serde_json::from_value(json!([
            {"entity_group": "PER", "score": 0.75, "word": "Anna"},
            {"entity_group": "LOC", "score": 0.25, "word": "Berlin"}
        ]))
        .unwrap();

        let tagged = normalize_predictions(raw).unwrap();
        assert_eq!(tagged.hf_entities[1].entity_label, "LOC");
        assert_eq!(tagged.hf_entities[1].position, 1);
    }

    #[test]
    fn test_serialized_scores_are_plain_numbers() {
        let raw = vec![RawTaggedEntity {
            entity: "I-ORG".to_string(),
            score: 0.25,
            index: Some(2),
            word: "ACME".to_string(),
            start: None,
            end: None,
        }];
        let value = serde_json::to_value(normalize_predictions(raw).unwrap()).unwrap();
        assert_eq!(value["hf_entities"][0]["score"], json!(0.25));
        assert!(value["hf_entities"][0].get("start").is_none());
    }

    #[test]
    fn test_nan_score_fails() {
        let raw = vec![RawTaggedEntity {
            entity: "I-ORG".to_string(),
            score: f32::NAN,
            index: None,
            word: "ACME".to_string(),
            start: None,
            end: None,
        }];
        assert!(matches!(
            normalize_predictions(raw),
            Err(RettamError::ExtractionFailure { capability: Capability::EntityTagging, .. })
        ));
    }
}

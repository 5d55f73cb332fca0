//! rettam Extractor - Metadata extraction pipeline
//!
//! Fans a text out to three independent model capabilities (syntactic
//! analysis, named-entity tagging, sentiment) and merges their outputs into
//! one [`ExtractionResult`].

use std::sync::Arc;
use std::time::Instant;

use reqwest::Client;
use rettam_core::{
    EntityTagger, ExtractionResult, ModelsConfig, Result, RettamError, SyntaxAnalyzer,
    TokenCounter,
};

pub mod chunker;
pub mod client;
pub mod ner;
pub mod sentiment;
pub mod syntax;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use chunker::{HttpTokenCounter, SentenceChunker, WordEstimateCounter};
pub use ner::HttpEntityTagger;
pub use sentiment::{HttpSentimentScorer, SentimentExtractor};
pub use syntax::HttpSyntaxAnalyzer;

/// Aggregates the three extraction capabilities
pub struct MetadataExtractor {
    syntax: Arc<dyn SyntaxAnalyzer>,
    tagger: Arc<dyn EntityTagger>,
    sentiment: SentimentExtractor,
}

impl MetadataExtractor {
    pub fn new(
        syntax: Arc<dyn SyntaxAnalyzer>,
        tagger: Arc<dyn EntityTagger>,
        sentiment: SentimentExtractor,
    ) -> Self {
        Self {
            syntax,
            tagger,
            sentiment,
        }
    }

    /// Wire HTTP model clients from config
    pub fn from_config(config: &ModelsConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| RettamError::ConfigError(format!("HTTP client: {e}")))?;
        let token = config.api_token.clone();

        let counter: Arc<dyn TokenCounter> = match &config.tokenizer_url {
            Some(url) if !config.estimates_tokens() => {
                Arc::new(HttpTokenCounter::new(client.clone(), url, token.clone()))
            }
            _ => {
                tracing::warn!(
                    max_tokens = config.sentiment_max_tokens,
                    "No tokenizer URL configured; sentiment chunks are sized by a word estimate \
                     and may exceed the model limit"
                );
                Arc::new(WordEstimateCounter)
            }
        };

        Ok(Self::new(
            Arc::new(HttpSyntaxAnalyzer::new(
                client.clone(),
                &config.syntax_url,
                token.clone(),
            )),
            Arc::new(HttpEntityTagger::new(client.clone(), &config.ner_url, token.clone())),
            SentimentExtractor::new(
                Arc::new(HttpSentimentScorer::new(client, &config.sentiment_url, token)),
                counter,
                config.sentiment_max_tokens,
            ),
        ))
    }

    /// Run every capability on `text` and merge the results.
    ///
    /// Blank input is rejected before any capability runs. Capabilities run
    /// one after another; the first failure aborts the whole extraction.
    pub async fn extract_metadata(&self, text: &str) -> Result<ExtractionResult> {
        if text.trim().is_empty() {
            return Err(RettamError::EmptyInput);
        }

        let started = Instant::now();
        let syntax = self.syntax.analyze(text).await?;
        let tagged = self.tagger.tag(text).await?;
        let sentiment = self.sentiment.extract(text).await?;

        let result = ExtractionResult::from_fragments(syntax, tagged, sentiment)?;

        tracing::info!(
            text_len = text.len(),
            entities = result.entities.len(),
            dependencies = result.dependencies.len(),
            hf_entities = result.hf_entities.len(),
            sentiment_chunks = result.sentiment.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Metadata extracted"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingTagger, FakeCapabilities, WhitespaceCounter};
    use rettam_core::Capability;

    #[tokio::test]
    async fn test_extract_metadata_merges_all_capabilities() {
        let fakes = FakeCapabilities::new();
        let extractor = fakes.extractor(512);

        let result = extractor
            .extract_metadata("Anna met Bruno in Berlin. They had coffee.")
            .await
            .unwrap();

        let entity_texts: Vec<&str> = result.entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(entity_texts, vec!["Anna", "Bruno", "Berlin", "They"]);
        assert!(!result.dependencies.is_empty());
        assert_eq!(result.hf_entities.len(), 4);
        assert_eq!(result.sentiment.len(), 1);

        let value = serde_json::to_value(&result).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ExtractionResult::KEYS.to_vec());
    }

    #[tokio::test]
    async fn test_blank_input_rejected_without_calls() {
        let fakes = FakeCapabilities::new();
        let extractor = fakes.extractor(512);

        for text in ["", "   ", "\n\t"] {
            let err = extractor.extract_metadata(text).await.unwrap_err();
            assert!(matches!(err, RettamError::EmptyInput));
        }
        assert_eq!(fakes.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_capability_failure_aborts() {
        let fakes = FakeCapabilities::new();
        let extractor = MetadataExtractor::new(
            fakes.syntax.clone(),
            Arc::new(FailingTagger),
            SentimentExtractor::new(fakes.sentiment.clone(), Arc::new(WhitespaceCounter), 512),
        );

        let err = extractor.extract_metadata("Anna sings.").await.unwrap_err();
        assert!(matches!(
            err,
            RettamError::ExtractionFailure {
                capability: Capability::EntityTagging,
                ..
            }
        ));
        // Sentiment never ran after the tagger failed
        assert!(fakes.sentiment.chunks().is_empty());
    }

    #[tokio::test]
    async fn test_long_text_yields_one_sentiment_per_chunk() {
        let fakes = FakeCapabilities::new();
        let extractor = fakes.extractor(7);

        let result = extractor
            .extract_metadata("a b c. d e f. g h i. j k l")
            .await
            .unwrap();

        assert_eq!(result.sentiment.len(), fakes.sentiment.chunks().len());
        assert_eq!(result.sentiment.len(), 2);
    }

    #[test]
    fn test_from_config() {
        let mut config = ModelsConfig::default();
        config.tokenizer_url = Some("http://localhost:3018/tokenize".to_string());
        assert!(MetadataExtractor::from_config(&config).is_ok());
    }
}

//! Sentiment analysis over sentence-aligned chunks

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use rettam_core::{
    normalize_score, Capability, Result, SentimentAnalysis, SentimentScore, SentimentScorer,
    TokenCounter,
};
use serde::Deserialize;

use crate::chunker::SentenceChunker;
use crate::client::{InferenceRequest, ModelEndpoint};

#[derive(Debug, Clone, Deserialize)]
struct RawScore {
    label: String,
    score: f32,
}

/// Text-classification servers answer either flat or batched
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawScores {
    Flat(Vec<RawScore>),
    Batched(Vec<Vec<RawScore>>),
}

impl RawScores {
    fn into_scores(self) -> Result<Vec<SentimentScore>> {
        let raw = match self {
            Self::Flat(scores) => scores,
            Self::Batched(batches) => batches.into_iter().flatten().collect(),
        };
        raw.into_iter()
            .map(|s| {
                Ok(SentimentScore {
                    label: s.label,
                    score: normalize_score(s.score, Capability::Sentiment)?,
                })
            })
            .collect()
    }
}

/// HTTP client for the text-classification endpoint
pub struct HttpSentimentScorer {
    endpoint: ModelEndpoint,
}

impl HttpSentimentScorer {
    pub fn new(client: Client, url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            endpoint: ModelEndpoint::new(client, url, Capability::Sentiment).with_token(api_token),
        }
    }
}

#[async_trait]
impl SentimentScorer for HttpSentimentScorer {
    async fn score(&self, chunk: &str) -> Result<Vec<SentimentScore>> {
        let raw: RawScores = self.endpoint.post(&InferenceRequest { inputs: chunk }).await?;
        raw.into_scores()
    }
}

/// Chunks the input and scores every chunk in order
pub struct SentimentExtractor {
    scorer: Arc<dyn SentimentScorer>,
    counter: Arc<dyn TokenCounter>,
    chunker: SentenceChunker,
}

impl SentimentExtractor {
    pub fn new(
        scorer: Arc<dyn SentimentScorer>,
        counter: Arc<dyn TokenCounter>,
        max_tokens: usize,
    ) -> Self {
        Self {
            scorer,
            counter,
            chunker: SentenceChunker::new(max_tokens),
        }
    }

    pub async fn extract(&self, text: &str) -> Result<SentimentAnalysis> {
        let chunks = self.chunker.chunk(text, self.counter.as_ref()).await?;
        tracing::debug!(
            chunks = chunks.len(),
            max_tokens = self.chunker.max_tokens(),
            "Scoring sentiment"
        );

        let mut sentiment = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            sentiment.extend(self.scorer.score(chunk).await?);
        }
        Ok(SentimentAnalysis { sentiment })
    }
}

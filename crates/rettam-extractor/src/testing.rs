//! In-process capabilities for tests
//!
//! Enabled for this crate's own tests and, through the `test-utils`
//! feature, for dependent crates.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rettam_core::{
    Capability, Dependency, Entity, EntityTagger, NounChunk, Result, RettamError,
    SentimentScore, SentimentScorer, SyntaxAnalysis, SyntaxAnalyzer, TaggedEntities,
    TaggedEntity, TokenCounter,
};

use crate::{MetadataExtractor, SentimentExtractor};

/// Counts whitespace-separated words exactly
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceCounter;

#[async_trait]
impl TokenCounter for WhitespaceCounter {
    async fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(text.split_whitespace().count())
    }
}

/// Treats capitalized words as entities and links each word to its
/// predecessor, which is enough structure for graph and API tests.
#[derive(Debug, Default)]
pub struct CapitalizedSyntaxAnalyzer {
    calls: AtomicUsize,
}

impl CapitalizedSyntaxAnalyzer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyntaxAnalyzer for CapitalizedSyntaxAnalyzer {
    async fn analyze(&self, text: &str) -> Result<SyntaxAnalysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut entities = Vec::new();
        let mut noun_chunks = Vec::new();
        let mut offset = 0;
        let mut words = Vec::new();
        for word in text.split_whitespace() {
            let start = offset + text[offset..].find(word).unwrap_or(0);
            let end = start + word.len();
            offset = end;

            let clean = word.trim_matches(|c: char| !c.is_alphanumeric());
            if clean.is_empty() {
                continue;
            }
            if clean.chars().next().is_some_and(char::is_uppercase) {
                entities.push(Entity {
                    text: clean.to_string(),
                    label: "PROPN".to_string(),
                    start_offset: start,
                    end_offset: start + clean.len(),
                });
                noun_chunks.push(NounChunk {
                    text: clean.to_string(),
                    root: clean.to_string(),
                    start_offset: start,
                    end_offset: start + clean.len(),
                });
            }
            words.push(clean.to_string());
        }

        let dependencies = words
            .windows(2)
            .map(|pair| Dependency {
                source_token: pair[0].clone(),
                target_token: pair[1].clone(),
                relation: "next".to_string(),
            })
            .collect();

        Ok(SyntaxAnalysis {
            entities,
            noun_chunks,
            dependencies,
        })
    }
}

/// Tags every capitalized word as a person
#[derive(Debug, Default)]
pub struct CapitalizedTagger {
    calls: AtomicUsize,
}

impl CapitalizedTagger {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityTagger for CapitalizedTagger {
    async fn tag(&self, text: &str) -> Result<TaggedEntities> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let hf_entities = text
            .split_whitespace()
            .enumerate()
            .filter(|(_, w)| w.chars().next().is_some_and(char::is_uppercase))
            .map(|(i, w)| TaggedEntity {
                word: w.to_string(),
                entity_label: "I-PER".to_string(),
                score: f64::from(0.99_f32),
                position: i + 1,
                start: None,
                end: None,
            })
            .collect();
        Ok(TaggedEntities { hf_entities })
    }
}

/// Scores every chunk as positive and remembers what it was given
#[derive(Debug, Default)]
pub struct RecordingSentimentScorer {
    chunks: Mutex<Vec<String>>,
}

impl RecordingSentimentScorer {
    pub fn chunks(&self) -> Vec<String> {
        self.chunks.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SentimentScorer for RecordingSentimentScorer {
    async fn score(&self, chunk: &str) -> Result<Vec<SentimentScore>> {
        if let Ok(mut chunks) = self.chunks.lock() {
            chunks.push(chunk.to_string());
        }
        Ok(vec![SentimentScore {
            label: "POSITIVE".to_string(),
            score: 0.5,
        }])
    }
}

/// Always fails, as an unreachable model service would
#[derive(Debug, Clone, Copy)]
pub struct FailingTagger;

#[async_trait]
impl EntityTagger for FailingTagger {
    async fn tag(&self, _text: &str) -> Result<TaggedEntities> {
        Err(RettamError::extraction(
            Capability::EntityTagging,
            "model service unavailable",
        ))
    }
}

/// Fakes wired into an extractor, with handles for assertions
pub struct FakeCapabilities {
    pub syntax: Arc<CapitalizedSyntaxAnalyzer>,
    pub tagger: Arc<CapitalizedTagger>,
    pub sentiment: Arc<RecordingSentimentScorer>,
}

impl FakeCapabilities {
    pub fn new() -> Self {
        Self {
            syntax: Arc::new(CapitalizedSyntaxAnalyzer::default()),
            tagger: Arc::new(CapitalizedTagger::default()),
            sentiment: Arc::new(RecordingSentimentScorer::default()),
        }
    }

    /// Build an extractor over these fakes with the given token limit
    pub fn extractor(&self, max_tokens: usize) -> MetadataExtractor {
        MetadataExtractor::new(
            self.syntax.clone(),
            self.tagger.clone(),
            SentimentExtractor::new(self.sentiment.clone(), Arc::new(WhitespaceCounter), max_tokens),
        )
    }

    /// Total capability invocations so far
    pub fn total_calls(&self) -> usize {
        self.syntax.calls() + self.tagger.calls() + self.sentiment.chunks().len()
    }
}

impl Default for FakeCapabilities {
    fn default() -> Self {
        Self::new()
    }
}

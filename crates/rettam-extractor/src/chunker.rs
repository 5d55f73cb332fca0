//! Sentence-aligned chunking for length-limited models
//!
//! Text is split on `". "` and sentences are packed greedily into chunks
//! whose token count stays strictly below the model's maximum sequence
//! length. Chunks keep their original separators, so joining them with a
//! single space gives back the input.

use async_trait::async_trait;
use reqwest::Client;
use rettam_core::{Capability, Result, TokenCounter};

use crate::client::{InferenceRequest, ModelEndpoint};

/// Sentence boundary marker
pub const SENTENCE_SEPARATOR: &str = ". ";

/// Split `text` into sentences, keeping each sentence's closing period
pub fn split_sentences(text: &str) -> Vec<String> {
    let pieces: Vec<&str> = text.split(SENTENCE_SEPARATOR).collect();
    let last = pieces.len().saturating_sub(1);

    pieces
        .iter()
        .enumerate()
        .map(|(i, piece)| {
            if i < last {
                format!("{piece}.")
            } else {
                (*piece).to_string()
            }
        })
        .filter(|sentence| !sentence.trim().is_empty())
        .collect()
}

/// Greedy sentence packer
#[derive(Debug, Clone, Copy)]
pub struct SentenceChunker {
    max_tokens: usize,
}

impl SentenceChunker {
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens }
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Pack the sentences of `text` into chunks that fit the model.
    ///
    /// A sentence that alone exceeds the limit becomes its own chunk.
    pub async fn chunk(&self, text: &str, counter: &dyn TokenCounter) -> Result<Vec<String>> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for sentence in split_sentences(text) {
            if current.is_empty() {
                current = sentence;
                continue;
            }

            let candidate = format!("{current} {sentence}");
            if counter.count_tokens(&candidate).await? < self.max_tokens {
                current = candidate;
            } else {
                chunks.push(current.trim().to_string());
                current = sentence;
            }
        }

        if !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
        }

        tracing::debug!(
            chunks = chunks.len(),
            max_tokens = self.max_tokens,
            "Split text for sentiment scoring"
        );
        Ok(chunks)
    }
}

/// Word-based token estimate for subword tokenizers.
///
/// Assumes roughly four tokens per three words plus the two special tokens
/// a classifier adds around every sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordEstimateCounter;

impl WordEstimateCounter {
    pub fn estimate(text: &str) -> usize {
        let words = text.split_whitespace().count();
        (words * 4).div_ceil(3) + 2
    }
}

#[async_trait]
impl TokenCounter for WordEstimateCounter {
    async fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(Self::estimate(text))
    }
}

/// Token counter backed by the model server's tokenize endpoint
pub struct HttpTokenCounter {
    endpoint: ModelEndpoint,
}

impl HttpTokenCounter {
    pub fn new(client: Client, url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            endpoint: ModelEndpoint::new(client, url, Capability::Tokenizer).with_token(api_token),
        }
    }
}

#[async_trait]
impl TokenCounter for HttpTokenCounter {
    async fn count_tokens(&self, text: &str) -> Result<usize> {
        let tokens: Vec<serde_json::Value> =
            self.endpoint.post(&InferenceRequest { inputs: text }).await?;
        Ok(tokens.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::WhitespaceCounter;
    use proptest::prelude::*;

    #[test]
    fn test_split_sentences_restores_periods() {
        assert_eq!(
            split_sentences("The fox jumps. The dog sleeps. Done."),
            vec!["The fox jumps.", "The dog sleeps.", "Done."]
        );
        assert_eq!(split_sentences("no separator"), vec!["no separator"]);
        assert!(split_sentences("   ").is_empty());
    }

    #[tokio::test]
    async fn test_short_text_is_one_chunk() {
        let chunker = SentenceChunker::new(512);
        let text = "The quick brown fox jumps over the lazy dog. This is a test paragraph.";

        let chunks = chunker.chunk(text, &WordEstimateCounter).await.unwrap();
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[tokio::test]
    async fn test_split_when_limit_reached() {
        // 3 words per sentence; two fit under 7, a third would make 9
        let chunker = SentenceChunker::new(7);
        let text = "a b c. d e f. g h i. j k l";

        let chunks = chunker.chunk(text, &WhitespaceCounter).await.unwrap();
        assert_eq!(chunks, vec!["a b c. d e f.", "g h i. j k l"]);
    }

    #[tokio::test]
    async fn test_oversized_sentence_gets_own_chunk() {
        let chunker = SentenceChunker::new(3);
        let text = "one two three four five. six";

        let chunks = chunker.chunk(text, &WhitespaceCounter).await.unwrap();
        assert_eq!(chunks, vec!["one two three four five.", "six"]);
    }

    #[tokio::test]
    async fn test_leading_whitespace_trimmed() {
        let chunker = SentenceChunker::new(512);
        let chunks = chunker
            .chunk("\n        The fox. The dog.\n    ", &WhitespaceCounter)
            .await
            .unwrap();
        assert_eq!(chunks, vec!["The fox. The dog."]);
    }

    #[test]
    fn test_word_estimate() {
        assert_eq!(WordEstimateCounter::estimate(""), 2);
        assert_eq!(WordEstimateCounter::estimate("one two three"), 6);
    }

    fn sentence() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z]{1,8}", 1..12).prop_map(|words| words.join(" "))
    }

    proptest! {
        #[test]
        fn prop_chunks_reconstruct_sentences(
            sentences in prop::collection::vec(sentence(), 1..20),
            max_tokens in 1usize..40,
        ) {
            let text = sentences.join(SENTENCE_SEPARATOR);
            let chunker = SentenceChunker::new(max_tokens);
            let chunks = tokio_test::block_on(chunker.chunk(&text, &WhitespaceCounter)).unwrap();

            prop_assert!(!chunks.is_empty());
            prop_assert!(chunks.iter().all(|c| !c.is_empty()));
            prop_assert_eq!(chunks.join(" "), text);

            // Every multi-sentence chunk respects the limit
            for chunk in &chunks {
                if split_sentences(chunk).len() > 1 {
                    prop_assert!(chunk.split_whitespace().count() < max_tokens);
                }
            }
        }
    }
}

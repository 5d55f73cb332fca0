//! rettam Core - Data model, traits, and shared types
//!
//! This crate defines the abstractions shared by the rest of the workspace:
//! - Extraction result model (entities, noun chunks, dependencies, tagger
//!   output, sentiment) and its typed fragments
//! - Common error types
//! - Capability traits implemented by model clients
//! - Configuration management
//! - Diagnostic dumps of nested JSON

pub mod config;
pub mod diagnostics;

pub use config::{
    AppConfig, ConfigError, LoggingConfig, ModelsConfig, ServerConfig, StoreConfig,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// The extraction capabilities an aggregation fans out to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Syntax,
    EntityTagging,
    Sentiment,
    Tokenizer,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::EntityTagging => write!(f, "entity tagging"),
            Self::Sentiment => write!(f, "sentiment"),
            Self::Tokenizer => write!(f, "tokenizer"),
        }
    }
}

/// Core error types for rettam operations
#[derive(Error, Debug)]
pub enum RettamError {
    #[error("No text provided")]
    EmptyInput,

    #[error("{capability} extraction failed: {message}")]
    ExtractionFailure {
        capability: Capability,
        message: String,
    },

    #[error("Metadata key collision: {0}")]
    KeyCollision(String),

    #[error("Storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Exploration not found: {0}")]
    NotFound(String),

    #[error("Exploration already exists: {0}")]
    ExplorationExists(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RettamError {
    /// Shorthand for a failed capability call
    pub fn extraction(capability: Capability, message: impl Into<String>) -> Self {
        Self::ExtractionFailure {
            capability,
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput | Self::NotFound(_) | Self::ExplorationExists(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RettamError>;

// ============================================================================
// Extraction Model
// ============================================================================

/// Named entity span found by the syntactic analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    /// Semantic category (e.g. "PERSON", "ORG", "GPE")
    pub label: String,
    #[serde(rename = "start")]
    pub start_offset: usize,
    #[serde(rename = "end")]
    pub end_offset: usize,
}

/// Base noun phrase with its syntactic root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NounChunk {
    pub text: String,
    pub root: String,
    #[serde(rename = "start")]
    pub start_offset: usize,
    #[serde(rename = "end")]
    pub end_offset: usize,
}

/// Directed head -> dependent edge labeled with its grammatical relation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "source")]
    pub source_token: String,
    #[serde(rename = "target")]
    pub target_token: String,
    pub relation: String,
}

/// Token-level entity prediction from the independent tagger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedEntity {
    pub word: String,
    /// BIO-style label (e.g. "I-PER")
    #[serde(rename = "entity")]
    pub entity_label: String,
    pub score: f64,
    /// Token index in the tagger's tokenization
    #[serde(rename = "index")]
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
}

/// Sentiment label for one chunk of input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub label: String,
    pub score: f64,
}

/// User-supplied annotation attached to a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanTag {
    pub text: String,
    pub tag: String,
    pub start: usize,
    pub end: usize,
}

/// Output of the syntactic/entity analysis capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyntaxAnalysis {
    pub entities: Vec<Entity>,
    pub noun_chunks: Vec<NounChunk>,
    pub dependencies: Vec<Dependency>,
}

/// Output of the named-entity tagging capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaggedEntities {
    pub hf_entities: Vec<TaggedEntity>,
}

/// Output of the sentiment capability, one score per chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub sentiment: Vec<SentimentScore>,
}

/// Merged metadata for one text input
///
/// Missing sections deserialize as empty so older stored results still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionResult {
    pub entities: Vec<Entity>,
    pub noun_chunks: Vec<NounChunk>,
    pub dependencies: Vec<Dependency>,
    pub hf_entities: Vec<TaggedEntity>,
    pub sentiment: Vec<SentimentScore>,
}

impl ExtractionResult {
    /// Top-level keys of a serialized result
    pub const KEYS: [&'static str; 5] = [
        "entities",
        "noun_chunks",
        "dependencies",
        "hf_entities",
        "sentiment",
    ];

    /// Union of the three capability outputs.
    ///
    /// Fails with [`RettamError::KeyCollision`] if two fragments ever
    /// serialize the same top-level key.
    pub fn from_fragments(
        syntax: SyntaxAnalysis,
        tagged: TaggedEntities,
        sentiment: SentimentAnalysis,
    ) -> Result<Self> {
        let merged = merge_disjoint([
            serde_json::to_value(syntax)?,
            serde_json::to_value(tagged)?,
            serde_json::to_value(sentiment)?,
        ])?;
        Ok(serde_json::from_value(Value::Object(merged))?)
    }
}

/// Flat union of JSON objects whose key sets must not overlap
pub fn merge_disjoint(fragments: impl IntoIterator<Item = Value>) -> Result<Map<String, Value>> {
    let mut merged = Map::new();
    for fragment in fragments {
        let Value::Object(fields) = fragment else {
            return Err(RettamError::Other(anyhow::anyhow!(
                "metadata fragment is not a JSON object"
            )));
        };
        for (key, value) in fields {
            if merged.contains_key(&key) {
                return Err(RettamError::KeyCollision(key));
            }
            merged.insert(key, value);
        }
    }
    Ok(merged)
}

/// Extraction result as returned by `/breakup` and stored with an exploration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedResult {
    #[serde(flatten)]
    pub extraction: ExtractionResult,
    #[serde(default)]
    pub human_tags: Vec<HumanTag>,
}

impl From<ExtractionResult> for AnnotatedResult {
    fn from(extraction: ExtractionResult) -> Self {
        Self {
            extraction,
            human_tags: Vec::new(),
        }
    }
}

// ============================================================================
// Capability Traits
// ============================================================================

/// Syntactic analysis: entities, noun chunks and dependency edges
#[async_trait]
pub trait SyntaxAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<SyntaxAnalysis>;
}

/// Token-level named-entity tagging
#[async_trait]
pub trait EntityTagger: Send + Sync {
    async fn tag(&self, text: &str) -> Result<TaggedEntities>;
}

/// Sentiment classification of a single chunk that fits the model input
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(&self, chunk: &str) -> Result<Vec<SentimentScore>>;
}

/// Token counting with the sentiment model's tokenizer
#[async_trait]
pub trait TokenCounter: Send + Sync {
    async fn count_tokens(&self, text: &str) -> Result<usize>;
}

/// Convert a model's `f32` score into the `f64` used in results
pub fn normalize_score(score: f32, capability: Capability) -> Result<f64> {
    if !score.is_finite() {
        return Err(RettamError::extraction(
            capability,
            format!("model returned non-finite score {score}"),
        ));
    }
    Ok(f64::from(score))
}

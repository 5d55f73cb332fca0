//! Syntactic analysis client
//!
//! The syntax service returns a parsed document: entity spans, noun chunks
//! and the token list with head indices. Dependency edges are derived here
//! from the tokens, skipping the sentence roots.

use async_trait::async_trait;
use reqwest::Client;
use rettam_core::{
    Capability, Dependency, Entity, NounChunk, Result, SyntaxAnalysis, SyntaxAnalyzer,
};
use serde::{Deserialize, Serialize};

use crate::client::ModelEndpoint;

/// Relation label of a sentence root, which points at itself
pub const ROOT_RELATION: &str = "ROOT";

/// Token as returned by the syntax service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedToken {
    pub text: String,
    pub dep: String,
    /// Index of the syntactic head in the document's token list
    pub head: usize,
}

/// Parsed document as returned by the syntax service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDoc {
    #[serde(default)]
    pub ents: Vec<Entity>,
    #[serde(default)]
    pub noun_chunks: Vec<NounChunk>,
    #[serde(default)]
    pub tokens: Vec<ParsedToken>,
}

impl ParsedDoc {
    /// Convert into the extraction fragment.
    ///
    /// Fails if a token's head index is outside the token list.
    pub fn into_analysis(self) -> std::result::Result<SyntaxAnalysis, String> {
        let dependencies = dependencies_from_tokens(&self.tokens)?;
        Ok(SyntaxAnalysis {
            entities: self.ents,
            noun_chunks: self.noun_chunks,
            dependencies,
        })
    }
}

/// Head -> dependent edges for every non-root token, in token order
pub fn dependencies_from_tokens(
    tokens: &[ParsedToken],
) -> std::result::Result<Vec<Dependency>, String> {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| token.dep != ROOT_RELATION)
        .map(|(index, token)| {
            let head = tokens.get(token.head).ok_or_else(|| {
                format!(
                    "token {index} ({:?}) has head {} outside {} tokens",
                    token.text,
                    token.head,
                    tokens.len()
                )
            })?;
            Ok(Dependency {
                source_token: head.text.clone(),
                target_token: token.text.clone(),
                relation: token.dep.clone(),
            })
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
}

/// HTTP client for the syntax service
pub struct HttpSyntaxAnalyzer {
    endpoint: ModelEndpoint,
}

impl HttpSyntaxAnalyzer {
    pub fn new(client: Client, url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            endpoint: ModelEndpoint::new(client, url, Capability::Syntax).with_token(api_token),
        }
    }
}

#[async_trait]
impl SyntaxAnalyzer for HttpSyntaxAnalyzer {
    async fn analyze(&self, text: &str) -> Result<SyntaxAnalysis> {
        let doc: ParsedDoc = self.endpoint.post(&AnalyzeRequest { text }).await?;
        tracing::trace!(
            tokens = doc.tokens.len(),
            entities = doc.ents.len(),
            "Syntax service responded"
        );
        doc.into_analysis().map_err(|msg| self.endpoint.failure(msg))
    }
}

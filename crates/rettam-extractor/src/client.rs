//! Shared HTTP plumbing for model services
//!
//! Every capability is a JSON-over-HTTP endpoint; this wraps the request,
//! status check and decoding so failures surface as extraction errors
//! tagged with the capability that failed.

use reqwest::Client;
use rettam_core::{Capability, RettamError, Result};
use serde::{de::DeserializeOwned, Serialize};

/// A single model service endpoint
#[derive(Debug, Clone)]
pub struct ModelEndpoint {
    client: Client,
    url: String,
    api_token: Option<String>,
    capability: Capability,
}

/// Request body understood by inference servers
#[derive(Debug, Serialize)]
pub(crate) struct InferenceRequest<'a> {
    pub inputs: &'a str,
}

impl ModelEndpoint {
    /// Create a new endpoint for `capability`
    pub fn new(client: Client, url: impl Into<String>, capability: Capability) -> Self {
        Self {
            client,
            url: url.into(),
            api_token: None,
            capability,
        }
    }

    /// Send a bearer token with every request
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.api_token = token;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// POST `body` and decode the JSON response
    pub(crate) async fn post<B, R>(&self, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.client.post(&self.url).json(body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.failure(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(self.failure(format!("{} returned {status}: {error_text}", self.url)));
        }

        response
            .json()
            .await
            .map_err(|e| self.failure(format!("Failed to parse response: {e}")))
    }

    pub(crate) fn failure(&self, message: impl Into<String>) -> RettamError {
        RettamError::extraction(self.capability, message)
    }
}

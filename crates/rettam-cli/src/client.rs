//! Client for the extraction API

use anyhow::{bail, Context, Result};
use rettam_core::AnnotatedResult;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct BreakupRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

/// Talks to a running `rettam-api`
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `/breakup` and return the annotated metadata
    pub async fn breakup(&self, text: &str) -> Result<AnnotatedResult> {
        let url = format!("{}/breakup", self.base_url);
        tracing::debug!(url = %url, text_len = text.len(), "Requesting extraction");

        let response = self
            .client
            .post(&url)
            .json(&BreakupRequest { text })
            .send()
            .await
            .with_context(|| format!("could not reach {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(ErrorBody {
                    error,
                    details: Some(details),
                }) => format!("{error}: {details}"),
                Ok(ErrorBody { error, .. }) => error,
                Err(_) => body,
            };
            bail!("API returned {status}: {message}");
        }

        response
            .json::<AnnotatedResult>()
            .await
            .context("invalid extraction response")
    }
}

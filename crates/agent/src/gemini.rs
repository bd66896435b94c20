use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use unikron_core::config::LlmConfig;
use unikron_core::diagnostics::{ServiceCheck, ServiceProbe};
use unikron_core::service::Service;

use crate::llm::LlmClient;

pub const GEMINI_SERVICE_NAME: &str = "gemini";

/// Google Generative Language REST client (`generateContent`).
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(http: Client, api_key: SecretString, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self { http, api_key, base_url: base_url.into().trim_end_matches('/').to_string(), model: model.into() }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Service<Self>, reqwest::Error> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(Service::unconfigured("llm.api_key is not set"));
        };

        let http = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;

        Ok(Service::Configured(Self::new(http, api_key, &config.base_url, &config.model)))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .http
            .get(format!("{}/v1/models", self.base_url))
            .query(&[("key", self.api_key.expose_secret())])
            .send()
            .await
            .context("model listing request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("model listing returned {}", response.status()));
        }

        let listing: ModelListing =
            response.json().await.context("failed to decode model listing")?;
        Ok(listing.models.into_iter().map(|model| model.name).collect())
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content { parts: vec![Part { text: prompt.to_string() }] }],
        };

        debug!(event_name = "llm.generate.request", model = %self.model, "calling gemini");
        let response = self
            .http
            .post(format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model))
            .query(&[("key", self.api_key.expose_secret())])
            .json(&request)
            .send()
            .await
            .context("generateContent request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("generateContent returned {}", response.status()));
        }

        let body: GenerateContentResponse =
            response.json().await.context("failed to decode generateContent response")?;
        extract_text(body)
    }
}

/// Diagnostics probe: a key is only reported healthy once the model listing succeeds.
pub struct GeminiProbe {
    client: Service<GeminiClient>,
}

impl GeminiProbe {
    pub fn new(client: Service<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ServiceProbe for GeminiProbe {
    fn service_name(&self) -> &str {
        GEMINI_SERVICE_NAME
    }

    async fn probe(&self) -> ServiceCheck {
        let client = match &self.client {
            Service::Configured(client) => client,
            Service::Unconfigured { .. } => return ServiceCheck::key_missing(),
        };

        match client.list_models().await {
            Ok(models) => models_check(&models, client.model()),
            Err(error) => {
                warn!(event_name = "diagnostics.gemini.failed", error = %error, "gemini probe failed");
                ServiceCheck::error(error.to_string())
            }
        }
    }
}

fn models_check(models: &[String], configured_model: &str) -> ServiceCheck {
    let listed = models.iter().any(|name| name.trim_start_matches("models/") == configured_model);
    if listed {
        ServiceCheck::ok("Key valid & models found")
    } else {
        ServiceCheck::ok("Key valid but models limited")
    }
}

fn extract_text(body: GenerateContentResponse) -> Result<String> {
    let text = body
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().map(|part| part.text).collect::<Vec<_>>().join(""))
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(anyhow!("generateContent returned no text"));
    }
    Ok(text)
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ModelListing {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use unikron_core::config::RenderConfig;
use unikron_core::diagnostics::{ServiceCheck, ServiceProbe};
use unikron_core::domain::design::RenderedDesign;
use unikron_core::fallback::FallbackPolicy;
use unikron_core::service::Service;

pub const NANO_BANANA_SERVICE_NAME: &str = "nano_banana";

/// One floor-plan upload to be turned into a 3D rendering.
#[derive(Clone, Debug)]
pub struct RenderRequest {
    pub image: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
    pub style: String,
    pub prompt: Option<String>,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("render endpoint returned {0}")]
    Status(u16),
    #[error("render response was missing `{0}`")]
    IncompleteResponse(&'static str),
}

#[async_trait]
pub trait RenderClient: Send + Sync {
    async fn render(&self, request: RenderRequest) -> Result<RenderedDesign, RenderError>;
}

#[derive(Clone)]
pub struct NanoBananaClient {
    http: Client,
    api_key: SecretString,
    endpoint: String,
}

impl NanoBananaClient {
    pub fn new(http: Client, api_key: SecretString, endpoint: impl Into<String>) -> Self {
        Self { http, api_key, endpoint: endpoint.into() }
    }

    pub fn from_config(config: &RenderConfig) -> Result<Service<Self>, reqwest::Error> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(Service::unconfigured("render.api_key is not set"));
        };

        let http = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Service::Configured(Self::new(http, api_key, &config.endpoint)))
    }
}

#[async_trait]
impl RenderClient for NanoBananaClient {
    async fn render(&self, request: RenderRequest) -> Result<RenderedDesign, RenderError> {
        let image = Part::bytes(request.image)
            .file_name(request.file_name)
            .mime_str(&request.content_type)?;
        let mut form = Form::new().part("image", image).text("style", request.style);
        if let Some(prompt) = request.prompt {
            form = form.text("prompt", prompt);
        }

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RenderError::Status(response.status().as_u16()));
        }

        let body: RenderResponse = response.json().await?;
        design_from_response(body)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderResponse {
    image_url: Option<String>,
    id: Option<String>,
}

fn design_from_response(body: RenderResponse) -> Result<RenderedDesign, RenderError> {
    let image_url = body
        .image_url
        .filter(|url| !url.trim().is_empty())
        .ok_or(RenderError::IncompleteResponse("imageUrl"))?;
    let id = body.id.filter(|id| !id.trim().is_empty()).ok_or(RenderError::IncompleteResponse("id"))?;
    Ok(RenderedDesign { image_url, id, fallback: false })
}

/// Render front door: always yields a design, substituting the fallback when
/// the renderer is missing or failing.
pub struct RenderService {
    client: Service<Arc<dyn RenderClient>>,
    fallback: FallbackPolicy,
}

impl RenderService {
    pub fn new(client: Service<Arc<dyn RenderClient>>, fallback: FallbackPolicy) -> Self {
        Self { client, fallback }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    pub async fn generate(&self, request: RenderRequest) -> RenderedDesign {
        let client = match &self.client {
            Service::Configured(client) => client,
            Service::Unconfigured { reason } => {
                info!(event_name = "render.fallback", reason = %reason, "renderer not configured, serving demo design");
                return self.fallback.fallback_design();
            }
        };

        let style = request.style.clone();
        match client.render(request).await {
            Ok(design) => {
                info!(event_name = "render.completed", style = %style, design_id = %design.id, "design rendered");
                design
            }
            Err(error) => {
                warn!(event_name = "render.failed", style = %style, error = %error, "renderer failed, serving demo design");
                self.fallback.fallback_design()
            }
        }
    }
}

/// Key presence only; the renderer exposes no cheap authenticated endpoint.
pub struct NanoBananaProbe {
    configured: bool,
}

impl NanoBananaProbe {
    pub fn new(configured: bool) -> Self {
        Self { configured }
    }
}

#[async_trait]
impl ServiceProbe for NanoBananaProbe {
    fn service_name(&self) -> &str {
        NANO_BANANA_SERVICE_NAME
    }

    async fn probe(&self) -> ServiceCheck {
        if self.configured {
            ServiceCheck::ok("Key present (deployment check required for full validation)")
        } else {
            ServiceCheck::key_missing()
        }
    }
}

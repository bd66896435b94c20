use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use unikron_core::config::PaymentConfig;
use unikron_core::diagnostics::{ServiceCheck, ServiceProbe};
use unikron_core::service::Service;

pub const STRIPE_SERVICE_NAME: &str = "stripe";
pub const STRIPE_API_VERSION: &str = "2025-01-27.acacia";
const PRODUCT_DESCRIPTION: &str = "Full architectural report and high-resolution 3D renders.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Whole currency units, e.g. `7700.50`.
    pub amount: Decimal,
    pub style_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("payment service is not configured: {0}")]
    Unconfigured(String),
    #[error("invalid checkout amount: {0}")]
    InvalidAmount(String),
    #[error("payment provider error: {0}")]
    Provider(String),
}

#[async_trait]
pub trait CheckoutClient: Send + Sync {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, CheckoutError>;
}

/// Converts a whole-unit amount to the provider's minor units (`round(amount * 100)`).
pub fn to_minor_units(amount: Decimal) -> Result<i64, CheckoutError> {
    if amount <= Decimal::ZERO {
        return Err(CheckoutError::InvalidAmount(format!("{amount} must be greater than zero")));
    }

    let cents = amount
        .checked_mul(Decimal::from(100))
        .ok_or_else(|| CheckoutError::InvalidAmount(format!("{amount} is too large to charge")))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    cents
        .to_i64()
        .filter(|cents| *cents > 0)
        .ok_or_else(|| CheckoutError::InvalidAmount(format!("{amount} cannot be charged")))
}

pub fn product_name(style_name: &str) -> String {
    format!("Unikron Project Finalization - {style_name} Design")
}

#[derive(Clone)]
pub struct StripeClient {
    http: Client,
    secret_key: SecretString,
    api_base_url: String,
    public_base_url: String,
    currency: String,
}

impl StripeClient {
    pub fn new(http: Client, secret_key: SecretString, config: &PaymentConfig) -> Self {
        Self {
            http,
            secret_key,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            currency: config.currency.to_ascii_lowercase(),
        }
    }

    pub fn from_config(config: &PaymentConfig) -> Result<Service<Self>, reqwest::Error> {
        let Some(secret_key) = config.secret_key.clone() else {
            return Ok(Service::unconfigured("payment.secret_key is not set"));
        };

        let http = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Service::Configured(Self::new(http, secret_key, config)))
    }

    /// Form body for `POST /v1/checkout/sessions` in Stripe's bracketed encoding.
    fn session_form(&self, unit_amount: i64, style_name: &str) -> Vec<(String, String)> {
        vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("line_items[0][price_data][currency]".to_string(), self.currency.clone()),
            ("line_items[0][price_data][unit_amount]".to_string(), unit_amount.to_string()),
            ("line_items[0][price_data][product_data][name]".to_string(), product_name(style_name)),
            (
                "line_items[0][price_data][product_data][description]".to_string(),
                PRODUCT_DESCRIPTION.to_string(),
            ),
            (
                "success_url".to_string(),
                format!("{}/success?session_id={{CHECKOUT_SESSION_ID}}", self.public_base_url),
            ),
            ("cancel_url".to_string(), format!("{}/", self.public_base_url)),
        ]
    }

    async fn list_payment_intents(&self) -> Result<(), CheckoutError> {
        let response = self
            .http
            .get(format!("{}/v1/payment_intents", self.api_base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .header("Stripe-Version", STRIPE_API_VERSION)
            .query(&[("limit", "1")])
            .send()
            .await
            .map_err(|error| CheckoutError::Provider(error.to_string()))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }
        Ok(())
    }
}

#[async_trait]
impl CheckoutClient for StripeClient {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, CheckoutError> {
        let unit_amount = to_minor_units(request.amount)?;
        let form = self.session_form(unit_amount, &request.style_name);

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .header("Stripe-Version", STRIPE_API_VERSION)
            .form(&form)
            .send()
            .await
            .map_err(|error| CheckoutError::Provider(format!("session request failed: {error}")))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let session: StripeSession = response
            .json()
            .await
            .map_err(|error| CheckoutError::Provider(format!("failed to decode session: {error}")))?;
        match session.url {
            Some(url) if !url.is_empty() => Ok(CheckoutSession { id: session.id, url }),
            _ => Err(CheckoutError::Provider("session was created without a redirect url".to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    message: Option<String>,
}

async fn provider_error(response: reqwest::Response) -> CheckoutError {
    let status = response.status();
    let message = response
        .json::<StripeErrorEnvelope>()
        .await
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| format!("stripe returned {status}"));
    CheckoutError::Provider(message)
}

/// Validates the amount and routes to the provider when one is configured.
pub struct CheckoutService {
    client: Service<Arc<dyn CheckoutClient>>,
}

impl CheckoutService {
    pub fn new(client: Service<Arc<dyn CheckoutClient>>) -> Self {
        Self { client }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    pub async fn create_session(&self, request: CheckoutRequest) -> Result<CheckoutSession, CheckoutError> {
        to_minor_units(request.amount)?;
        let client = match &self.client {
            Service::Configured(client) => client,
            Service::Unconfigured { reason } => {
                return Err(CheckoutError::Unconfigured(reason.clone()));
            }
        };

        match client.create_session(&request).await {
            Ok(session) => {
                info!(
                    event_name = "checkout.session_created",
                    session_id = %session.id,
                    amount = %request.amount,
                    "checkout session created"
                );
                Ok(session)
            }
            Err(error) => {
                warn!(event_name = "checkout.failed", error = %error, "checkout session creation failed");
                Err(error)
            }
        }
    }
}

pub struct StripeProbe {
    client: Service<StripeClient>,
}

impl StripeProbe {
    pub fn new(client: Service<StripeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ServiceProbe for StripeProbe {
    fn service_name(&self) -> &str {
        STRIPE_SERVICE_NAME
    }

    async fn probe(&self) -> ServiceCheck {
        let client = match &self.client {
            Service::Configured(client) => client,
            Service::Unconfigured { .. } => return ServiceCheck::key_missing(),
        };

        match client.list_payment_intents().await {
            Ok(()) => ServiceCheck::ok("API connection successful"),
            Err(error) => ServiceCheck::error(error.to_string()),
        }
    }
}

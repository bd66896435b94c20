use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use unikron_agent::{GeminiClient, GeminiProbe, LlmClient, TrendAnalyst};
use unikron_core::activity::InMemoryActivityLog;
use unikron_core::config::AppConfig;
use unikron_core::diagnostics::ServiceProbe;
use unikron_core::domain::catalog::{CatalogLoadError, InventoryCatalog};
use unikron_core::errors::DomainError;
use unikron_core::fallback::FallbackPolicy;
use unikron_core::quote::DeterministicQuoteCalculator;
use unikron_core::service::Service;
use unikron_integrations::{
    CheckoutClient, CheckoutService, NanoBananaClient, NanoBananaProbe, RenderClient,
    RenderService, StripeClient, StripeProbe,
};

use crate::api::StudioState;
use crate::health::HealthState;

pub struct Application {
    pub config: AppConfig,
    pub state: StudioState,
    pub health: HealthState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("catalog load failed: {0}")]
    Catalog(#[from] CatalogLoadError),
    #[error("default project area is invalid: {0}")]
    DefaultArea(#[from] DomainError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        catalog_path = %config.catalog.path.display(),
        "starting application bootstrap"
    );

    let catalog = Arc::new(InventoryCatalog::load(&config.catalog.path)?);
    let default_area = config.catalog.default_area()?;
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        styles = catalog.styles().len(),
        addons = catalog.addons().len(),
        tiers = catalog.complexity_multipliers().len(),
        "inventory catalog loaded"
    );

    let fallback = FallbackPolicy::default();

    let render_client =
        NanoBananaClient::from_config(&config.render).map_err(BootstrapError::HttpClient)?;
    let render_configured = render_client.is_configured();
    let renderer = RenderService::new(
        map_service(render_client, |client| Arc::new(client) as Arc<dyn RenderClient>),
        fallback.clone(),
    );

    let gemini = GeminiClient::from_config(&config.llm).map_err(BootstrapError::HttpClient)?;
    let llm_configured = gemini.is_configured();
    let trends = TrendAnalyst::new(
        map_service(gemini.clone(), |client| Arc::new(client) as Arc<dyn LlmClient>),
        fallback,
    );

    let stripe = StripeClient::from_config(&config.payment).map_err(BootstrapError::HttpClient)?;
    let payment_configured = stripe.is_configured();
    let checkout = CheckoutService::new(map_service(stripe.clone(), |client| {
        Arc::new(client) as Arc<dyn CheckoutClient>
    }));

    let probes: Vec<Arc<dyn ServiceProbe>> = vec![
        Arc::new(GeminiProbe::new(gemini)),
        Arc::new(StripeProbe::new(stripe)),
        Arc::new(NanoBananaProbe::new(render_configured)),
    ];

    info!(
        event_name = "system.bootstrap.integrations",
        correlation_id = "bootstrap",
        render_configured,
        llm_configured,
        payment_configured,
        "external collaborators initialized"
    );

    let health = HealthState {
        catalog: catalog.clone(),
        render_configured,
        llm_configured,
        payment_configured,
    };
    let state = StudioState {
        catalog,
        calculator: Arc::new(DeterministicQuoteCalculator),
        default_area,
        renderer: Arc::new(renderer),
        checkout: Arc::new(checkout),
        trends: Arc::new(trends),
        probes: Arc::new(probes),
        activity: InMemoryActivityLog::default(),
    };

    Ok(Application { config, state, health })
}

fn map_service<C, D>(service: Service<C>, wrap: impl FnOnce(C) -> D) -> Service<D> {
    match service {
        Service::Configured(client) => Service::Configured(wrap(client)),
        Service::Unconfigured { reason } => Service::Unconfigured { reason },
    }
}

//! Studio HTTP surface: catalog, live quote, rendering, checkout and the
//! admin endpoints (trends, diagnostics, activity).

use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use unikron_agent::TrendAnalyst;
use unikron_core::activity::{ActivityEntry, ActivityKind, ActivitySink, InMemoryActivityLog};
use unikron_core::diagnostics::{run_diagnostics, DiagnosticsReport, ServiceProbe};
use unikron_core::domain::catalog::{AddonId, InventoryCatalog, StyleId, TierKey};
use unikron_core::domain::design::RenderedDesign;
use unikron_core::domain::selection::{Selection, SquareMeters};
use unikron_core::errors::{ApplicationError, DomainError, InterfaceError};
use unikron_core::flows::{FlowContext, FlowEngine, FlowEvent, FlowState, FlowTransitionError};
use unikron_core::quote::pricing::{LineItem, PricingTraceStep};
use unikron_core::quote::QuoteCalculator;
use unikron_integrations::{CheckoutError, CheckoutRequest, CheckoutService, RenderRequest, RenderService};
use uuid::Uuid;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const TREND_TRANSCRIPT_LINES: usize = 50;

#[derive(Clone)]
pub struct StudioState {
    pub catalog: Arc<InventoryCatalog>,
    pub calculator: Arc<dyn QuoteCalculator>,
    pub default_area: SquareMeters,
    pub renderer: Arc<RenderService>,
    pub checkout: Arc<CheckoutService>,
    pub trends: Arc<TrendAnalyst>,
    pub probes: Arc<Vec<Arc<dyn ServiceProbe>>>,
    pub activity: InMemoryActivityLog,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn api_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (status, Json(ApiError { error: message.into() }))
}

fn interface_error(error: InterfaceError) -> (StatusCode, Json<ApiError>) {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = match &error {
        InterfaceError::BadRequest { message, .. } => message.clone(),
        _ => error.user_message().to_string(),
    };
    api_error(status, message)
}

pub fn router(state: StudioState) -> Router {
    Router::new()
        .route("/api/catalog", get(catalog))
        .route("/api/quote", post(quote))
        .route("/api/generate", post(generate).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)))
        .route("/api/checkout", post(checkout))
        .route("/api/trends", post(trends))
        .route("/api/diagnostics", get(diagnostics))
        .route("/api/activity", get(activity))
        .with_state(state)
}

/// Wire form of a studio selection. Omitted fields take the studio defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    pub style_id: Option<StyleId>,
    #[serde(default)]
    pub addon_ids: Vec<AddonId>,
    pub complexity_tier: Option<TierKey>,
    pub area_square_meters: Option<Decimal>,
    pub custom_prompt: Option<String>,
}

impl SelectionRequest {
    pub fn into_selection(self, default_area: SquareMeters) -> Result<Selection, DomainError> {
        let mut selection = Selection::with_area_default(default_area);
        if let Some(style_id) = self.style_id {
            selection = selection.with_style(style_id);
        }
        for addon_id in self.addon_ids {
            selection = selection.with_addon(addon_id);
        }
        if let Some(tier) = self.complexity_tier {
            selection = selection.with_tier(tier);
        }
        if let Some(area) = self.area_square_meters {
            selection = selection.with_area(SquareMeters::new(area)?);
        }
        if let Some(prompt) = self.custom_prompt {
            selection = selection.with_custom_prompt(prompt);
        }
        Ok(selection)
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierView {
    pub key: TierKey,
    pub label: String,
    pub multiplier: Decimal,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    #[serde(flatten)]
    pub catalog: InventoryCatalog,
    pub tiers: Vec<TierView>,
    pub default_selection: Selection,
}

#[derive(Clone, Debug, Serialize)]
pub struct LineItemView {
    pub caption: String,
    #[serde(flatten)]
    pub item: LineItem,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub selection: Selection,
    pub total: Option<Decimal>,
    pub line_items: Vec<LineItemView>,
    pub trace: Vec<PricingTraceStep>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TrendsRequest {
    #[serde(default)]
    pub logs: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsResponse {
    pub summary: String,
    pub log_count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct ActivityResponse {
    pub entries: Vec<ActivityEntry>,
}

pub async fn catalog(State(state): State<StudioState>) -> Json<CatalogResponse> {
    let tiers = state
        .catalog
        .complexity_multipliers()
        .iter()
        .map(|(key, multiplier)| TierView {
            key: key.clone(),
            label: key.display_label(),
            multiplier: *multiplier,
        })
        .collect();

    Json(CatalogResponse {
        catalog: state.catalog.as_ref().clone(),
        tiers,
        default_selection: Selection::with_area_default(state.default_area),
    })
}

pub async fn quote(
    State(state): State<StudioState>,
    payload: Result<Json<SelectionRequest>, JsonRejection>,
) -> ApiResult<QuoteResponse> {
    let correlation_id = Uuid::new_v4().to_string();
    let selection = parse_selection(&state, payload, &correlation_id)?;
    let breakdown = state.calculator.quote(&state.catalog, &selection);

    let baseline = Selection::with_area_default(state.default_area);
    for entry in ActivityEntry::changes_from(&state.catalog, &baseline, &selection) {
        state.activity.record(entry);
    }
    state.activity.record(ActivityEntry::for_selection(&state.catalog, &selection));
    if let Some(prompt) = selection.render_prompt() {
        state.activity.record(ActivityEntry::new(
            ActivityKind::CustomPrompt,
            format!("Custom prompt: {prompt}"),
        ));
    }

    info!(
        event_name = "studio.quote.computed",
        correlation_id = %correlation_id,
        style_id = %selection.style_id.as_str(),
        tier = %selection.complexity_tier.as_str(),
        addons = selection.addon_ids.len(),
        quoted = breakdown.total.is_some(),
        "quote computed"
    );

    Ok(Json(QuoteResponse {
        total: breakdown.total,
        line_items: breakdown
            .line_items
            .into_iter()
            .map(|item| LineItemView { caption: item.label(), item })
            .collect(),
        trace: breakdown.trace,
        selection,
    }))
}

pub async fn generate(
    State(state): State<StudioState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<RenderedDesign> {
    let correlation_id = Uuid::new_v4().to_string();
    let mut multipart =
        multipart.map_err(|rejection| api_error(StatusCode::BAD_REQUEST, rejection.body_text()))?;

    let mut image = None;
    let mut style = String::new();
    let mut prompt = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| api_error(StatusCode::BAD_REQUEST, error.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or("floor-plan").to_string();
                let content_type =
                    field.content_type().unwrap_or("application/octet-stream").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|error| api_error(StatusCode::BAD_REQUEST, error.body_text()))?;
                if !bytes.is_empty() {
                    image = Some((bytes.to_vec(), file_name, content_type));
                }
            }
            "style" => {
                style = field
                    .text()
                    .await
                    .map_err(|error| api_error(StatusCode::BAD_REQUEST, error.body_text()))?;
            }
            "prompt" => {
                let text = field
                    .text()
                    .await
                    .map_err(|error| api_error(StatusCode::BAD_REQUEST, error.body_text()))?;
                prompt = Some(text).filter(|text| !text.trim().is_empty());
            }
            _ => {}
        }
    }

    let context = FlowContext {
        plan_uploaded: image.is_some(),
        style_resolved: !style.trim().is_empty(),
        quote_available: false,
    };
    let engine = FlowEngine::default();
    engine
        .apply_with_activity(
            &FlowState::Customizing,
            &FlowEvent::GenerateRequested,
            &context,
            &state.activity,
        )
        .map_err(|error| match error {
            FlowTransitionError::MissingRequiredFields { missing_fields, .. }
                if missing_fields.iter().any(|field| field == "floor_plan") =>
            {
                api_error(StatusCode::BAD_REQUEST, "No image uploaded")
            }
            other => api_error(StatusCode::BAD_REQUEST, other.to_string()),
        })?;

    let Some((bytes, file_name, content_type)) = image else {
        return Err(api_error(StatusCode::BAD_REQUEST, "No image uploaded"));
    };
    if let Some(prompt) = &prompt {
        state.activity.record(ActivityEntry::new(
            ActivityKind::CustomPrompt,
            format!("Custom prompt: {prompt}"),
        ));
    }

    let design = state
        .renderer
        .generate(RenderRequest {
            image: bytes,
            file_name,
            content_type,
            style: style.clone(),
            prompt,
        })
        .await;

    state.activity.record(
        ActivityEntry::new(ActivityKind::RenderDelivered, format!("Render delivered: {style} design"))
            .with_metadata("design_id", design.id.clone())
            .with_metadata("fallback", design.fallback.to_string()),
    );
    info!(
        event_name = "studio.render.delivered",
        correlation_id = %correlation_id,
        design_id = %design.id,
        fallback = design.fallback,
        "rendering delivered"
    );

    Ok(Json(design))
}

pub async fn checkout(
    State(state): State<StudioState>,
    payload: Result<Json<SelectionRequest>, JsonRejection>,
) -> ApiResult<CheckoutResponse> {
    let correlation_id = Uuid::new_v4().to_string();
    let selection = parse_selection(&state, payload, &correlation_id)?;
    let breakdown = state.calculator.quote(&state.catalog, &selection);
    let style = state.catalog.find_style(&selection.style_id);

    let context = FlowContext {
        plan_uploaded: true,
        style_resolved: style.is_some(),
        quote_available: breakdown.total.is_some(),
    };
    FlowEngine::default()
        .apply_with_activity(
            &FlowState::Rendered,
            &FlowEvent::CheckoutRequested,
            &context,
            &state.activity,
        )
        .map_err(|_| {
            api_error(StatusCode::UNPROCESSABLE_ENTITY, "No quote is available for this selection")
        })?;

    let (Some(amount), Some(style)) = (breakdown.total, style) else {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "No quote is available for this selection",
        ));
    };

    let session = state
        .checkout
        .create_session(CheckoutRequest { amount, style_name: style.name.clone() })
        .await
        .map_err(|error| checkout_error(error, &correlation_id))?;

    info!(
        event_name = "studio.checkout.redirect",
        correlation_id = %correlation_id,
        session_id = %session.id,
        amount = %amount,
        "checkout session ready"
    );

    Ok(Json(CheckoutResponse { session_id: session.id, url: session.url, amount }))
}

pub async fn trends(
    State(state): State<StudioState>,
    payload: Result<Json<TrendsRequest>, JsonRejection>,
) -> ApiResult<TrendsResponse> {
    let Json(request) =
        payload.map_err(|rejection| api_error(StatusCode::BAD_REQUEST, rejection.body_text()))?;

    let logs = if request.logs.is_empty() {
        state.activity.transcript(TREND_TRANSCRIPT_LINES)
    } else {
        request.logs
    };
    let summary = state.trends.summarize(&logs).await;

    Ok(Json(TrendsResponse { summary, log_count: logs.len() }))
}

pub async fn diagnostics(State(state): State<StudioState>) -> Json<DiagnosticsReport> {
    let report = run_diagnostics(&state.probes).await;
    info!(event_name = "admin.diagnostics.completed", all_ok = report.all_ok(), "diagnostics completed");
    Json(report)
}

pub async fn activity(State(state): State<StudioState>) -> Json<ActivityResponse> {
    Json(ActivityResponse { entries: state.activity.entries() })
}

fn parse_selection(
    state: &StudioState,
    payload: Result<Json<SelectionRequest>, JsonRejection>,
    correlation_id: &str,
) -> Result<Selection, (StatusCode, Json<ApiError>)> {
    let Json(request) =
        payload.map_err(|rejection| api_error(StatusCode::BAD_REQUEST, rejection.body_text()))?;

    request.into_selection(state.default_area).map_err(|error| {
        warn!(
            event_name = "studio.selection.rejected",
            correlation_id = %correlation_id,
            error = %error,
            "selection rejected"
        );
        interface_error(ApplicationError::from(error).into_interface(correlation_id))
    })
}

fn checkout_error(error: CheckoutError, correlation_id: &str) -> (StatusCode, Json<ApiError>) {
    match error {
        CheckoutError::InvalidAmount(message) => api_error(StatusCode::BAD_REQUEST, message),
        CheckoutError::Unconfigured(reason) => {
            interface_error(ApplicationError::Unconfigured(reason).into_interface(correlation_id))
        }
        CheckoutError::Provider(message) => {
            warn!(
                event_name = "studio.checkout.provider_failed",
                correlation_id = %correlation_id,
                error = %message,
                "payment provider rejected checkout"
            );
            api_error(StatusCode::BAD_GATEWAY, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        extract::State,
        http::{Request, StatusCode},
        Json,
    };
    use indexmap::IndexMap;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use unikron_agent::TrendAnalyst;
    use unikron_core::activity::{ActivityKind, InMemoryActivityLog};
    use unikron_core::diagnostics::{ServiceCheck, ServiceProbe};
    use unikron_core::domain::catalog::{Addon, AddonId, InventoryCatalog, Style, StyleId, TierKey};
    use unikron_core::domain::selection::SquareMeters;
    use unikron_core::fallback::{FallbackPolicy, TRENDS_NOT_CONFIGURED};
    use unikron_core::quote::DeterministicQuoteCalculator;
    use unikron_core::service::Service;
    use unikron_integrations::{
        CheckoutClient, CheckoutError, CheckoutRequest, CheckoutService, CheckoutSession,
        RenderService,
    };

    use super::{quote, router, SelectionRequest, StudioState};

    struct RecordingCheckout {
        requests: Mutex<Vec<CheckoutRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl CheckoutClient for RecordingCheckout {
        async fn create_session(
            &self,
            request: &CheckoutRequest,
        ) -> Result<CheckoutSession, CheckoutError> {
            self.requests
                .lock()
                .map_err(|_| CheckoutError::Provider("poisoned".to_string()))?
                .push(request.clone());
            if self.fail {
                return Err(CheckoutError::Provider("card_declined".to_string()));
            }
            Ok(CheckoutSession {
                id: "cs_test_42".to_string(),
                url: "https://checkout.stripe.com/c/pay/cs_test_42".to_string(),
            })
        }
    }

    struct StaticProbe(&'static str, ServiceCheck);

    #[async_trait]
    impl ServiceProbe for StaticProbe {
        fn service_name(&self) -> &str {
            self.0
        }

        async fn probe(&self) -> ServiceCheck {
            self.1.clone()
        }
    }

    fn catalog() -> InventoryCatalog {
        let mut tiers = IndexMap::new();
        tiers.insert(TierKey::new("standard"), Decimal::ONE);
        tiers.insert(TierKey::new("complex"), Decimal::new(15, 1));
        InventoryCatalog::new(
            vec![Style {
                id: StyleId::new("signature"),
                name: "Signature".to_string(),
                price_per_square_meter: Decimal::from(50),
            }],
            vec![Addon {
                id: AddonId::new("lighting"),
                name: "Smart Lighting".to_string(),
                price: Decimal::from(200),
            }],
            tiers,
        )
        .expect("valid catalog")
    }

    fn state_with(checkout: Service<Arc<dyn CheckoutClient>>) -> StudioState {
        let probes: Vec<Arc<dyn ServiceProbe>> = vec![
            Arc::new(StaticProbe("gemini", ServiceCheck::key_missing())),
            Arc::new(StaticProbe("stripe", ServiceCheck::ok("API connection successful"))),
        ];
        StudioState {
            catalog: Arc::new(catalog()),
            calculator: Arc::new(DeterministicQuoteCalculator),
            default_area: SquareMeters::default(),
            renderer: Arc::new(RenderService::new(
                Service::unconfigured("no key"),
                FallbackPolicy::default(),
            )),
            checkout: Arc::new(CheckoutService::new(checkout)),
            trends: Arc::new(TrendAnalyst::new(
                Service::unconfigured("no key"),
                FallbackPolicy::default(),
            )),
            probes: Arc::new(probes),
            activity: InMemoryActivityLog::default(),
        }
    }

    fn state() -> StudioState {
        state_with(Service::unconfigured("payment.secret_key is not set"))
    }

    async fn send(state: StudioState, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state).oneshot(request).await.expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn decimal(value: &Value) -> Decimal {
        Decimal::from_str(value.as_str().expect("decimal string")).expect("decimal")
    }

    #[tokio::test]
    async fn quote_handler_prices_complex_selection() {
        let state = state();
        let request = SelectionRequest {
            style_id: Some(StyleId::new("signature")),
            addon_ids: vec![AddonId::new("lighting")],
            complexity_tier: Some(TierKey::new("complex")),
            ..SelectionRequest::default()
        };

        let Json(response) =
            quote(State(state.clone()), Ok(Json(request))).await.expect("quote response");

        assert_eq!(response.total, Some(Decimal::from(7700)));
        assert_eq!(response.line_items.len(), 4);
        assert_eq!(response.line_items[2].caption, "Complexity (COMPLEX)");
        let entries = state.activity.entries();
        let kinds = entries.iter().map(|entry| entry.kind.clone()).collect::<Vec<_>>();
        assert_eq!(kinds, vec![ActivityKind::AddonToggled, ActivityKind::TierChanged, ActivityKind::Selection]);
        assert_eq!(entries[0].summary, "Add-on selected: Smart Lighting");
        assert_eq!(entries[1].summary, "Complexity tier: COMPLEX");
        assert_eq!(entries[2].summary, "Selection: Signature style for 100m2 project");
    }

    #[tokio::test]
    async fn quote_route_records_style_pick_only_when_style_changes() {
        let state = state();
        let (status, _) =
            send(state.clone(), json_request("/api/quote", json!({ "styleId": "luxe" }))).await;
        assert_eq!(status, StatusCode::OK);

        let entries = state.activity.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, ActivityKind::StylePicked);
        assert_eq!(entries[0].metadata.get("style_id").map(String::as_str), Some("luxe"));

        send(state.clone(), json_request("/api/quote", json!({ "styleId": "signature" }))).await;
        assert_eq!(state.activity.entries()[2].kind, ActivityKind::Selection);
    }

    #[tokio::test]
    async fn quote_route_reports_null_total_for_unknown_style() {
        let (status, body) =
            send(state(), json_request("/api/quote", json!({ "styleId": "nonexistent" }))).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["total"].is_null());
        assert_eq!(body["lineItems"], json!([]));
    }

    #[tokio::test]
    async fn quote_route_applies_unknown_tier_as_identity() {
        let (status, body) = send(
            state(),
            json_request(
                "/api/quote",
                json!({ "styleId": "signature", "addonIds": ["lighting", "ghost"], "complexityTier": "mystery" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&body["total"]), Decimal::from(5200));
        assert_eq!(body["lineItems"][2]["kind"], "multiplier");
        assert_eq!(body["lineItems"][2]["resolved"], false);
    }

    #[tokio::test]
    async fn quote_route_rejects_negative_area_with_error_body() {
        let (status, body) = send(
            state(),
            json_request("/api/quote", json!({ "styleId": "signature", "areaSquareMeters": -3 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap_or_default().contains("-3"));
    }

    #[tokio::test]
    async fn catalog_route_lists_tiers_in_declared_order() {
        let request = Request::builder().uri("/api/catalog").body(Body::empty()).expect("request");
        let (status, body) = send(state(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tiers"][0]["key"], "standard");
        assert_eq!(body["tiers"][1]["label"], "COMPLEX");
        assert_eq!(body["styles"][0]["pricePerSquareMeter"], "50");
        assert_eq!(body["defaultSelection"]["styleId"], "signature");
    }

    #[tokio::test]
    async fn checkout_computes_total_server_side() {
        let recorder = Arc::new(RecordingCheckout { requests: Mutex::new(Vec::new()), fail: false });
        let client: Arc<dyn CheckoutClient> = recorder.clone();
        let state = state_with(Service::Configured(client));

        let (status, body) = send(
            state.clone(),
            json_request(
                "/api/checkout",
                json!({ "styleId": "signature", "addonIds": ["lighting"], "complexityTier": "complex", "total": 1 }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sessionId"], "cs_test_42");
        let requests = recorder.requests.lock().expect("requests");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].amount, Decimal::from(7700));
        assert_eq!(requests[0].style_name, "Signature");
        assert!(state
            .activity
            .entries()
            .iter()
            .any(|entry| entry.kind == ActivityKind::CheckoutStarted));
    }

    #[tokio::test]
    async fn checkout_without_quote_is_unprocessable() {
        let (status, body) =
            send(state(), json_request("/api/checkout", json!({ "styleId": "nonexistent" }))).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn checkout_maps_unconfigured_and_provider_failures() {
        let (status, _) =
            send(state(), json_request("/api/checkout", json!({ "styleId": "signature" }))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let failing: Arc<dyn CheckoutClient> =
            Arc::new(RecordingCheckout { requests: Mutex::new(Vec::new()), fail: true });
        let (status, body) = send(
            state_with(Service::Configured(failing)),
            json_request("/api/checkout", json!({ "styleId": "signature" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "card_declined");

        let (status, _) = send(
            state(),
            json_request("/api/checkout", json!({ "styleId": "signature", "areaSquareMeters": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    fn multipart_request(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, file_name, value) in parts {
            body.push_str("--UNIKRONBOUNDARY\r\n");
            match file_name {
                Some(file_name) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
                )),
                None => body.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str("--UNIKRONBOUNDARY--\r\n");

        Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header("content-type", "multipart/form-data; boundary=UNIKRONBOUNDARY")
            .body(Body::from(body))
            .expect("request")
    }

    #[tokio::test]
    async fn generate_without_image_is_bad_request() {
        let (status, body) = send(state(), multipart_request(&[("style", None, "Signature")])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No image uploaded");
    }

    #[tokio::test]
    async fn generate_falls_back_to_demo_design_without_renderer() {
        let state = state();
        let (status, body) = send(
            state.clone(),
            multipart_request(&[
                ("style", None, "Signature"),
                ("prompt", None, "floating staircase"),
                ("image", Some("plan.png"), "PNGDATA"),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fallback"], true);
        assert!(body["id"].as_str().unwrap_or_default().starts_with("demo-"));
        assert!(body["imageUrl"].as_str().unwrap_or_default().starts_with("https://images.unsplash.com/"));

        let kinds = state.activity.entries().into_iter().map(|entry| entry.kind).collect::<Vec<_>>();
        assert!(kinds.contains(&ActivityKind::RenderRequested));
        assert!(kinds.contains(&ActivityKind::CustomPrompt));
        assert!(kinds.contains(&ActivityKind::RenderDelivered));
    }

    #[tokio::test]
    async fn trends_without_model_returns_not_configured_sentence() {
        let (status, body) =
            send(state(), json_request("/api/trends", json!({ "logs": ["Selection: Luxe style for 150m2 project"] }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"], TRENDS_NOT_CONFIGURED);
        assert_eq!(body["logCount"], 1);
    }

    #[tokio::test]
    async fn diagnostics_route_reports_each_service() {
        let request = Request::builder().uri("/api/diagnostics").body(Body::empty()).expect("request");
        let (status, body) = send(state(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["gemini"], json!({ "status": "error", "message": "Key missing" }));
        assert_eq!(body["stripe"]["status"], "ok");
    }
}

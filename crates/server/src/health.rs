use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use unikron_core::domain::catalog::InventoryCatalog;

#[derive(Clone)]
pub struct HealthState {
    pub catalog: Arc<InventoryCatalog>,
    pub render_configured: bool,
    pub llm_configured: bool,
    pub payment_configured: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub catalog: HealthCheck,
    pub render: HealthCheck,
    pub llm: HealthCheck,
    pub payment: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Liveness plus a summary of what is running on fallbacks. The studio keeps
/// quoting without any collaborator, so missing keys never fail the probe.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = &state.catalog;
    let all_configured = state.render_configured && state.llm_configured && state.payment_configured;

    let payload = HealthResponse {
        status: if all_configured { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "unikron-server runtime initialized".to_string(),
        },
        catalog: HealthCheck {
            status: "ready",
            detail: format!(
                "{} styles, {} addons, {} complexity tiers",
                catalog.styles().len(),
                catalog.addons().len(),
                catalog.complexity_multipliers().len()
            ),
        },
        render: collaborator_check(state.render_configured, "demo renderings are served"),
        llm: collaborator_check(state.llm_configured, "trend analysis is disabled"),
        payment: collaborator_check(state.payment_configured, "checkout is unavailable"),
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

fn collaborator_check(configured: bool, fallback_detail: &str) -> HealthCheck {
    if configured {
        HealthCheck { status: "ready", detail: "credentials configured".to_string() }
    } else {
        HealthCheck { status: "fallback", detail: format!("not configured, {fallback_detail}") }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use indexmap::IndexMap;
    use rust_decimal::Decimal;
    use unikron_core::domain::catalog::{InventoryCatalog, Style, StyleId, TierKey};

    use crate::health::{health, HealthState};

    fn catalog() -> Arc<InventoryCatalog> {
        let mut tiers = IndexMap::new();
        tiers.insert(TierKey::new("standard"), Decimal::ONE);
        Arc::new(
            InventoryCatalog::new(
                vec![Style {
                    id: StyleId::new("signature"),
                    name: "Signature".to_string(),
                    price_per_square_meter: Decimal::from(50),
                }],
                Vec::new(),
                tiers,
            )
            .expect("valid catalog"),
        )
    }

    #[tokio::test]
    async fn health_is_ready_when_every_collaborator_is_configured() {
        let state = HealthState {
            catalog: catalog(),
            render_configured: true,
            llm_configured: true,
            payment_configured: true,
        };

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.catalog.detail, "1 styles, 0 addons, 1 complexity tiers");
    }

    #[tokio::test]
    async fn health_stays_up_but_degraded_without_keys() {
        let state = HealthState {
            catalog: catalog(),
            render_configured: false,
            llm_configured: true,
            payment_configured: false,
        };

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.render.status, "fallback");
        assert_eq!(payload.llm.status, "ready");
        assert!(payload.payment.detail.contains("checkout is unavailable"));
    }
}

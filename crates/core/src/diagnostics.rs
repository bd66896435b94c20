use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const KEY_MISSING: &str = "Key missing";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Ok,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCheck {
    pub status: ServiceStatus,
    pub message: String,
}

impl ServiceCheck {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { status: ServiceStatus::Ok, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { status: ServiceStatus::Error, message: message.into() }
    }

    pub fn key_missing() -> Self {
        Self::error(KEY_MISSING)
    }

    pub fn is_ok(&self) -> bool {
        self.status == ServiceStatus::Ok
    }
}

/// Per-service results keyed by service name, in probe order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticsReport(pub IndexMap<String, ServiceCheck>);

impl DiagnosticsReport {
    pub fn get(&self, service: &str) -> Option<&ServiceCheck> {
        self.0.get(service)
    }

    pub fn all_ok(&self) -> bool {
        self.0.values().all(ServiceCheck::is_ok)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ServiceCheck)> {
        self.0.iter()
    }
}

#[async_trait]
pub trait ServiceProbe: Send + Sync {
    fn service_name(&self) -> &str;
    async fn probe(&self) -> ServiceCheck;
}

/// Runs every probe in turn. Probes report failures as `error` checks, never panics.
pub async fn run_diagnostics(probes: &[Arc<dyn ServiceProbe>]) -> DiagnosticsReport {
    let mut report = IndexMap::new();
    for probe in probes {
        let check = probe.probe().await;
        report.insert(probe.service_name().to_string(), check);
    }
    DiagnosticsReport(report)
}

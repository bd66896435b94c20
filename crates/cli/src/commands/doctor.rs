use std::sync::Arc;

use serde::Serialize;
use unikron_agent::{GeminiClient, GeminiProbe};
use unikron_core::config::{AppConfig, LoadOptions};
use unikron_core::diagnostics::{run_diagnostics, ServiceCheck, ServiceProbe, KEY_MISSING};
use unikron_core::domain::catalog::InventoryCatalog;
use unikron_integrations::{NanoBananaClient, NanoBananaProbe, StripeClient, StripeProbe};

use crate::commands::{CommandResult, EXIT_DOCTOR};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Fail { EXIT_DOCTOR } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(check("config_validation", CheckStatus::Pass, "configuration loaded and validated"));
            checks.push(check_catalog(&config));
            checks.extend(check_services(&config));
        }
        Err(error) => {
            checks.push(check("config_validation", CheckStatus::Fail, error.to_string()));
            for name in ["catalog", "gemini", "stripe", "nano_banana"] {
                checks.push(check(
                    name,
                    CheckStatus::Skipped,
                    "skipped because configuration did not load",
                ));
            }
        }
    }

    // Missing keys leave the studio on its fallbacks, which is not a failure.
    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_catalog(config: &AppConfig) -> DoctorCheck {
    match InventoryCatalog::load(&config.catalog.path) {
        Ok(catalog) => check(
            "catalog",
            CheckStatus::Pass,
            format!(
                "`{}`: {} styles, {} addons, {} tiers",
                config.catalog.path.display(),
                catalog.styles().len(),
                catalog.addons().len(),
                catalog.complexity_multipliers().len()
            ),
        ),
        Err(error) => check("catalog", CheckStatus::Fail, error.to_string()),
    }
}

fn check_services(config: &AppConfig) -> Vec<DoctorCheck> {
    let probes = match build_probes(config) {
        Ok(probes) => probes,
        Err(error) => {
            return vec![check(
                "http_client",
                CheckStatus::Fail,
                format!("failed to build HTTP client: {error}"),
            )];
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![check(
                "service_diagnostics",
                CheckStatus::Fail,
                format!("failed to initialize async runtime: {error}"),
            )];
        }
    };

    let report = runtime.block_on(run_diagnostics(&probes));
    report.iter().map(|(service, result)| service_check(service, result)).collect()
}

fn build_probes(config: &AppConfig) -> Result<Vec<Arc<dyn ServiceProbe>>, String> {
    let gemini = GeminiClient::from_config(&config.llm).map_err(|error| error.to_string())?;
    let stripe = StripeClient::from_config(&config.payment).map_err(|error| error.to_string())?;
    let render_configured = NanoBananaClient::from_config(&config.render)
        .map_err(|error| error.to_string())?
        .is_configured();

    let probes: Vec<Arc<dyn ServiceProbe>> = vec![
        Arc::new(GeminiProbe::new(gemini)),
        Arc::new(StripeProbe::new(stripe)),
        Arc::new(NanoBananaProbe::new(render_configured)),
    ];
    Ok(probes)
}

fn service_check(service: &str, result: &ServiceCheck) -> DoctorCheck {
    if result.is_ok() {
        check(service, CheckStatus::Pass, result.message.clone())
    } else if result.message == KEY_MISSING {
        check(service, CheckStatus::Skipped, format!("{KEY_MISSING}; fallback behavior active"))
    } else {
        check(service, CheckStatus::Fail, result.message.clone())
    }
}

fn check(name: &str, status: CheckStatus, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck { name: name.to_string(), status, details: details.into() }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use unikron_core::diagnostics::ServiceCheck;

    use super::{service_check, CheckStatus};

    #[test]
    fn missing_key_is_skipped_not_failed() {
        let check = service_check("gemini", &ServiceCheck::key_missing());
        assert_eq!(check.status, CheckStatus::Skipped);
        assert!(check.details.starts_with("Key missing"));
    }

    #[test]
    fn provider_error_fails_the_check() {
        let check = service_check("stripe", &ServiceCheck::error("Invalid API Key provided"));
        assert_eq!(check.status, CheckStatus::Fail);
        assert_eq!(check.details, "Invalid API Key provided");
    }
}

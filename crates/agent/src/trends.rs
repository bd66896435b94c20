use std::sync::Arc;

use tera::{Context, Tera};
use tracing::{info, warn};
use unikron_core::fallback::FallbackPolicy;
use unikron_core::service::Service;

use crate::llm::LlmClient;

const TREND_PROMPT_TEMPLATE: &str = r#"As a market analyst for Unikron (a luxury construction and design firm), analyze the following user activity logs and summarize the current design trends.
Also, suggest new inventory additions based on high-frequency keywords in custom prompts.

Logs:
{% for line in logs %}{{ line }}
{% endfor %}
Provide a concise technical summary and 3 bulleted recommendations for the inventory."#;

/// Turns studio activity into a short trend summary. Never fails: missing or
/// failing models produce the fixed fallback sentences.
pub struct TrendAnalyst {
    llm: Service<Arc<dyn LlmClient>>,
    fallback: FallbackPolicy,
}

impl TrendAnalyst {
    pub fn new(llm: Service<Arc<dyn LlmClient>>, fallback: FallbackPolicy) -> Self {
        Self { llm, fallback }
    }

    pub fn render_prompt(logs: &[String]) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("logs", logs);
        Tera::one_off(TREND_PROMPT_TEMPLATE, &context, false)
    }

    pub async fn summarize(&self, logs: &[String]) -> String {
        let llm = match &self.llm {
            Service::Configured(llm) => llm,
            Service::Unconfigured { reason } => {
                info!(event_name = "trends.unconfigured", reason = %reason, "trend analysis skipped");
                return self.fallback.trends_not_configured.clone();
            }
        };

        let prompt = match Self::render_prompt(logs) {
            Ok(prompt) => prompt,
            Err(error) => {
                warn!(event_name = "trends.prompt_failed", error = %error, "trend prompt rendering failed");
                return self.fallback.trends_unavailable.clone();
            }
        };

        match llm.complete(&prompt).await {
            Ok(summary) => {
                info!(event_name = "trends.summarized", log_lines = logs.len(), "trend summary generated");
                summary
            }
            Err(error) => {
                warn!(event_name = "trends.failed", error = %error, "trend analysis failed");
                self.fallback.trends_unavailable.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use unikron_core::fallback::{FallbackPolicy, TRENDS_NOT_CONFIGURED, TRENDS_UNAVAILABLE};
    use unikron_core::service::Service;

    use super::TrendAnalyst;
    use crate::llm::LlmClient;

    struct RecordingLlm {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingLlm {
        fn replying(reply: Result<String, String>) -> Arc<Self> {
            Arc::new(Self { reply, prompts: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl LlmClient for RecordingLlm {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().map_err(|_| anyhow!("poisoned"))?.push(prompt.to_string());
            self.reply.clone().map_err(|message| anyhow!(message))
        }
    }

    fn logs() -> Vec<String> {
        vec![
            "Selection: Luxe style for 150m2 project".to_string(),
            "Custom prompt: floating staircase".to_string(),
        ]
    }

    #[test]
    fn prompt_lists_every_log_line_and_asks_for_three_bullets() {
        let prompt = TrendAnalyst::render_prompt(&logs()).expect("prompt renders");

        assert!(prompt.starts_with("As a market analyst for Unikron"));
        assert!(prompt.contains("Selection: Luxe style for 150m2 project\n"));
        assert!(prompt.contains("Custom prompt: floating staircase\n"));
        assert!(prompt.contains("3 bulleted recommendations"));
    }

    #[tokio::test]
    async fn configured_model_summary_is_returned() {
        let llm = RecordingLlm::replying(Ok("Warm minimalism is trending.".to_string()));
        let client: Arc<dyn LlmClient> = llm.clone();
        let analyst = TrendAnalyst::new(Service::Configured(client), FallbackPolicy::default());

        let summary = analyst.summarize(&logs()).await;

        assert_eq!(summary, "Warm minimalism is trending.");
        let prompts = llm.prompts.lock().expect("prompts");
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("floating staircase"));
    }

    #[tokio::test]
    async fn unconfigured_model_returns_not_configured_sentence() {
        let analyst = TrendAnalyst::new(Service::unconfigured("no key"), FallbackPolicy::default());
        assert_eq!(analyst.summarize(&logs()).await, TRENDS_NOT_CONFIGURED);
    }

    #[tokio::test]
    async fn model_failure_returns_unavailable_sentence() {
        let client: Arc<dyn LlmClient> = RecordingLlm::replying(Err("quota exceeded".to_string()));
        let analyst = TrendAnalyst::new(Service::Configured(client), FallbackPolicy::default());

        assert_eq!(analyst.summarize(&logs()).await, TRENDS_UNAVAILABLE);
    }
}
